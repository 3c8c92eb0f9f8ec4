/*!
# `Lumen` - Crop
*/

use crate::{
	Image,
	LumenError,
	image::pixel_buffer_size,
};



/// # Crop.
///
/// Cut a `width × height` window out of the middle of a pixel image. When the
/// leftover space is odd, the extra pixel ends up on the right/bottom.
///
/// ## Errors
///
/// Encoded sources and inconsistent buffers return an error, as do zero
/// dimensions or a window larger than the source ([`LumenError::Crop`]).
pub fn crop(img: &Image, width: u32, height: u32) -> Result<Image, LumenError> {
	let format = img.format();
	if ! format.is_pixels() {
		return Err(LumenError::Process { process: "crop", format });
	}

	let bpp = img.pixel_size()?;
	let (src_w, src_h) = (img.width(), img.height());
	if width == 0 || height == 0 || width > src_w || height > src_h {
		return Err(LumenError::Crop);
	}
	tracing::debug!(src_w, src_h, width, height, "crop");

	let x = (src_w - width) as usize / 2;
	let y = (src_h - height) as usize / 2;
	let src_stride = img.stride()?;
	let dst_stride = width as usize * bpp;

	let mut dst: Vec<u8> = Vec::new();
	dst.try_reserve_exact(pixel_buffer_size(format, width, height)?)
		.map_err(|_| LumenError::Overflow)?;

	for row in img.chunks_exact(src_stride).skip(y).take(height as usize) {
		let start = x * bpp;
		dst.extend_from_slice(&row[start..start + dst_stride]);
	}

	Ok(Image::new(dst, format, width, height))
}



#[cfg(test)]
mod tests {
	use super::*;
	use crate::ImageFormat;

	#[test]
	fn t_crop() {
		// A 4x3 RGB image where each pixel is (x, y, 0).
		let mut buf = Vec::new();
		for y in 0..3_u8 {
			for x in 0..4_u8 { buf.extend_from_slice(&[x, y, 0]); }
		}
		let img = Image::from_pixels(buf, ImageFormat::Rgb8, 4, 3).expect("Valid pixels.");

		let out = crop(&img, 2, 1).expect("Crop failed.");
		assert_eq!((out.width(), out.height()), (2, 1));
		assert_eq!(&*out, &[1, 1, 0, 2, 1, 0]);

		// Odd leftovers favor the top/left offset rounding down.
		let out = crop(&img, 3, 2).expect("Crop failed.");
		assert_eq!(&*out, &[0, 0, 0, 1, 0, 0, 2, 0, 0, 0, 1, 0, 1, 1, 0, 2, 1, 0]);

		// The whole thing.
		assert_eq!(&*crop(&img, 4, 3).expect("Crop failed."), &*img);
	}

	#[test]
	fn t_crop_bounds() {
		let img = Image::blank(ImageFormat::Rgba8, 4, 4).expect("Blank.");
		assert_eq!(crop(&img, 0, 2).err(), Some(LumenError::Crop));
		assert_eq!(crop(&img, 5, 2).err(), Some(LumenError::Crop));
		assert_eq!(crop(&img, 2, 5).err(), Some(LumenError::Crop));
		assert_eq!(crop(&img, 2, 2).map(|i| i.len()), Ok(16));
	}
}
