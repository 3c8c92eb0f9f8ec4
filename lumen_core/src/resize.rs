/*!
# `Lumen` - Resize
*/

use crate::{
	ErrorMessage,
	Image,
	ImageFormat,
	LumenError,
	image::pixel_buffer_size,
};
use resize::{
	Pixel,
	Type,
};
use rgb::FromSlice;



/// # Resize Seed.
///
/// The canonical hashing seed for resized output. Bump it whenever the
/// resampling changes in a way that alters the pixels.
pub const SEED: u64 = 1;



/// # Target Dimensions.
///
/// Work out the output size for resizing a `src_width × src_height` image
/// to `width × height`.
///
/// Without `maintain_aspect`, the request is taken literally and both sides
/// must be non-zero.
///
/// With `maintain_aspect`, a zero side is derived from the other. If both are
/// given, the result is the largest size fitting inside the box: the width is
/// kept when `width * src_height <= height * src_width`, otherwise the height
/// is. Derived sides are rounded to the nearest integer (halves up) and are
/// never less than one.
///
/// ## Errors
///
/// Zero source dimensions, a zero (or `0 × 0`) request, or a derived side
/// that doesn't fit in a `u32` all return an error.
pub fn target_dimensions(
	src_width: u32,
	src_height: u32,
	width: u32,
	height: u32,
	maintain_aspect: bool,
) -> Result<(u32, u32), LumenError> {
	if src_width == 0 || src_height == 0 { return Err(LumenError::Dimensions); }

	if ! maintain_aspect {
		return
			if width == 0 || height == 0 { Err(LumenError::Dimensions) }
			else { Ok((width, height)) };
	}

	match (width, height) {
		(0, 0) => Err(LumenError::Dimensions),
		(w, 0) => Ok((w, scale(src_height, w, src_width)?)),
		(0, h) => Ok((scale(src_width, h, src_height)?, h)),
		(w, h) =>
			if u64::from(w) * u64::from(src_height) <= u64::from(h) * u64::from(src_width) {
				Ok((w, scale(src_height, w, src_width)?))
			}
			else {
				Ok((scale(src_width, h, src_height)?, h))
			},
	}
}

/// # Resize.
///
/// Resample a pixel image with a triangle (bilinear) filter, returning a new
/// image in the same pixel format. See [`target_dimensions`] for how the
/// output size is chosen.
///
/// ## Errors
///
/// Encoded sources, inconsistent buffers, invalid dimensions, and resampler
/// failures all return an error.
pub fn resize(img: &Image, width: u32, height: u32, maintain_aspect: bool)
-> Result<Image, LumenError> {
	let format = img.format();
	if ! format.is_pixels() {
		return Err(LumenError::Process { process: "resize", format });
	}
	img.pixel_size()?;

	let (src_w, src_h) = (img.width(), img.height());
	let (dst_w, dst_h) = target_dimensions(src_w, src_h, width, height, maintain_aspect)?;
	tracing::debug!(src_w, src_h, dst_w, dst_h, "resize");

	// Nothing to resample.
	if (src_w, src_h) == (dst_w, dst_h) { return Ok(img.clone()); }

	let size = pixel_buffer_size(format, dst_w, dst_h)?;
	let mut dst: Vec<u8> = Vec::new();
	dst.try_reserve_exact(size).map_err(|_| LumenError::Overflow)?;
	dst.resize(size, 0);

	let (sw, sh, dw, dh) = (src_w as usize, src_h as usize, dst_w as usize, dst_h as usize);
	let res = match format {
		ImageFormat::Rgb8 => resize::new(sw, sh, dw, dh, Pixel::RGB8, Type::Triangle)
			.and_then(|mut r| r.resize(img.as_rgb(), dst.as_rgb_mut())),
		ImageFormat::Rgba8 => resize::new(sw, sh, dw, dh, Pixel::RGBA8, Type::Triangle)
			.and_then(|mut r| r.resize(img.as_rgba(), dst.as_rgba_mut())),
		_ => return Err(LumenError::Process { process: "resize", format }),
	};
	res.map_err(|e| LumenError::Resize(ErrorMessage::from_display(&e)))?;

	Ok(Image::new(dst, format, dst_w, dst_h))
}



/// # Scale Side.
///
/// Return `len * num / den`, rounded to nearest with halves going up, and
/// clamped to at least one.
fn scale(len: u32, num: u32, den: u32) -> Result<u32, LumenError> {
	let den = u128::from(den) * 2;
	let out = num_integer::div_floor(u128::from(len) * u128::from(num) * 2 + den / 2, den);
	u32::try_from(out.max(1)).map_err(|_| LumenError::Overflow)
}
