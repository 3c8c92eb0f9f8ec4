/*!
# `Lumen`: `WebP` Handling

This uses [`libwebp-sys2`](https://crates.io/crates/libwebp-sys2) bindings to Google's
`libwebp`. Lossy output should be roughly equivalent to:

```bash
cwebp -m 4 -q {QUALITY}
```
*/

use crate::{
	Context,
	Image,
	ImageFormat,
	LumenError,
	color::rgba_to_rgb,
	image::pixel_buffer_size,
	traits::{
		Decoder,
		Encoder,
	},
};
use libwebp_sys::{
	WEBP_MAX_DIMENSION,
	WebPConfig,
	WebPConfigInit,
	WebPDecodeRGBA,
	WebPEncode,
	WebPFree,
	WebPMemoryWrite,
	WebPMemoryWriter,
	WebPMemoryWriterClear,
	WebPMemoryWriterInit,
	WebPPicture,
	WebPPictureFree,
	WebPPictureImportRGB,
	WebPPictureImportRGBA,
	WebPPictureInit,
	WebPValidateConfig,
};
use std::os::raw::c_int;



/// # `WebP` Image.
pub(crate) struct ImageWebp;

impl Decoder for ImageWebp {
	/// # Decode.
	///
	/// `libwebp` always hands back RGBA; fully-opaque results are reduced to
	/// RGB.
	fn decode(raw: &[u8]) -> Result<Image, LumenError> {
		let d = LibWebPDecode::try_from(raw)?;

		let width = u32::try_from(d.width).map_err(|_| LumenError::Overflow)?;
		let height = u32::try_from(d.height).map_err(|_| LumenError::Overflow)?;
		let size = pixel_buffer_size(ImageFormat::Rgba8, width, height)?;

		// Safety: libwebp allocated exactly this much.
		let src: &[u8] = unsafe { std::slice::from_raw_parts(d.ptr, size) };
		match rgba_to_rgb(src) {
			Some(rgb) => Image::from_pixels(rgb, ImageFormat::Rgb8, width, height),
			None => Image::from_pixels(src.to_vec(), ImageFormat::Rgba8, width, height),
		}
	}
}

impl Encoder for ImageWebp {
	const SEED: u64 = 1;

	/// # Encode.
	///
	/// Lossy, at the context's quality (capped at `100`).
	fn encode(img: &Image, ctx: &Context) -> Result<Image, LumenError> {
		let config = make_config(ctx.webp().quality)?;
		let mut picture = LibWebpPicture::try_from(img)?;
		let writer = LibWebpWriter::from(&mut picture.0);

		// Encode!
		maybe_die(
			unsafe { WebPEncode(&config, &mut picture.0) },
			"Encoding failed.",
		)?;
		drop(picture);

		let out = writer.as_slice().to_vec();
		if out.is_empty() { return Err(LumenError::Webp("Encoding produced no output.")); }
		Ok(Image::new(out, ImageFormat::Webp, img.width(), img.height()))
	}
}



/// # Decode Wrapper.
///
/// This exists solely to help with garbage cleanup.
struct LibWebPDecode {
	width: c_int,
	height: c_int,
	ptr: *mut u8,
}

impl TryFrom<&[u8]> for LibWebPDecode {
	type Error = LumenError;

	fn try_from(src: &[u8]) -> Result<Self, Self::Error> {
		let mut width: c_int = 0;
		let mut height: c_int = 0;
		let result = unsafe {
			WebPDecodeRGBA(src.as_ptr(), src.len(), &mut width, &mut height)
		};

		if result.is_null() { Err(LumenError::Webp("Decoding failed.")) }
		else {
			Ok(Self {
				width,
				height,
				ptr: result,
			})
		}
	}
}

impl Drop for LibWebPDecode {
	#[inline]
	fn drop(&mut self) { unsafe { WebPFree(self.ptr.cast()); } }
}



/// # Picture Wrapper.
///
/// This `C` struct is Rust-wrapped to help with garbage cleanup, but while
/// we're here, may as well provide initialization code too.
struct LibWebpPicture(WebPPicture);

impl TryFrom<&Image> for LibWebpPicture {
	type Error = LumenError;

	fn try_from(img: &Image) -> Result<Self, Self::Error> {
		let bpp = img.pixel_size()?;
		let stride = c_int::try_from(img.stride()?).map_err(|_| LumenError::Overflow)?;

		// Check the source dimensions.
		let width = c_int::try_from(img.width()).map_err(|_| LumenError::Overflow)?;
		let height = c_int::try_from(img.height()).map_err(|_| LumenError::Overflow)?;
		if width > WEBP_MAX_DIMENSION || height > WEBP_MAX_DIMENSION {
			return Err(LumenError::Overflow);
		}

		// Set up the picture struct.
		let mut out = Self(unsafe { std::mem::zeroed() });
		maybe_die(unsafe { WebPPictureInit(&mut out.0) }, "Picture setup failed.")?;

		out.0.use_argb = 1;
		out.0.width = width;
		out.0.height = height;

		// Fill the pixel buffers. (These don't actually mutate.)
		let raw: &[u8] = img;
		maybe_die(
			unsafe {
				if bpp == 4 { WebPPictureImportRGBA(&mut out.0, raw.as_ptr(), stride) }
				else { WebPPictureImportRGB(&mut out.0, raw.as_ptr(), stride) }
			},
			"Pixel import failed.",
		)?;

		// A few more sanity checks.
		if out.0.use_argb != 1 || ! out.0.y.is_null() || out.0.argb.is_null() {
			return Err(LumenError::Webp("Pixel import failed."));
		}

		Ok(out)
	}
}

impl Drop for LibWebpPicture {
	#[inline]
	fn drop(&mut self) { unsafe { WebPPictureFree(&mut self.0); } }
}



/// # Writer Wrapper.
///
/// This `C` struct is Rust-wrapped to help with garbage cleanup, but while
/// we're here, may as well provide initialization code too.
struct LibWebpWriter(Box<WebPMemoryWriter>);

impl From<&mut WebPPicture> for LibWebpWriter {
	fn from(picture: &mut WebPPicture) -> Self {
		// A Writer wrapper function. (It has to be "safe".)
		extern "C" fn on_write(
			data: *const u8,
			data_size: usize,
			picture: *const WebPPicture,
		) -> c_int {
			unsafe { WebPMemoryWrite(data, data_size, picture) }
		}

		// Hook in the writer.
		let mut writer = Self(Box::new(unsafe { std::mem::zeroed() }));
		unsafe { WebPMemoryWriterInit(&mut *writer.0); }

		picture.writer = Some(on_write);
		picture.custom_ptr = (&raw mut *writer.0).cast::<std::ffi::c_void>();

		writer
	}
}

impl Drop for LibWebpWriter {
	#[inline]
	fn drop(&mut self) { unsafe { WebPMemoryWriterClear(&mut *self.0); } }
}

impl LibWebpWriter {
	/// # Output.
	fn as_slice(&self) -> &[u8] {
		if self.0.mem.is_null() { &[] }
		else { unsafe { std::slice::from_raw_parts(self.0.mem, self.0.size) } }
	}
}



/// # Make Config.
///
/// This generates a lossy encoder configuration profile.
fn make_config(quality: u8) -> Result<WebPConfig, LumenError> {
	let mut config: WebPConfig = unsafe { std::mem::zeroed() };
	maybe_die(unsafe { WebPConfigInit(&mut config) }, "Config setup failed.")?;

	config.quality = f32::from(quality.min(100));
	config.method = 4;
	config.thread_level = 0;

	maybe_die(unsafe { WebPValidateConfig(&config) }, "Invalid config.")?;
	Ok(config)
}

#[inline]
/// # Verify Status.
///
/// This converts unsuccessful `libwebp` function results into proper Rust
/// errors.
const fn maybe_die(res: c_int, msg: &'static str) -> Result<(), LumenError> {
	if 0 == res { Err(LumenError::Webp(msg)) }
	else { Ok(()) }
}



#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn t_round_trip() {
		let mut ctx = Context::default();
		ctx.set_webp_quality(250); // Capped, not rejected.

		let src = Image::from_pixels([40, 80, 120].repeat(4 * 4), ImageFormat::Rgb8, 4, 4)
			.unwrap();
		let enc = ImageWebp::encode(&src, &ctx).expect("Encode failed.");
		assert_eq!(enc.format(), ImageFormat::Webp);
		assert_eq!(ImageFormat::try_from(&*enc), Ok(ImageFormat::Webp));

		let dec = ImageWebp::decode(&enc).expect("Decode failed.");
		assert_eq!(dec.format(), ImageFormat::Rgb8);
		assert_eq!((dec.width(), dec.height()), (4, 4));
		for (a, b) in src.iter().zip(dec.iter()) { assert!(a.abs_diff(*b) <= 8); }
	}

	#[test]
	fn t_alpha() {
		let ctx = Context::default();
		let src = Image::from_pixels([200, 10, 10, 0].repeat(2 * 2), ImageFormat::Rgba8, 2, 2)
			.unwrap();
		let dec = ImageWebp::decode(&ImageWebp::encode(&src, &ctx).unwrap()).unwrap();
		assert_eq!(dec.format(), ImageFormat::Rgba8);
		assert_eq!((dec.width(), dec.height()), (2, 2));
		assert!(dec.chunks_exact(4).all(|p| p[3] == 0));
	}

	#[test]
	fn t_invalid() {
		assert_eq!(
			ImageWebp::decode(b"RIFF\0\0\0\0WEBPVP8 junk").err(),
			Some(LumenError::Webp("Decoding failed.")),
		);
	}
}
