/*!
# `Lumen` - PNG Images.
*/

use crate::{
	Context,
	ErrorMessage,
	Image,
	ImageFormat,
	LumenError,
	color::rgba_to_rgb,
	traits::{
		Decoder,
		Encoder,
	},
};
use rgb::FromSlice;



/// # PNG Image.
pub(crate) struct ImagePng;

impl Decoder for ImagePng {
	/// # Decode.
	///
	/// Everything is expanded to 8-bit RGBA, then squashed back down to RGB
	/// if it turns out every pixel is opaque.
	fn decode(raw: &[u8]) -> Result<Image, LumenError> {
		let img = lodepng::decode32(raw)
			.map_err(|e| LumenError::Png(ErrorMessage::from_display(&e)))?;

		let width = u32::try_from(img.width).map_err(|_| LumenError::Overflow)?;
		let height = u32::try_from(img.height).map_err(|_| LumenError::Overflow)?;

		let mut buf: Vec<u8> = Vec::new();
		buf.try_reserve_exact(img.buffer.len() * 4).map_err(|_| LumenError::Overflow)?;
		for px in &img.buffer { buf.extend_from_slice(&[px.r, px.g, px.b, px.a]); }
		drop(img);

		match rgba_to_rgb(&buf) {
			Some(rgb) => Image::from_pixels(rgb, ImageFormat::Rgb8, width, height),
			None => Image::from_pixels(buf, ImageFormat::Rgba8, width, height),
		}
	}
}

impl Encoder for ImagePng {
	const SEED: u64 = 1;

	/// # Encode.
	///
	/// PNG has no tunables; the context is ignored.
	fn encode(img: &Image, _ctx: &Context) -> Result<Image, LumenError> {
		let bpp = img.pixel_size()?;
		let (width, height) = (img.width() as usize, img.height() as usize);

		let res = match bpp {
			3 => lodepng::encode24(img.as_rgb(), width, height),
			4 => lodepng::encode32(img.as_rgba(), width, height),
			_ => return Err(LumenError::PixelBuffer),
		};
		let out = res.map_err(|e| LumenError::Png(ErrorMessage::from_display(&e)))?;

		Ok(Image::new(out, ImageFormat::Png, img.width(), img.height()))
	}
}
