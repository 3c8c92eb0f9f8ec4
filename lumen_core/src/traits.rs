/*!
# `Lumen` - Traits.
*/

#![cfg_attr(not(any(feature = "avif", feature = "jpeg", feature = "png", feature = "webp")), allow(dead_code))]

use crate::{
	Context,
	Image,
	LumenError,
};



/// # Decoder.
///
/// This is implemented for image formats capable of decoding a raw file into
/// an owned pixel buffer.
pub(crate) trait Decoder {
	/// # Decode.
	///
	/// Decode the bytes from a raw image file into a new [`Image`] holding
	/// either RGB or RGBA pixels, whichever the source actually needs.
	///
	/// ## Errors
	///
	/// Return any errors encountered during decoding. No partial image is
	/// ever returned.
	fn decode(raw: &[u8]) -> Result<Image, LumenError>;
}

/// # Encoder.
///
/// This is implemented for image formats capable of encoding RGB/RGBA pixels
/// into a raw file.
pub(crate) trait Encoder {
	/// # Hashing Seed.
	///
	/// The canonical content-hashing seed for this format's output.
	const SEED: u64;

	/// # Encode.
	///
	/// Encode the pixels using whatever tunables the [`Context`] holds for
	/// this format. The source image is never modified.
	///
	/// ## Errors
	///
	/// Return any errors encountered during encoding.
	fn encode(img: &Image, ctx: &Context) -> Result<Image, LumenError>;
}
