/*!
# `Lumen` - Image Format
*/

use crate::{
	Context,
	Image,
	LumenError,
	traits::{
		Decoder,
		Encoder,
	},
};
use std::fmt;

#[cfg(feature = "avif")] use crate::ImageAvif;
#[cfg(feature = "jpeg")] use crate::ImageJpeg;
#[cfg(feature = "png")]  use crate::ImagePng;
#[cfg(feature = "webp")] use crate::ImageWebp;



#[repr(u8)]
#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
/// # Image Format.
///
/// This tags the contents of an [`Image`] buffer: either raw pixels
/// ([`ImageFormat::Rgb8`], [`ImageFormat::Rgba8`]) or an encoded file.
///
/// The discriminants are part of the C interface and must never change.
pub enum ImageFormat {
	/// # 8-bit RGB Pixels.
	Rgb8 = 1,

	/// # 8-bit RGBA Pixels.
	Rgba8 = 2,

	/// # JPEG.
	Jpeg = 3,

	/// # PNG.
	Png = 4,

	/// # WebP.
	Webp = 5,

	/// # AVIF.
	Avif = 6,
}

impl AsRef<str> for ImageFormat {
	#[inline]
	fn as_ref(&self) -> &str { self.as_str() }
}

impl fmt::Display for ImageFormat {
	#[inline]
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl TryFrom<u8> for ImageFormat {
	type Error = LumenError;

	fn try_from(src: u8) -> Result<Self, Self::Error> {
		match src {
			1 => Ok(Self::Rgb8),
			2 => Ok(Self::Rgba8),
			3 => Ok(Self::Jpeg),
			4 => Ok(Self::Png),
			5 => Ok(Self::Webp),
			6 => Ok(Self::Avif),
			_ => Err(LumenError::Format(src)),
		}
	}
}

impl TryFrom<&[u8]> for ImageFormat {
	type Error = LumenError;

	/// # From Raw Bytes.
	///
	/// This examines the magic headers of an encoded file. Raw pixel buffers
	/// carry no magic and are never matched.
	fn try_from(src: &[u8]) -> Result<Self, Self::Error> {
		// JPEG only needs its SOI marker and the start of the next segment.
		// Truncated files are still reported as JPEG so the decoder gets a
		// chance to explain what is wrong with them.
		if 3 <= src.len() && src[..3] == [0xFF, 0xD8, 0xFF] {
			return Ok(Self::Jpeg);
		}

		if src.len() >= 12 {
			if src[..8] == [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'] {
				return Ok(Self::Png);
			}

			if src[..4] == *b"RIFF" && src[8..12] == *b"WEBP" {
				return Ok(Self::Webp);
			}

			// We're ignoring AVIF sequences since we don't build them.
			if
				src[4..8] == *b"ftyp" &&
				matches!(&src[8..12], b"avif" | b"MA1B" | b"MA1A")
			{
				return Ok(Self::Avif);
			}
		}

		Err(LumenError::Unknown)
	}
}

/// ## Getters.
impl ImageFormat {
	#[must_use]
	/// # As String Slice.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Rgb8 => "RGB8",
			Self::Rgba8 => "RGBA8",
			Self::Jpeg => "JPEG",
			Self::Png => "PNG",
			Self::Webp => "WebP",
			Self::Avif => "AVIF",
		}
	}

	#[must_use]
	/// # Bytes Per Pixel.
	///
	/// Returns `None` for encoded formats.
	pub const fn pixel_size(self) -> Option<usize> {
		match self {
			Self::Rgb8 => Some(3),
			Self::Rgba8 => Some(4),
			_ => None,
		}
	}

	#[inline]
	#[must_use]
	/// # Is Raw Pixels?
	pub const fn is_pixels(self) -> bool { matches!(self, Self::Rgb8 | Self::Rgba8) }

	#[must_use]
	/// # File Extension.
	///
	/// Returns `None` for raw pixel formats.
	pub const fn extension(self) -> Option<&'static str> {
		match self {
			Self::Jpeg => Some("jpg"),
			Self::Png => Some("png"),
			Self::Webp => Some("webp"),
			Self::Avif => Some("avif"),
			Self::Rgb8 | Self::Rgba8 => None,
		}
	}

	#[must_use]
	/// # Media Type.
	///
	/// Returns `None` for raw pixel formats.
	pub const fn mime(self) -> Option<&'static str> {
		match self {
			Self::Jpeg => Some("image/jpeg"),
			Self::Png => Some("image/png"),
			Self::Webp => Some("image/webp"),
			Self::Avif => Some("image/avif"),
			Self::Rgb8 | Self::Rgba8 => None,
		}
	}

	/// # Hashing Seed.
	///
	/// Return the canonical content-hashing seed for output encoded in this
	/// format. The seed changes whenever the encoder's output would, so
	/// hashes double as cache keys.
	///
	/// ## Errors
	///
	/// Raw pixel formats have no encoder, and disabled formats have no seed.
	pub const fn seed(self) -> Result<u64, LumenError> {
		match self {
			#[cfg(feature = "avif")] Self::Avif => Ok(ImageAvif::SEED),
			#[cfg(feature = "jpeg")] Self::Jpeg => Ok(ImageJpeg::SEED),
			#[cfg(feature = "png")]  Self::Png => Ok(ImagePng::SEED),
			#[cfg(feature = "webp")] Self::Webp => Ok(ImageWebp::SEED),
			Self::Rgb8 | Self::Rgba8 => Err(LumenError::Process { process: "seed", format: self }),
			#[allow(unreachable_patterns)]
			_ => Err(LumenError::Disabled(self)),
		}
	}
}

/// ## Codecs.
impl ImageFormat {
	/// # Decode.
	///
	/// Decode a raw file of this format into an owned pixel [`Image`].
	///
	/// ## Errors
	///
	/// This bubbles up any decoder errors, including attempts to "decode" a
	/// raw pixel format or one whose support was not compiled in.
	pub fn decode(self, raw: &[u8]) -> Result<Image, LumenError> {
		tracing::debug!(format = self.as_str(), size = raw.len(), "decode");
		match self {
			#[cfg(feature = "avif")] Self::Avif => ImageAvif::decode(raw),
			#[cfg(feature = "jpeg")] Self::Jpeg => ImageJpeg::decode(raw),
			#[cfg(feature = "png")]  Self::Png => ImagePng::decode(raw),
			#[cfg(feature = "webp")] Self::Webp => ImageWebp::decode(raw),
			Self::Rgb8 | Self::Rgba8 => Err(LumenError::Process { process: "decode", format: self }),
			#[allow(unreachable_patterns)]
			_ => Err(LumenError::Disabled(self)),
		}
	}

	/// # Encode.
	///
	/// Encode an owned pixel [`Image`] into this format using the tunables
	/// from the [`Context`]. The source is only read.
	///
	/// ## Errors
	///
	/// This bubbles up any encoder errors, including attempts to encode a
	/// non-pixel source or into a raw pixel format.
	pub fn encode(self, img: &Image, ctx: &Context) -> Result<Image, LumenError> {
		tracing::debug!(
			format = self.as_str(),
			width = img.width(),
			height = img.height(),
			"encode",
		);

		// Only pixels can be encoded.
		if ! img.format().is_pixels() {
			return Err(LumenError::Process { process: "encode", format: img.format() });
		}

		match self {
			#[cfg(feature = "avif")] Self::Avif => ImageAvif::encode(img, ctx),
			#[cfg(feature = "jpeg")] Self::Jpeg => ImageJpeg::encode(img, ctx),
			#[cfg(feature = "png")]  Self::Png => ImagePng::encode(img, ctx),
			#[cfg(feature = "webp")] Self::Webp => ImageWebp::encode(img, ctx),
			Self::Rgb8 | Self::Rgba8 => Err(LumenError::Process { process: "encode into", format: self }),
			#[allow(unreachable_patterns)]
			_ => Err(LumenError::Disabled(self)),
		}
	}
}
