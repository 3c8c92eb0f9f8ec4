/*!
# `Lumen` - Context
*/

use crate::{
	ErrorMessage,
	Image,
	ImageFormat,
	LumenError,
};



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # JPEG Encoding Options.
pub struct JpegOptions {
	/// # Quality (`0..=100`).
	pub quality: u8,
}

impl Default for JpegOptions {
	#[inline]
	fn default() -> Self { Self { quality: 80 } }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # WebP Encoding Options.
pub struct WebpOptions {
	/// # Quality (`0..=100`).
	pub quality: u8,
}

impl Default for WebpOptions {
	#[inline]
	fn default() -> Self { Self { quality: 80 } }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # AVIF Encoding Options.
pub struct AvifOptions {
	/// # Quality (`0..=100`).
	pub quality: u8,

	/// # Speed (`0..=10`).
	///
	/// Zero is painfully slow, ten is fast but crappy.
	pub speed: u8,
}

impl Default for AvifOptions {
	#[inline]
	fn default() -> Self { Self { quality: 60, speed: 5 } }
}



#[derive(Debug, Clone, Default)]
/// # Context.
///
/// A caller-owned bundle of encoder tunables, a content-hashing seed, and the
/// message from the most recent failure.
///
/// Setters store whatever they are given; out-of-range values are clamped by
/// the individual encoders at encode time.
///
/// A context may be reused for any number of sequential operations, but it
/// is not synchronized: never use one from two threads at once. Each failed
/// operation overwrites the last error, and each successful one clears it,
/// so read it before moving on.
pub struct Context {
	/// # JPEG Options.
	jpeg: JpegOptions,

	/// # WebP Options.
	webp: WebpOptions,

	/// # AVIF Options.
	avif: AvifOptions,

	/// # Hashing Seed.
	seed: u64,

	/// # Last Error.
	last_error: Option<ErrorMessage>,
}

/// ## Getters.
impl Context {
	#[inline]
	#[must_use]
	/// # AVIF Options.
	pub const fn avif(&self) -> AvifOptions { self.avif }

	#[inline]
	#[must_use]
	/// # JPEG Options.
	pub const fn jpeg(&self) -> JpegOptions { self.jpeg }

	#[inline]
	#[must_use]
	/// # Last Error.
	pub fn last_error(&self) -> Option<&str> {
		self.last_error.as_ref().map(ErrorMessage::as_str)
	}

	#[inline]
	#[must_use]
	/// # Hashing Seed.
	pub const fn seed(&self) -> u64 { self.seed }

	#[inline]
	#[must_use]
	/// # WebP Options.
	pub const fn webp(&self) -> WebpOptions { self.webp }
}

/// ## Setters.
impl Context {
	#[inline]
	/// # Set AVIF Quality.
	pub const fn set_avif_quality(&mut self, quality: u8) { self.avif.quality = quality; }

	#[inline]
	/// # Set AVIF Speed.
	pub const fn set_avif_speed(&mut self, speed: u8) { self.avif.speed = speed; }

	#[inline]
	/// # Set JPEG Quality.
	pub const fn set_jpeg_quality(&mut self, quality: u8) { self.jpeg.quality = quality; }

	#[inline]
	/// # Set Hashing Seed.
	pub const fn set_seed(&mut self, seed: u64) { self.seed = seed; }

	#[inline]
	/// # Set WebP Quality.
	pub const fn set_webp_quality(&mut self, quality: u8) { self.webp.quality = quality; }

	#[inline]
	/// # Clear Error.
	pub const fn clear_error(&mut self) { self.last_error = None; }

	/// # Record.
	///
	/// Note the outcome of an operation: a failure replaces the last error,
	/// a success clears it. The result is passed through untouched.
	///
	/// ## Errors
	///
	/// Whatever error was passed in is returned as-is.
	pub fn record<T>(&mut self, res: Result<T, LumenError>) -> Result<T, LumenError> {
		match &res {
			Ok(_) => { self.last_error = None; },
			Err(e) => {
				tracing::warn!(error = %e, "operation failed");
				self.last_error = Some(e.message());
			},
		}
		res
	}
}

/// ## Operations.
///
/// These are thin conveniences over the free functions that also remember
/// any failure.
impl Context {
	/// # Decode.
	///
	/// Sniff the format of a raw file and decode it.
	///
	/// ## Errors
	///
	/// Unrecognized formats and decoder failures are returned (and recorded).
	pub fn decode(&mut self, raw: &[u8]) -> Result<Image, LumenError> {
		let res = ImageFormat::try_from(raw).and_then(|f| f.decode(raw));
		self.record(res)
	}

	/// # Decode As.
	///
	/// Decode a raw file, insisting on a specific format.
	///
	/// ## Errors
	///
	/// Decoder failures are returned (and recorded).
	pub fn decode_as(&mut self, format: ImageFormat, raw: &[u8]) -> Result<Image, LumenError> {
		let res = format.decode(raw);
		self.record(res)
	}

	/// # Encode.
	///
	/// ## Errors
	///
	/// Encoder failures are returned (and recorded).
	pub fn encode(&mut self, img: &Image, format: ImageFormat) -> Result<Image, LumenError> {
		let res = format.encode(img, self);
		self.record(res)
	}

	/// # Resize.
	///
	/// See [`resize`](crate::resize) for the dimension rules.
	///
	/// ## Errors
	///
	/// Invalid dimensions and resampling failures are returned (and
	/// recorded).
	pub fn resize(&mut self, img: &Image, width: u32, height: u32, maintain_aspect: bool)
	-> Result<Image, LumenError> {
		let res = crate::resize(img, width, height, maintain_aspect);
		self.record(res)
	}

	/// # Crop.
	///
	/// ## Errors
	///
	/// Out-of-bounds crops are returned (and recorded).
	pub fn crop(&mut self, img: &Image, width: u32, height: u32) -> Result<Image, LumenError> {
		let res = crate::crop(img, width, height);
		self.record(res)
	}

	#[inline]
	#[must_use]
	/// # Hash.
	///
	/// Hash some bytes with this context's seed.
	pub fn hash(&self, src: &[u8]) -> u64 { crate::hash(src, self.seed) }
}
