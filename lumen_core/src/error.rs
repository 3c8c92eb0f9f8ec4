/*!
# `Lumen` - Error
*/

use crate::{
	ErrorMessage,
	ImageFormat,
};
use std::{
	error::Error,
	fmt,
};



#[derive(Debug, Copy, Clone, Eq, PartialEq)]
/// # Errors.
///
/// Every variant is `Copy`; codec diagnostics travel as an inline
/// [`ErrorMessage`] so nothing here ever points back into a codec handle.
pub enum LumenError {
	/// # AVIF Codec Failure.
	Avif(ErrorMessage),

	/// # Crop Out of Bounds.
	Crop,

	/// # Codec Handle Already Destroyed.
	Destroyed,

	/// # Invalid Dimensions.
	Dimensions,

	/// # Format Support Not Compiled In.
	Disabled(ImageFormat),

	/// # Unknown Format Tag.
	Format(u8),

	/// # JPEG Codec Failure.
	Jpeg(ErrorMessage),

	/// # Null Pointer.
	NullPointer,

	/// # Image Dimensions Are Too Big.
	Overflow,

	/// # Unexpected Panic.
	Panic,

	/// # PNG Codec Failure.
	Png(ErrorMessage),

	/// # Unsupported Operation.
	Process {
		/// # What Was Attempted.
		process: &'static str,

		/// # The Offending Format.
		format: ImageFormat,
	},

	/// # Pixel Buffer Size Mismatch.
	PixelBuffer,

	/// # Resampling Failure.
	Resize(ErrorMessage),

	/// # Unrecognized Image Data.
	Unknown,

	/// # WebP Codec Failure.
	Webp(&'static str),
}

impl Error for LumenError {}

impl fmt::Display for LumenError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Avif(e) => write!(f, "Failed to process AVIF image: {e}"),
			Self::Disabled(k) => write!(f, "Support for {k} was not enabled."),
			Self::Format(n) => write!(f, "Unknown image format tag: {n}."),
			Self::Jpeg(e) => write!(f, "Failed to process JPEG image: {e}"),
			Self::Png(e) => write!(f, "Failed to process PNG image: {e}"),
			Self::Process { process, format } => write!(f, "Cannot {process} {format}."),
			Self::Resize(e) => write!(f, "Failed to resize image: {e}"),
			Self::Webp(e) => write!(f, "Failed to process WebP image: {e}"),
			_ => f.write_str(self.as_str()),
		}
	}
}

impl LumenError {
	#[must_use]
	/// # As Str.
	///
	/// Return a static English description. Variants carrying a codec
	/// diagnostic only describe the category here; use `Display` for the
	/// full text.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Avif(_) => "Failed to process AVIF image.",
			Self::Crop => "The crop is out of bounds.",
			Self::Destroyed => "The codec handle has already been destroyed.",
			Self::Dimensions => "The requested dimensions are invalid.",
			Self::Disabled(_) => "Support for this format was not enabled.",
			Self::Format(_) => "Unknown image format tag.",
			Self::Jpeg(_) => "Failed to process JPEG image.",
			Self::NullPointer => "Received a null pointer.",
			Self::Overflow => "The image dimensions are out of range.",
			Self::Panic => "An unexpected internal error occurred.",
			Self::Png(_) => "Failed to process PNG image.",
			Self::Process { .. } => "Unsupported operation for this format.",
			Self::PixelBuffer => "The pixel buffer does not match the image dimensions.",
			Self::Resize(_) => "Failed to resize image.",
			Self::Unknown => "The image format could not be determined.",
			Self::Webp(_) => "Failed to process WebP image.",
		}
	}

	#[must_use]
	/// # Message.
	///
	/// Render the full error text into a bounded [`ErrorMessage`].
	pub fn message(&self) -> ErrorMessage { ErrorMessage::from_display(self) }
}
