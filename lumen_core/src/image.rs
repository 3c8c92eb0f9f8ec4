/*!
# `Lumen` - Image
*/

use crate::{
	ImageFormat,
	LumenError,
};
use std::{
	mem::ManuallyDrop,
	ops::Deref,
	ptr,
};



#[repr(C)]
#[derive(Debug)]
/// # Image.
///
/// An owned, contiguous buffer plus the metadata needed to make sense of
/// it. The buffer holds either raw pixels ([`ImageFormat::Rgb8`] or
/// [`ImageFormat::Rgba8`], tightly packed, no row padding) or the bytes of an
/// encoded file.
///
/// The layout is part of the C interface:
///
/// ```c
/// typedef struct Image {
///   uint8_t *ptr;
///   uintptr_t len;
///   uintptr_t cap;
///   uint8_t format;
///   uint32_t width;
///   uint32_t height;
/// } Image;
/// ```
///
/// `len` is the logical size, `cap` the size of the allocation behind `ptr`.
/// The allocation always comes from this library and is given back on drop
/// (or through `image_destroy` on the C side). A *released* image has a null
/// `ptr` and zero `len`/`cap`; releasing it again does nothing.
pub struct Image {
	/// # Buffer.
	ptr: *mut u8,

	/// # Logical Length.
	len: usize,

	/// # Allocated Capacity.
	cap: usize,

	/// # Format.
	format: ImageFormat,

	/// # Width.
	width: u32,

	/// # Height.
	height: u32,
}

// The buffer is exclusively owned, so moving it to another thread is fine.
unsafe impl Send for Image {}

impl AsRef<[u8]> for Image {
	#[inline]
	fn as_ref(&self) -> &[u8] { self }
}

impl Clone for Image {
	fn clone(&self) -> Self {
		Self::new(self.to_vec(), self.format, self.width, self.height)
	}
}

impl Deref for Image {
	type Target = [u8];

	#[inline]
	fn deref(&self) -> &Self::Target {
		if self.ptr.is_null() { &[] }
		else {
			// Safety: the pointer and length came from a live Vec.
			unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
		}
	}
}

impl Drop for Image {
	#[inline]
	fn drop(&mut self) { self.release(); }
}

/// ## Instantiation.
impl Image {
	#[must_use]
	/// # New.
	///
	/// Take ownership of a buffer. No validation is performed; see
	/// [`Image::from_pixels`] for the checked pixel version.
	pub fn new(buf: Vec<u8>, format: ImageFormat, width: u32, height: u32) -> Self {
		let mut buf = ManuallyDrop::new(buf);
		Self {
			ptr: buf.as_mut_ptr(),
			len: buf.len(),
			cap: buf.capacity(),
			format,
			width,
			height,
		}
	}

	/// # From Pixels.
	///
	/// Take ownership of a raw pixel buffer, verifying that its length
	/// matches the dimensions.
	///
	/// ## Errors
	///
	/// Returns an error if the format is not a pixel format, the dimensions
	/// are zero or overflow, or the buffer is the wrong size.
	pub fn from_pixels(buf: Vec<u8>, format: ImageFormat, width: u32, height: u32)
	-> Result<Self, LumenError> {
		let size = pixel_buffer_size(format, width, height)?;
		if buf.len() == size { Ok(Self::new(buf, format, width, height)) }
		else { Err(LumenError::PixelBuffer) }
	}

	/// # Blank.
	///
	/// Allocate a zero-filled pixel buffer of the given dimensions, ready to
	/// be written to.
	///
	/// ## Errors
	///
	/// Returns an error if the format is not a pixel format or the
	/// dimensions are zero or too big to allocate.
	pub fn blank(format: ImageFormat, width: u32, height: u32) -> Result<Self, LumenError> {
		let size = pixel_buffer_size(format, width, height)?;
		let mut buf = Vec::new();
		buf.try_reserve_exact(size).map_err(|_| LumenError::Overflow)?;
		buf.resize(size, 0);
		Ok(Self::new(buf, format, width, height))
	}
}

/// ## Getters.
impl Image {
	#[inline]
	#[must_use]
	/// # Buffer Pointer.
	///
	/// Null once released.
	pub const fn as_ptr(&self) -> *const u8 { self.ptr }

	#[inline]
	#[must_use]
	/// # Capacity.
	pub const fn capacity(&self) -> usize { self.cap }

	#[inline]
	#[must_use]
	/// # Format.
	pub const fn format(&self) -> ImageFormat { self.format }

	#[inline]
	#[must_use]
	/// # Height.
	pub const fn height(&self) -> u32 { self.height }

	#[inline]
	#[must_use]
	/// # Is Released?
	pub const fn is_released(&self) -> bool { self.ptr.is_null() }

	#[inline]
	#[must_use]
	/// # Width.
	pub const fn width(&self) -> u32 { self.width }

	/// # Pixel Size.
	///
	/// Return the bytes-per-pixel after confirming this is a well-formed
	/// pixel image: non-zero dimensions and a buffer of exactly
	/// `width * height * bytes-per-pixel`.
	///
	/// ## Errors
	///
	/// Encoded images and inconsistent buffers return an error.
	pub fn pixel_size(&self) -> Result<usize, LumenError> {
		let size = pixel_buffer_size(self.format, self.width, self.height)?;
		if self.len == size {
			self.format.pixel_size().ok_or(LumenError::PixelBuffer)
		}
		else { Err(LumenError::PixelBuffer) }
	}

	#[inline]
	/// # Row Size.
	///
	/// The number of bytes in one row of pixels.
	///
	/// ## Errors
	///
	/// Same as [`Image::pixel_size`].
	pub fn stride(&self) -> Result<usize, LumenError> {
		let bpp = self.pixel_size()?;
		usize::try_from(self.width).ok()
			.and_then(|w| w.checked_mul(bpp))
			.ok_or(LumenError::Overflow)
	}
}

/// ## Ownership.
impl Image {
	#[must_use]
	/// # Into Vec.
	///
	/// Hand the buffer back as a regular vector.
	pub fn into_vec(mut self) -> Vec<u8> { self.take_vec() }

	/// # Release.
	///
	/// Free the buffer and reset the descriptor to its released state. The
	/// format tag is left as-is so the descriptor stays valid.
	pub fn release(&mut self) { drop(self.take_vec()); }

	/// # Take Vec.
	fn take_vec(&mut self) -> Vec<u8> {
		let ptr = std::mem::replace(&mut self.ptr, ptr::null_mut());
		let len = std::mem::take(&mut self.len);
		let cap = std::mem::take(&mut self.cap);
		self.width = 0;
		self.height = 0;

		if ptr.is_null() { Vec::new() }
		else {
			// Safety: these are the original parts of a Vec we leaked.
			unsafe { Vec::from_raw_parts(ptr, len, cap) }
		}
	}
}



/// # Pixel Buffer Size.
///
/// Return `width * height * bytes-per-pixel`, or an error if that is zero,
/// overflows, or the format isn't pixels.
pub(crate) fn pixel_buffer_size(format: ImageFormat, width: u32, height: u32)
-> Result<usize, LumenError> {
	let bpp = format.pixel_size()
		.ok_or(LumenError::Process { process: "allocate pixels for", format })?;
	if width == 0 || height == 0 { return Err(LumenError::Dimensions); }

	usize::try_from(width).ok()
		.zip(usize::try_from(height).ok())
		.and_then(|(w, h)| w.checked_mul(h))
		.and_then(|x| x.checked_mul(bpp))
		.ok_or(LumenError::Overflow)
}
