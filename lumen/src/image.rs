/*!
# `Lumen` - Image Exports
*/

use crate::{
	Context,
	Image,
	ImageFormat,
	run,
};
use std::os::raw::c_int;



#[unsafe(no_mangle)]
/// # New Image.
///
/// Allocate a zero-filled `Rgb8` (`1`) or `Rgba8` (`2`) image for the caller
/// to fill in, writing it to `out` on success.
pub unsafe extern "C" fn image_new(
	ctx: *mut Context,
	format: u8,
	width: u32,
	height: u32,
	out: *mut Image,
) -> c_int {
	unsafe {
		run(ctx, out, "image_new", |ctx| ctx.record(
			ImageFormat::try_from(format)
				.and_then(|format| Image::blank(format, width, height))
		))
	}
}

#[unsafe(no_mangle)]
/// # Destroy Image.
///
/// Free the image's buffer and reset the descriptor in place. The
/// descriptor itself is not freed (it belongs to the caller), and
/// destroying it again is harmless. Null is ignored.
pub unsafe extern "C" fn image_destroy(img: *mut Image) {
	if let Some(img) = unsafe { img.as_mut() } { img.release(); }
}
