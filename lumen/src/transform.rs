/*!
# `Lumen` - Transform Exports
*/

use crate::{
	Context,
	Image,
	null_input,
	run,
};
use lumen_core::RESIZE_SEED;
use std::os::raw::c_int;



#[unsafe(no_mangle)]
/// # Resize.
///
/// Resample the pixel image at `src`, writing the result to `out` on
/// success.
///
/// Without `maintain_aspect`, the output is exactly `width` by `height`
/// and both must be non-zero. With it, a zero side is derived from the
/// other; if both are given, the image is scaled to fit inside that box.
pub unsafe extern "C" fn resize(
	ctx: *mut Context,
	src: *const Image,
	width: u32,
	height: u32,
	maintain_aspect: bool,
	out: *mut Image,
) -> c_int {
	let Some(img) = (unsafe { src.as_ref() }) else {
		return unsafe { null_input(ctx) };
	};
	unsafe {
		run(ctx, out, "resize", |ctx| ctx.resize(img, width, height, maintain_aspect))
	}
}

#[must_use]
#[unsafe(no_mangle)]
/// # Resize Seed.
///
/// A constant that changes whenever resized output would.
pub extern "C" fn resize_seed() -> u64 { RESIZE_SEED }

#[unsafe(no_mangle)]
/// # Crop.
///
/// Cut a centered `width` by `height` window out of the pixel image at
/// `src`, writing the result to `out` on success.
pub unsafe extern "C" fn crop(
	ctx: *mut Context,
	src: *const Image,
	width: u32,
	height: u32,
	out: *mut Image,
) -> c_int {
	let Some(img) = (unsafe { src.as_ref() }) else {
		return unsafe { null_input(ctx) };
	};
	unsafe { run(ctx, out, "crop", |ctx| ctx.crop(img, width, height)) }
}
