/*!
# `Lumen` - C Interface

This crate exposes [`lumen_core`] to C. Everything is plain functions over
two kinds of object:

* an opaque `Context`, created with [`context_new`] and freed with
  [`context_destroy`], which carries encoder options, the hash seed, and the
  text of the most recent failure;
* an `Image` descriptor (see [`lumen_core::Image`] for the layout) whose
  buffer belongs to the library until handed back via [`image_destroy`].

Fallible operations share one shape: they return [`LUMEN_OK`] on success,
[`LUMEN_ERR`] on failure, or [`LUMEN_ERR_NULL`] if a required pointer was
null, and write their result to the trailing `out` pointer _only_ on
success. Whatever `out` held before a failed call is left untouched.

Nothing unwinds across this boundary; panics are caught and reported like
any other failure.

## Pointers

Non-null pointers must be valid for the access described by each function.
`out` slots are written without reading or dropping their previous
contents, so an `Image` already stored there must be destroyed first or it
will leak.
*/

#![deny(unsafe_op_in_unsafe_fn)]

#![warn(clippy::filetype_is_file)]
#![warn(clippy::integer_division)]
#![warn(clippy::needless_borrow)]
#![warn(clippy::nursery)]
#![warn(clippy::pedantic)]
#![warn(clippy::perf)]
#![warn(clippy::suboptimal_flops)]
#![warn(clippy::unneeded_field_pattern)]
#![warn(macro_use_extern_crate)]
#![warn(missing_copy_implementations)]
#![warn(missing_debug_implementations)]
#![warn(missing_docs)]
#![warn(non_ascii_idents)]
#![warn(trivial_casts)]
#![warn(trivial_numeric_casts)]
#![warn(unreachable_pub)]
#![warn(unused_extern_crates)]
#![warn(unused_import_braces)]

#![allow(clippy::missing_safety_doc)] // The crate docs cover pointer rules.
#![allow(clippy::module_name_repetitions)]



mod codec;
mod context;
mod hash;
mod image;
mod memory;
mod transform;

pub use codec::*;
pub use context::*;
pub use hash::*;
pub use image::*;
pub use memory::*;
pub use transform::*;

pub use lumen_core::{
	Context,
	Image,
	ImageFormat,
	LumenError,
};

use std::{
	os::raw::c_int,
	panic::{
		self,
		AssertUnwindSafe,
	},
};



/// # Status: Success.
pub const LUMEN_OK: c_int = 0;

/// # Status: Failure.
///
/// The reason can be fetched with [`last_error_message`].
pub const LUMEN_ERR: c_int = -1;

/// # Status: Null Pointer.
pub const LUMEN_ERR_NULL: c_int = -2;



/// # Run an Operation.
///
/// This validates the context and output pointers, runs `op` with panics
/// caught, and writes the image to `out` on success. The callback records its
/// own outcome on the context; only a caught panic is recorded here.
unsafe fn run<F>(ctx: *mut Context, out: *mut Image, op: &'static str, cb: F) -> c_int
where F: FnOnce(&mut Context) -> Result<Image, LumenError> {
	// Safety: the caller promises the pointer is null or valid.
	let Some(ctx) = (unsafe { ctx.as_mut() }) else { return LUMEN_ERR_NULL; };
	if out.is_null() { return null_pointer(ctx); }

	tracing::debug!(op, "ffi call");
	match panic::catch_unwind(AssertUnwindSafe(|| cb(&mut *ctx))) {
		Ok(Ok(img)) => {
			// Safety: checked for null above; the old contents are the
			// caller's business.
			unsafe { out.write(img); }
			LUMEN_OK
		},
		Ok(Err(_)) => LUMEN_ERR,
		Err(_) => {
			tracing::error!(op, "caught panic");
			let _res = ctx.record::<()>(Err(LumenError::Panic));
			LUMEN_ERR
		},
	}
}

/// # Null Pointer.
///
/// Note a null pointer on the context and return the matching status.
fn null_pointer(ctx: &mut Context) -> c_int {
	let _res = ctx.record::<()>(Err(LumenError::NullPointer));
	LUMEN_ERR_NULL
}

/// # Null Input.
///
/// Same as [`null_pointer`], but for the path where the context itself has
/// not been checked yet.
unsafe fn null_input(ctx: *mut Context) -> c_int {
	// Safety: the caller promises the pointer is null or valid.
	unsafe { ctx.as_mut() }.map_or(LUMEN_ERR_NULL, null_pointer)
}

/// # Byte Slice.
///
/// Borrow `size` bytes from `ptr`. An empty slice is returned for zero
/// sizes, whatever the pointer; otherwise a null pointer yields `None`.
unsafe fn byte_slice<'a>(ptr: *const u8, size: usize) -> Option<&'a [u8]> {
	if size == 0 { Some(&[]) }
	else if ptr.is_null() { None }
	else {
		// Safety: the caller promises `size` readable bytes.
		Some(unsafe { std::slice::from_raw_parts(ptr, size) })
	}
}
