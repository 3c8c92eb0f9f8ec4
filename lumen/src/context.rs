/*!
# `Lumen` - Context Exports
*/

use crate::Context;
use std::{
	ffi::CString,
	os::raw::c_char,
	ptr,
};



#[must_use]
#[unsafe(no_mangle)]
/// # New Context.
///
/// Allocate a context with the default options. Free it with
/// [`context_destroy`].
pub extern "C" fn context_new() -> *mut Context {
	Box::into_raw(Box::default())
}

#[unsafe(no_mangle)]
/// # Destroy Context.
///
/// Null is ignored. Destroying the same context twice is not.
pub unsafe extern "C" fn context_destroy(ctx: *mut Context) {
	if ! ctx.is_null() {
		// Safety: the pointer came from `context_new`.
		drop(unsafe { Box::from_raw(ctx) });
	}
}

#[unsafe(no_mangle)]
/// # Set Hash Seed.
pub unsafe extern "C" fn context_set_seed(ctx: *mut Context, seed: u64) {
	if let Some(ctx) = unsafe { ctx.as_mut() } { ctx.set_seed(seed); }
}

#[unsafe(no_mangle)]
/// # Hash Seed.
///
/// Null contexts report zero.
pub unsafe extern "C" fn context_seed(ctx: *const Context) -> u64 {
	unsafe { ctx.as_ref() }.map_or(0, Context::seed)
}

#[unsafe(no_mangle)]
/// # Last Error Message.
///
/// Return a fresh, NUL-terminated copy of the most recent failure message,
/// or null if the last operation succeeded. The copy belongs to the caller
/// and must be freed with [`error_message_destroy`].
pub unsafe extern "C" fn last_error_message(ctx: *const Context) -> *mut c_char {
	unsafe { ctx.as_ref() }
		.and_then(Context::last_error)
		.and_then(|msg| CString::new(msg).ok())
		.map_or(ptr::null_mut(), CString::into_raw)
}

#[unsafe(no_mangle)]
/// # Destroy Error Message.
///
/// Free a string returned by [`last_error_message`]. Null is ignored.
pub unsafe extern "C" fn error_message_destroy(msg: *mut c_char) {
	if ! msg.is_null() {
		// Safety: the pointer came from `last_error_message`.
		drop(unsafe { CString::from_raw(msg) });
	}
}
