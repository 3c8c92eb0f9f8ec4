/*!
# `Lumen` - Hash Exports

These are not cryptographic; they are meant for cache keys.
*/

use crate::{
	byte_slice,
	LUMEN_ERR_NULL,
	LUMEN_OK,
};
use lumen_core::HASH_WIDE_LEN;
use std::os::raw::c_int;



#[must_use]
#[unsafe(no_mangle)]
/// # Hash.
///
/// Return the 64-bit hash of the `size` bytes at `ptr`. A null pointer is
/// hashed as if it were empty.
pub unsafe extern "C" fn hash(ptr: *const u8, size: usize, seed: u64) -> u64 {
	lumen_core::hash(unsafe { input(ptr, size) }, seed)
}

#[unsafe(no_mangle)]
/// # Wide Hash.
///
/// Write the 128-bit hash of the `size` bytes at `ptr` to the 16 bytes at
/// `out`, most significant byte first. As with [`hash`], a null `ptr` is
/// hashed as if it were empty; only a null `out` is refused.
pub unsafe extern "C" fn hash_into(
	ptr: *const u8,
	size: usize,
	seed: u64,
	out: *mut u8,
) -> c_int {
	if out.is_null() { return LUMEN_ERR_NULL; }
	let src = unsafe { input(ptr, size) };

	let wide = lumen_core::hash_wide(src, seed);
	// Safety: the caller promises room for the full hash.
	unsafe { std::ptr::copy_nonoverlapping(wide.as_ptr(), out, HASH_WIDE_LEN); }
	LUMEN_OK
}

/// # Input.
///
/// Borrow the bytes to hash, treating a null pointer as empty.
unsafe fn input<'a>(ptr: *const u8, size: usize) -> &'a [u8] {
	unsafe { byte_slice(ptr, size) }.unwrap_or_default()
}
