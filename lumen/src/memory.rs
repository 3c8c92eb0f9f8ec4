/*!
# `Lumen` - Memory Exports

Hosts without a usable allocator of their own (WebAssembly, mainly) need a
way to hand input bytes to the library. These reserve and release scratch
buffers aligned to `usize`.
*/

use std::alloc::Layout;



#[must_use]
#[unsafe(no_mangle)]
/// # Allocate.
///
/// Reserve `size` uninitialized bytes. Null is returned if `size` is zero or
/// too large, or if the allocation fails. The buffer must eventually be
/// passed to [`dealloc`] with the same `size`.
pub extern "C" fn alloc(size: usize) -> *mut u8 {
	match layout(size) {
		// Safety: the layout has a non-zero size.
		Some(layout) => unsafe { std::alloc::alloc(layout) },
		None => std::ptr::null_mut(),
	}
}

#[unsafe(no_mangle)]
/// # Deallocate.
///
/// Release a buffer obtained from [`alloc`]. `size` must match the original
/// request. Null pointers and zero sizes are ignored.
pub unsafe extern "C" fn dealloc(ptr: *mut u8, size: usize) {
	if ptr.is_null() { return; }
	if let Some(layout) = layout(size) {
		// Safety: the caller promises this came from alloc(size).
		unsafe { std::alloc::dealloc(ptr, layout); }
	}
}

/// # Layout.
fn layout(size: usize) -> Option<Layout> {
	if size == 0 { None }
	else { Layout::from_size_align(size, align_of::<usize>()).ok() }
}
