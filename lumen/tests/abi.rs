/*!
# `Lumen` - C Interface Tests
*/

use lumen::*;
use std::{
	ffi::CStr,
	mem::MaybeUninit,
	ptr,
};



/// # Snapshot.
///
/// Every field of the descriptor, for before/after comparisons.
fn snapshot(img: &Image) -> (*const u8, usize, usize, ImageFormat, u32, u32) {
	(img.as_ptr(), img.len(), img.capacity(), img.format(), img.width(), img.height())
}

/// # New Image via the C API.
fn new_image(ctx: *mut Context, format: u8, width: u32, height: u32) -> Image {
	let mut slot = MaybeUninit::<Image>::uninit();
	assert_eq!(unsafe { image_new(ctx, format, width, height, slot.as_mut_ptr()) }, LUMEN_OK);
	unsafe { slot.assume_init() }
}

/// # Fill an Image.
fn fill(img: &Image, value: u8) {
	unsafe { ptr::write_bytes(img.as_ptr().cast_mut(), value, img.len()); }
}

/// # Last Error.
fn last_error(ctx: *mut Context) -> Option<String> {
	let ptr = unsafe { last_error_message(ctx) };
	if ptr.is_null() { None }
	else {
		let out = unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned();
		unsafe { error_message_destroy(ptr); }
		Some(out)
	}
}

/// # Call Into a Fresh Slot.
fn call<F>(cb: F) -> Result<Image, i32>
where F: FnOnce(*mut Image) -> i32 {
	let mut slot = MaybeUninit::<Image>::uninit();
	match cb(slot.as_mut_ptr()) {
		LUMEN_OK => Ok(unsafe { slot.assume_init() }),
		e => Err(e),
	}
}



#[test]
fn t_context() {
	let ctx = context_new();
	assert!(! ctx.is_null());
	assert_eq!(unsafe { context_seed(ctx) }, 0);
	unsafe { context_set_seed(ctx, 42); }
	assert_eq!(unsafe { context_seed(ctx) }, 42);
	assert_eq!(last_error(ctx), None);

	// Setters don't complain about anything.
	unsafe {
		jpeg_set_encode_quality(ctx, 255);
		webp_set_encode_quality(ctx, 0);
		avif_set_encode_quality(ctx, 101);
		avif_set_encode_speed(ctx, 99);
		jpeg_set_encode_quality(ptr::null_mut(), 50);
	}

	unsafe {
		context_destroy(ctx);
		context_destroy(ptr::null_mut());
	}
	assert_eq!(unsafe { context_seed(ptr::null()) }, 0);
}

#[test]
fn t_out_untouched() {
	let ctx = context_new();
	let mut sentinel = new_image(ctx, 1, 2, 2);
	let before = snapshot(&sentinel);
	assert_eq!(before.3, ImageFormat::Rgb8);
	assert_eq!(before.1, 2 * 2 * 3);

	// Truncated JPEG.
	let truncated = [0xFF_u8, 0xD8];
	assert_eq!(
		unsafe { jpeg_decode(ctx, truncated.as_ptr(), truncated.len(), &raw mut sentinel) },
		LUMEN_ERR,
	);
	assert_eq!(snapshot(&sentinel), before);
	assert!(last_error(ctx).is_some_and(|e| ! e.is_empty()));

	// Garbage for every other format.
	let junk = b"this is not an image at all";
	unsafe {
		assert_eq!(png_decode(ctx, junk.as_ptr(), junk.len(), &raw mut sentinel), LUMEN_ERR);
		assert_eq!(webp_decode(ctx, junk.as_ptr(), junk.len(), &raw mut sentinel), LUMEN_ERR);
		assert_eq!(avif_decode(ctx, junk.as_ptr(), junk.len(), &raw mut sentinel), LUMEN_ERR);
	}
	assert_eq!(snapshot(&sentinel), before);

	// Bad transforms.
	let src = new_image(ctx, 2, 4, 4);
	unsafe {
		assert_eq!(resize(ctx, &raw const src, 0, 0, true, &raw mut sentinel), LUMEN_ERR);
		assert_eq!(resize(ctx, &raw const src, 0, 3, false, &raw mut sentinel), LUMEN_ERR);
		assert_eq!(crop(ctx, &raw const src, 5, 1, &raw mut sentinel), LUMEN_ERR);
		assert_eq!(image_new(ctx, 9, 1, 1, &raw mut sentinel), LUMEN_ERR);
		assert_eq!(image_new(ctx, 3, 1, 1, &raw mut sentinel), LUMEN_ERR);
	}
	assert_eq!(snapshot(&sentinel), before);

	// Encoding an encoded image.
	let enc = call(|out| unsafe { png_encode(ctx, &raw const src, out) }).expect("PNG encode failed.");
	unsafe {
		assert_eq!(jpeg_encode(ctx, &raw const enc, &raw mut sentinel), LUMEN_ERR);
	}
	assert_eq!(snapshot(&sentinel), before);

	// Null pointers.
	unsafe {
		assert_eq!(jpeg_decode(ctx, ptr::null(), 8, &raw mut sentinel), LUMEN_ERR_NULL);
		assert_eq!(png_encode(ctx, ptr::null(), &raw mut sentinel), LUMEN_ERR_NULL);
		assert_eq!(crop(ctx, ptr::null(), 1, 1, &raw mut sentinel), LUMEN_ERR_NULL);
		assert_eq!(
			jpeg_decode(ptr::null_mut(), truncated.as_ptr(), truncated.len(), &raw mut sentinel),
			LUMEN_ERR_NULL,
		);
		assert_eq!(png_encode(ctx, &raw const src, ptr::null_mut()), LUMEN_ERR_NULL);
	}
	assert_eq!(snapshot(&sentinel), before);

	// Destruction resets the descriptor, and can be repeated.
	unsafe { image_destroy(&raw mut sentinel); }
	assert!(sentinel.is_released());
	assert_eq!(sentinel.len(), 0);
	assert_eq!(sentinel.capacity(), 0);
	unsafe {
		image_destroy(&raw mut sentinel);
		image_destroy(ptr::null_mut());
	}

	unsafe { context_destroy(ctx); }
}

#[test]
fn t_last_error() {
	let ctx = context_new();
	let truncated = [0xFF_u8, 0xD8];
	assert!(call(|out| unsafe { jpeg_decode(ctx, truncated.as_ptr(), truncated.len(), out) }).is_err());
	assert!(last_error(ctx).is_some());

	// Asking twice gives two copies.
	assert!(last_error(ctx).is_some());

	// Success clears it.
	let img = call(|out| unsafe { image_new(ctx, 1, 1, 1, out) }).expect("Image failed.");
	assert_eq!(img.len(), 3);
	assert_eq!(last_error(ctx), None);

	unsafe { context_destroy(ctx); }
}

#[test]
fn t_round_trip() {
	let ctx = context_new();
	let src = new_image(ctx, 1, 2, 2);
	fill(&src, 200);

	// PNG is exact.
	let enc = call(|out| unsafe { png_encode(ctx, &raw const src, out) }).expect("Encode failed.");
	assert_eq!(enc.format(), ImageFormat::Png);
	let dec = call(|out| unsafe { png_decode(ctx, enc.as_ptr(), enc.len(), out) })
		.expect("Decode failed.");
	assert_eq!(dec.format(), ImageFormat::Rgb8);
	assert_eq!((dec.width(), dec.height()), (2, 2));
	assert_eq!(&*dec, &*src);

	// The rest are close enough.
	type Pair = (
		unsafe extern "C" fn(*mut Context, *const Image, *mut Image) -> i32,
		unsafe extern "C" fn(*mut Context, *const u8, usize, *mut Image) -> i32,
		u8,
	);
	let lossy: [Pair; 3] = [
		(jpeg_encode, jpeg_decode, 8),
		(webp_encode, webp_decode, 8),
		(avif_encode, avif_decode, 16),
	];
	for (encode, decode, tolerance) in lossy {
		let enc = call(|out| unsafe { encode(ctx, &raw const src, out) })
			.expect("Encode failed.");
		let dec = call(|out| unsafe { decode(ctx, enc.as_ptr(), enc.len(), out) })
			.expect("Decode failed.");
		assert_eq!((dec.width(), dec.height()), (2, 2));
		assert_eq!(dec.format(), ImageFormat::Rgb8);
		assert!(dec.iter().all(|b| b.abs_diff(200) <= tolerance));
	}

	// The source was only read.
	assert!(src.iter().all(|&b| b == 200));
	unsafe { context_destroy(ctx); }
}

#[test]
fn t_resize() {
	let ctx = context_new();
	let src = new_image(ctx, 2, 400, 200);

	for (w, h, aspect, expected) in [
		(100, 100, true, (100, 50)),
		(100, 0, true, (100, 50)),
		(0, 100, true, (200, 100)),
		(1000, 100, true, (200, 100)),
		(10, 10, false, (10, 10)),
	] {
		let out = call(|out| unsafe { resize(ctx, &raw const src, w, h, aspect, out) })
			.expect("Resize failed.");
		assert_eq!((out.width(), out.height()), expected);
		assert_eq!(out.format(), ImageFormat::Rgba8);
		assert_eq!(out.len(), (expected.0 * expected.1 * 4) as usize);
	}

	let out = call(|out| unsafe { crop(ctx, &raw const src, 10, 20, out) })
		.expect("Crop failed.");
	assert_eq!((out.width(), out.height()), (10, 20));

	unsafe { context_destroy(ctx); }
}

#[test]
fn t_alloc() {
	let ctx = context_new();
	let src = new_image(ctx, 2, 3, 2);
	fill(&src, 90);
	let enc = call(|out| unsafe { png_encode(ctx, &raw const src, out) }).expect("Encode failed.");

	// Copy the file into a library-owned buffer and decode from there.
	let size = enc.len();
	let buf = alloc(size);
	assert!(! buf.is_null());
	assert_eq!(buf.align_offset(align_of::<usize>()), 0);
	unsafe { ptr::copy_nonoverlapping(enc.as_ptr(), buf, size); }
	let dec = call(|out| unsafe { png_decode(ctx, buf, size, out) }).expect("Decode failed.");
	unsafe { dealloc(buf, size); }
	assert_eq!((dec.width(), dec.height()), (3, 2));
	assert_eq!(dec.format(), ImageFormat::Rgba8);
	assert!(dec.iter().all(|&b| b == 90));

	// Nothing to reserve, nothing to release.
	assert!(alloc(0).is_null());
	assert!(alloc(usize::MAX).is_null());
	unsafe {
		dealloc(ptr::null_mut(), 0);
		dealloc(ptr::null_mut(), 16);
	}

	unsafe { context_destroy(ctx); }
}

#[test]
fn t_seeds() {
	assert_eq!(jpeg_seed(), 1);
	assert_eq!(png_seed(), 1);
	assert_eq!(webp_seed(), 1);
	assert_eq!(avif_seed(), 1);
	assert_eq!(resize_seed(), 1);
}

#[test]
fn t_hash() {
	let src = b"The quick brown fox jumps over the lazy dog.";
	let a = unsafe { hash(src.as_ptr(), src.len(), 0) };
	assert_eq!(a, unsafe { hash(src.as_ptr(), src.len(), 0) });
	assert_ne!(a, unsafe { hash(src.as_ptr(), src.len(), 1) });
	assert_eq!(a, lumen_core::hash(src, 0));

	// Null hashes like nothing.
	assert_eq!(unsafe { hash(ptr::null(), 5, 3) }, lumen_core::hash(&[], 3));

	let mut wide = [0_u8; 16];
	assert_eq!(unsafe { hash_into(src.as_ptr(), src.len(), 7, wide.as_mut_ptr()) }, LUMEN_OK);
	assert_eq!(wide, lumen_core::hash_wide(src, 7));
	assert_eq!(unsafe { hash_into(src.as_ptr(), src.len(), 7, ptr::null_mut()) }, LUMEN_ERR_NULL);

	// Both agree on null input.
	assert_eq!(unsafe { hash_into(ptr::null(), 5, 3, wide.as_mut_ptr()) }, LUMEN_OK);
	assert_eq!(wide, lumen_core::hash_wide(&[], 3));
}
