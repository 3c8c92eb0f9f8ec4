/*!
# `Lumen` - Codec Exports
*/

use crate::{
	byte_slice,
	Context,
	Image,
	ImageFormat,
	null_input,
	run,
};
use std::os::raw::c_int;



/// # Helper: Per-Format Exports.
///
/// Every format gets the same decode/encode/seed trio.
macro_rules! codec {
	($format:ident, $label:literal, $decode:ident, $encode:ident, $seed:ident) => (
		#[unsafe(no_mangle)]
		#[doc = concat!("# Decode ", $label, ".")]
		///
		/// Decode the `size` bytes at `ptr` into an `Rgb8` or `Rgba8` image,
		/// written to `out` on success.
		pub unsafe extern "C" fn $decode(
			ctx: *mut Context,
			ptr: *const u8,
			size: usize,
			out: *mut Image,
		) -> c_int {
			unsafe { decode(ImageFormat::$format, ctx, ptr, size, out) }
		}

		#[unsafe(no_mangle)]
		#[doc = concat!("# Encode ", $label, ".")]
		///
		/// Encode the pixel image at `src` using the context's options,
		/// writing the file to `out` on success. The source is not modified.
		pub unsafe extern "C" fn $encode(
			ctx: *mut Context,
			src: *const Image,
			out: *mut Image,
		) -> c_int {
			unsafe { encode(ImageFormat::$format, ctx, src, out) }
		}

		#[must_use]
		#[unsafe(no_mangle)]
		#[doc = concat!("# ", $label, " Seed.")]
		///
		/// A constant that changes whenever the encoder's output would, for
		/// use in cache keys. This is zero if support was not compiled in.
		pub extern "C" fn $seed() -> u64 {
			ImageFormat::$format.seed().unwrap_or_default()
		}
	);
}

codec!(Avif, "AVIF", avif_decode, avif_encode, avif_seed);
codec!(Jpeg, "JPEG", jpeg_decode, jpeg_encode, jpeg_seed);
codec!(Png, "PNG", png_decode, png_encode, png_seed);
codec!(Webp, "WebP", webp_decode, webp_encode, webp_seed);



#[unsafe(no_mangle)]
/// # Set AVIF Quality.
///
/// Values above `100` are treated as `100` at encode time.
pub unsafe extern "C" fn avif_set_encode_quality(ctx: *mut Context, quality: u8) {
	if let Some(ctx) = unsafe { ctx.as_mut() } { ctx.set_avif_quality(quality); }
}

#[unsafe(no_mangle)]
/// # Set AVIF Speed.
///
/// `0` is slowest, `10` fastest; larger values are treated as `10`.
pub unsafe extern "C" fn avif_set_encode_speed(ctx: *mut Context, speed: u8) {
	if let Some(ctx) = unsafe { ctx.as_mut() } { ctx.set_avif_speed(speed); }
}

#[unsafe(no_mangle)]
/// # Set JPEG Quality.
pub unsafe extern "C" fn jpeg_set_encode_quality(ctx: *mut Context, quality: u8) {
	if let Some(ctx) = unsafe { ctx.as_mut() } { ctx.set_jpeg_quality(quality); }
}

#[unsafe(no_mangle)]
/// # Set WebP Quality.
pub unsafe extern "C" fn webp_set_encode_quality(ctx: *mut Context, quality: u8) {
	if let Some(ctx) = unsafe { ctx.as_mut() } { ctx.set_webp_quality(quality); }
}



/// # Decode.
unsafe fn decode(
	format: ImageFormat,
	ctx: *mut Context,
	ptr: *const u8,
	size: usize,
	out: *mut Image,
) -> c_int {
	let Some(raw) = (unsafe { byte_slice(ptr, size) }) else {
		return unsafe { null_input(ctx) };
	};
	unsafe { run(ctx, out, "decode", |ctx| ctx.decode_as(format, raw)) }
}

/// # Encode.
unsafe fn encode(
	format: ImageFormat,
	ctx: *mut Context,
	src: *const Image,
	out: *mut Image,
) -> c_int {
	let Some(img) = (unsafe { src.as_ref() }) else {
		return unsafe { null_input(ctx) };
	};
	unsafe { run(ctx, out, "encode", |ctx| ctx.encode(img, format)) }
}
