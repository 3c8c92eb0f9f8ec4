/*!
# `Lumen` - Library

This crate holds everything behind the `lumen` C interface: the owned
[`Image`] buffer, the caller-owned [`Context`], the per-format codecs, the
resize/crop transforms, and content hashing.

The interesting part is the JPEG support. `libjpeg` reports fatal errors by
calling an `error_exit` hook that must never return. Here that hook unwinds
back into a tiny per-call shim, which destroys the decoder/encoder handle and
hands back an ordinary [`LumenError`] instead of taking the whole process
down.
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

#![allow(clippy::module_name_repetitions)]



mod color;
mod context;
mod crop;
mod error;
mod format;
mod hash;
mod image;
mod message;
mod resize;
mod traits;

#[cfg(feature = "avif")] mod avif;
#[cfg(feature = "jpeg")] pub mod jpeg;
#[cfg(feature = "png")]  mod png;
#[cfg(feature = "webp")] mod webp;

pub use color::ColorKind;
pub use context::{
	AvifOptions,
	Context,
	JpegOptions,
	WebpOptions,
};
pub use crop::crop;
pub use error::LumenError;
pub use format::ImageFormat;
pub use hash::{
	hash,
	hash_wide,
	HASH_WIDE_LEN,
};
pub use image::Image;
pub use message::{
	ErrorMessage,
	MESSAGE_MAX,
};
pub use resize::{
	resize,
	target_dimensions,
	SEED as RESIZE_SEED,
};

#[cfg(feature = "avif")] pub(crate) use avif::ImageAvif;
#[cfg(feature = "jpeg")] pub(crate) use jpeg::ImageJpeg;
#[cfg(feature = "png")]  pub(crate) use png::ImagePng;
#[cfg(feature = "webp")] pub(crate) use webp::ImageWebp;

