/*!
# `Lumen`: `AVIF` Handling

This uses [`libavif-sys`](https://crates.io/crates/libavif-sys) bindings to
`libavif`, backed by `aom` for both directions. Everything is pinned to a
single thread.
*/

use crate::{
	ColorKind,
	Context,
	ErrorMessage,
	Image,
	ImageFormat,
	LumenError,
	color::rgba_to_rgb,
	image::pixel_buffer_size,
	traits::{
		Decoder,
		Encoder,
	},
};
use libavif_sys::{
	AVIF_CHROMA_SAMPLE_POSITION_COLOCATED,
	AVIF_CODEC_CHOICE_AOM,
	AVIF_COLOR_PRIMARIES_BT709,
	AVIF_MATRIX_COEFFICIENTS_BT709,
	AVIF_PIXEL_FORMAT_YUV400,
	AVIF_PIXEL_FORMAT_YUV444,
	AVIF_RANGE_FULL,
	AVIF_RESULT_OK,
	AVIF_RGB_FORMAT_RGB,
	AVIF_RGB_FORMAT_RGBA,
	AVIF_TRANSFER_CHARACTERISTICS_SRGB,
	avifDecoder,
	avifDecoderCreate,
	avifDecoderDestroy,
	avifDecoderReadMemory,
	avifEncoder,
	avifEncoderCreate,
	avifEncoderDestroy,
	avifEncoderWrite,
	avifImage,
	avifImageCreate,
	avifImageCreateEmpty,
	avifImageDestroy,
	avifImageRGBToYUV,
	avifImageYUVToRGB,
	avifResult,
	avifResultToString,
	avifRGBImage,
	avifRGBImageAllocatePixels,
	avifRGBImageFreePixels,
	avifRGBImageSetDefaults,
	avifRWData,
	avifRWDataFree,
};
use std::ffi::CStr;



/// # AVIF Image.
pub(crate) struct ImageAvif;

impl Decoder for ImageAvif {
	/// # Decode.
	///
	/// The image is converted to 8-bit RGBA, then reduced to RGB if every
	/// pixel is opaque (which is always the case without an alpha plane).
	fn decode(raw: &[u8]) -> Result<Image, LumenError> {
		let image = LibAvifImage::empty()?;
		let decoder = LibAvifDecoder::new()?;
		maybe_die(unsafe {
			avifDecoderReadMemory(decoder.0, image.0, raw.as_ptr(), raw.len())
		})?;

		// Turn the avifImage into an avifRGB.
		let mut rgb = LibAvifRGBImage::default();
		unsafe {
			avifRGBImageSetDefaults(&mut rgb.0, image.0);
			rgb.0.format = AVIF_RGB_FORMAT_RGBA;
			rgb.0.depth = 8;
			avifRGBImageAllocatePixels(&mut rgb.0);
		}
		if rgb.0.pixels.is_null() { return Err(LumenError::Overflow); }
		maybe_die(unsafe { avifImageYUVToRGB(image.0, &mut rgb.0) })?;
		drop(decoder);
		drop(image);

		let (width, height) = (rgb.0.width, rgb.0.height);
		let size = pixel_buffer_size(ImageFormat::Rgba8, width, height)?;
		if rgb.0.rowBytes.checked_mul(height).map(|n| n as usize) != Some(size) {
			return Err(LumenError::PixelBuffer);
		}

		// Safety: libavif allocated `rowBytes * height` bytes.
		let src: &[u8] = unsafe { std::slice::from_raw_parts(rgb.0.pixels, size) };
		match rgba_to_rgb(src) {
			Some(buf) => Image::from_pixels(buf, ImageFormat::Rgb8, width, height),
			None => Image::from_pixels(src.to_vec(), ImageFormat::Rgba8, width, height),
		}
	}
}

impl Encoder for ImageAvif {
	const SEED: u64 = 1;

	/// # Encode.
	///
	/// Quality (capped at `100`) maps onto `libavif`'s quantizers, and speed
	/// is capped at `10`.
	fn encode(img: &Image, ctx: &Context) -> Result<Image, LumenError> {
		let opts = ctx.avif();
		let image = LibAvifImage::new(img)?;
		let encoder = LibAvifEncoder::new(opts.quality, opts.speed)?;

		// Encode!
		let mut data = LibAvifRwData(avifRWData::default());
		maybe_die(unsafe { avifEncoderWrite(encoder.0, image.0, &mut data.0) })?;

		// Grab the output.
		if data.0.data.is_null() || data.0.size == 0 {
			return Err(LumenError::Process { process: "encode", format: ImageFormat::Avif });
		}
		let out = unsafe { std::slice::from_raw_parts(data.0.data, data.0.size) }.to_vec();

		drop(data);
		drop(encoder);
		drop(image);

		Ok(Image::new(out, ImageFormat::Avif, img.width(), img.height()))
	}
}



/// # AVIF Decoder.
///
/// This wraps the AVIF decoder. It exists solely for garbage cleanup.
struct LibAvifDecoder(*mut avifDecoder);

impl LibAvifDecoder {
	/// # New.
	fn new() -> Result<Self, LumenError> {
		let decoder = unsafe { avifDecoderCreate() };
		if decoder.is_null() {
			return Err(LumenError::Avif(ErrorMessage::from("Decoder setup failed.")));
		}

		unsafe {
			(*decoder).codecChoice = AVIF_CODEC_CHOICE_AOM;
			(*decoder).maxThreads = 1;
		}

		Ok(Self(decoder))
	}
}

impl Drop for LibAvifDecoder {
	#[inline]
	fn drop(&mut self) { unsafe { avifDecoderDestroy(self.0); } }
}



/// # AVIF Encoder.
///
/// This wraps the AVIF encoder. It primarily exists to give us a way to free
/// resources on drop, but also handles setup.
struct LibAvifEncoder(*mut avifEncoder);

impl LibAvifEncoder {
	/// # New Instance.
	fn new(quality: u8, speed: u8) -> Result<Self, LumenError> {
		// Convert quality to quantizers. AVIF is so convoluted...
		let (q, aq) = quality_to_quantizers(quality);

		// Start up the encoder!
		let encoder = unsafe { avifEncoderCreate() };
		if encoder.is_null() {
			return Err(LumenError::Avif(ErrorMessage::from("Encoder setup failed.")));
		}

		unsafe {
			(*encoder).codecChoice = AVIF_CODEC_CHOICE_AOM;
			(*encoder).maxThreads = 1;

			(*encoder).minQuantizer = i32::from(q);
			(*encoder).maxQuantizer = i32::from(q);

			(*encoder).minQuantizerAlpha = i32::from(aq);
			(*encoder).maxQuantizerAlpha = i32::from(aq);

			(*encoder).speed = i32::from(speed.min(10));
		}

		Ok(Self(encoder))
	}
}

impl Drop for LibAvifEncoder {
	#[inline]
	fn drop(&mut self) { unsafe { avifEncoderDestroy(self.0); } }
}



/// # Avif Image.
///
/// The struct includes initialization helpers, but exists primarily for
/// garbage cleanup.
struct LibAvifImage(*mut avifImage);

impl LibAvifImage {
	#[allow(clippy::cast_possible_wrap)] // Dimensions are checked first.
	/// # New (YUV copy of an RGB/RGBA image).
	fn new(src: &Image) -> Result<Self, LumenError> {
		let bpp = src.pixel_size()?;
		let row_bytes = u32::try_from(src.stride()?).map_err(|_| LumenError::Overflow)?;
		let (width, height) = (src.width(), src.height());

		// AVIF dimensions can't exceed this amount. We might as well bail as
		// early as possible.
		if u64::from(width) * u64::from(height) > 16_384 * 16_384 {
			return Err(LumenError::Overflow);
		}

		let color =
			if bpp == 4 { ColorKind::from_rgba(src) }
			else { ColorKind::from_rgb(src) };

		let yuv = unsafe {
			let tmp = avifImageCreate(
				width as _,
				height as _,
				8, // Depth.
				if color.is_greyscale() { AVIF_PIXEL_FORMAT_YUV400 }
				else { AVIF_PIXEL_FORMAT_YUV444 }
			);

			// This shouldn't happen, but could, maybe.
			if tmp.is_null() {
				return Err(LumenError::Avif(ErrorMessage::from("Image setup failed.")));
			}

			(*tmp).yuvRange = AVIF_RANGE_FULL;
			(*tmp).alphaRange = AVIF_RANGE_FULL;
			(*tmp).yuvChromaSamplePosition = AVIF_CHROMA_SAMPLE_POSITION_COLOCATED;
			(*tmp).colorPrimaries = AVIF_COLOR_PRIMARIES_BT709 as _;
			(*tmp).transferCharacteristics = AVIF_TRANSFER_CHARACTERISTICS_SRGB as _;
			(*tmp).matrixCoefficients = AVIF_MATRIX_COEFFICIENTS_BT709 as _;

			Self(tmp)
		};

		// Point an "avifRGBImage" at our buffer and convert it.
		let mut rgb = avifRGBImage::default();
		unsafe { avifRGBImageSetDefaults(&mut rgb, yuv.0); }
		rgb.depth = 8;
		rgb.format =
			if bpp == 4 { AVIF_RGB_FORMAT_RGBA }
			else { AVIF_RGB_FORMAT_RGB };
		rgb.ignoreAlpha = (! color.has_alpha()).into();
		rgb.pixels = src.as_ptr().cast_mut(); // This doesn't actually mutate.
		rgb.rowBytes = row_bytes;

		maybe_die(unsafe { avifImageRGBToYUV(yuv.0, &rgb) })?;
		Ok(yuv)
	}

	/// # Empty.
	fn empty() -> Result<Self, LumenError> {
		let image = unsafe { avifImageCreateEmpty() };
		if image.is_null() {
			Err(LumenError::Avif(ErrorMessage::from("Image setup failed.")))
		}
		else { Ok(Self(image)) }
	}
}

impl Drop for LibAvifImage {
	#[inline]
	fn drop(&mut self) { unsafe { avifImageDestroy(self.0); } }
}



#[derive(Default)]
/// # Avif RGB Image.
///
/// This struct exists only for garbage collection purposes. It is used for
/// decoding.
struct LibAvifRGBImage(avifRGBImage);

impl Drop for LibAvifRGBImage {
	fn drop(&mut self) { unsafe { avifRGBImageFreePixels(&mut self.0); } }
}



/// # Data Struct.
///
/// This wrapper only exists to provide garbage cleanup.
struct LibAvifRwData(avifRWData);

impl Drop for LibAvifRwData {
	#[inline]
	fn drop(&mut self) { unsafe { avifRWDataFree(&mut self.0); } }
}



/// # Verify Status.
///
/// This converts unsuccessful `libavif` function results into proper Rust
/// errors, keeping `libavif`'s own description.
fn maybe_die(res: avifResult) -> Result<(), LumenError> {
	if AVIF_RESULT_OK == res { Ok(()) }
	else {
		let ptr = unsafe { avifResultToString(res) };
		let msg =
			if ptr.is_null() { ErrorMessage::from("Unknown libavif error.") }
			else { ErrorMessage::from_display(&unsafe { CStr::from_ptr(ptr) }.to_string_lossy()) };
		Err(LumenError::Avif(msg))
	}
}

/// # Quality to Quantizer(s).
///
/// This converts a `0..=100` quality into `libavif` quantizers (`0..=63`),
/// which run the other way: `0` is lossless, `63` is garbage.
///
/// AVIF separates out color and alpha values. For the latter, we apply the
/// formula used by `ravif` as it seems to work well.
fn quality_to_quantizers(quality: u8) -> (u8, u8) {
	let quality = quality.min(100);

	// Color first.
	let q = 63 - ratio_of(quality, 100, 63);
	if q == 0 { return (0, 0); }

	// Alpha follows a neat little formula stolen from `ravif`.
	let aq = num_integer::div_floor(quality + 100, 2).min(
		quality + num_integer::div_floor(quality, 4) + 2
	);
	let aq = 63 - ratio_of(aq, 100, 63);

	(q, aq)
}

#[allow(clippy::cast_sign_loss)] // Unsigned in, unsigned out.
#[allow(clippy::cast_possible_truncation)] // u8 in, u8 out.
#[inline]
/// # Ratio Of.
///
/// This simply takes a fraction, multiplies it against a new base, and returns
/// that value. It's a bit verbose, so is offloaded to its own place.
fn ratio_of(e: u8, d: u8, base: u8) -> u8 {
	(f32::from(e.min(d)) / f32::from(d) * f32::from(base))
		.max(0.0)
		.min(f32::from(base)) as u8
}
