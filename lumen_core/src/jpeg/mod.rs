/*!
# `Lumen` - JPEG

JPEG support goes through `libjpeg` (`mozjpeg`), one shimmed call at a time.
The [`shim`] module is public so callers can drive the codec handles
directly if they need something the plain decode/encode don't offer.
*/

mod errmgr;
pub mod shim;

pub use shim::{
	Compress,
	Decompress,
	ShimResult,
};

use crate::{
	Context,
	ErrorMessage,
	Image,
	ImageFormat,
	LumenError,
	image::pixel_buffer_size,
	traits::{
		Decoder,
		Encoder,
	},
};
use mozjpeg_sys::{
	J_COLOR_SPACE,
	J_DCT_METHOD,
};



/// # JPEG Image.
pub(crate) struct ImageJpeg;

impl Decoder for ImageJpeg {
	/// # Decode.
	///
	/// JPEGs always come out as RGB.
	fn decode(raw: &[u8]) -> Result<Image, LumenError> {
		let mut dec = Decompress::new();
		dec.try_create_decompress().into_result()?;
		dec.try_mem_src(raw).into_result()?;
		dec.try_read_header().into_result()?;
		dec.set_out_color_space(J_COLOR_SPACE::JCS_RGB);
		dec.try_start_decompress().into_result()?;

		let (width, height) = dec.output_size();
		let size = pixel_buffer_size(ImageFormat::Rgb8, width, height)?;
		let stride = dec.row_stride();
		if stride.checked_mul(height as usize) != Some(size) {
			return Err(LumenError::PixelBuffer);
		}

		let mut buf: Vec<u8> = Vec::new();
		buf.try_reserve_exact(size).map_err(|_| LumenError::Overflow)?;
		buf.resize(size, 0);

		let mut row = 0_usize;
		while row < height as usize {
			let mut read = 0;
			dec.try_read_scanlines(&mut buf[row * stride..], &mut read).into_result()?;
			if read == 0 {
				return Err(LumenError::Jpeg(ErrorMessage::from("No scanlines were read.")));
			}
			row += read as usize;
		}

		dec.try_finish_decompress().into_result()?;
		dec.try_destroy_decompress().into_result()?;

		Image::from_pixels(buf, ImageFormat::Rgb8, width, height)
	}
}

impl Encoder for ImageJpeg {
	const SEED: u64 = 1;

	/// # Encode.
	///
	/// RGBA sources are accepted, but the alpha channel is discarded.
	fn encode(img: &Image, ctx: &Context) -> Result<Image, LumenError> {
		let (components, space) = match img.pixel_size()? {
			3 => (3, J_COLOR_SPACE::JCS_RGB),
			4 => (4, J_COLOR_SPACE::JCS_EXT_RGBA),
			_ => return Err(LumenError::PixelBuffer),
		};
		let stride = img.stride()?;
		let (width, height) = (img.width(), img.height());

		let mut enc = Compress::new();
		enc.try_create_compress().into_result()?;
		enc.try_mem_dest().into_result()?;
		enc.set_input(width, height, components, space);
		enc.try_set_defaults().into_result()?;
		enc.set_dct_method(J_DCT_METHOD::JDCT_ISLOW);
		enc.try_set_quality(ctx.jpeg().quality).into_result()?;
		enc.try_start_compress().into_result()?;

		let mut row = 0_usize;
		while row < height as usize {
			let mut written = 0;
			enc.try_write_scanlines(&img[row * stride..], &mut written).into_result()?;
			if written == 0 {
				return Err(LumenError::Jpeg(ErrorMessage::from("No scanlines were written.")));
			}
			row += written as usize;
		}

		enc.try_finish_compress().into_result()?;
		enc.try_destroy_compress().into_result()?;

		let out = enc.output()
			.filter(|o| ! o.is_empty())
			.ok_or(LumenError::Process { process: "encode", format: ImageFormat::Jpeg })?
			.to_vec();
		Ok(Image::new(out, ImageFormat::Jpeg, width, height))
	}
}



#[cfg(test)]
mod tests {
	use super::*;
	use shim::DESTROYED;

	fn destroyed() -> usize { DESTROYED.with(std::cell::Cell::get) }

	/// # Gradient.
	fn gradient(format: ImageFormat, width: u32, height: u32) -> Image {
		let bpp = format.pixel_size().unwrap();
		let mut buf = Vec::new();
		for y in 0..height {
			for x in 0..width {
				let px = [(x * 16) as u8, (y * 16) as u8, 128, 255];
				buf.extend_from_slice(&px[..bpp]);
			}
		}
		Image::from_pixels(buf, format, width, height).unwrap()
	}

	#[test]
	fn t_shim_result() {
		assert_eq!(std::mem::size_of::<ShimResult>(), 1 + crate::MESSAGE_MAX);
		assert!(ShimResult::OK.into_result().is_ok());
	}

	#[test]
	fn t_truncated() {
		let before = destroyed();
		let err = ImageJpeg::decode(&[0xFF, 0xD8]).expect_err("Truncated JPEG decoded?!");
		let LumenError::Jpeg(msg) = err else { panic!("Wrong error: {err:?}"); };
		assert!(! msg.is_empty());
		assert_eq!(destroyed() - before, 1);
	}

	#[test]
	fn t_empty() {
		let before = destroyed();
		assert!(matches!(ImageJpeg::decode(&[]), Err(LumenError::Jpeg(_))));
		assert_eq!(destroyed() - before, 1);
	}

	#[test]
	fn t_fault_destroys() {
		let before = destroyed();

		// Writing before starting is a libjpeg state error.
		let mut enc = Compress::new();
		assert!(enc.try_create_compress().is_ok());
		enc.set_input(8, 2, 3, J_COLOR_SPACE::JCS_RGB);
		let mut written = 0;
		let res = enc.try_write_scanlines(&[0; 64], &mut written);
		assert!(! res.is_ok());
		assert!(res.message().is_some_and(|m| ! m.is_empty()));
		assert!(! enc.is_live());
		assert_eq!(destroyed() - before, 1);

		// The dead handle refuses further calls.
		let res = enc.try_set_defaults();
		assert_eq!(
			res.message().as_ref().map(ErrorMessage::as_str),
			Some(LumenError::Destroyed.as_str()),
		);
		assert!(! enc.try_destroy_compress().is_ok());

		// Dropping doesn't destroy it again.
		drop(enc);
		assert_eq!(destroyed() - before, 1);
	}

	#[test]
	fn t_refusal_destroys() {
		let ctx = Context::default();
		let file = ImageJpeg::encode(&gradient(ImageFormat::Rgb8, 4, 4), &ctx)
			.expect("Encode failed.");

		// Nowhere to put a single row.
		let before = destroyed();
		let mut dec = Decompress::new();
		assert!(dec.try_create_decompress().is_ok());
		assert!(dec.try_mem_src(&file).is_ok());
		assert!(dec.try_read_header().is_ok());
		dec.set_out_color_space(J_COLOR_SPACE::JCS_RGB);
		assert!(dec.try_start_decompress().is_ok());
		let mut read = 0;
		let res = dec.try_read_scanlines(&mut [0; 2], &mut read);
		assert!(! res.is_ok());
		assert!(res.message().is_some_and(|m| ! m.is_empty()));
		assert_eq!(read, 0);
		assert!(! dec.is_live());
		assert_eq!(destroyed() - before, 1);
		drop(dec);
		assert_eq!(destroyed() - before, 1);

		// Same for writing.
		let mut enc = Compress::new();
		assert!(enc.try_create_compress().is_ok());
		assert!(enc.try_mem_dest().is_ok());
		enc.set_input(4, 4, 3, J_COLOR_SPACE::JCS_RGB);
		assert!(enc.try_set_defaults().is_ok());
		assert!(enc.try_start_compress().is_ok());
		let mut written = 0;
		assert!(! enc.try_write_scanlines(&[0; 4], &mut written).is_ok());
		assert_eq!(written, 0);
		assert!(! enc.is_live());
		assert!(enc.output().is_none());
		assert_eq!(destroyed() - before, 2);
		drop(enc);
		assert_eq!(destroyed() - before, 2);

		// A handle that was never created has nothing to destroy.
		let mut dec = Decompress::new();
		assert!(! dec.try_read_scanlines(&mut [0; 2], &mut read).is_ok());
		assert!(! dec.is_live());
		assert!(dec.try_create_decompress().is_ok());
		drop(dec);
		assert_eq!(destroyed() - before, 3);
	}

	#[test]
	fn t_too_big() {
		let ctx = Context::default();
		let src = Image::blank(ImageFormat::Rgb8, 70_000, 1).expect("Blank.");
		let before = destroyed();
		let err = ImageJpeg::encode(&src, &ctx).expect_err("Oversized JPEG encoded?!");
		assert!(matches!(err, LumenError::Jpeg(m) if ! m.is_empty()));
		assert_eq!(destroyed() - before, 1);
	}

	#[test]
	fn t_large_output() {
		let ctx = Context::default();

		// Noise compresses badly, so the output has to grow a few times.
		let buf: Vec<u8> = (0..128 * 128 * 3_u32)
			.map(|i| (i.wrapping_mul(7919) % 251) as u8)
			.collect();
		let src = Image::from_pixels(buf, ImageFormat::Rgb8, 128, 128).unwrap();
		let enc = ImageJpeg::encode(&src, &ctx).expect("Encode failed.");
		assert!(enc.len() > 4096);
		assert_eq!(enc[..2], [0xFF, 0xD8]);
		assert_eq!(enc[enc.len() - 2..], [0xFF, 0xD9]);

		let dec = ImageJpeg::decode(&enc).expect("Decode failed.");
		assert_eq!((dec.width(), dec.height()), (128, 128));
	}

	#[test]
	fn t_lifecycle() {
		let before = destroyed();

		// Never created, never destroyed.
		let mut dec = Decompress::new();
		assert!(! dec.try_read_header().is_ok());
		drop(dec);
		assert_eq!(destroyed(), before);

		// Created then dropped.
		let mut dec = Decompress::new();
		assert!(dec.try_create_decompress().is_ok());
		assert!(! dec.try_create_decompress().is_ok());
		assert!(dec.is_live());
		drop(dec);
		assert_eq!(destroyed() - before, 1);
	}

	#[test]
	fn t_round_trip() {
		let ctx = Context::default();
		for format in [ImageFormat::Rgb8, ImageFormat::Rgba8] {
			let src = gradient(format, 16, 8);
			let before = destroyed();

			let enc = ImageJpeg::encode(&src, &ctx).expect("Encode failed.");
			assert_eq!(enc.format(), ImageFormat::Jpeg);
			assert_eq!(ImageFormat::try_from(&*enc), Ok(ImageFormat::Jpeg));

			let dec = ImageJpeg::decode(&enc).expect("Decode failed.");
			assert_eq!(destroyed() - before, 2);
			assert_eq!(dec.format(), ImageFormat::Rgb8);
			assert_eq!((dec.width(), dec.height()), (16, 8));

			// Lossy, but not that lossy.
			let bpp = format.pixel_size().unwrap();
			for (a, b) in src.chunks_exact(bpp).zip(dec.chunks_exact(3)) {
				for i in 0..3 { assert!(a[i].abs_diff(b[i]) <= 48, "{a:?} vs {b:?}"); }
			}
		}
	}

	#[test]
	fn t_tiny() {
		let ctx = Context::default();
		let src = Image::from_pixels(vec![200; 2 * 2 * 3], ImageFormat::Rgb8, 2, 2).unwrap();
		let enc = ImageJpeg::encode(&src, &ctx).expect("Encode failed.");
		let dec = ImageJpeg::decode(&enc).expect("Decode failed.");
		assert_eq!((dec.width(), dec.height()), (2, 2));
		assert!(dec.iter().all(|&b| b.abs_diff(200) <= 4));
	}
}
