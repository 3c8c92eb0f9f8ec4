/*!
# `Lumen` - Color Kind
*/

#![cfg_attr(not(any(feature = "avif", feature = "png", feature = "webp")), allow(dead_code))]



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Pixel Color.
///
/// This is a list of color types, or, more specifically, which color
/// channels are actually used by a given pixel buffer.
///
/// Alpha ([`ColorKind::GreyAlpha`], [`ColorKind::Rgba`]) requires at least
/// one alpha value less than `255`.
///
/// Greyscale ([`ColorKind::Grey`], [`ColorKind::GreyAlpha`]) requires that
/// every pixel have equal R, G and B values.
pub enum ColorKind {
	/// # Greyscale.
	Grey,
	/// # Greyscale with Alpha.
	GreyAlpha,
	/// # RGB.
	Rgb,
	/// # RGB with Alpha.
	Rgba,
}

/// # Getters.
impl ColorKind {
	#[inline]
	#[must_use]
	/// # Is Greyscale?
	pub const fn is_greyscale(self) -> bool {
		matches!(self, Self::Grey | Self::GreyAlpha)
	}

	#[inline]
	#[must_use]
	/// # Has Alpha?
	///
	/// If any pixel has alpha data associated with it, this is true.
	pub const fn has_alpha(self) -> bool {
		matches!(self, Self::GreyAlpha | Self::Rgba)
	}
}

/// # Setters.
impl ColorKind {
	#[must_use]
	/// # From RGBA.
	///
	/// Find out whether the 4-byte pixel slice is using any color or alpha
	/// channels.
	pub fn from_rgba(src: &[u8]) -> Self {
		let mut color: bool = false;
		let mut alpha: bool = false;
		for px in src.chunks_exact(4) {
			if ! color && (px[0] != px[1] || px[0] != px[2]) {
				color = true;
				if alpha { return Self::Rgba; }
			}
			if ! alpha && px[3] != 255 {
				alpha = true;
				if color { return Self::Rgba; }
			}
		}

		// RGBA will have already been returned if applicable. If we're here,
		// it's one of the other three.
		if color { Self::Rgb }
		else if alpha { Self::GreyAlpha }
		else { Self::Grey }
	}

	#[must_use]
	/// # From RGB.
	///
	/// Same as [`ColorKind::from_rgba`], but for 3-byte pixels, which can
	/// never have alpha.
	pub fn from_rgb(src: &[u8]) -> Self {
		if src.chunks_exact(3).any(|px| px[0] != px[1] || px[0] != px[2]) {
			Self::Rgb
		}
		else { Self::Grey }
	}
}



/// # Drop Opaque Alpha.
///
/// Decoders that always hand back RGBA use this to shrink fully-opaque
/// results down to RGB. Returns `None` if any pixel is even slightly
/// transparent.
pub(crate) fn rgba_to_rgb(src: &[u8]) -> Option<Vec<u8>> {
	if src.chunks_exact(4).any(|px| px[3] != 255) { return None; }

	let mut out = Vec::with_capacity(src.len() / 4 * 3);
	for px in src.chunks_exact(4) { out.extend_from_slice(&px[..3]); }
	Some(out)
}



#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn t_from_rgba() {
		assert_eq!(ColorKind::from_rgba(&[1, 1, 1, 255, 2, 2, 2, 255]), ColorKind::Grey);
		assert_eq!(ColorKind::from_rgba(&[1, 1, 1, 255, 2, 2, 2, 0]), ColorKind::GreyAlpha);
		assert_eq!(ColorKind::from_rgba(&[1, 2, 1, 255, 2, 2, 2, 255]), ColorKind::Rgb);
		assert_eq!(ColorKind::from_rgba(&[1, 2, 1, 255, 2, 2, 2, 3]), ColorKind::Rgba);
		assert_eq!(ColorKind::from_rgb(&[5, 5, 5, 6, 6, 6]), ColorKind::Grey);
		assert_eq!(ColorKind::from_rgb(&[5, 5, 5, 6, 7, 6]), ColorKind::Rgb);
	}

	#[test]
	fn t_rgba_to_rgb() {
		assert_eq!(
			rgba_to_rgb(&[1, 2, 3, 255, 4, 5, 6, 255]),
			Some(vec![1, 2, 3, 4, 5, 6]),
		);
		assert_eq!(rgba_to_rgb(&[1, 2, 3, 255, 4, 5, 6, 254]), None);
	}
}
