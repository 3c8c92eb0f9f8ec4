/*!
# `Lumen` - Error Message
*/

use std::{
	borrow::Cow,
	fmt,
};



/// # Maximum Message Size.
///
/// This matches `libjpeg`'s `JMSG_LENGTH_MAX` and includes room for the
/// trailing NUL, so the longest storable message is one byte shorter.
pub const MESSAGE_MAX: usize = 200;



#[derive(Clone, Copy, Eq, PartialEq)]
/// # Error Message.
///
/// A bounded, inline UTF-8 string. It never allocates, so it can be returned
/// by value, stored on a [`Context`](crate::Context), or carried out of a
/// codec handle that is about to be destroyed without anything left over for
/// anybody to free.
///
/// Text is written through [`fmt::Write`]. Anything past the capacity is
/// dropped at the last complete character, and once truncated, later writes
/// are ignored so the message never ends in a stitched-together fragment.
pub struct ErrorMessage {
	/// # Buffer.
	buf: [u8; MESSAGE_MAX],

	/// # Used Length.
	len: u8,

	/// # Truncated?
	truncated: bool,
}

impl AsRef<str> for ErrorMessage {
	#[inline]
	fn as_ref(&self) -> &str { self.as_str() }
}

impl Default for ErrorMessage {
	#[inline]
	fn default() -> Self { Self::new() }
}

impl fmt::Debug for ErrorMessage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("ErrorMessage").field(&self.as_str()).finish()
	}
}

impl fmt::Display for ErrorMessage {
	#[inline]
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl fmt::Write for ErrorMessage {
	#[allow(clippy::cast_possible_truncation)] // The length never exceeds MESSAGE_MAX.
	fn write_str(&mut self, s: &str) -> fmt::Result {
		if self.truncated { return Ok(()); }

		let start = usize::from(self.len);
		let room = MESSAGE_MAX - 1 - start;
		let mut take = s.len();
		if room < take {
			self.truncated = true;
			take = room;
			while ! s.is_char_boundary(take) { take -= 1; }
		}

		self.buf[start..start + take].copy_from_slice(&s.as_bytes()[..take]);
		self.len = (start + take) as u8;
		Ok(())
	}
}

impl From<&str> for ErrorMessage {
	#[inline]
	fn from(src: &str) -> Self { Self::from_display(&src) }
}

/// ## Instantiation.
impl ErrorMessage {
	#[must_use]
	/// # New (Empty).
	pub const fn new() -> Self {
		Self {
			buf: [0; MESSAGE_MAX],
			len: 0,
			truncated: false,
		}
	}

	#[must_use]
	/// # From Display.
	///
	/// Render anything displayable into a new message, truncating as needed.
	pub fn from_display<T: fmt::Display + ?Sized>(src: &T) -> Self {
		use fmt::Write;

		let mut out = Self::new();
		// Our writer never fails; only a misbehaving Display impl could.
		let _res = write!(out, "{src}");
		out
	}

	#[must_use]
	/// # From C Buffer.
	///
	/// Read a NUL-terminated (or completely full) byte buffer, such as the
	/// one filled by `libjpeg`'s `format_message`. Invalid UTF-8 is replaced
	/// rather than rejected.
	pub fn from_c_buf(src: &[u8]) -> Self {
		let end = src.iter().position(|&b| b == 0).unwrap_or(src.len());
		let text: Cow<str> = String::from_utf8_lossy(&src[..end]);
		Self::from_display(&text)
	}
}

/// ## Getters.
impl ErrorMessage {
	#[must_use]
	/// # As Str.
	pub fn as_str(&self) -> &str {
		// Only whole characters are ever copied in, so this cannot fail.
		std::str::from_utf8(&self.buf[..usize::from(self.len)]).unwrap_or_default()
	}

	#[inline]
	#[must_use]
	/// # Is Empty?
	pub const fn is_empty(&self) -> bool { self.len == 0 }

	#[inline]
	#[must_use]
	/// # Length.
	pub const fn len(&self) -> usize { self.len as usize }

	#[inline]
	#[must_use]
	/// # Was Truncated?
	pub const fn is_truncated(&self) -> bool { self.truncated }

	#[inline]
	#[must_use]
	/// # NUL-Padded Bytes.
	///
	/// Return the raw buffer. Everything past [`ErrorMessage::len`] is zero,
	/// so the result is always a valid C string.
	pub const fn to_c_buf(&self) -> [u8; MESSAGE_MAX] { self.buf }
}



#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn t_truncate() {
		let long = "x".repeat(MESSAGE_MAX * 2);
		let msg = ErrorMessage::from_display(&long);
		assert_eq!(msg.len(), MESSAGE_MAX - 1);
		assert!(msg.is_truncated());
		assert_eq!(msg.to_c_buf()[MESSAGE_MAX - 1], 0);

		// Multi-byte characters must not be split.
		let long = "é".repeat(MESSAGE_MAX);
		let msg = ErrorMessage::from_display(&long);
		assert_eq!(msg.len(), MESSAGE_MAX - 2);
		assert!(msg.as_str().chars().all(|c| c == 'é'));
	}

	#[test]
	fn t_no_stitching() {
		use fmt::Write;

		let mut msg = ErrorMessage::new();
		msg.write_str(&"a".repeat(MESSAGE_MAX - 2)).unwrap();
		msg.write_str("bcd").unwrap();
		msg.write_str("e").unwrap();
		assert!(msg.as_str().ends_with("ab"));
		assert!(! msg.as_str().contains('e'));
	}

	#[test]
	fn t_c_buf() {
		let mut raw = [0_u8; 80];
		raw[..13].copy_from_slice(b"Bogus marker!");
		raw[20] = b'z';
		assert_eq!(ErrorMessage::from_c_buf(&raw).as_str(), "Bogus marker!");
		assert_eq!(ErrorMessage::from_c_buf(b"no nul").as_str(), "no nul");
		assert!(ErrorMessage::from_c_buf(&[0, 1, 2]).is_empty());
	}
}
