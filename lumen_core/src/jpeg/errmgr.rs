/*!
# `Lumen` - JPEG Error Manager

`libjpeg` reports fatal errors by calling `error_exit`, which must never
return. The handler installed here formats the message and unwinds with a
[`Fault`] payload. The library prototypes are declared `C-unwind`, so the
unwind may legally pass back through libjpeg's frames to the nearest
`catch_unwind`, which lives in the shim.

Each handle owns its own manager; nothing here is global.
*/

use crate::{
	ErrorMessage,
	MESSAGE_MAX,
};
use mozjpeg_sys::{
	c_int,
	jpeg_common_struct,
	jpeg_error_mgr,
	jpeg_std_error,
};



/// # Fault.
///
/// The unwind payload raised by [`error_exit`].
pub(super) struct Fault(pub(super) ErrorMessage);



/// # Install.
///
/// Initialize the manager with the library defaults, then swap in our own
/// fatal and non-fatal message handlers. The returned pointer is what goes
/// into the handle's `err` field; the manager must outlive the handle.
pub(super) fn install(err: &mut jpeg_error_mgr) -> *mut jpeg_error_mgr {
	// Safety: this only fills in the struct.
	unsafe { jpeg_std_error(err); }
	err.error_exit = Some(error_exit);
	err.emit_message = Some(emit_message);
	err
}

/// # Format Message.
///
/// Ask libjpeg to render its current message.
fn format_message(cinfo: &mut jpeg_common_struct) -> ErrorMessage {
	// Safety: the error manager is installed before any handle is created,
	// and this is only ever called from inside its own callbacks.
	let Some(fmt) = (unsafe { cinfo.err.as_ref() }).and_then(|e| e.format_message)
	else { return ErrorMessage::from("Unknown libjpeg error.") };

	// libjpeg writes up to JMSG_LENGTH_MAX bytes, but the binding declares a
	// shorter array, so a full-size buffer is passed in its place.
	let mut buffer = [0_u8; MESSAGE_MAX];
	unsafe { fmt(cinfo, &*buffer.as_mut_ptr().cast::<[u8; 80]>()); }
	ErrorMessage::from_c_buf(&buffer)
}



/// # Error Exit.
///
/// Unwind back to the shim with the formatted message. `resume_unwind`
/// skips the panic hook, so nothing is printed.
unsafe extern "C-unwind" fn error_exit(cinfo: &mut jpeg_common_struct) {
	let msg = format_message(cinfo);
	std::panic::resume_unwind(Box::new(Fault(msg)));
}

/// # Emit Message.
///
/// Level `-1` is a warning (corrupt but recoverable data); anything else is
/// trace chatter. Both go to `tracing` instead of stderr.
unsafe extern "C-unwind" fn emit_message(cinfo: &mut jpeg_common_struct, msg_level: c_int) {
	if msg_level < 0 {
		// Safety: see format_message.
		if let Some(err) = unsafe { cinfo.err.as_mut() } { err.num_warnings += 1; }
		let msg = format_message(cinfo);
		tracing::warn!(msg = msg.as_str(), "libjpeg warning");
	}
	else if tracing::enabled!(tracing::Level::TRACE) {
		let msg = format_message(cinfo);
		tracing::trace!(level = msg_level, msg = msg.as_str(), "libjpeg message");
	}
}



#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn t_install() {
		let mut err: Box<jpeg_error_mgr> = Box::new(unsafe { std::mem::zeroed() });
		let ptr = install(&mut err);
		assert!(std::ptr::eq(ptr, &*err));
		assert!(err.error_exit.is_some());
		assert!(err.emit_message.is_some());

		// The library defaults are still there for everything else.
		assert!(err.format_message.is_some());
		assert_eq!(err.num_warnings, 0);
	}

	#[test]
	fn t_long_message() {
		// Stands in for libjpeg filling most of its message buffer.
		unsafe extern "C-unwind" fn long_message(_: &mut jpeg_common_struct, buffer: &[u8; 80]) {
			let ptr = buffer.as_ptr().cast_mut();
			unsafe {
				std::ptr::write_bytes(ptr, b'x', 150);
				ptr.add(150).write(0);
			}
		}

		let mut err: Box<jpeg_error_mgr> = Box::new(unsafe { std::mem::zeroed() });
		let mut cinfo: jpeg_common_struct = unsafe { std::mem::zeroed() };
		cinfo.err = install(&mut err);
		err.format_message = Some(long_message);

		let msg = format_message(&mut cinfo);
		assert_eq!(msg.len(), 150);
		assert!(msg.as_str().bytes().all(|b| b == b'x'));
	}
}
