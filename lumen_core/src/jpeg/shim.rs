/*!
# `Lumen` - JPEG Shim

Every libjpeg entry point used by this crate gets exactly one wrapper here.
Each wrapper runs its single library call inside `catch_unwind`; if libjpeg
bails out through the installed `error_exit` (see `errmgr`), the handle is
destroyed on the spot and the message comes back in a [`ShimResult`].

A handle moves through three states: fresh, live (after `create`), and
destroyed. Calls against a fresh or destroyed handle are refused with a
failure result rather than handed to libjpeg. Any other failure, whether
raised by libjpeg or by the wrapper's own checks, destroys a live handle
before it is reported. Destruction happens at most once: on a failure,
through the explicit `destroy` wrapper, or on drop, whichever comes first.

Compressed output goes to a `Vec` through a custom destination manager, so
the buffer is always owned by Rust, however the handle ends up.
*/

use super::errmgr::{
	self,
	Fault,
};
use crate::{
	ErrorMessage,
	LumenError,
	MESSAGE_MAX,
};
use mozjpeg_sys::{
	boolean,
	c_int,
	c_ulong,
	J_COLOR_SPACE,
	J_DCT_METHOD,
	JDIMENSION,
	jpeg_common_struct,
	jpeg_compress_struct,
	jpeg_create_compress,
	jpeg_create_decompress,
	jpeg_decompress_struct,
	jpeg_destination_mgr,
	jpeg_destroy_compress,
	jpeg_destroy_decompress,
	jpeg_error_mgr,
	jpeg_finish_compress,
	jpeg_finish_decompress,
	jpeg_mem_src,
	jpeg_read_header,
	jpeg_read_scanlines,
	jpeg_set_defaults,
	jpeg_set_quality,
	jpeg_start_compress,
	jpeg_start_decompress,
	jpeg_write_scanlines,
};
use std::{
	marker::PhantomData,
	mem,
	panic::{
		self,
		AssertUnwindSafe,
	},
	ptr,
};

#[cfg(test)]
use std::cell::Cell;



#[cfg(test)]
thread_local! {
	/// # Destroy Counter.
	///
	/// The number of handles destroyed on this thread.
	pub(crate) static DESTROYED: Cell<usize> = const { Cell::new(0) };
}

/// # Header OK.
///
/// The `jpeg_read_header` return value for a complete image header.
const JPEG_HEADER_OK: c_int = 1;

/// # Output Chunk.
///
/// The minimum amount the compressed output buffer grows by.
const DEST_CHUNK: usize = 4096;



#[repr(C)]
#[must_use]
#[derive(Debug, Clone, Copy)]
/// # Shim Result.
///
/// The fixed-size outcome of a single wrapped libjpeg call. It never points
/// anywhere, so it can be returned by value across any boundary.
///
/// `message` is NUL-terminated (and NUL-padded) UTF-8, and only meaningful
/// when `ok` is false.
pub struct ShimResult {
	/// # Success?
	pub ok: bool,

	/// # Error Message.
	pub message: [u8; MESSAGE_MAX],
}

impl ShimResult {
	/// # Success.
	pub const OK: Self = Self { ok: true, message: [0; MESSAGE_MAX] };

	/// # Failure.
	const fn fail(msg: &ErrorMessage) -> Self {
		Self { ok: false, message: msg.to_c_buf() }
	}

	/// # Refusal.
	///
	/// A failure that never reached libjpeg.
	fn refuse(msg: &str) -> Self { Self::fail(&ErrorMessage::from(msg)) }

	#[inline]
	#[must_use]
	/// # Is OK?
	pub const fn is_ok(&self) -> bool { self.ok }

	#[must_use]
	/// # Message.
	///
	/// Return the error message, if this is a failure.
	pub fn message(&self) -> Option<ErrorMessage> {
		if self.ok { None }
		else { Some(ErrorMessage::from_c_buf(&self.message)) }
	}

	/// # Into Result.
	///
	/// ## Errors
	///
	/// Failures are returned as [`LumenError::Jpeg`].
	pub fn into_result(self) -> Result<(), LumenError> {
		match self.message() {
			None => Ok(()),
			Some(msg) => Err(LumenError::Jpeg(msg)),
		}
	}
}



/// # Handle Kind.
///
/// The two libjpeg structs share a common header and a destructor.
trait Handle {
	/// # Blank.
	///
	/// A zeroed struct, the expected state before `create`.
	fn blank() -> Box<Self>;

	/// # Common Fields.
	fn common(&mut self) -> &mut jpeg_common_struct;

	/// # Destroy.
	///
	/// ## Safety
	///
	/// The struct must have been created and not yet destroyed.
	unsafe fn destroy(&mut self);
}

impl Handle for jpeg_decompress_struct {
	fn blank() -> Box<Self> {
		// Safety: a C struct of integers, pointers, and nullable callbacks.
		Box::new(unsafe { mem::zeroed() })
	}

	fn common(&mut self) -> &mut jpeg_common_struct { &mut self.common }

	unsafe fn destroy(&mut self) { unsafe { jpeg_destroy_decompress(self); } }
}

impl Handle for jpeg_compress_struct {
	fn blank() -> Box<Self> {
		// Safety: a C struct of integers, pointers, and nullable callbacks.
		Box::new(unsafe { mem::zeroed() })
	}

	fn common(&mut self) -> &mut jpeg_common_struct { &mut self.common }

	unsafe fn destroy(&mut self) { unsafe { jpeg_destroy_compress(self); } }
}



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Handle State.
enum State {
	Fresh,
	Live,
	Destroyed,
}

/// # Shield.
///
/// A boxed libjpeg struct and the boxed error manager it points to. Both
/// live on the heap so neither moves while libjpeg holds pointers to them.
struct Shield<S: Handle> {
	/// # Library Struct.
	raw: Box<S>,

	/// # Error Manager.
	///
	/// Only accessed by libjpeg, through `raw.common.err`.
	_err: Box<jpeg_error_mgr>,

	/// # State.
	state: State,
}

impl<S: Handle> Drop for Shield<S> {
	fn drop(&mut self) { self.destroy(); }
}

impl<S: Handle> Shield<S> {
	/// # New.
	///
	/// The error manager is installed before anything else can happen.
	fn new() -> Self {
		// Safety: jpeg_std_error overwrites every field that matters.
		let mut err: Box<jpeg_error_mgr> = Box::new(unsafe { mem::zeroed() });
		let mut raw = S::blank();
		raw.common().err = errmgr::install(&mut err);
		Self { raw, _err: err, state: State::Fresh }
	}

	/// # Create.
	///
	/// The create call itself can fail (out of memory, version mismatch), so
	/// the handle counts as live from just before it runs.
	fn create(&mut self, call: impl FnOnce(&mut S)) -> ShimResult {
		match self.state {
			State::Fresh => {
				self.state = State::Live;
				self.shim(call)
			},
			State::Live => ShimResult::refuse("The codec handle was already created."),
			State::Destroyed => ShimResult::refuse(LumenError::Destroyed.as_str()),
		}
	}

	/// # Check State.
	///
	/// Only live handles may be used; anything else is refused without
	/// touching the handle.
	fn check(&self) -> Result<(), ShimResult> {
		match self.state {
			State::Live => Ok(()),
			State::Fresh => Err(ShimResult::refuse("The codec handle was never created.")),
			State::Destroyed => Err(ShimResult::refuse(LumenError::Destroyed.as_str())),
		}
	}

	/// # Reject.
	///
	/// Fail a call on the wrapper's own account. A live handle is destroyed
	/// first, same as for a libjpeg fault; otherwise this is the usual state
	/// refusal.
	fn reject(&mut self, msg: &str) -> ShimResult {
		if let Err(e) = self.check() { return e; }
		self.destroy();
		ShimResult::refuse(msg)
	}

	/// # Guard.
	///
	/// Run one library call. If it unwinds, destroy the handle and return the
	/// failure. Stray panics are caught too, with a generic message.
	fn guard<T>(&mut self, call: impl FnOnce(&mut S) -> T) -> Result<T, ShimResult> {
		self.check()?;

		let raw = &mut *self.raw;
		match panic::catch_unwind(AssertUnwindSafe(|| call(raw))) {
			Ok(out) => Ok(out),
			Err(payload) => {
				let msg = payload.downcast::<Fault>().map_or_else(
					|_| ErrorMessage::from(LumenError::Panic.as_str()),
					|fault| fault.0,
				);
				self.destroy();
				Err(ShimResult::fail(&msg))
			},
		}
	}

	/// # Shim.
	///
	/// Same as [`Shield::guard`], for calls with nothing to return.
	fn shim(&mut self, call: impl FnOnce(&mut S)) -> ShimResult {
		match self.guard(call) {
			Ok(()) => ShimResult::OK,
			Err(e) => e,
		}
	}

	/// # Try Destroy.
	fn try_destroy(&mut self) -> ShimResult {
		if let Err(e) = self.check() { return e; }
		self.destroy();
		ShimResult::OK
	}

	/// # Destroy.
	///
	/// This is a no-op unless the handle is live.
	fn destroy(&mut self) {
		if self.state == State::Live {
			self.state = State::Destroyed;

			// Safety: live means created and not yet destroyed.
			unsafe { self.raw.destroy(); }

			#[cfg(test)]
			DESTROYED.with(|n| n.set(n.get() + 1));
		}
	}

	#[inline]
	/// # Is Live?
	fn is_live(&self) -> bool { self.state == State::Live }
}



/// # Decompressor.
///
/// A libjpeg decompression handle reading from a borrowed memory buffer.
pub struct Decompress<'a> {
	/// # Handle.
	shield: Shield<jpeg_decompress_struct>,

	/// # Source.
	///
	/// `jpeg_mem_src` keeps a pointer to this.
	src: PhantomData<&'a [u8]>,
}

impl Default for Decompress<'_> {
	#[inline]
	fn default() -> Self { Self::new() }
}

impl std::fmt::Debug for Decompress<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Decompress")
			.field("live", &self.is_live())
			.finish_non_exhaustive()
	}
}

/// ## Setup and Getters.
impl Decompress<'_> {
	#[must_use]
	/// # New.
	pub fn new() -> Self {
		Self { shield: Shield::new(), src: PhantomData }
	}

	#[inline]
	#[must_use]
	/// # Is Live?
	///
	/// True once created, false again after destruction.
	pub fn is_live(&self) -> bool { self.shield.is_live() }

	#[inline]
	/// # Set Output Color Space.
	///
	/// Call between reading the header and starting decompression.
	pub fn set_out_color_space(&mut self, space: J_COLOR_SPACE) {
		self.shield.raw.out_color_space = space;
	}

	#[inline]
	#[must_use]
	/// # Output Size.
	///
	/// Valid once decompression has started.
	pub fn output_size(&self) -> (u32, u32) {
		(self.shield.raw.output_width, self.shield.raw.output_height)
	}

	#[must_use]
	/// # Output Row Size.
	///
	/// Bytes per decoded scanline; zero before decompression has started.
	pub fn row_stride(&self) -> usize {
		usize::try_from(self.shield.raw.output_components).map_or(0, |c| {
			c.saturating_mul(self.shield.raw.output_width as usize)
		})
	}
}

/// ## Wrapped Calls.
impl<'a> Decompress<'a> {
	/// # Create.
	pub fn try_create_decompress(&mut self) -> ShimResult {
		// Safety: the struct is zeroed with the error manager set.
		self.shield.create(|raw| unsafe { jpeg_create_decompress(raw) })
	}

	/// # Set Memory Source.
	pub fn try_mem_src(&mut self, src: &'a [u8]) -> ShimResult {
		let Ok(size) = c_ulong::try_from(src.len())
		else { return self.shield.reject(LumenError::Overflow.as_str()) };

		// Safety: the borrow outlives the handle.
		self.shield.shim(|raw| unsafe { jpeg_mem_src(raw, src.as_ptr(), size) })
	}

	/// # Read Header.
	///
	/// Anything short of a complete image header is a failure.
	pub fn try_read_header(&mut self) -> ShimResult {
		// Safety: libjpeg validates its own state.
		match self.shield.guard(|raw| unsafe { jpeg_read_header(raw, true as boolean) }) {
			Ok(JPEG_HEADER_OK) => ShimResult::OK,
			Ok(_) => self.shield.reject("The JPEG header is incomplete."),
			Err(e) => e,
		}
	}

	/// # Start Decompress.
	pub fn try_start_decompress(&mut self) -> ShimResult {
		// Safety: libjpeg validates its own state.
		match self.shield.guard(|raw| unsafe { jpeg_start_decompress(raw) }) {
			Ok(0) => self.shield.reject("JPEG decompression was suspended."),
			Ok(_) => ShimResult::OK,
			Err(e) => e,
		}
	}

	/// # Read Scanlines.
	///
	/// Decode as many rows as libjpeg is willing to give into `rows`, which
	/// must hold at least one whole row. The count is written to `read`.
	pub fn try_read_scanlines(&mut self, rows: &mut [u8], read: &mut u32) -> ShimResult {
		let stride = self.row_stride();
		if stride == 0 || rows.len() < stride {
			return self.shield.reject("The scanline buffer is too small.");
		}

		let mut ptrs: Vec<*mut u8> = rows.chunks_exact_mut(stride)
			.map(<[u8]>::as_mut_ptr)
			.collect();
		let Ok(max) = JDIMENSION::try_from(ptrs.len())
		else { return self.shield.reject(LumenError::Overflow.as_str()) };

		// Safety: every pointer addresses a full row of writable memory.
		match self.shield.guard(|raw| unsafe { jpeg_read_scanlines(raw, ptrs.as_mut_ptr(), max) }) {
			Ok(n) => {
				*read = n;
				ShimResult::OK
			},
			Err(e) => e,
		}
	}

	/// # Finish Decompress.
	pub fn try_finish_decompress(&mut self) -> ShimResult {
		// Safety: libjpeg validates its own state.
		match self.shield.guard(|raw| unsafe { jpeg_finish_decompress(raw) }) {
			Ok(0) => self.shield.reject("JPEG decompression was suspended."),
			Ok(_) => ShimResult::OK,
			Err(e) => e,
		}
	}

	/// # Destroy.
	pub fn try_destroy_decompress(&mut self) -> ShimResult { self.shield.try_destroy() }
}



/// # Vector Destination.
///
/// A `jpeg_destination_mgr` that writes into a growing `Vec`. The manager
/// must stay the first field: libjpeg only knows about it, and the callbacks
/// cast its pointer back to the whole struct.
#[repr(C)]
struct VecDest {
	/// # Manager.
	mgr: jpeg_destination_mgr,

	/// # Output.
	///
	/// Once compression finishes, this holds exactly the encoded file.
	buf: Vec<u8>,
}

impl VecDest {
	/// # New.
	fn new() -> Box<Self> {
		Box::new(Self {
			mgr: jpeg_destination_mgr {
				next_output_byte: ptr::null_mut(),
				free_in_buffer: 0,
				init_destination: Some(dest_init),
				empty_output_buffer: Some(dest_empty),
				term_destination: Some(dest_term),
			},
			buf: Vec::new(),
		})
	}

	/// # Grow.
	///
	/// Extend the buffer by at least one chunk and point libjpeg at the new
	/// space. Everything already in the buffer counts as written.
	///
	/// Running out of memory unwinds with a [`Fault`], like any other
	/// libjpeg error.
	fn grow(&mut self) {
		let used = self.buf.len();
		let extra = used.max(DEST_CHUNK);
		if self.buf.try_reserve_exact(extra).is_err() {
			panic::resume_unwind(Box::new(Fault(ErrorMessage::from(
				"Insufficient memory for the JPEG output.",
			))));
		}
		self.buf.resize(used + extra, 0);

		// Safety: `used` is within the (now larger) buffer.
		self.mgr.next_output_byte = unsafe { self.buf.as_mut_ptr().add(used) };
		self.mgr.free_in_buffer = extra;
	}

	/// # Finish.
	///
	/// Trim the unwritten tail.
	fn finish(&mut self) {
		let used = self.buf.len().saturating_sub(self.mgr.free_in_buffer);
		self.buf.truncate(used);
		self.mgr.next_output_byte = ptr::null_mut();
		self.mgr.free_in_buffer = 0;
	}
}

/// # Destination From Handle.
///
/// ## Safety
///
/// The handle's `dest` must point to the manager of a live [`VecDest`].
unsafe fn vec_dest(cinfo: &mut jpeg_compress_struct) -> &mut VecDest {
	unsafe { &mut *cinfo.dest.cast::<VecDest>() }
}

/// # Callback: Init Destination.
unsafe extern "C-unwind" fn dest_init(cinfo: &mut jpeg_compress_struct) {
	let dest = unsafe { vec_dest(cinfo) };
	dest.buf.clear();
	dest.grow();
}

/// # Callback: Empty Output Buffer.
///
/// libjpeg only calls this once the whole buffer is full.
unsafe extern "C-unwind" fn dest_empty(cinfo: &mut jpeg_compress_struct) -> boolean {
	unsafe { vec_dest(cinfo) }.grow();
	1
}

/// # Callback: Term Destination.
unsafe extern "C-unwind" fn dest_term(cinfo: &mut jpeg_compress_struct) {
	unsafe { vec_dest(cinfo) }.finish();
}



/// # Compressor.
///
/// A libjpeg compression handle writing to a library-managed memory buffer.
pub struct Compress {
	/// # Handle.
	shield: Shield<jpeg_compress_struct>,

	/// # Destination.
	///
	/// Declared after the handle so it is dropped after it.
	dest: Box<VecDest>,

	/// # Finished?
	///
	/// The destination is only meaningful once compression is finished.
	finished: bool,
}

impl Default for Compress {
	#[inline]
	fn default() -> Self { Self::new() }
}

impl std::fmt::Debug for Compress {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Compress")
			.field("live", &self.is_live())
			.field("finished", &self.finished)
			.finish_non_exhaustive()
	}
}

/// ## Setup and Getters.
impl Compress {
	#[must_use]
	/// # New.
	pub fn new() -> Self {
		Self {
			shield: Shield::new(),
			dest: VecDest::new(),
			finished: false,
		}
	}

	#[inline]
	#[must_use]
	/// # Is Live?
	pub fn is_live(&self) -> bool { self.shield.is_live() }

	/// # Set Input.
	///
	/// Describe the source pixels. Call before setting defaults.
	pub fn set_input(&mut self, width: u32, height: u32, components: c_int, space: J_COLOR_SPACE) {
		let raw = &mut *self.shield.raw;
		raw.image_width = width;
		raw.image_height = height;
		raw.input_components = components;
		raw.in_color_space = space;
	}

	#[inline]
	/// # Set DCT Method.
	///
	/// Call after setting defaults, which would otherwise overwrite it.
	pub fn set_dct_method(&mut self, method: J_DCT_METHOD) {
		self.shield.raw.dct_method = method;
	}

	#[must_use]
	/// # Output.
	///
	/// The encoded file, once compression has finished. It remains available
	/// after the handle is destroyed.
	pub fn output(&self) -> Option<&[u8]> {
		if self.finished { Some(&self.dest.buf) }
		else { None }
	}
}

/// ## Wrapped Calls.
impl Compress {
	/// # Create.
	pub fn try_create_compress(&mut self) -> ShimResult {
		// Safety: the struct is zeroed with the error manager set.
		self.shield.create(|raw| unsafe { jpeg_create_compress(raw) })
	}

	/// # Set Memory Destination.
	///
	/// Point the handle at the in-memory output buffer. This is not a
	/// library call, but it needs a live handle all the same, since
	/// `create` resets the field.
	pub fn try_mem_dest(&mut self) -> ShimResult {
		let dest = &raw mut self.dest.mgr;

		// The destination is boxed and outlives the handle.
		self.shield.shim(|raw| { raw.dest = dest; })
	}

	/// # Set Defaults.
	pub fn try_set_defaults(&mut self) -> ShimResult {
		// Safety: libjpeg validates its own state.
		self.shield.shim(|raw| unsafe { jpeg_set_defaults(raw) })
	}

	/// # Set Quality.
	///
	/// Values above `100` are treated as `100`. Baseline-compatible
	/// quantization tables are forced.
	pub fn try_set_quality(&mut self, quality: u8) -> ShimResult {
		let quality = c_int::from(quality.min(100));

		// Safety: libjpeg validates its own state.
		self.shield.shim(|raw| unsafe { jpeg_set_quality(raw, quality, true as boolean) })
	}

	/// # Start Compress.
	pub fn try_start_compress(&mut self) -> ShimResult {
		// Safety: libjpeg validates its own state.
		self.shield.shim(|raw| unsafe { jpeg_start_compress(raw, true as boolean) })
	}

	/// # Write Scanlines.
	///
	/// Feed as many whole rows from `rows` as libjpeg will take. The count
	/// is written to `written`.
	pub fn try_write_scanlines(&mut self, rows: &[u8], written: &mut u32) -> ShimResult {
		let raw = &*self.shield.raw;
		let stride = usize::try_from(raw.input_components).map_or(0, |c| {
			c.saturating_mul(raw.image_width as usize)
		});
		if stride == 0 || rows.len() < stride {
			return self.shield.reject("The scanline buffer is too small.");
		}

		let ptrs: Vec<*const u8> = rows.chunks_exact(stride)
			.map(<[u8]>::as_ptr)
			.collect();
		let Ok(max) = JDIMENSION::try_from(ptrs.len())
		else { return self.shield.reject(LumenError::Overflow.as_str()) };

		// Safety: every pointer addresses a full row; libjpeg only reads.
		match self.shield.guard(|raw| unsafe { jpeg_write_scanlines(raw, ptrs.as_ptr(), max) }) {
			Ok(n) => {
				*written = n;
				ShimResult::OK
			},
			Err(e) => e,
		}
	}

	/// # Finish Compress.
	pub fn try_finish_compress(&mut self) -> ShimResult {
		// Safety: libjpeg validates its own state.
		let res = self.shield.shim(|raw| unsafe { jpeg_finish_compress(raw) });
		self.finished = res.ok;
		res
	}

	/// # Destroy.
	pub fn try_destroy_compress(&mut self) -> ShimResult { self.shield.try_destroy() }
}



#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn t_vec_dest() {
		let mut dest = VecDest::new();
		let mut cinfo: Box<jpeg_compress_struct> = Box::new(unsafe { mem::zeroed() });
		cinfo.dest = &raw mut dest.mgr;

		// Init hands out the first chunk.
		unsafe { dest_init(&mut cinfo); }
		assert_eq!(dest.buf.len(), DEST_CHUNK);
		assert_eq!(dest.mgr.free_in_buffer, DEST_CHUNK);

		// Fill it up completely, the way libjpeg does before asking for more.
		for i in 0..DEST_CHUNK {
			unsafe { dest.mgr.next_output_byte.add(i).write((i % 251) as u8); }
		}
		dest.mgr.free_in_buffer = 0;
		assert_eq!(unsafe { dest_empty(&mut cinfo) }, 1);
		assert_eq!(dest.buf.len(), DEST_CHUNK * 2);
		assert_eq!(dest.mgr.free_in_buffer, DEST_CHUNK);

		// A partial write, then the end.
		for i in 0..10 {
			unsafe { dest.mgr.next_output_byte.add(i).write(0xAA); }
		}
		dest.mgr.free_in_buffer -= 10;
		unsafe { dest_term(&mut cinfo); }
		assert_eq!(dest.buf.len(), DEST_CHUNK + 10);
		assert_eq!(dest.buf[DEST_CHUNK - 1], ((DEST_CHUNK - 1) % 251) as u8);
		assert!(dest.buf[DEST_CHUNK..].iter().all(|&b| b == 0xAA));
		assert!(dest.mgr.next_output_byte.is_null());
	}
}
