use crate::tys::{Result, TysError};

/// Simple bounded cursor over an immutable byte slice.
///
/// Type streams are always little-endian.
pub struct Cursor<'a> {
	bytes: &'a [u8],
	pos: usize,
}

impl<'a> Cursor<'a> {
	/// Create a cursor at position 0.
	pub fn new(bytes: &'a [u8]) -> Self {
		Self { bytes, pos: 0 }
	}

	/// Return current byte offset.
	pub fn pos(&self) -> usize {
		self.pos
	}

	/// Return remaining unread bytes.
	pub fn remaining(&self) -> usize {
		self.bytes.len().saturating_sub(self.pos)
	}

	/// Read exactly `n` bytes and advance cursor.
	pub fn read_exact(&mut self, n: usize) -> Result<&'a [u8]> {
		if n > self.remaining() {
			return Err(TysError::UnexpectedEof {
				at: self.pos,
				need: n,
				rem: self.remaining(),
			});
		}

		let start = self.pos;
		self.pos += n;
		Ok(&self.bytes[start..self.pos])
	}

	/// Read a single byte.
	pub fn read_u8(&mut self) -> Result<u8> {
		Ok(self.read_exact(1)?[0])
	}

	/// Read a little-endian `u16`.
	pub fn read_u16(&mut self) -> Result<u16> {
		let raw = self.read_exact(2)?;
		let mut buf = [0_u8; 2];
		buf.copy_from_slice(raw);
		Ok(u16::from_le_bytes(buf))
	}

	/// Read a little-endian `u32`.
	pub fn read_u32(&mut self) -> Result<u32> {
		let raw = self.read_exact(4)?;
		let mut buf = [0_u8; 4];
		buf.copy_from_slice(raw);
		Ok(u32::from_le_bytes(buf))
	}

	/// Read a little-endian `i64`.
	pub fn read_i64(&mut self) -> Result<i64> {
		let raw = self.read_exact(8)?;
		let mut buf = [0_u8; 8];
		buf.copy_from_slice(raw);
		Ok(i64::from_le_bytes(buf))
	}

	/// Read a zero-terminated byte string without the terminator.
	pub fn read_cstring_bytes(&mut self) -> Result<&'a [u8]> {
		let start = self.pos;
		let rem = &self.bytes[self.pos..];
		let Some(rel_end) = rem.iter().position(|byte| *byte == 0) else {
			return Err(TysError::UnexpectedEof {
				at: self.pos,
				need: 1,
				rem: self.remaining(),
			});
		};

		let end = start + rel_end;
		self.pos = end + 1;
		Ok(&self.bytes[start..end])
	}

	/// Read a zero-terminated string, replacing invalid UTF-8 lossily.
	pub fn read_cstring_lossy(&mut self) -> Result<Box<str>> {
		let raw = self.read_cstring_bytes()?;
		Ok(String::from_utf8_lossy(raw).into())
	}
}

#[cfg(test)]
mod tests {
	use super::Cursor;

	#[test]
	fn read_past_end_reports_position() {
		let mut cursor = Cursor::new(&[1, 2, 3]);
		cursor.read_u8().expect("first byte reads");
		let err = cursor.read_u32().expect_err("u32 should not fit");
		let msg = err.to_string();
		assert!(msg.contains("offset 1"), "unexpected message: {msg}");
	}

	#[test]
	fn cstring_stops_at_terminator() {
		let mut cursor = Cursor::new(b"abc\0def\0");
		assert_eq!(&*cursor.read_cstring_lossy().expect("first string"), "abc");
		assert_eq!(&*cursor.read_cstring_lossy().expect("second string"), "def");
		assert_eq!(cursor.remaining(), 0);
	}
}
