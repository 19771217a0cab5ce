use crate::tys::bytes::Cursor;
use crate::tys::{Result, TysError, TypeId};

/// Parsed type-stream header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHeader {
	/// Stream format version.
	pub format_version: u16,
	/// Number of records declared by the header.
	pub record_count: u32,
}

impl StreamHeader {
	/// Fixed header size in bytes: magic, version, reserved, record count.
	pub const SIZE: usize = 12;

	/// Parse a type-stream header from the beginning of `bytes`.
	pub fn parse(bytes: &[u8]) -> Result<Self> {
		let mut cursor = Cursor::new(bytes);
		let magic = cursor.read_exact(4)?;
		if magic != b"TYS1" {
			let mut first4 = [0_u8; 4];
			first4.copy_from_slice(magic);
			return Err(TysError::UnknownMagic { magic: first4 });
		}

		let format_version = cursor.read_u16()?;
		if format_version != 1 {
			return Err(TysError::UnsupportedFormatVersion { version: format_version });
		}

		let _reserved = cursor.read_u16()?;
		let record_count = cursor.read_u32()?;
		Ok(Self {
			format_version,
			record_count,
		})
	}
}

/// Record kind code for primitive records.
pub const KIND_PRIMITIVE: u8 = 0x01;
/// Record kind code for pointer records.
pub const KIND_POINTER: u8 = 0x02;
/// Record kind code for array records.
pub const KIND_ARRAY: u8 = 0x03;
/// Record kind code for enum records.
pub const KIND_ENUM: u8 = 0x04;
/// Record kind code for modifier records.
pub const KIND_MODIFIER: u8 = 0x05;
/// Record kind code for procedure records.
pub const KIND_PROCEDURE: u8 = 0x06;
/// Record kind code for aggregate records.
pub const KIND_AGGREGATE: u8 = 0x07;

/// One raw, undecoded record with its stream-assigned id.
#[derive(Debug, Clone, Copy)]
pub struct RawRecord<'a> {
	/// Position-assigned id of this record.
	pub id: TypeId,
	/// Record kind code.
	pub kind: u8,
	/// Opaque payload bytes.
	pub payload: &'a [u8],
	/// Stream offset of the record header.
	pub stream_offset: usize,
}

/// Iterator over the record area of a stream.
pub struct RecordIter<'a> {
	cursor: Cursor<'a>,
	offset_base: usize,
	next_id: TypeId,
	remaining_records: u32,
	done: bool,
}

impl<'a> RecordIter<'a> {
	/// Create an iterator over `record_count` records starting at `offset`.
	pub fn new(bytes: &'a [u8], offset: usize, record_count: u32) -> Self {
		let slice = bytes.get(offset..).unwrap_or(&[]);
		Self {
			cursor: Cursor::new(slice),
			offset_base: offset,
			next_id: 0,
			remaining_records: record_count,
			done: false,
		}
	}
}

impl<'a> Iterator for RecordIter<'a> {
	type Item = Result<RawRecord<'a>>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.done || self.remaining_records == 0 {
			return None;
		}

		let stream_offset = self.offset_base + self.cursor.pos();
		let id = self.next_id;

		let header = (|| -> Result<(u8, u32)> {
			let kind = self.cursor.read_u8()?;
			let _reserved = self.cursor.read_u8()?;
			let len = self.cursor.read_u32()?;
			Ok((kind, len))
		})();
		let (kind, len) = match header {
			Ok(value) => value,
			Err(err) => {
				self.done = true;
				return Some(Err(err));
			}
		};

		let rem = self.cursor.remaining();
		if len as usize > rem {
			self.done = true;
			return Some(Err(TysError::RecordLenOutOfRange {
				id,
				at: stream_offset,
				len,
				rem,
			}));
		}

		let payload = match self.cursor.read_exact(len as usize) {
			Ok(value) => value,
			Err(err) => {
				self.done = true;
				return Some(Err(err));
			}
		};

		self.next_id += 1;
		self.remaining_records -= 1;
		Some(Ok(RawRecord {
			id,
			kind,
			payload,
			stream_offset,
		}))
	}
}
