use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::tys::compression::decompress;
use crate::tys::record::{RecordIter, StreamHeader};
use crate::tys::{Compression, Result, TysError};

/// An ingested type stream: header, decoded bytes, record area.
#[derive(Debug)]
pub struct TypeStreamFile {
	/// Parsed stream header.
	pub header: StreamHeader,
	/// Compression detected on the source bytes.
	pub compression: Compression,
	bytes: Vec<u8>,
}

impl TypeStreamFile {
	/// Read and decode a type stream from disk.
	pub fn open(path: impl AsRef<Path>) -> Result<Self> {
		Self::from_bytes(fs::read(path)?)
	}

	/// Decode a type stream from raw (possibly compressed) bytes.
	pub fn from_bytes(raw: Vec<u8>) -> Result<Self> {
		let compression = Compression::sniff(&raw);
		let bytes = match compression {
			Compression::None => raw,
			Compression::Zstd => {
				let decoded = decompress(&raw)?;
				if !decoded.starts_with(b"TYS1") {
					return Err(TysError::NotTypeStreamAfterDecompress);
				}
				decoded
			}
		};
		let header = StreamHeader::parse(&bytes)?;
		Ok(Self {
			header,
			compression,
			bytes,
		})
	}

	/// Decoded stream bytes.
	pub fn bytes(&self) -> &[u8] {
		&self.bytes
	}

	/// Iterate the raw records in stream order.
	pub fn records(&self) -> RecordIter<'_> {
		RecordIter::new(&self.bytes, StreamHeader::SIZE, self.header.record_count)
	}

	/// Scan the record area and collect per-kind counts.
	pub fn scan_record_stats(&self) -> Result<RecordStats> {
		let mut stats = RecordStats {
			record_count: 0,
			kinds: HashMap::new(),
		};

		for record in self.records() {
			let record = record?;
			stats.record_count += 1;
			*stats.kinds.entry(record.kind).or_insert(0) += 1;
		}

		Ok(stats)
	}
}

/// Per-kind record counts from one scan of the record area.
pub struct RecordStats {
	/// Records actually present in the record area.
	pub record_count: u32,
	/// Count per record kind code.
	pub kinds: HashMap<u8, u32>,
}
