use thiserror::Error;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, TysError>;

/// Errors produced while reading and reconstructing type-stream data.
///
/// These are the fatal conditions only: an unreadable container, a missing
/// type name, or a caller-level abort. Per-record anomalies are collected as
/// [`crate::tys::Diagnostic`] values alongside best-effort output instead.
#[derive(Debug, Error)]
pub enum TysError {
	/// Filesystem or stream IO failure.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	/// Declaration writer failure.
	#[error("fmt: {0}")]
	Fmt(#[from] std::fmt::Error),
	/// Unknown leading file magic.
	#[error("unsupported compression or not a type stream (magic={magic:?})")]
	UnknownMagic {
		/// First up-to-4 bytes of the stream.
		magic: [u8; 4],
	},
	/// Decompressed stream did not start with the `TYS1` magic.
	#[error("decompressed data does not start with TYS1 magic")]
	NotTypeStreamAfterDecompress,
	/// Decompression output exceeded configured safety limit.
	#[error("decompressed output exceeded limit {limit} bytes")]
	DecompressedTooLarge {
		/// Maximum allowed output bytes.
		limit: usize,
	},
	/// Unsupported container format version.
	#[error("unsupported type stream version {version} (expected 1)")]
	UnsupportedFormatVersion {
		/// Parsed format version.
		version: u16,
	},
	/// Not enough bytes remained for a requested read.
	#[error("unexpected eof at offset {at}, need {need} bytes, remaining {rem}")]
	UnexpectedEof {
		/// Byte offset where the read was attempted.
		at: usize,
		/// Requested bytes.
		need: usize,
		/// Bytes still available.
		rem: usize,
	},
	/// Record payload would exceed remaining stream data.
	#[error("record {id} length {len} at offset {at} exceeds remaining {rem}")]
	RecordLenOutOfRange {
		/// Record id whose header was being read.
		id: u32,
		/// Record header stream offset.
		at: usize,
		/// Declared payload length.
		len: u32,
		/// Remaining bytes in cursor.
		rem: usize,
	},
	/// Requested type name was not found in the stream.
	#[error("type not found: {name}")]
	TypeNotFound {
		/// Requested type name.
		name: String,
	},
	/// Caller aborted the session between top-level types.
	#[error("reconstruction cancelled")]
	Cancelled,
}
