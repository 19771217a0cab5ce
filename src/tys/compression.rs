use std::io::Read;

use crate::tys::{Result, TysError};

const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];
const MAX_DECOMPRESSED_BYTES: usize = 512 * 1024 * 1024;

/// Compression mode detected for a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
	/// Raw uncompressed stream.
	None,
	/// zstd-compressed stream.
	Zstd,
}

impl Compression {
	/// Classify source bytes by their leading magic. Anything that is not a
	/// zstd frame is treated as raw; the header parser rejects it afterward
	/// if it is not a type stream either.
	pub fn sniff(bytes: &[u8]) -> Self {
		if bytes.starts_with(&ZSTD_MAGIC) { Self::Zstd } else { Self::None }
	}

	/// Render compression mode as a stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::None => "none",
			Self::Zstd => "zstd",
		}
	}
}

/// Decompress one zstd frame, bounded so a crafted stream cannot balloon
/// past [`MAX_DECOMPRESSED_BYTES`].
pub fn decompress(raw: &[u8]) -> Result<Vec<u8>> {
	let decoder = zstd::stream::read::Decoder::new(raw)?;
	let mut out = Vec::new();
	decoder.take(MAX_DECOMPRESSED_BYTES as u64 + 1).read_to_end(&mut out)?;
	if out.len() > MAX_DECOMPRESSED_BYTES {
		return Err(TysError::DecompressedTooLarge { limit: MAX_DECOMPRESSED_BYTES });
	}
	Ok(out)
}
