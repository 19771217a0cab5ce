use std::path::PathBuf;

use tydoc::tys::{Result, TypeStreamFile};

use crate::cmd::util::kind_label;

/// Print high-level stream and record statistics.
pub fn run(path: PathBuf) -> Result<()> {
	let stream = TypeStreamFile::open(&path)?;
	let stats = stream.scan_record_stats()?;

	println!("path: {}", path.display());
	println!("compression: {}", stream.compression.as_str());
	println!("format_version: {}", stream.header.format_version);
	println!("endianness: little");
	println!("declared_records: {}", stream.header.record_count);
	println!("record_count: {}", stats.record_count);

	let mut entries: Vec<_> = stats.kinds.into_iter().collect();
	entries.sort_by(|left, right| right.1.cmp(&left.1).then_with(|| left.0.cmp(&right.0)));

	println!("kinds:");
	for (kind, count) in entries {
		println!("  {}: {}", kind_label(kind), count);
	}

	Ok(())
}
