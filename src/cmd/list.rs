use std::path::PathBuf;

use tydoc::tys::{LayoutOptions, LayoutResolver, Result, TypeNode, TypeStore, TypeStreamFile};

use crate::cmd::util::{emit_json, print_diagnostics};

/// List decoded records, optionally filtered by kind label or by a
/// case-insensitive name substring.
pub fn run(path: PathBuf, kind: Option<String>, filter: Option<String>, json: bool) -> Result<()> {
	let stream = TypeStreamFile::open(&path)?;
	let (store, diagnostics) = TypeStore::from_file(&stream)?;
	let mut resolver = LayoutResolver::new(&store, LayoutOptions::default());
	let filter = filter.map(|pattern| pattern.to_lowercase());

	let mut entries = Vec::new();
	for id in store.all_ids() {
		let Some(node) = store.get_raw(id) else {
			if kind.is_none() && filter.is_none() {
				entries.push(EntryJson {
					id,
					kind: "undecoded",
					name: None,
					size: None,
				});
			}
			continue;
		};
		let label = node.kind_label();
		if let Some(wanted) = kind.as_deref() {
			if label != wanted {
				continue;
			}
		}
		if let Some(pattern) = filter.as_deref() {
			let matches = node
				.definition_name()
				.is_some_and(|name| name.to_lowercase().contains(pattern));
			if !matches {
				continue;
			}
		}
		entries.push(EntryJson {
			id,
			kind: label,
			name: node.definition_name().map(str::to_owned),
			size: resolved_size(&mut resolver, id, node),
		});
	}

	if json {
		emit_json(&ListJson {
			path: path.display().to_string(),
			records: store.len(),
			entries,
		});
		return Ok(());
	}

	print_diagnostics(&diagnostics);
	println!("path: {}", path.display());
	println!("records: {}", store.len());
	for entry in entries {
		let name = entry.name.as_deref().unwrap_or("");
		match entry.size {
			Some(size) => println!("  {}: {} {} (size={size:#x})", entry.id, entry.kind, name),
			None => println!("  {}: {} {}", entry.id, entry.kind, name),
		}
	}

	Ok(())
}

/// Resolved sizes are reported for complete aggregate definitions only;
/// forward references and non-aggregate records have none worth listing.
fn resolved_size(resolver: &mut LayoutResolver<'_>, id: u32, node: &TypeNode) -> Option<u32> {
	match node {
		TypeNode::Aggregate(agg) if !agg.is_forward_reference => Some(resolver.resolve(id).size),
		_ => None,
	}
}

#[derive(serde::Serialize)]
struct EntryJson {
	id: u32,
	kind: &'static str,
	name: Option<String>,
	size: Option<u32>,
}

#[derive(serde::Serialize)]
struct ListJson {
	path: String,
	records: usize,
	entries: Vec<EntryJson>,
}
