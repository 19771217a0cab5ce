use std::fmt::Write as _;

use similar::{ChangeTag, TextDiff};

use crate::tys::session::{ReconstructOptions, ReconstructResult, reconstruct_stream, reconstruct_type};
use crate::tys::{Diagnostic, Result, TypeStore, TysError};

/// Change tag of one diff line.
pub type DiffChange = ChangeTag;
/// Line indices into the from-side and to-side reconstructions.
pub type DiffIndices = (Option<usize>, Option<usize>);

/// Line-by-line difference between two reconstructions.
#[derive(Debug)]
pub struct DiffResult {
	/// Diff text: one line per reconstructed line, prefixed with `+`, `-`,
	/// or a space.
	pub output: String,
	/// Per-line source indices and change tags, in output order.
	pub metadata: Vec<(DiffIndices, DiffChange)>,
	/// Diagnostics from both reconstructions, from-side first.
	pub diagnostics: Vec<Diagnostic>,
}

/// Diff one named definition between two stores.
///
/// A name present on only one side diffs against an empty reconstruction,
/// so an added or removed type shows up as pure insertions or deletions. A
/// name absent from both sides is an error.
pub fn diff_type(from: &TypeStore, to: &TypeStore, name: &str, options: &ReconstructOptions) -> Result<DiffResult> {
	let from_side = reconstruct_if_present(from, name, options)?;
	let to_side = reconstruct_if_present(to, name, options)?;
	if from_side.is_none() && to_side.is_none() {
		return Err(TysError::TypeNotFound { name: name.to_owned() });
	}

	let (from_text, mut diagnostics) = split_side(from_side);
	let (to_text, to_diagnostics) = split_side(to_side);
	diagnostics.extend(to_diagnostics);
	diff_outputs(&from_text, &to_text, diagnostics)
}

/// Diff the full reconstructions of two streams.
pub fn diff_stream(from: &TypeStore, to: &TypeStore, options: &ReconstructOptions) -> Result<DiffResult> {
	let from_result = reconstruct_stream(from, options)?;
	let to_result = reconstruct_stream(to, options)?;

	let mut diagnostics = from_result.diagnostics;
	diagnostics.extend(to_result.diagnostics);
	diff_outputs(&from_result.output, &to_result.output, diagnostics)
}

fn reconstruct_if_present(store: &TypeStore, name: &str, options: &ReconstructOptions) -> Result<Option<ReconstructResult>> {
	if store.find_by_name(name).is_none() {
		return Ok(None);
	}
	reconstruct_type(store, name, options).map(Some)
}

fn split_side(side: Option<ReconstructResult>) -> (String, Vec<Diagnostic>) {
	match side {
		Some(result) => (result.output, result.diagnostics),
		None => (String::new(), Vec::new()),
	}
}

fn diff_outputs(from_text: &str, to_text: &str, diagnostics: Vec<Diagnostic>) -> Result<DiffResult> {
	let diff = TextDiff::from_lines(from_text, to_text);
	let mut output = String::new();
	let mut metadata = Vec::new();

	for change in diff.iter_all_changes() {
		metadata.push(((change.old_index(), change.new_index()), change.tag()));
		let prefix = match change.tag() {
			ChangeTag::Insert => "+",
			ChangeTag::Delete => "-",
			ChangeTag::Equal => " ",
		};
		write!(output, "{prefix}{change}")?;
	}

	Ok(DiffResult {
		output,
		metadata,
		diagnostics,
	})
}
