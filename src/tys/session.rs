use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::tys::layout::LayoutOptions;
use crate::tys::synth::Synthesizer;
use crate::tys::{Diagnostic, Result, TypeNode, TypeStore, TysError};

/// Options controlling a reconstruction pass.
#[derive(Debug, Clone)]
pub struct ReconstructOptions {
	/// Annotate instance members with their resolved byte offsets and
	/// aggregates with their resolved sizes.
	pub emit_offset_comments: bool,
	/// Render static data members (they never occupy layout space).
	pub include_static_members: bool,
	/// Recursion bound for dependency expansion; deeper chains truncate to
	/// forward declarations.
	pub nested_depth_limit: u32,
	/// Layout resolution options.
	pub layout: LayoutOptions,
	/// Cooperative cancellation flag, checked between top-level types.
	pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for ReconstructOptions {
	fn default() -> Self {
		Self {
			emit_offset_comments: true,
			include_static_members: true,
			nested_depth_limit: 32,
			layout: LayoutOptions::default(),
			cancel: None,
		}
	}
}

impl ReconstructOptions {
	fn cancelled(&self) -> bool {
		self.cancel.as_ref().is_some_and(|flag| flag.load(Ordering::Relaxed))
	}
}

/// Outcome of a reconstruction pass.
#[derive(Debug)]
pub struct ReconstructResult {
	/// Reconstructed declaration text.
	pub output: String,
	/// Names of the definitions rendered, in emission order.
	pub rendered: Vec<String>,
	/// Recoverable problems encountered while resolving and rendering.
	pub diagnostics: Vec<Diagnostic>,
}

/// Reconstruct declarations for every named definition in the store, in
/// stream order, dependencies first.
pub fn reconstruct_stream(store: &TypeStore, options: &ReconstructOptions) -> Result<ReconstructResult> {
	let mut synth = Synthesizer::new(store, options);

	for id in store.all_ids() {
		if options.cancelled() {
			return Err(TysError::Cancelled);
		}
		if is_top_level(store, id) {
			synth.render_top_level(id)?;
		}
	}

	let (output, rendered, diagnostics) = synth.finish();
	Ok(ReconstructResult {
		output,
		rendered,
		diagnostics,
	})
}

/// Reconstruct the named definition and its dependencies.
pub fn reconstruct_type(store: &TypeStore, name: &str, options: &ReconstructOptions) -> Result<ReconstructResult> {
	let id = store.find_by_name(name).ok_or_else(|| TysError::TypeNotFound {
		name: name.to_owned(),
	})?;

	let mut synth = Synthesizer::new(store, options);
	synth.render_top_level(id)?;

	let (output, rendered, diagnostics) = synth.finish();
	Ok(ReconstructResult {
		output,
		rendered,
		diagnostics,
	})
}

/// Whether a record starts a definition of its own. Anonymous nested
/// aggregates are inlined into their parents, and forward references render
/// only when their name never resolves.
fn is_top_level(store: &TypeStore, id: crate::tys::TypeId) -> bool {
	match store.get_raw(id) {
		Some(TypeNode::Enum { name, .. }) => name.is_some(),
		Some(TypeNode::Aggregate(agg)) => {
			if agg.is_nested_anonymous || agg.name.is_none() {
				return false;
			}
			if agg.is_forward_reference {
				// Dangling declarations surface as opaque forward decls;
				// ones with a complete definition are folded into it.
				return store.resolve_complete(id) == id;
			}
			true
		}
		_ => false,
	}
}
