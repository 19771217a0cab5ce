use std::path::PathBuf;

use tydoc::tys::{BitfieldUnitBreak, Diagnostic, ReconstructOptions, ReconstructResult, Result, TypeStore, TypeStreamFile};

use crate::cmd::util::{DiagnosticJson, diagnostics_json, emit_json, print_diagnostics};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long = "no-offsets")]
	pub no_offsets: bool,
	#[arg(long = "no-statics")]
	pub no_statics: bool,
	#[arg(long = "depth-limit")]
	pub depth_limit: Option<u32>,
	#[arg(long = "pointer-width")]
	pub pointer_width: Option<u8>,
	#[arg(long = "gcc-bitfields")]
	pub gcc_bitfields: bool,
	#[arg(long)]
	pub json: bool,
}

/// Reconstruct every named definition in the stream.
pub fn run(args: Args) -> Result<()> {
	let Args {
		path,
		no_offsets,
		no_statics,
		depth_limit,
		pointer_width,
		gcc_bitfields,
		json,
	} = args;

	let stream = TypeStreamFile::open(&path)?;
	let (store, decode_diagnostics) = TypeStore::from_file(&stream)?;
	let options = build_options(no_offsets, no_statics, depth_limit, pointer_width, gcc_bitfields);
	let result = tydoc::tys::reconstruct_stream(&store, &options)?;

	if json {
		emit_json(&DumpJson::new(&path, &decode_diagnostics, &result));
		return Ok(());
	}

	print_diagnostics(&decode_diagnostics);
	print_diagnostics(&result.diagnostics);
	print!("{}", result.output);
	Ok(())
}

pub(crate) fn build_options(
	no_offsets: bool,
	no_statics: bool,
	depth_limit: Option<u32>,
	pointer_width: Option<u8>,
	gcc_bitfields: bool,
) -> ReconstructOptions {
	let mut options = ReconstructOptions {
		emit_offset_comments: !no_offsets,
		include_static_members: !no_statics,
		..ReconstructOptions::default()
	};
	if let Some(limit) = depth_limit {
		options.nested_depth_limit = limit;
	}
	if let Some(width) = pointer_width {
		options.layout.pointer_width = width;
	}
	if gcc_bitfields {
		options.layout.bitfield_unit_break = BitfieldUnitBreak::OnOverflowOnly;
	}
	options
}

#[derive(serde::Serialize)]
struct DumpJson {
	path: String,
	rendered: Vec<String>,
	output: String,
	diagnostics: Vec<DiagnosticJson>,
}

impl DumpJson {
	fn new(path: &PathBuf, decode_diagnostics: &[Diagnostic], result: &ReconstructResult) -> Self {
		let mut diagnostics = diagnostics_json(decode_diagnostics);
		diagnostics.extend(diagnostics_json(&result.diagnostics));
		Self {
			path: path.display().to_string(),
			rendered: result.rendered.clone(),
			output: result.output.clone(),
			diagnostics,
		}
	}
}
