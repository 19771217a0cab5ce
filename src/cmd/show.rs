use std::path::PathBuf;

use tydoc::tys::{Result, TypeStore, TypeStreamFile};

use crate::cmd::dump::build_options;
use crate::cmd::util::{DiagnosticJson, diagnostics_json, emit_json, print_diagnostics};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long)]
	pub name: String,
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

/// Reconstruct one named definition and its dependencies.
pub fn run(args: Args) -> Result<()> {
	let Args {
		path,
		name,
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
	let result = tydoc::tys::reconstruct_type(&store, &name, &options)?;

	if json {
		let mut diagnostics = diagnostics_json(&decode_diagnostics);
		diagnostics.extend(diagnostics_json(&result.diagnostics));
		emit_json(&ShowJson {
			path: path.display().to_string(),
			name,
			rendered: result.rendered,
			output: result.output,
			diagnostics,
		});
		return Ok(());
	}

	print_diagnostics(&decode_diagnostics);
	print_diagnostics(&result.diagnostics);
	print!("{}", result.output);
	Ok(())
}

#[derive(serde::Serialize)]
struct ShowJson {
	path: String,
	name: String,
	rendered: Vec<String>,
	output: String,
	diagnostics: Vec<DiagnosticJson>,
}
