use std::path::PathBuf;

use tydoc::tys::{Diagnostic, Result, TypeStore, TypeStreamFile};

use crate::cmd::dump::build_options;
use crate::cmd::util::{DiagnosticJson, diagnostics_json, emit_json, print_diagnostics};

#[derive(clap::Args)]
pub struct Args {
	pub from_path: PathBuf,
	pub to_path: PathBuf,
	#[arg(long)]
	pub name: Option<String>,
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

/// Diff reconstructed declarations between two streams, either one named
/// type or the full output.
pub fn run(args: Args) -> Result<()> {
	let Args {
		from_path,
		to_path,
		name,
		no_offsets,
		no_statics,
		depth_limit,
		pointer_width,
		gcc_bitfields,
		json,
	} = args;

	let (from_store, mut decode_diagnostics) = open_store(&from_path)?;
	let (to_store, to_decode) = open_store(&to_path)?;
	decode_diagnostics.extend(to_decode);

	let options = build_options(no_offsets, no_statics, depth_limit, pointer_width, gcc_bitfields);
	let result = match name.as_deref() {
		Some(name) => tydoc::tys::diff_type(&from_store, &to_store, name, &options)?,
		None => tydoc::tys::diff_stream(&from_store, &to_store, &options)?,
	};

	if json {
		let mut diagnostics = diagnostics_json(&decode_diagnostics);
		diagnostics.extend(diagnostics_json(&result.diagnostics));
		emit_json(&DiffJson {
			from: from_path.display().to_string(),
			to: to_path.display().to_string(),
			name,
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

fn open_store(path: &PathBuf) -> Result<(TypeStore, Vec<Diagnostic>)> {
	let stream = TypeStreamFile::open(path)?;
	TypeStore::from_file(&stream)
}

#[derive(serde::Serialize)]
struct DiffJson {
	from: String,
	to: String,
	name: Option<String>,
	output: String,
	diagnostics: Vec<DiagnosticJson>,
}
