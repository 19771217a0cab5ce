use tydoc::tys::{
	Diagnostic, KIND_AGGREGATE, KIND_ARRAY, KIND_ENUM, KIND_MODIFIER, KIND_POINTER, KIND_PRIMITIVE, KIND_PROCEDURE,
};

/// Stable label for a record kind code.
pub(crate) fn kind_label(kind: u8) -> &'static str {
	match kind {
		KIND_PRIMITIVE => "primitive",
		KIND_POINTER => "pointer",
		KIND_ARRAY => "array",
		KIND_ENUM => "enum",
		KIND_MODIFIER => "modifier",
		KIND_PROCEDURE => "procedure",
		KIND_AGGREGATE => "aggregate",
		_ => "unknown",
	}
}

/// Serialize and print a payload as pretty JSON.
pub(crate) fn emit_json<T: serde::Serialize>(payload: &T) {
	match serde_json::to_string_pretty(payload) {
		Ok(text) => println!("{text}"),
		Err(err) => eprintln!("error: json serialization failed: {err}"),
	}
}

#[derive(serde::Serialize)]
pub(crate) struct DiagnosticJson {
	pub record: u32,
	pub kind: &'static str,
	pub message: String,
}

pub(crate) fn diagnostics_json(diagnostics: &[Diagnostic]) -> Vec<DiagnosticJson> {
	diagnostics
		.iter()
		.map(|diag| DiagnosticJson {
			record: diag.type_id,
			kind: diag.kind_label(),
			message: diag.to_string(),
		})
		.collect()
}

/// Print diagnostics to stderr in the plain-text output modes.
pub(crate) fn print_diagnostics(diagnostics: &[Diagnostic]) {
	for diag in diagnostics {
		eprintln!("warning: {diag}");
	}
}
