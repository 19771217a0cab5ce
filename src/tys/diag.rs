use std::fmt;

use crate::tys::TypeId;

/// Structured reason for one recoverable reconstruction anomaly.
///
/// No diagnostic aborts a session; each one accompanies best-effort output
/// (a skipped record, a placeholder forward declaration, a first-wins
/// offset) so a partially malformed stream still yields maximal usable
/// reconstruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
	/// A referenced id does not resolve to a decoded record. A placeholder
	/// forward declaration is emitted at the reference site.
	UnresolvedReference {
		/// The id that failed to resolve.
		target: TypeId,
	},
	/// A single record failed to decode and was skipped; siblings are still
	/// processed.
	MalformedRecord {
		/// Human-readable decode failure reason.
		reason: Box<str>,
	},
	/// A primitive record carried an unknown kind code and was decoded with
	/// the minimal-size spelling for its byte size.
	UnknownPrimitive {
		/// Unrecognized primitive kind code.
		code: u8,
	},
	/// Two non-union instance members claimed overlapping offsets. The first
	/// claim wins; the conflicting member falls back to the computed cursor.
	LayoutOverlap {
		/// Name of the conflicting member, when it has one.
		member: Option<Box<str>>,
		/// Offset claimed by the conflicting member.
		claimed_offset: u32,
	},
	/// A by-value membership cycle was detected while resolving layout; the
	/// declared record size is used instead.
	LayoutCycle,
	/// The nested definition depth limit was reached during synthesis; the
	/// definition was truncated to a forward reference.
	DepthExceeded {
		/// Configured depth ceiling.
		limit: u32,
	},
}

/// One recoverable anomaly, attributed to the record being processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
	/// Id of the record that was being processed when the anomaly surfaced.
	pub type_id: TypeId,
	/// Structured anomaly reason.
	pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.kind {
			DiagnosticKind::UnresolvedReference { target } => {
				write!(f, "record {}: unresolved reference to id {target}", self.type_id)
			}
			DiagnosticKind::MalformedRecord { reason } => {
				write!(f, "record {}: malformed record: {reason}", self.type_id)
			}
			DiagnosticKind::UnknownPrimitive { code } => {
				write!(f, "record {}: unknown primitive kind code {code:#04x}", self.type_id)
			}
			DiagnosticKind::LayoutOverlap { member, claimed_offset } => write!(
				f,
				"record {}: member {} claims overlapping offset {claimed_offset:#x}",
				self.type_id,
				member.as_deref().unwrap_or("<anonymous>"),
			),
			DiagnosticKind::LayoutCycle => {
				write!(f, "record {}: by-value layout cycle, using declared size", self.type_id)
			}
			DiagnosticKind::DepthExceeded { limit } => {
				write!(f, "record {}: nested definition depth limit {limit} exceeded", self.type_id)
			}
		}
	}
}

impl Diagnostic {
	/// Stable lowercase label for the diagnostic kind.
	pub fn kind_label(&self) -> &'static str {
		match self.kind {
			DiagnosticKind::UnresolvedReference { .. } => "unresolved_reference",
			DiagnosticKind::MalformedRecord { .. } => "malformed_record",
			DiagnosticKind::UnknownPrimitive { .. } => "unknown_primitive",
			DiagnosticKind::LayoutOverlap { .. } => "layout_overlap",
			DiagnosticKind::LayoutCycle => "layout_cycle",
			DiagnosticKind::DepthExceeded { .. } => "depth_exceeded",
		}
	}
}
