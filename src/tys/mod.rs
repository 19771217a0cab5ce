mod bytes;
mod compression;
mod decode;
mod diag;
mod diffing;
mod error;
mod file;
mod layout;
mod node;
mod record;
mod session;
mod store;
mod synth;

/// Compression detection result.
pub use compression::Compression;
/// Record payload flag constants.
pub use decode::{
	AGG_FLAG_FORWARD_REFERENCE, AGG_FLAG_NESTED_ANONYMOUS, AGG_FLAG_VTABLE, MEMBER_FLAG_BITFIELD, MEMBER_FLAG_DECLARED_OFFSET,
	MEMBER_FLAG_STATIC, PTR_FLAG_CONST, PTR_FLAG_REFERENCE, PTR_FLAG_VOLATILE,
};
/// Recoverable anomaly reporting types.
pub use diag::{Diagnostic, DiagnosticKind};
/// Reconstruction diffing types and entry points.
pub use diffing::{DiffChange, DiffIndices, DiffResult, diff_stream, diff_type};
/// Error and result aliases.
pub use error::{Result, TysError};
/// File abstraction and record statistics.
pub use file::{RecordStats, TypeStreamFile};
/// Layout resolution types and entry points.
pub use layout::{
	AggregateLayout, BaseSlot, BitfieldSlot, BitfieldUnitBreak, FieldSlot, GroupSlot, LayoutOptions, LayoutResolver, ResolvedMember,
};
/// Decoded type graph node types.
pub use node::{Access, Aggregate, AggregateKind, BaseClass, CallConv, Enumerator, Member, PrimitiveKind, TypeId, TypeNode};
/// Stream framing types and record kind codes.
pub use record::{
	KIND_AGGREGATE, KIND_ARRAY, KIND_ENUM, KIND_MODIFIER, KIND_POINTER, KIND_PRIMITIVE, KIND_PROCEDURE, RawRecord, RecordIter,
	StreamHeader,
};
/// Reconstruction session options and entry points.
pub use session::{ReconstructOptions, ReconstructResult, reconstruct_stream, reconstruct_type};
/// Indexed record store.
pub use store::TypeStore;
