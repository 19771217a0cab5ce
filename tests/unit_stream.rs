#![allow(missing_docs)]

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use common::{MemberSpec, PRIM_I32, PRIM_U32, PRIM_U64, StreamBuilder};
use tydoc::tys::{
	AGG_FLAG_FORWARD_REFERENCE, AGG_FLAG_VTABLE, Compression, DiagnosticKind, ReconstructOptions, TypeStore, TypeStreamFile,
	TysError, reconstruct_stream,
};

fn point_stream() -> StreamBuilder {
	let mut builder = StreamBuilder::new();
	let u32_id = builder.primitive(PRIM_U32, 4);
	builder.aggregate(
		0,
		0,
		0,
		"Point",
		&[],
		&[MemberSpec::field("x", u32_id), MemberSpec::field("y", u32_id)],
	);
	builder
}

#[test]
fn full_stream_decodes_and_reconstructs() {
	let bytes = point_stream().build();
	let stream = TypeStreamFile::from_bytes(bytes).expect("stream decodes");
	assert_eq!(stream.compression, Compression::None);
	assert_eq!(stream.header.record_count, 2);

	let (store, diagnostics) = TypeStore::from_file(&stream).expect("records decode");
	assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");

	let result = reconstruct_stream(&store, &ReconstructOptions::default()).expect("reconstruction runs");
	assert!(result.output.contains("struct Point { /* Size=0x8 */"), "got:\n{}", result.output);
	assert!(result.output.contains("/* 0x0000 */ uint32_t x;"), "got:\n{}", result.output);
	assert!(result.output.contains("/* 0x0004 */ uint32_t y;"), "got:\n{}", result.output);
}

#[test]
fn zstd_compressed_stream_roundtrips() {
	let raw = point_stream().build();
	let compressed = zstd::encode_all(&raw[..], 3).expect("zstd encodes");

	let stream = TypeStreamFile::from_bytes(compressed).expect("compressed stream decodes");
	assert_eq!(stream.compression, Compression::Zstd);
	assert_eq!(stream.bytes(), &raw[..]);

	let (store, _) = TypeStore::from_file(&stream).expect("records decode");
	let result = reconstruct_stream(&store, &ReconstructOptions::default()).expect("reconstruction runs");
	assert!(result.output.contains("struct Point {"), "got:\n{}", result.output);
}

#[test]
fn malformed_record_is_skipped_with_diagnostic() {
	let mut builder = StreamBuilder::new();
	let u32_id = builder.primitive(PRIM_U32, 4);
	// Primitive payload needs two bytes; one byte cannot decode.
	let bad_id = builder.push(0x01, vec![0x07]);
	builder.aggregate(0, 0, 0, "Survivor", &[], &[MemberSpec::field("value", u32_id)]);

	let stream = TypeStreamFile::from_bytes(builder.build()).expect("framing is intact");
	let (store, diagnostics) = TypeStore::from_file(&stream).expect("decode pass completes");

	assert_eq!(store.len(), 3, "record slots must not shift");
	assert!(store.get_raw(bad_id).is_none());
	assert!(
		diagnostics
			.iter()
			.any(|diag| diag.type_id == bad_id && matches!(diag.kind, DiagnosticKind::MalformedRecord { .. })),
		"expected malformed record diagnostic, got {diagnostics:?}"
	);

	let result = reconstruct_stream(&store, &ReconstructOptions::default()).expect("siblings still reconstruct");
	assert!(result.output.contains("struct Survivor {"), "got:\n{}", result.output);
}

#[test]
fn unknown_primitive_code_falls_back_to_sized_spelling() {
	let mut builder = StreamBuilder::new();
	let odd = builder.primitive(0x77, 4);
	builder.aggregate(0, 0, 0, "Odd", &[], &[MemberSpec::field("value", odd)]);

	let stream = TypeStreamFile::from_bytes(builder.build()).expect("stream decodes");
	let (store, diagnostics) = TypeStore::from_file(&stream).expect("decode pass completes");
	assert!(
		diagnostics
			.iter()
			.any(|diag| matches!(diag.kind, DiagnosticKind::UnknownPrimitive { code: 0x77 })),
		"expected unknown primitive diagnostic, got {diagnostics:?}"
	);

	let result = reconstruct_stream(&store, &ReconstructOptions::default()).expect("reconstruction runs");
	assert!(result.output.contains("uint32_t value;"), "got:\n{}", result.output);
}

#[test]
fn unknown_magic_is_fatal() {
	let err = TypeStreamFile::from_bytes(b"NOPE nonsense".to_vec()).expect_err("magic should fail");
	assert!(matches!(err, TysError::UnknownMagic { .. }), "unexpected: {err}");
}

#[test]
fn unsupported_version_is_fatal() {
	let mut bytes = point_stream().build();
	bytes[4] = 9;
	let err = TypeStreamFile::from_bytes(bytes).expect_err("version should fail");
	assert!(matches!(err, TysError::UnsupportedFormatVersion { version: 9 }), "unexpected: {err}");
}

#[test]
fn truncated_record_area_is_a_framing_error() {
	let mut bytes = point_stream().build();
	bytes.truncate(bytes.len() - 3);
	let stream = TypeStreamFile::from_bytes(bytes).expect("header still parses");
	let err = TypeStore::from_file(&stream).expect_err("truncated payload is fatal");
	assert!(
		matches!(err, TysError::RecordLenOutOfRange { .. } | TysError::UnexpectedEof { .. }),
		"unexpected: {err}"
	);
}

#[test]
fn cancellation_stops_between_top_level_types() {
	let bytes = point_stream().build();
	let stream = TypeStreamFile::from_bytes(bytes).expect("stream decodes");
	let (store, _) = TypeStore::from_file(&stream).expect("records decode");

	let cancel = Arc::new(AtomicBool::new(false));
	cancel.store(true, Ordering::Relaxed);
	let options = ReconstructOptions {
		cancel: Some(Arc::clone(&cancel)),
		..ReconstructOptions::default()
	};
	let err = reconstruct_stream(&store, &options).expect_err("cancelled run should abort");
	assert!(matches!(err, TysError::Cancelled), "unexpected: {err}");
}

#[test]
fn forward_reference_wire_records_resolve_to_definition() {
	let mut builder = StreamBuilder::new();
	let fwd = builder.aggregate(0, AGG_FLAG_FORWARD_REFERENCE, 0, "Node", &[], &[]);
	let ptr = builder.pointer(fwd, 0, 8);
	let i32_id = builder.primitive(PRIM_I32, 4);
	builder.aggregate(
		0,
		0,
		0,
		"Node",
		&[],
		&[MemberSpec::field("value", i32_id), MemberSpec::field("next", ptr)],
	);

	let stream = TypeStreamFile::from_bytes(builder.build()).expect("stream decodes");
	let (store, diagnostics) = TypeStore::from_file(&stream).expect("records decode");
	assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");

	let result = reconstruct_stream(&store, &ReconstructOptions::default()).expect("reconstruction runs");
	assert_eq!(result.output.matches("struct Node {").count(), 1, "got:\n{}", result.output);
	assert!(result.output.contains("Node* next;"), "got:\n{}", result.output);
}

#[test]
fn vtable_wire_flag_reserves_slot() {
	let mut builder = StreamBuilder::new();
	let i32_id = builder.primitive(PRIM_I32, 4);
	builder.aggregate(
		1,
		AGG_FLAG_VTABLE,
		0,
		"Widget",
		&[],
		&[MemberSpec::field("refcount", i32_id).with_access(3)],
	);

	let stream = TypeStreamFile::from_bytes(builder.build()).expect("stream decodes");
	let (store, _) = TypeStore::from_file(&stream).expect("records decode");
	let result = reconstruct_stream(&store, &ReconstructOptions::default()).expect("reconstruction runs");
	assert!(result.output.contains("/* vfptr */"), "got:\n{}", result.output);
	assert!(result.output.contains("/* 0x0008 */ int32_t refcount;"), "got:\n{}", result.output);
}

#[test]
fn anonymous_union_wire_layout_matches_named_member() {
	let mut builder = StreamBuilder::new();
	let u64_id = builder.primitive(PRIM_U64, 8);
	let anon = builder.anonymous_union(&[MemberSpec::field("as_int", u64_id), MemberSpec::field("as_bits", u64_id)]);
	builder.aggregate(
		0,
		0,
		0,
		"Value",
		&[],
		&[MemberSpec::anonymous(anon), MemberSpec::field("next", u64_id)],
	);

	let stream = TypeStreamFile::from_bytes(builder.build()).expect("stream decodes");
	let (store, _) = TypeStore::from_file(&stream).expect("records decode");
	let result = reconstruct_stream(&store, &ReconstructOptions::default()).expect("reconstruction runs");
	assert!(result.output.contains("union {"), "got:\n{}", result.output);
	assert!(result.output.contains("/* 0x0008 */ uint64_t next;"), "got:\n{}", result.output);
}

#[test]
fn enum_wire_records_keep_signed_values() {
	let mut builder = StreamBuilder::new();
	let i32_id = builder.primitive(PRIM_I32, 4);
	builder.enumeration(i32_id, "Level", &[(-1, "Unknown"), (0, "Info"), (10, "Fatal")]);

	let stream = TypeStreamFile::from_bytes(builder.build()).expect("stream decodes");
	let (store, _) = TypeStore::from_file(&stream).expect("records decode");
	let result = reconstruct_stream(&store, &ReconstructOptions::default()).expect("reconstruction runs");
	assert!(result.output.contains("enum Level : int32_t {"), "got:\n{}", result.output);
	assert!(result.output.contains("  Unknown = -1,"), "got:\n{}", result.output);
	assert!(result.output.contains("  Fatal = 10,"), "got:\n{}", result.output);
}
