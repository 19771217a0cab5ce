use crate::tys::bytes::Cursor;
use crate::tys::record::{
	KIND_AGGREGATE, KIND_ARRAY, KIND_ENUM, KIND_MODIFIER, KIND_POINTER, KIND_PRIMITIVE, KIND_PROCEDURE, RawRecord,
};
use crate::tys::{
	Access, Aggregate, AggregateKind, BaseClass, CallConv, Diagnostic, DiagnosticKind, Enumerator, Member, PrimitiveKind, TypeNode,
};

/// Aggregate flag: virtual members present, implicit vtable slot.
pub const AGG_FLAG_VTABLE: u8 = 0x01;
/// Aggregate flag: anonymous nested aggregate, inlined into its parent.
pub const AGG_FLAG_NESTED_ANONYMOUS: u8 = 0x02;
/// Aggregate flag: declaration-only forward reference.
pub const AGG_FLAG_FORWARD_REFERENCE: u8 = 0x04;

/// Member flag: static storage class.
pub const MEMBER_FLAG_STATIC: u8 = 0x01;
/// Member flag: bitfield member, payload carries a bit width.
pub const MEMBER_FLAG_BITFIELD: u8 = 0x02;
/// Member flag: payload carries a declared byte offset.
pub const MEMBER_FLAG_DECLARED_OFFSET: u8 = 0x04;

/// Pointer flag: `const` pointee.
pub const PTR_FLAG_CONST: u8 = 0x01;
/// Pointer flag: `volatile` pointee.
pub const PTR_FLAG_VOLATILE: u8 = 0x02;
/// Pointer flag: C++ reference.
pub const PTR_FLAG_REFERENCE: u8 = 0x04;

type DecodeResult = std::result::Result<TypeNode, Box<str>>;

/// Decode one raw record into its typed node.
///
/// Decode failures never abort the pass: a malformed record produces a
/// diagnostic and `None`, and siblings are still processed. References stay
/// symbolic [`crate::tys::TypeId`] edges, so decoding needs no second pass
/// and never recurses, even for self-referential records.
pub(crate) fn decode_record(record: &RawRecord<'_>, diagnostics: &mut Vec<Diagnostic>) -> Option<TypeNode> {
	let mut cursor = Cursor::new(record.payload);
	let decoded = match record.kind {
		KIND_PRIMITIVE => decode_primitive(record, &mut cursor, diagnostics),
		KIND_POINTER => decode_pointer(&mut cursor),
		KIND_ARRAY => decode_array(&mut cursor),
		KIND_ENUM => decode_enum(&mut cursor),
		KIND_MODIFIER => decode_modifier(&mut cursor),
		KIND_PROCEDURE => decode_procedure(&mut cursor),
		KIND_AGGREGATE => decode_aggregate(&mut cursor),
		other => Err(format!("unknown record kind {other:#04x}").into()),
	};

	match decoded {
		Ok(node) => Some(node),
		Err(reason) => {
			diagnostics.push(Diagnostic {
				type_id: record.id,
				kind: DiagnosticKind::MalformedRecord { reason },
			});
			None
		}
	}
}

fn decode_primitive(record: &RawRecord<'_>, cursor: &mut Cursor<'_>, diagnostics: &mut Vec<Diagnostic>) -> DecodeResult {
	let code = read_u8(cursor)?;
	let size = read_u8(cursor)?;
	let kind = match PrimitiveKind::from_code(code) {
		Some(kind) => kind,
		None => {
			// Unknown kind codes still decode, spelled by minimal size.
			diagnostics.push(Diagnostic {
				type_id: record.id,
				kind: DiagnosticKind::UnknownPrimitive { code },
			});
			PrimitiveKind::fallback_for_size(size)
		}
	};
	Ok(TypeNode::Primitive { kind, size })
}

fn decode_pointer(cursor: &mut Cursor<'_>) -> DecodeResult {
	let target = read_u32(cursor)?;
	let flags = read_u8(cursor)?;
	let width = read_u8(cursor)?;
	if width == 0 {
		return Err("pointer width 0".into());
	}

	Ok(TypeNode::Pointer {
		target,
		is_const: flags & PTR_FLAG_CONST != 0,
		is_volatile: flags & PTR_FLAG_VOLATILE != 0,
		is_reference: flags & PTR_FLAG_REFERENCE != 0,
		width,
	})
}

fn decode_array(cursor: &mut Cursor<'_>) -> DecodeResult {
	let element = read_u32(cursor)?;
	let dim_count = read_u8(cursor)?;
	if dim_count == 0 {
		return Err("array with no dimensions".into());
	}

	let mut dims = Vec::with_capacity(dim_count as usize);
	for _ in 0..dim_count {
		dims.push(read_u32(cursor)?);
	}

	Ok(TypeNode::Array { element, dims })
}

fn decode_enum(cursor: &mut Cursor<'_>) -> DecodeResult {
	let underlying = read_u32(cursor)?;
	let name = read_name(cursor)?;
	let count = read_u32(cursor)?;

	let mut enumerators = Vec::with_capacity(count.min(1024) as usize);
	for _ in 0..count {
		let value = cursor.read_i64().map_err(stringify)?;
		let name = cursor.read_cstring_lossy().map_err(stringify)?;
		enumerators.push(Enumerator { name, value });
	}

	Ok(TypeNode::Enum {
		name,
		underlying,
		enumerators,
	})
}

fn decode_modifier(cursor: &mut Cursor<'_>) -> DecodeResult {
	let base = read_u32(cursor)?;
	let flags = read_u8(cursor)?;
	Ok(TypeNode::Modifier {
		base,
		is_const: flags & 0x01 != 0,
		is_volatile: flags & 0x02 != 0,
	})
}

fn decode_procedure(cursor: &mut Cursor<'_>) -> DecodeResult {
	let return_type = read_u32(cursor)?;
	let conv_code = read_u8(cursor)?;
	let call_conv = CallConv::from_code(conv_code).ok_or_else(|| format!("unknown calling convention {conv_code}"))?;
	let arg_count = cursor.read_u16().map_err(stringify)?;

	let mut args = Vec::with_capacity(arg_count as usize);
	for _ in 0..arg_count {
		args.push(read_u32(cursor)?);
	}

	Ok(TypeNode::Procedure {
		return_type,
		call_conv,
		args,
	})
}

fn decode_aggregate(cursor: &mut Cursor<'_>) -> DecodeResult {
	let kind_code = read_u8(cursor)?;
	let kind = AggregateKind::from_code(kind_code).ok_or_else(|| format!("unknown aggregate kind {kind_code}"))?;
	let flags = read_u8(cursor)?;
	let declared_size = read_u32(cursor)?;
	let name = read_name(cursor)?;

	let is_forward_reference = flags & AGG_FLAG_FORWARD_REFERENCE != 0;
	if is_forward_reference && name.is_none() {
		return Err("unnamed forward reference".into());
	}

	let base_count = cursor.read_u16().map_err(stringify)?;
	let mut bases = Vec::with_capacity(base_count as usize);
	for _ in 0..base_count {
		let type_id = read_u32(cursor)?;
		let declared_offset = read_u32(cursor)?;
		let access = read_access(cursor)?;
		bases.push(BaseClass {
			type_id,
			declared_offset,
			access,
		});
	}

	let member_count = read_u32(cursor)?;
	let mut members = Vec::with_capacity(member_count.min(4096) as usize);
	for _ in 0..member_count {
		members.push(decode_member(cursor)?);
	}

	Ok(TypeNode::Aggregate(Aggregate {
		kind,
		name,
		declared_size,
		vtable_present: flags & AGG_FLAG_VTABLE != 0,
		is_nested_anonymous: flags & AGG_FLAG_NESTED_ANONYMOUS != 0,
		is_forward_reference,
		bases,
		members,
	}))
}

fn decode_member(cursor: &mut Cursor<'_>) -> std::result::Result<Member, Box<str>> {
	let flags = read_u8(cursor)?;
	let access = read_access(cursor)?;
	let type_id = read_u32(cursor)?;
	let name = read_name(cursor)?;

	let is_static = flags & MEMBER_FLAG_STATIC != 0;
	let is_bitfield = flags & MEMBER_FLAG_BITFIELD != 0;
	if is_static && is_bitfield {
		return Err("member is both static and bitfield".into());
	}

	let declared_offset = if flags & MEMBER_FLAG_DECLARED_OFFSET != 0 {
		Some(read_u32(cursor)?)
	} else {
		None
	};
	let bit_width = if is_bitfield { Some(read_u8(cursor)?) } else { None };

	Ok(Member {
		name,
		type_id,
		access,
		is_static,
		declared_offset,
		bit_width,
	})
}

fn read_access(cursor: &mut Cursor<'_>) -> std::result::Result<Access, Box<str>> {
	let code = read_u8(cursor)?;
	Access::from_code(code).ok_or_else(|| format!("unknown access code {code}").into())
}

fn read_name(cursor: &mut Cursor<'_>) -> std::result::Result<Option<Box<str>>, Box<str>> {
	let name = cursor.read_cstring_lossy().map_err(stringify)?;
	Ok(if name.is_empty() { None } else { Some(name) })
}

fn read_u8(cursor: &mut Cursor<'_>) -> std::result::Result<u8, Box<str>> {
	cursor.read_u8().map_err(stringify)
}

fn read_u32(cursor: &mut Cursor<'_>) -> std::result::Result<u32, Box<str>> {
	cursor.read_u32().map_err(stringify)
}

fn stringify(err: crate::tys::TysError) -> Box<str> {
	err.to_string().into()
}
