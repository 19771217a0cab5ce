#![allow(missing_docs, dead_code)]

use tydoc::tys::{
	AGG_FLAG_NESTED_ANONYMOUS, KIND_AGGREGATE, KIND_ARRAY, KIND_ENUM, KIND_MODIFIER, KIND_POINTER, KIND_PRIMITIVE, KIND_PROCEDURE,
	MEMBER_FLAG_BITFIELD, MEMBER_FLAG_DECLARED_OFFSET, MEMBER_FLAG_STATIC,
};

/// Builds wire-format type streams record by record, returning ids as it goes.
pub struct StreamBuilder {
	records: Vec<(u8, Vec<u8>)>,
}

/// One member entry for [`StreamBuilder::aggregate`].
pub struct MemberSpec {
	pub name: Option<&'static str>,
	pub type_id: u32,
	pub access: u8,
	pub is_static: bool,
	pub declared_offset: Option<u32>,
	pub bit_width: Option<u8>,
}

impl MemberSpec {
	pub fn field(name: &'static str, type_id: u32) -> Self {
		Self {
			name: Some(name),
			type_id,
			access: 0,
			is_static: false,
			declared_offset: None,
			bit_width: None,
		}
	}

	pub fn bitfield(name: &'static str, type_id: u32, width: u8) -> Self {
		Self {
			bit_width: Some(width),
			..Self::field(name, type_id)
		}
	}

	pub fn anonymous(type_id: u32) -> Self {
		Self {
			name: None,
			..Self::field("", type_id)
		}
	}

	pub fn with_access(mut self, access: u8) -> Self {
		self.access = access;
		self
	}

	pub fn at_offset(mut self, offset: u32) -> Self {
		self.declared_offset = Some(offset);
		self
	}

	pub fn statik(mut self) -> Self {
		self.is_static = true;
		self
	}
}

impl StreamBuilder {
	pub fn new() -> Self {
		Self { records: Vec::new() }
	}

	pub fn push(&mut self, kind: u8, payload: Vec<u8>) -> u32 {
		self.records.push((kind, payload));
		(self.records.len() - 1) as u32
	}

	pub fn primitive(&mut self, code: u8, size: u8) -> u32 {
		self.push(KIND_PRIMITIVE, vec![code, size])
	}

	pub fn pointer(&mut self, target: u32, flags: u8, width: u8) -> u32 {
		let mut payload = target.to_le_bytes().to_vec();
		payload.push(flags);
		payload.push(width);
		self.push(KIND_POINTER, payload)
	}

	pub fn array(&mut self, element: u32, dims: &[u32]) -> u32 {
		let mut payload = element.to_le_bytes().to_vec();
		payload.push(dims.len() as u8);
		for dim in dims {
			payload.extend_from_slice(&dim.to_le_bytes());
		}
		self.push(KIND_ARRAY, payload)
	}

	pub fn enumeration(&mut self, underlying: u32, name: &str, items: &[(i64, &str)]) -> u32 {
		let mut payload = underlying.to_le_bytes().to_vec();
		push_cstr(&mut payload, name);
		payload.extend_from_slice(&(items.len() as u32).to_le_bytes());
		for (value, item_name) in items {
			payload.extend_from_slice(&value.to_le_bytes());
			push_cstr(&mut payload, item_name);
		}
		self.push(KIND_ENUM, payload)
	}

	pub fn modifier(&mut self, base: u32, flags: u8) -> u32 {
		let mut payload = base.to_le_bytes().to_vec();
		payload.push(flags);
		self.push(KIND_MODIFIER, payload)
	}

	pub fn procedure(&mut self, return_type: u32, call_conv: u8, args: &[u32]) -> u32 {
		let mut payload = return_type.to_le_bytes().to_vec();
		payload.push(call_conv);
		payload.extend_from_slice(&(args.len() as u16).to_le_bytes());
		for arg in args {
			payload.extend_from_slice(&arg.to_le_bytes());
		}
		self.push(KIND_PROCEDURE, payload)
	}

	pub fn aggregate(&mut self, kind: u8, flags: u8, declared_size: u32, name: &str, bases: &[(u32, u32, u8)], members: &[MemberSpec]) -> u32 {
		let mut payload = vec![kind, flags];
		payload.extend_from_slice(&declared_size.to_le_bytes());
		push_cstr(&mut payload, name);

		payload.extend_from_slice(&(bases.len() as u16).to_le_bytes());
		for (type_id, offset, access) in bases {
			payload.extend_from_slice(&type_id.to_le_bytes());
			payload.extend_from_slice(&offset.to_le_bytes());
			payload.push(*access);
		}

		payload.extend_from_slice(&(members.len() as u32).to_le_bytes());
		for member in members {
			let mut flags = 0_u8;
			if member.is_static {
				flags |= MEMBER_FLAG_STATIC;
			}
			if member.bit_width.is_some() {
				flags |= MEMBER_FLAG_BITFIELD;
			}
			if member.declared_offset.is_some() {
				flags |= MEMBER_FLAG_DECLARED_OFFSET;
			}
			payload.push(flags);
			payload.push(member.access);
			payload.extend_from_slice(&member.type_id.to_le_bytes());
			push_cstr(&mut payload, member.name.unwrap_or(""));
			if let Some(offset) = member.declared_offset {
				payload.extend_from_slice(&offset.to_le_bytes());
			}
			if let Some(width) = member.bit_width {
				payload.push(width);
			}
		}

		self.push(KIND_AGGREGATE, payload)
	}

	pub fn anonymous_union(&mut self, members: &[MemberSpec]) -> u32 {
		self.aggregate(2, AGG_FLAG_NESTED_ANONYMOUS, 0, "", &[], members)
	}

	pub fn anonymous_struct(&mut self, members: &[MemberSpec]) -> u32 {
		self.aggregate(0, AGG_FLAG_NESTED_ANONYMOUS, 0, "", &[], members)
	}

	pub fn build(&self) -> Vec<u8> {
		let mut out = Vec::new();
		out.extend_from_slice(b"TYS1");
		out.extend_from_slice(&1_u16.to_le_bytes());
		out.extend_from_slice(&0_u16.to_le_bytes());
		out.extend_from_slice(&(self.records.len() as u32).to_le_bytes());
		for (kind, payload) in &self.records {
			out.push(*kind);
			out.push(0);
			out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
			out.extend_from_slice(payload);
		}
		out
	}
}

fn push_cstr(payload: &mut Vec<u8>, text: &str) {
	payload.extend_from_slice(text.as_bytes());
	payload.push(0);
}

/// Primitive kind code for `uint8_t`.
pub const PRIM_U8: u8 = 0x04;
/// Primitive kind code for `uint16_t`.
pub const PRIM_U16: u8 = 0x06;
/// Primitive kind code for `int32_t`.
pub const PRIM_I32: u8 = 0x07;
/// Primitive kind code for `uint32_t`.
pub const PRIM_U32: u8 = 0x08;
/// Primitive kind code for `uint64_t`.
pub const PRIM_U64: u8 = 0x0A;
/// Primitive kind code for `void`.
pub const PRIM_VOID: u8 = 0x00;
