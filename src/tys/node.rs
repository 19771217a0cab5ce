/// Stable numeric identifier of one type record within a stream.
///
/// Ids are assigned by record position and are unique per reconstruction
/// session. References between records use ids and may point forward, at the
/// referencing record itself, or at absent records.
pub type TypeId = u32;

/// Primitive kind table.
///
/// Two kinds can be bit-identical (`Long` vs `I32`, `LongDouble` vs `Double`)
/// but keep distinct spellings. The exact byte size always travels with the
/// record, independent of the spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
	/// `void`, only meaningful behind pointers or as a return type.
	Void,
	/// `bool`.
	Bool,
	/// Plain `char`, distinct from the explicitly sized 8-bit integers.
	Char,
	/// `int8_t`.
	I8,
	/// `uint8_t`.
	U8,
	/// `int16_t`.
	I16,
	/// `uint16_t`.
	U16,
	/// `int32_t`.
	I32,
	/// `uint32_t`.
	U32,
	/// `int64_t`.
	I64,
	/// `uint64_t`.
	U64,
	/// Platform `long`; usually 4 bytes but spelled distinctly from `int32_t`.
	Long,
	/// Platform `unsigned long`.
	ULong,
	/// `wchar_t`.
	WChar,
	/// `char16_t`.
	Char16,
	/// `char32_t`.
	Char32,
	/// `float`.
	Float,
	/// `double`.
	Double,
	/// `long double`; may be bit-identical to `double`.
	LongDouble,
	/// `__float80` extended precision spelling.
	Float80,
	/// Opaque handle type.
	Handle,
}

impl PrimitiveKind {
	/// Decode a primitive kind code from a record payload.
	pub fn from_code(code: u8) -> Option<Self> {
		Some(match code {
			0x00 => Self::Void,
			0x01 => Self::Bool,
			0x02 => Self::Char,
			0x03 => Self::I8,
			0x04 => Self::U8,
			0x05 => Self::I16,
			0x06 => Self::U16,
			0x07 => Self::I32,
			0x08 => Self::U32,
			0x09 => Self::I64,
			0x0A => Self::U64,
			0x0B => Self::Long,
			0x0C => Self::ULong,
			0x0D => Self::WChar,
			0x0E => Self::Char16,
			0x0F => Self::Char32,
			0x10 => Self::Float,
			0x11 => Self::Double,
			0x12 => Self::LongDouble,
			0x13 => Self::Float80,
			0x14 => Self::Handle,
			_ => return None,
		})
	}

	/// Source spelling for this kind.
	pub fn spelling(self) -> &'static str {
		match self {
			Self::Void => "void",
			Self::Bool => "bool",
			Self::Char => "char",
			Self::I8 => "int8_t",
			Self::U8 => "uint8_t",
			Self::I16 => "int16_t",
			Self::U16 => "uint16_t",
			Self::I32 => "int32_t",
			Self::U32 => "uint32_t",
			Self::I64 => "int64_t",
			Self::U64 => "uint64_t",
			Self::Long => "long",
			Self::ULong => "unsigned long",
			Self::WChar => "wchar_t",
			Self::Char16 => "char16_t",
			Self::Char32 => "char32_t",
			Self::Float => "float",
			Self::Double => "double",
			Self::LongDouble => "long double",
			Self::Float80 => "__float80",
			Self::Handle => "HANDLE",
		}
	}

	/// Conventional byte size, used when an encoder omits an explicit one.
	pub fn natural_size(self) -> u8 {
		match self {
			Self::Void => 0,
			Self::Bool | Self::Char | Self::I8 | Self::U8 => 1,
			Self::I16 | Self::U16 | Self::WChar | Self::Char16 => 2,
			Self::I32 | Self::U32 | Self::Long | Self::ULong | Self::Char32 | Self::Float => 4,
			Self::I64 | Self::U64 | Self::Double | Self::LongDouble | Self::Handle => 8,
			Self::Float80 => 10,
		}
	}

	/// Minimal-size integer kind used when a kind code is unknown.
	pub fn fallback_for_size(size: u8) -> Self {
		match size {
			0..=1 => Self::U8,
			2 => Self::U16,
			3..=4 => Self::U32,
			_ => Self::U64,
		}
	}
}

/// Member and base-class access level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
	/// No access recorded (C-style aggregates).
	None,
	/// `private`.
	Private,
	/// `protected`.
	Protected,
	/// `public`.
	Public,
}

impl Access {
	/// Decode an access code from a record payload.
	pub fn from_code(code: u8) -> Option<Self> {
		Some(match code {
			0 => Self::None,
			1 => Self::Private,
			2 => Self::Protected,
			3 => Self::Public,
			_ => return None,
		})
	}

	/// Source keyword, empty for [`Access::None`].
	pub fn keyword(self) -> &'static str {
		match self {
			Self::None => "",
			Self::Private => "private",
			Self::Protected => "protected",
			Self::Public => "public",
		}
	}
}

/// Aggregate flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
	/// `struct`.
	Struct,
	/// `class`.
	Class,
	/// `union`.
	Union,
}

impl AggregateKind {
	/// Decode an aggregate kind code from a record payload.
	pub fn from_code(code: u8) -> Option<Self> {
		Some(match code {
			0 => Self::Struct,
			1 => Self::Class,
			2 => Self::Union,
			_ => return None,
		})
	}

	/// Source keyword.
	pub fn keyword(self) -> &'static str {
		match self {
			Self::Struct => "struct",
			Self::Class => "class",
			Self::Union => "union",
		}
	}
}

/// Procedure calling convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallConv {
	/// Default `__cdecl`, rendered without a keyword.
	Cdecl,
	/// `__stdcall`.
	Stdcall,
	/// `__thiscall`.
	Thiscall,
	/// `__fastcall`.
	Fastcall,
}

impl CallConv {
	/// Decode a calling-convention code from a record payload.
	pub fn from_code(code: u8) -> Option<Self> {
		Some(match code {
			0 => Self::Cdecl,
			1 => Self::Stdcall,
			2 => Self::Thiscall,
			3 => Self::Fastcall,
			_ => return None,
		})
	}

	/// Source keyword, empty for the default convention.
	pub fn keyword(self) -> &'static str {
		match self {
			Self::Cdecl => "",
			Self::Stdcall => "__stdcall",
			Self::Thiscall => "__thiscall",
			Self::Fastcall => "__fastcall",
		}
	}
}

/// One member declaration inside an aggregate, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
	/// Member name; `None` for anonymous members (nested aggregates,
	/// zero-width bitfields).
	pub name: Option<Box<str>>,
	/// Member type reference.
	pub type_id: TypeId,
	/// Access level.
	pub access: Access,
	/// Static members carry no offset in the instance layout.
	pub is_static: bool,
	/// Byte offset claimed by the record, when present. The layout resolver
	/// validates it against its own cursor.
	pub declared_offset: Option<u32>,
	/// Bit width for bitfield members; `Some(0)` is a zero-width unit break.
	pub bit_width: Option<u8>,
}

/// One base class of an aggregate, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseClass {
	/// Base type reference.
	pub type_id: TypeId,
	/// Byte offset of the base subobject claimed by the record.
	pub declared_offset: u32,
	/// Inheritance access level.
	pub access: Access,
}

/// A struct/class/union-shaped record with members and possibly bases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
	/// Aggregate flavor.
	pub kind: AggregateKind,
	/// Tag name; `None` for unnamed aggregates.
	pub name: Option<Box<str>>,
	/// Byte size claimed by the record; 0 when unknown.
	pub declared_size: u32,
	/// Whether the aggregate has virtual members and carries a vtable.
	pub vtable_present: bool,
	/// Whether this is an anonymous nested aggregate, inlined into its
	/// parent at synthesis time and never independently nameable.
	pub is_nested_anonymous: bool,
	/// Whether this record is a declaration-only forward reference.
	pub is_forward_reference: bool,
	/// Base classes in declaration order.
	pub bases: Vec<BaseClass>,
	/// Members in declaration order.
	pub members: Vec<Member>,
}

/// One named enumerator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enumerator {
	/// Enumerator name.
	pub name: Box<str>,
	/// Enumerator value.
	pub value: i64,
}

/// Decoded in-memory form of one type record.
///
/// Nodes are created once during graph building and never mutated afterward;
/// all cross references are symbolic [`TypeId`] edges resolved through the
/// store, which is what makes self-referential records representable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeNode {
	/// Primitive type with exact byte size.
	Primitive {
		/// Kind controlling the spelling.
		kind: PrimitiveKind,
		/// Exact byte size, independent of the spelling.
		size: u8,
	},
	/// Pointer or C++ reference.
	Pointer {
		/// Pointee type.
		target: TypeId,
		/// `const` qualifier on the pointee.
		is_const: bool,
		/// `volatile` qualifier on the pointee.
		is_volatile: bool,
		/// Rendered as `&` instead of `*`.
		is_reference: bool,
		/// Pointer byte width on the target platform.
		width: u8,
	},
	/// Possibly multi-dimensional array.
	Array {
		/// Element type.
		element: TypeId,
		/// Element counts, outermost dimension first. The full list is kept
		/// for correct spelling, never flattened to a single count.
		dims: Vec<u32>,
	},
	/// Enumeration.
	Enum {
		/// Tag name; `None` for unnamed enums.
		name: Option<Box<str>>,
		/// Underlying integer type.
		underlying: TypeId,
		/// Enumerators in declaration order.
		enumerators: Vec<Enumerator>,
	},
	/// `const`/`volatile` wrapper.
	Modifier {
		/// Wrapped type.
		base: TypeId,
		/// `const` qualifier.
		is_const: bool,
		/// `volatile` qualifier.
		is_volatile: bool,
	},
	/// Procedure signature, only meaningful behind pointers.
	Procedure {
		/// Return type.
		return_type: TypeId,
		/// Calling convention.
		call_conv: CallConv,
		/// Argument types in order.
		args: Vec<TypeId>,
	},
	/// Struct, class, or union.
	Aggregate(Aggregate),
}

impl TypeNode {
	/// Stable lowercase label for stats and listings.
	pub fn kind_label(&self) -> &'static str {
		match self {
			Self::Primitive { .. } => "primitive",
			Self::Pointer { .. } => "pointer",
			Self::Array { .. } => "array",
			Self::Enum { .. } => "enum",
			Self::Modifier { .. } => "modifier",
			Self::Procedure { .. } => "procedure",
			Self::Aggregate(agg) => agg.kind.keyword(),
		}
	}

	/// Tag name of a named aggregate or enum definition, if any.
	pub fn definition_name(&self) -> Option<&str> {
		match self {
			Self::Enum { name, .. } => name.as_deref(),
			Self::Aggregate(agg) => agg.name.as_deref(),
			_ => None,
		}
	}
}
