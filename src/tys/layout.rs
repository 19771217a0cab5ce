use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::tys::{Access, Aggregate, AggregateKind, Diagnostic, DiagnosticKind, Member, TypeId, TypeNode, TypeStore};

/// Policy for bitfield storage-unit breaks when the underlying type changes.
///
/// The interaction between consecutive bitfields of differing underlying
/// types is ABI-defined; neither interpretation is normalized as universally
/// correct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitfieldUnitBreak {
	/// A bitfield whose storage-unit size differs from the open unit starts
	/// a new unit (MSVC-like).
	OnTypeChange,
	/// Bitfields pack into the open unit while room remains, regardless of
	/// the underlying type (GCC-like).
	OnOverflowOnly,
}

/// Platform-dependent layout options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutOptions {
	/// Pointer byte width of the reconstruction target, used for the
	/// implicit vtable slot.
	pub pointer_width: u8,
	/// Storage-unit break policy for heterogeneous bitfield runs.
	pub bitfield_unit_break: BitfieldUnitBreak,
}

impl Default for LayoutOptions {
	fn default() -> Self {
		Self {
			pointer_width: 8,
			bitfield_unit_break: BitfieldUnitBreak::OnTypeChange,
		}
	}
}

/// Resolved bit placement of one bitfield member within its storage unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitfieldSlot {
	/// Bit offset within the storage unit, 0 = least significant.
	pub bit_offset: u8,
	/// Bit width; 0 marks a unit-break member.
	pub bit_width: u8,
	/// Byte size of the underlying storage unit.
	pub storage_size: u8,
}

/// Resolved placement of one leaf member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSlot {
	/// Member name; `None` for zero-width bitfield breaks.
	pub name: Option<Box<str>>,
	/// Member type reference.
	pub type_id: TypeId,
	/// Access level.
	pub access: Access,
	/// Static members exist for declaration purposes only.
	pub is_static: bool,
	/// Absolute byte offset from the aggregate base; `None` for statics.
	pub offset: Option<u32>,
	/// Resolved byte size of the member type (storage-unit size for
	/// bitfields).
	pub size: u32,
	/// Bit placement for bitfield members.
	pub bitfield: Option<BitfieldSlot>,
}

/// Resolved anonymous nested aggregate, inlined into its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSlot {
	/// `struct` or `union` grouping semantics.
	pub kind: AggregateKind,
	/// Id of the anonymous aggregate record.
	pub type_id: TypeId,
	/// Access level of the introducing member.
	pub access: Access,
	/// Absolute byte offset of the group within the outer aggregate.
	pub offset: u32,
	/// Resolved byte size of the group.
	pub size: u32,
	/// Resolved members, offsets absolute within the outer aggregate.
	pub members: Vec<ResolvedMember>,
}

/// One entry of a resolved member tree, mirroring declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedMember {
	/// Leaf member with an absolute placement.
	Field(FieldSlot),
	/// Inlined anonymous aggregate.
	Group(GroupSlot),
}

/// Resolved placement of one base-class subobject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseSlot {
	/// Base type reference.
	pub type_id: TypeId,
	/// Byte offset of the base subobject within the derived layout.
	pub offset: u32,
	/// Resolved byte size of the base.
	pub size: u32,
	/// Inheritance access level.
	pub access: Access,
}

/// Complete resolved layout of one aggregate, offsets relative to its own
/// base address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateLayout {
	/// Final byte size: cursor end rounded up to the alignment, or the
	/// declared record size when that is larger.
	pub size: u32,
	/// Alignment: maximum alignment of any contained member, transitively.
	pub align: u32,
	/// Offset of the implicit vtable slot when this aggregate introduces
	/// virtuality; absent when a base already carries the slot.
	pub vtable_at: Option<u32>,
	/// Base subobjects in declaration order.
	pub bases: Vec<BaseSlot>,
	/// Resolved member tree in declaration order.
	pub members: Vec<ResolvedMember>,
}

impl AggregateLayout {
	fn empty() -> Self {
		Self {
			size: 0,
			align: 1,
			vtable_at: None,
			bases: Vec::new(),
			members: Vec::new(),
		}
	}

	/// Iterate all leaf field slots, including those nested in groups.
	pub fn flat_fields(&self) -> Vec<&FieldSlot> {
		fn walk<'a>(members: &'a [ResolvedMember], out: &mut Vec<&'a FieldSlot>) {
			for member in members {
				match member {
					ResolvedMember::Field(field) => out.push(field),
					ResolvedMember::Group(group) => walk(&group.members, out),
				}
			}
		}

		let mut out = Vec::new();
		walk(&self.members, &mut out);
		out
	}
}

/// Memoizing layout resolver for one reconstruction session.
///
/// Layouts are computed once per id; repeated references reuse the cached
/// result. The resolver never panics on malformed input: anomalies degrade
/// to first-wins placements and are collected as diagnostics.
pub struct LayoutResolver<'a> {
	store: &'a TypeStore,
	options: LayoutOptions,
	cache: HashMap<TypeId, Rc<AggregateLayout>>,
	in_progress: HashSet<TypeId>,
	measuring: HashSet<TypeId>,
	diagnostics: Vec<Diagnostic>,
	subject: TypeId,
}

struct OpenUnit {
	start: u32,
	storage: u32,
	next_bit: u32,
	force_new: bool,
}

impl<'a> LayoutResolver<'a> {
	/// Create a resolver over an immutable store.
	pub fn new(store: &'a TypeStore, options: LayoutOptions) -> Self {
		Self {
			store,
			options,
			cache: HashMap::new(),
			in_progress: HashSet::new(),
			measuring: HashSet::new(),
			diagnostics: Vec::new(),
			subject: 0,
		}
	}

	/// Drain diagnostics collected since the last call.
	pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
		std::mem::take(&mut self.diagnostics)
	}

	/// Resolve the layout of the aggregate at `id`, memoized.
	pub fn resolve(&mut self, id: TypeId) -> Rc<AggregateLayout> {
		let id = self.store.resolve_complete(id);
		if let Some(cached) = self.cache.get(&id) {
			return Rc::clone(cached);
		}

		let Some(TypeNode::Aggregate(agg)) = self.store.get_raw(id) else {
			return Rc::new(AggregateLayout::empty());
		};

		if self.in_progress.contains(&id) {
			// By-value membership cycle; fall back to the declared size so
			// the outer walk can continue.
			self.diagnostics.push(Diagnostic {
				type_id: id,
				kind: DiagnosticKind::LayoutCycle,
			});
			return Rc::new(AggregateLayout {
				size: agg.declared_size,
				..AggregateLayout::empty()
			});
		}

		self.in_progress.insert(id);
		let previous_subject = self.subject;
		self.subject = id;
		let layout = match agg.kind {
			AggregateKind::Union => self.layout_union(agg),
			AggregateKind::Struct | AggregateKind::Class => self.layout_struct(agg),
		};
		self.subject = previous_subject;
		self.in_progress.remove(&id);

		let layout = Rc::new(layout);
		self.cache.insert(id, Rc::clone(&layout));
		layout
	}

	fn layout_struct(&mut self, agg: &Aggregate) -> AggregateLayout {
		let mut cursor = 0_u32;
		let mut max_align = 1_u32;
		let mut vtable_at = None;

		if agg.vtable_present && !self.bases_carry_vtable(agg, 0) {
			// The most-derived layout introducing virtuality owns the slot.
			vtable_at = Some(0);
			cursor = u32::from(self.options.pointer_width);
			max_align = max_align.max(u32::from(self.options.pointer_width));
		}

		let mut bases = Vec::with_capacity(agg.bases.len());
		for base in &agg.bases {
			let size = self.size_of(base.type_id);
			let align = self.align_of(base.type_id);
			max_align = max_align.max(align);

			let aligned = align_up(cursor, align);
			let offset = if base.declared_offset >= aligned {
				base.declared_offset
			} else {
				// Same first-claim-wins rule as member offsets.
				let name = match self.store.get(base.type_id) {
					Some(TypeNode::Aggregate(base_agg)) => base_agg.name.clone(),
					_ => None,
				};
				self.diagnostics.push(Diagnostic {
					type_id: self.subject,
					kind: DiagnosticKind::LayoutOverlap {
						member: name,
						claimed_offset: base.declared_offset,
					},
				});
				aligned
			};
			cursor = offset + size;
			bases.push(BaseSlot {
				type_id: base.type_id,
				offset,
				size,
				access: base.access,
			});
		}

		let mut members = Vec::with_capacity(agg.members.len());
		let mut open: Option<OpenUnit> = None;

		for member in &agg.members {
			if member.is_static {
				members.push(ResolvedMember::Field(self.static_slot(member)));
				continue;
			}

			if let Some(width) = member.bit_width {
				let slot = self.place_bitfield(member, width, &mut cursor, &mut open);
				max_align = max_align.max(self.align_of(member.type_id));
				members.push(ResolvedMember::Field(slot));
				continue;
			}

			// Any named or group member closes the open storage unit.
			open = None;

			if let Some((group_id, group_kind)) = self.anonymous_group(member) {
				let sub = self.resolve(group_id);
				max_align = max_align.max(sub.align);
				let offset = self.place_at(member, align_up(cursor, sub.align));
				cursor = offset + sub.size;
				members.push(ResolvedMember::Group(GroupSlot {
					kind: group_kind,
					type_id: group_id,
					access: member.access,
					offset,
					size: sub.size,
					members: shift_members(&sub.members, offset),
				}));
				continue;
			}

			let size = self.size_of(member.type_id);
			let align = self.align_of(member.type_id);
			max_align = max_align.max(align);
			let offset = self.place_at(member, align_up(cursor, align));
			cursor = offset + size;
			members.push(ResolvedMember::Field(FieldSlot {
				name: member.name.clone(),
				type_id: member.type_id,
				access: member.access,
				is_static: false,
				offset: Some(offset),
				size,
				bitfield: None,
			}));
		}

		let size = align_up(cursor, max_align).max(agg.declared_size);
		AggregateLayout {
			size,
			align: max_align,
			vtable_at,
			bases,
			members,
		}
	}

	fn layout_union(&mut self, agg: &Aggregate) -> AggregateLayout {
		let mut max_end = 0_u32;
		let mut max_align = 1_u32;
		let mut members = Vec::with_capacity(agg.members.len());

		for member in &agg.members {
			if member.is_static {
				members.push(ResolvedMember::Field(self.static_slot(member)));
				continue;
			}

			// Every union alternative starts at the union's own base.
			if let Some((group_id, group_kind)) = self.anonymous_group(member) {
				let sub = self.resolve(group_id);
				max_align = max_align.max(sub.align);
				max_end = max_end.max(sub.size);
				members.push(ResolvedMember::Group(GroupSlot {
					kind: group_kind,
					type_id: group_id,
					access: member.access,
					offset: 0,
					size: sub.size,
					members: sub.members.clone(),
				}));
				continue;
			}

			if let Some(width) = member.bit_width {
				let storage = self.size_of(self.store.strip_modifiers(member.type_id));
				max_align = max_align.max(self.align_of(member.type_id));
				max_end = max_end.max(storage);
				members.push(ResolvedMember::Field(FieldSlot {
					name: member.name.clone(),
					type_id: member.type_id,
					access: member.access,
					is_static: false,
					offset: Some(0),
					size: storage,
					bitfield: Some(BitfieldSlot {
						bit_offset: 0,
						bit_width: width,
						storage_size: storage.min(255) as u8,
					}),
				}));
				continue;
			}

			let size = self.size_of(member.type_id);
			max_align = max_align.max(self.align_of(member.type_id));
			max_end = max_end.max(size);
			members.push(ResolvedMember::Field(FieldSlot {
				name: member.name.clone(),
				type_id: member.type_id,
				access: member.access,
				is_static: false,
				offset: Some(0),
				size,
				bitfield: None,
			}));
		}

		let size = align_up(max_end, max_align).max(agg.declared_size);
		AggregateLayout {
			size,
			align: max_align,
			vtable_at: None,
			bases: Vec::new(),
			members,
		}
	}

	fn place_bitfield(&mut self, member: &Member, width: u8, cursor: &mut u32, open: &mut Option<OpenUnit>) -> FieldSlot {
		let storage = self.size_of(self.store.strip_modifiers(member.type_id)).max(1);

		if width == 0 {
			// Zero-width break: closes the unit, occupies nothing, and
			// forces the next bitfield to start fresh.
			if let Some(unit) = open {
				unit.force_new = true;
				unit.next_bit = unit.storage * 8;
			}
			return FieldSlot {
				name: member.name.clone(),
				type_id: member.type_id,
				access: member.access,
				is_static: false,
				offset: Some(*cursor),
				size: 0,
				bitfield: Some(BitfieldSlot {
					bit_offset: 0,
					bit_width: 0,
					storage_size: storage.min(255) as u8,
				}),
			};
		}

		let policy = self.options.bitfield_unit_break;
		let fits = move |unit: &OpenUnit| -> bool {
			if unit.force_new {
				return false;
			}
			if u32::from(width) + unit.next_bit > unit.storage * 8 {
				return false;
			}
			match policy {
				BitfieldUnitBreak::OnTypeChange => unit.storage == storage,
				BitfieldUnitBreak::OnOverflowOnly => true,
			}
		};

		let (unit_start, bit_offset) = match open {
			Some(unit) if fits(unit) => {
				let bit = unit.next_bit;
				unit.next_bit += u32::from(width);
				(unit.start, bit)
			}
			_ => {
				let align = self.align_of(member.type_id);
				let start = align_up(*cursor, align);
				*cursor = start + storage;
				*open = Some(OpenUnit {
					start,
					storage,
					next_bit: u32::from(width),
					force_new: false,
				});
				(start, 0)
			}
		};

		FieldSlot {
			name: member.name.clone(),
			type_id: member.type_id,
			access: member.access,
			is_static: false,
			offset: Some(unit_start),
			size: storage,
			bitfield: Some(BitfieldSlot {
				bit_offset: bit_offset.min(255) as u8,
				bit_width: width,
				storage_size: storage.min(255) as u8,
			}),
		}
	}

	fn place_at(&mut self, member: &Member, computed: u32) -> u32 {
		match member.declared_offset {
			// A declared offset past the cursor is compiler-observed padding
			// and is preserved.
			Some(declared) if declared >= computed => declared,
			Some(declared) => {
				// First claim wins; the conflicting member falls back to the
				// computed cursor position.
				self.diagnostics.push(Diagnostic {
					type_id: self.subject,
					kind: DiagnosticKind::LayoutOverlap {
						member: member.name.clone(),
						claimed_offset: declared,
					},
				});
				computed
			}
			None => computed,
		}
	}

	fn static_slot(&mut self, member: &Member) -> FieldSlot {
		FieldSlot {
			name: member.name.clone(),
			type_id: member.type_id,
			access: member.access,
			is_static: true,
			offset: None,
			size: self.size_of(member.type_id),
			bitfield: None,
		}
	}

	/// Classify a member as an inlined anonymous aggregate, when it is one.
	fn anonymous_group(&self, member: &Member) -> Option<(TypeId, AggregateKind)> {
		if member.name.is_some() || member.bit_width.is_some() {
			return None;
		}
		let stripped = self.store.strip_modifiers(member.type_id);
		let resolved = self.store.resolve_complete(stripped);
		match self.store.get_raw(resolved) {
			Some(TypeNode::Aggregate(agg)) if agg.is_nested_anonymous && agg.name.is_none() => Some((resolved, agg.kind)),
			_ => None,
		}
	}

	fn bases_carry_vtable(&self, agg: &Aggregate, depth: u32) -> bool {
		if depth > 64 {
			return false;
		}
		agg.bases.iter().any(|base| match self.store.get(base.type_id) {
			Some(TypeNode::Aggregate(base_agg)) => base_agg.vtable_present || self.bases_carry_vtable(base_agg, depth + 1),
			_ => false,
		})
	}

	/// Resolved byte size of any type node.
	pub fn size_of(&mut self, id: TypeId) -> u32 {
		// Modifier, enum, and array records can reference themselves; the
		// revisit check keeps a malformed self-edge from recursing forever.
		if !self.measuring.insert(id) {
			self.diagnostics.push(Diagnostic {
				type_id: self.subject,
				kind: DiagnosticKind::LayoutCycle,
			});
			return 0;
		}
		let size = match self.store.get(id) {
			None => {
				self.diagnostics.push(Diagnostic {
					type_id: self.subject,
					kind: DiagnosticKind::UnresolvedReference { target: id },
				});
				0
			}
			Some(TypeNode::Primitive { size, .. }) => u32::from(*size),
			Some(TypeNode::Pointer { width, .. }) => u32::from(*width),
			Some(TypeNode::Array { element, dims }) => {
				let element = *element;
				let elem_count: u64 = dims.iter().map(|dim| u64::from(*dim)).product();
				let total = u64::from(self.size_of(element)) * elem_count;
				total.min(u64::from(u32::MAX)) as u32
			}
			Some(TypeNode::Enum { underlying, .. }) => {
				let underlying = *underlying;
				self.size_of(underlying)
			}
			Some(TypeNode::Modifier { base, .. }) => {
				let base = *base;
				self.size_of(base)
			}
			Some(TypeNode::Procedure { .. }) => 0,
			Some(TypeNode::Aggregate(_)) => self.resolve(id).size,
		};
		self.measuring.remove(&id);
		size
	}

	/// Resolved alignment of any type node.
	pub fn align_of(&mut self, id: TypeId) -> u32 {
		if !self.measuring.insert(id) {
			return 1;
		}
		let align = match self.store.get(id) {
			None => 1,
			Some(TypeNode::Primitive { size, .. }) => natural_align(u32::from(*size)),
			Some(TypeNode::Pointer { width, .. }) => natural_align(u32::from(*width)),
			Some(TypeNode::Array { element, .. }) => {
				let element = *element;
				self.align_of(element)
			}
			Some(TypeNode::Enum { underlying, .. }) => {
				let underlying = *underlying;
				self.align_of(underlying)
			}
			Some(TypeNode::Modifier { base, .. }) => {
				let base = *base;
				self.align_of(base)
			}
			Some(TypeNode::Procedure { .. }) => 1,
			Some(TypeNode::Aggregate(_)) => self.resolve(id).align,
		};
		self.measuring.remove(&id);
		align
	}
}

fn natural_align(size: u32) -> u32 {
	if size == 0 {
		return 1;
	}
	size.next_power_of_two().min(8)
}

fn align_up(value: u32, align: u32) -> u32 {
	if align <= 1 {
		return value;
	}
	value.div_ceil(align) * align
}

fn shift_members(members: &[ResolvedMember], delta: u32) -> Vec<ResolvedMember> {
	members
		.iter()
		.map(|member| match member {
			ResolvedMember::Field(field) => ResolvedMember::Field(FieldSlot {
				offset: field.offset.map(|off| off + delta),
				..field.clone()
			}),
			ResolvedMember::Group(group) => ResolvedMember::Group(GroupSlot {
				offset: group.offset + delta,
				members: shift_members(&group.members, delta),
				..group.clone()
			}),
		})
		.collect()
}
