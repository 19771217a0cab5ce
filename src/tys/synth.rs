use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Write as _;

use crate::tys::layout::{FieldSlot, LayoutResolver, ResolvedMember};
use crate::tys::session::ReconstructOptions;
use crate::tys::{Access, Aggregate, Diagnostic, DiagnosticKind, Result, TypeId, TypeNode, TypeStore};

/// Per-type render state; the mechanism that bounds recursion for
/// self-referential and mutually cyclic graphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RenderState {
	InProgress,
	Rendered,
}

/// Set of types a declaration body references, with a flag marking
/// references that go through a pointer or C++ reference.
type NeededTypeSet = BTreeSet<(TypeId, bool)>;

const SPELL_DEPTH_LIMIT: u32 = 32;

pub(crate) struct Synthesizer<'a> {
	store: &'a TypeStore,
	resolver: LayoutResolver<'a>,
	options: &'a ReconstructOptions,
	states: HashMap<TypeId, RenderState>,
	forward_declared: HashSet<TypeId>,
	rendered_names: HashSet<String>,
	rendered: Vec<String>,
	out: String,
	diagnostics: Vec<Diagnostic>,
	depth: u32,
}

impl<'a> Synthesizer<'a> {
	pub(crate) fn new(store: &'a TypeStore, options: &'a ReconstructOptions) -> Self {
		Self {
			store,
			resolver: LayoutResolver::new(store, options.layout),
			options,
			states: HashMap::new(),
			forward_declared: HashSet::new(),
			rendered_names: HashSet::new(),
			rendered: Vec::new(),
			out: String::new(),
			diagnostics: Vec::new(),
			depth: 0,
		}
	}

	pub(crate) fn finish(mut self) -> (String, Vec<String>, Vec<Diagnostic>) {
		let mut diagnostics = self.diagnostics;
		diagnostics.extend(self.resolver.take_diagnostics());
		(self.out, self.rendered, diagnostics)
	}

	/// Render one definition and everything it depends on.
	pub(crate) fn render_top_level(&mut self, id: TypeId) -> Result<()> {
		self.render_definition(id)
	}

	fn state(&self, id: TypeId) -> Option<RenderState> {
		self.states.get(&id).copied()
	}

	fn render_definition(&mut self, id: TypeId) -> Result<()> {
		let id = self.store.resolve_complete(id);
		match self.state(id) {
			Some(RenderState::Rendered) => return Ok(()),
			Some(RenderState::InProgress) => {
				// Cyclic reference back into a body being rendered; cut to a
				// forward reference instead of re-entering.
				self.ensure_forward_decl(id)?;
				return Ok(());
			}
			None => {}
		}

		if self.depth >= self.options.nested_depth_limit {
			self.diagnostics.push(Diagnostic {
				type_id: id,
				kind: DiagnosticKind::DepthExceeded {
					limit: self.options.nested_depth_limit,
				},
			});
			self.ensure_forward_decl(id)?;
			return Ok(());
		}

		let Some(node) = self.store.get_raw(id) else {
			self.ensure_forward_decl(id)?;
			return Ok(());
		};

		match node {
			TypeNode::Enum {
				name,
				underlying,
				enumerators,
			} => {
				let display = match name.as_deref() {
					Some(name) => name.to_owned(),
					None => format!("_unnamed_{id}"),
				};
				if !self.rendered_names.insert(display.clone()) {
					self.states.insert(id, RenderState::Rendered);
					return Ok(());
				}

				let mut needed = NeededTypeSet::new();
				let (under_left, _) = self.spell_type(*underlying, &mut needed, 0);
				let mut body = String::new();
				writeln!(body, "enum {display} : {under_left} {{")?;
				for enumerator in enumerators {
					writeln!(body, "  {} = {},", enumerator.name, enumerator.value)?;
				}
				writeln!(body, "}};")?;

				writeln!(self.out)?;
				self.out.push_str(&body);
				self.states.insert(id, RenderState::Rendered);
				self.rendered.push(display);
				Ok(())
			}

			TypeNode::Aggregate(agg) => {
				if agg.is_forward_reference {
					// Dangling declaration-only record; nothing to expand.
					self.ensure_forward_decl(id)?;
					self.states.insert(id, RenderState::Rendered);
					return Ok(());
				}

				let display = display_name(id, agg);
				if !self.rendered_names.insert(display.clone()) {
					self.states.insert(id, RenderState::Rendered);
					return Ok(());
				}

				self.states.insert(id, RenderState::InProgress);
				self.depth += 1;
				let result = self.render_aggregate(id, agg, &display);
				self.depth -= 1;
				match result {
					Ok(()) => {
						self.states.insert(id, RenderState::Rendered);
						self.rendered.push(display);
						Ok(())
					}
					Err(err) => Err(err),
				}
			}

			// Primitives, pointers, arrays, modifiers, and procedures are
			// spelled inline and have no top-level definition of their own.
			_ => Ok(()),
		}
	}

	fn render_aggregate(&mut self, id: TypeId, agg: &Aggregate, display: &str) -> Result<()> {
		let layout = self.resolver.resolve(id);
		let mut needed = NeededTypeSet::new();

		let mut header = format!("{} {display}", agg.kind.keyword());
		for (i, base) in agg.bases.iter().enumerate() {
			let prefix = if i == 0 { " :" } else { "," };
			let (base_name, _) = self.spell_type(base.type_id, &mut needed, 0);
			let access = base.access.keyword();
			if access.is_empty() {
				write!(header, "{prefix} {base_name}")?;
			} else {
				write!(header, "{prefix} {access} {base_name}")?;
			}
		}
		if self.options.emit_offset_comments {
			write!(header, " {{ /* Size={:#x} */", layout.size)?;
		} else {
			write!(header, " {{")?;
		}

		let mut body = String::new();
		if self.options.emit_offset_comments {
			for base in &layout.bases {
				let (base_name, _) = self.spell_type(base.type_id, &mut needed, 0);
				writeln!(body, "  /* {:#06x}: fields for {base_name} */", base.offset)?;
			}
		}
		if layout.vtable_at.is_some() {
			writeln!(body, "  /* vfptr */")?;
		}
		self.render_members(&layout.members, 1, &mut body, &mut needed)?;

		// Dependencies first: full definitions for by-value references,
		// forward declarations for pointer references.
		for (needed_id, via_pointer) in needed {
			let needed_id = self.store.resolve_complete(needed_id);
			if needed_id == id {
				continue;
			}
			if via_pointer {
				if self.state(needed_id) != Some(RenderState::Rendered) {
					self.ensure_forward_decl(needed_id)?;
				}
			} else {
				self.render_definition(needed_id)?;
			}
		}

		writeln!(self.out)?;
		self.out.push_str(&header);
		self.out.push('\n');
		self.out.push_str(&body);
		self.out.push_str("};\n");
		Ok(())
	}

	fn render_members(&mut self, members: &[ResolvedMember], depth: usize, body: &mut String, needed: &mut NeededTypeSet) -> Result<()> {
		let indentation = "  ".repeat(depth);
		// Access boundaries are positional: a run change re-emits the
		// marker even for a level seen earlier.
		let mut current_access: Option<Access> = None;

		for member in members {
			let access = match member {
				ResolvedMember::Field(field) => field.access,
				ResolvedMember::Group(group) => group.access,
			};
			if current_access != Some(access) {
				if access != Access::None {
					writeln!(body, "{}{}:", "  ".repeat(depth.saturating_sub(1)), access.keyword())?;
				}
				current_access = Some(access);
			}

			match member {
				ResolvedMember::Field(field) => self.render_field(field, &indentation, body, needed)?,
				ResolvedMember::Group(group) => {
					writeln!(body, "{indentation}{} {{", group.kind.keyword())?;
					self.render_members(&group.members, depth + 1, body, needed)?;
					writeln!(body, "{indentation}}};")?;
				}
			}
		}

		Ok(())
	}

	fn render_field(&mut self, field: &FieldSlot, indentation: &str, body: &mut String, needed: &mut NeededTypeSet) -> Result<()> {
		if field.is_static {
			if !self.options.include_static_members {
				return Ok(());
			}
			let (left, right) = self.spell_type(field.type_id, needed, 0);
			let name = field.name.as_deref().unwrap_or("");
			writeln!(body, "{indentation}static {left} {name}{right};")?;
			return Ok(());
		}

		let offset_comment = match (self.options.emit_offset_comments, field.offset) {
			(true, Some(offset)) => format!("/* {offset:#06x} */ "),
			_ => String::new(),
		};
		let (left, right) = self.spell_type(field.type_id, needed, 0);

		if let Some(bitfield) = field.bitfield {
			if bitfield.bit_width == 0 {
				writeln!(body, "{indentation}{offset_comment}{left} : 0;")?;
				return Ok(());
			}
			let bitpos_comment = if self.options.emit_offset_comments {
				format!(" /* BitPos={} */", bitfield.bit_offset)
			} else {
				String::new()
			};
			let name = field.name.as_deref().unwrap_or("");
			writeln!(body, "{indentation}{offset_comment}{left} {name} : {};{bitpos_comment}", bitfield.bit_width)?;
			return Ok(());
		}

		match field.name.as_deref() {
			Some(name) => writeln!(body, "{indentation}{offset_comment}{left} {name}{right};")?,
			None => writeln!(body, "{indentation}{offset_comment}{left}{right};")?,
		}
		Ok(())
	}

	/// Emit a forward declaration for `id` unless its definition (or a
	/// previous forward declaration) already appeared.
	fn ensure_forward_decl(&mut self, id: TypeId) -> Result<()> {
		let id = self.store.resolve_complete(id);
		if self.state(id) == Some(RenderState::Rendered) || !self.forward_declared.insert(id) {
			return Ok(());
		}

		match self.store.get_raw(id) {
			Some(TypeNode::Aggregate(agg)) => {
				let display = display_name(id, agg);
				writeln!(self.out, "{} {display};", agg.kind.keyword())?;
			}
			Some(TypeNode::Enum { name, .. }) => {
				let display = match name.as_deref() {
					Some(name) => name.to_owned(),
					None => format!("_unnamed_{id}"),
				};
				writeln!(self.out, "enum {display};")?;
			}
			Some(_) => {}
			None => {
				// Absent record: opaque placeholder so references still
				// compile against a tag.
				self.diagnostics.push(Diagnostic {
					type_id: id,
					kind: DiagnosticKind::UnresolvedReference { target: id },
				});
				writeln!(self.out, "struct __unresolved_{id};")?;
			}
		}
		Ok(())
	}

	/// Produce the two-sided spelling of a type: declarator text to the left
	/// and right of the member name, so arrays and function pointers nest
	/// correctly.
	fn spell_type(&mut self, id: TypeId, needed: &mut NeededTypeSet, depth: u32) -> (String, String) {
		if depth > SPELL_DEPTH_LIMIT {
			return ("__cycle".to_owned(), String::new());
		}

		let resolved = self.store.resolve_complete(id);
		let Some(node) = self.store.get(id) else {
			self.diagnostics.push(Diagnostic {
				type_id: resolved,
				kind: DiagnosticKind::UnresolvedReference { target: id },
			});
			needed.insert((resolved, true));
			return (format!("__unresolved_{id}"), String::new());
		};

		match node {
			TypeNode::Primitive { kind, .. } => (kind.spelling().to_owned(), String::new()),

			TypeNode::Pointer {
				target,
				is_const,
				is_volatile,
				is_reference,
				..
			} => {
				// References behind a pointer only need a forward
				// declaration, unless the pointee spelling is composite.
				let mut temp = NeededTypeSet::new();
				let (mut left, right) = self.spell_type(*target, &mut temp, depth + 1);
				if temp.len() < 2 {
					if let Some((needed_id, _)) = temp.into_iter().next() {
						needed.insert((needed_id, true));
					}
				} else {
					needed.extend(temp);
				}

				if *is_const {
					left = format!("const {left}");
				}
				if *is_volatile {
					left = format!("volatile {left}");
				}
				let sigil = if *is_reference { '&' } else { '*' };
				(format!("{left}{sigil}"), right)
			}

			TypeNode::Array { element, dims } => {
				let (left, mut right) = self.spell_type(*element, needed, depth + 1);
				let mut dims_text = String::new();
				for dim in dims {
					dims_text.push_str(&format!("[{dim}]"));
				}
				right = format!("{dims_text}{right}");
				(left, right)
			}

			TypeNode::Enum { name, .. } => {
				needed.insert((resolved, false));
				let display = match name.as_deref() {
					Some(name) => name.to_owned(),
					None => format!("_unnamed_{resolved}"),
				};
				(display, String::new())
			}

			TypeNode::Modifier {
				base,
				is_const,
				is_volatile,
			} => {
				let (left, right) = self.spell_type(*base, needed, depth + 1);
				let left = if *is_const {
					format!("const {left}")
				} else if *is_volatile {
					format!("volatile {left}")
				} else {
					left
				};
				(left, right)
			}

			TypeNode::Procedure {
				return_type,
				call_conv,
				args,
			} => {
				let (ret_left, ret_right) = self.spell_type(*return_type, needed, depth + 1);
				let mut arg_list = Vec::with_capacity(args.len());
				for arg in args {
					let (arg_left, arg_right) = self.spell_type(*arg, needed, depth + 1);
					arg_list.push(format!("{arg_left}{arg_right}"));
				}
				(
					format!("{ret_left}{ret_right} ({}", call_conv.keyword()),
					format!(")({})", arg_list.join(", ")),
				)
			}

			TypeNode::Aggregate(agg) => {
				needed.insert((resolved, false));
				(display_name(resolved, agg), String::new())
			}
		}
	}
}

/// Tag name used in declarations; unnamed aggregates get a stable
/// id-derived name.
fn display_name(id: TypeId, agg: &Aggregate) -> String {
	match agg.name.as_deref() {
		Some(name) => name.to_owned(),
		None => format!("_unnamed_{id}"),
	}
}
