use std::collections::HashMap;

use crate::tys::decode::decode_record;
use crate::tys::file::TypeStreamFile;
use crate::tys::{Diagnostic, Result, TypeId, TypeNode};

/// Indexed, immutable collection of decoded type records.
///
/// Built once per reconstruction session and read-only afterward. Every
/// record occupies its position-assigned slot; records that failed to decode
/// keep an empty slot so that references to them surface as unresolved
/// rather than shifting later ids.
#[derive(Debug)]
pub struct TypeStore {
	nodes: Vec<Option<TypeNode>>,
	/// Forward-reference record id -> id of the complete definition with the
	/// same name, when the stream contains one.
	forwarders: HashMap<TypeId, TypeId>,
}

impl TypeStore {
	/// Decode every record of `file` into a store.
	///
	/// Framing errors (a truncated record area) are fatal; per-record decode
	/// failures are returned as diagnostics alongside the store.
	pub fn from_file(file: &TypeStreamFile) -> Result<(Self, Vec<Diagnostic>)> {
		let mut diagnostics = Vec::new();
		let mut nodes = Vec::with_capacity(file.header.record_count as usize);

		for record in file.records() {
			let record = record?;
			nodes.push(decode_record(&record, &mut diagnostics));
		}

		Ok((Self::from_slots(nodes), diagnostics))
	}

	/// Build a store directly from decoded nodes, for tests.
	pub fn from_nodes_for_test(nodes: Vec<TypeNode>) -> Self {
		Self::from_slots(nodes.into_iter().map(Some).collect())
	}

	fn from_slots(nodes: Vec<Option<TypeNode>>) -> Self {
		let mut complete_by_name: HashMap<&str, TypeId> = HashMap::new();
		for (id, node) in nodes.iter().enumerate() {
			let Some(TypeNode::Aggregate(agg)) = node else {
				continue;
			};
			if agg.is_forward_reference {
				continue;
			}
			if let Some(name) = agg.name.as_deref() {
				// First complete definition wins.
				complete_by_name.entry(name).or_insert(id as TypeId);
			}
		}

		let mut forwarders = HashMap::new();
		for (id, node) in nodes.iter().enumerate() {
			let Some(TypeNode::Aggregate(agg)) = node else {
				continue;
			};
			if !agg.is_forward_reference {
				continue;
			}
			let Some(name) = agg.name.as_deref() else {
				continue;
			};
			if let Some(complete) = complete_by_name.get(name) {
				forwarders.insert(id as TypeId, *complete);
			}
		}

		Self { nodes, forwarders }
	}

	/// Number of record slots, decoded or not.
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	/// Whether the store holds no records.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// All record ids in stream order.
	pub fn all_ids(&self) -> impl Iterator<Item = TypeId> + '_ {
		(0..self.nodes.len()).map(|id| id as TypeId)
	}

	/// Map a forward-reference id to its complete definition, when the
	/// stream contains one; other ids map to themselves.
	pub fn resolve_complete(&self, id: TypeId) -> TypeId {
		self.forwarders.get(&id).copied().unwrap_or(id)
	}

	/// Look up the node for `id`, following the forward-reference map.
	///
	/// `None` means the reference is unresolved: the id is out of range, its
	/// record failed to decode, or it names a type the stream never defines.
	/// Callers emit a placeholder instead of treating this as fatal.
	pub fn get(&self, id: TypeId) -> Option<&TypeNode> {
		let id = self.resolve_complete(id);
		self.nodes.get(id as usize)?.as_ref()
	}

	/// Look up the node stored at `id` without forward-reference mapping.
	pub fn get_raw(&self, id: TypeId) -> Option<&TypeNode> {
		self.nodes.get(id as usize)?.as_ref()
	}

	/// Find the first complete definition with the given tag name.
	pub fn find_by_name(&self, name: &str) -> Option<TypeId> {
		self.all_ids().find(|id| {
			let Some(node) = self.get_raw(*id) else {
				return false;
			};
			if let TypeNode::Aggregate(agg) = node {
				if agg.is_forward_reference {
					return false;
				}
			}
			node.definition_name() == Some(name)
		})
	}

	/// Follow modifier wrappers down to the underlying type.
	///
	/// The hop count is bounded so a malformed modifier cycle cannot spin.
	pub fn strip_modifiers(&self, id: TypeId) -> TypeId {
		let mut current = id;
		for _ in 0..32 {
			match self.get(current) {
				Some(TypeNode::Modifier { base, .. }) => current = *base,
				_ => return current,
			}
		}
		current
	}
}

#[cfg(test)]
mod tests {
	use super::TypeStore;
	use crate::tys::{Aggregate, AggregateKind, PrimitiveKind, TypeNode};

	fn forward_ref(name: &str) -> TypeNode {
		TypeNode::Aggregate(Aggregate {
			kind: AggregateKind::Struct,
			name: Some(name.into()),
			declared_size: 0,
			vtable_present: false,
			is_nested_anonymous: false,
			is_forward_reference: true,
			bases: Vec::new(),
			members: Vec::new(),
		})
	}

	fn complete(name: &str) -> TypeNode {
		TypeNode::Aggregate(Aggregate {
			kind: AggregateKind::Struct,
			name: Some(name.into()),
			declared_size: 4,
			vtable_present: false,
			is_nested_anonymous: false,
			is_forward_reference: false,
			bases: Vec::new(),
			members: Vec::new(),
		})
	}

	#[test]
	fn forward_reference_resolves_to_complete_definition() {
		let store = TypeStore::from_nodes_for_test(vec![forward_ref("Node"), complete("Node")]);
		assert_eq!(store.resolve_complete(0), 1);
		let node = store.get(0).expect("forward ref resolves");
		let TypeNode::Aggregate(agg) = node else {
			panic!("expected aggregate");
		};
		assert!(!agg.is_forward_reference);
	}

	#[test]
	fn dangling_forward_reference_stays_symbolic() {
		let store = TypeStore::from_nodes_for_test(vec![forward_ref("Ghost")]);
		assert_eq!(store.resolve_complete(0), 0);
	}

	#[test]
	fn absent_id_resolves_to_none() {
		let store = TypeStore::from_nodes_for_test(vec![TypeNode::Primitive {
			kind: PrimitiveKind::U32,
			size: 4,
		}]);
		assert!(store.get(7).is_none());
	}

	#[test]
	fn find_by_name_skips_forward_references() {
		let store = TypeStore::from_nodes_for_test(vec![forward_ref("Node"), complete("Node")]);
		assert_eq!(store.find_by_name("Node"), Some(1));
	}
}
