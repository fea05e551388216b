//! Arena-backed storage for containers under construction.
//!
//! Container handles never hold references into one another; they carry node
//! ids into the arena owned by the encoder, so nesting imposes no lifetime
//! web and a finished child can be spliced into its parent by id.

use indexmap::IndexMap;

use crate::{Bson, coding::PathComponent, error::Result, raw::DocumentWriter};

pub(crate) type NodeId = usize;

/// A value held by a container: either a finished scalar or a reference to a
/// container node still being assembled.
#[derive(Debug, Clone)]
pub(crate) enum ValueRef {
    Value(Bson),
    Node(NodeId),
}

/// An ordered keyed container under construction. Insertion preserves order
/// and re-inserting an existing key replaces the value in place.
pub(crate) type MutableDocument = IndexMap<String, ValueRef, ahash::RandomState>;

/// An array container under construction.
pub(crate) type MutableArray = Vec<ValueRef>;

#[derive(Debug)]
pub(crate) enum Node {
    Document(MutableDocument),
    Array(MutableArray),
}

/// The encoder's container arena plus the stack of in-progress roots.
///
/// The stack grows by one for every value boxed at a new coding path and is
/// popped once that value is finished; a completed top-level encode leaves
/// exactly one entry.
#[derive(Debug, Default)]
pub(crate) struct EncodingStorage {
    nodes: Vec<Node>,
    pub(crate) stack: Vec<ValueRef>,
}

impl EncodingStorage {
    pub(crate) fn alloc_document(&mut self) -> NodeId {
        self.nodes.push(Node::Document(MutableDocument::default()));
        self.nodes.len() - 1
    }

    pub(crate) fn alloc_array(&mut self) -> NodeId {
        self.nodes.push(Node::Array(MutableArray::default()));
        self.nodes.len() - 1
    }

    /// Pushes a fresh keyed container onto the stack.
    pub(crate) fn push_keyed_container(&mut self) -> NodeId {
        let id = self.alloc_document();
        self.stack.push(ValueRef::Node(id));
        id
    }

    /// Pushes a fresh unkeyed container onto the stack.
    pub(crate) fn push_unkeyed_container(&mut self) -> NodeId {
        let id = self.alloc_array();
        self.stack.push(ValueRef::Node(id));
        id
    }

    /// Pushes a finished scalar onto the stack.
    pub(crate) fn push_value(&mut self, value: Bson) {
        self.stack.push(ValueRef::Value(value));
    }

    pub(crate) fn len(&self) -> usize {
        self.stack.len()
    }

    pub(crate) fn pop(&mut self) -> Option<ValueRef> {
        self.stack.pop()
    }

    /// Drops any stack entries above `depth`, abandoning containers that
    /// were speculatively pushed by a failed nested encode.
    pub(crate) fn truncate(&mut self, depth: usize) {
        self.stack.truncate(depth);
    }

    pub(crate) fn document_node_mut(&mut self, id: NodeId) -> Option<&mut MutableDocument> {
        match self.nodes.get_mut(id) {
            Some(Node::Document(map)) => Some(map),
            _ => None,
        }
    }

    pub(crate) fn array_node_mut(&mut self, id: NodeId) -> Option<&mut MutableArray> {
        match self.nodes.get_mut(id) {
            Some(Node::Array(items)) => Some(items),
            _ => None,
        }
    }

    pub(crate) fn array_node(&self, id: NodeId) -> Option<&MutableArray> {
        match self.nodes.get(id) {
            Some(Node::Array(items)) => Some(items),
            _ => None,
        }
    }

    /// The node id of the container on top of the stack, if it is a keyed
    /// one.
    pub(crate) fn top_document_node(&self) -> Option<NodeId> {
        match self.stack.last() {
            Some(ValueRef::Node(id)) if matches!(self.nodes.get(*id), Some(Node::Document(_))) => {
                Some(*id)
            }
            _ => None,
        }
    }

    /// The node id of the container on top of the stack, if it is an unkeyed
    /// one.
    pub(crate) fn top_array_node(&self) -> Option<NodeId> {
        match self.stack.last() {
            Some(ValueRef::Node(id)) if matches!(self.nodes.get(*id), Some(Node::Array(_))) => {
                Some(*id)
            }
            _ => None,
        }
    }

    /// Adopts another storage's nodes (a finished referencing encoder's
    /// arena), rebasing every node id, and returns the rebased root.
    pub(crate) fn adopt(&mut self, nodes: Vec<Node>, root: ValueRef) -> ValueRef {
        let offset = self.nodes.len();
        for node in nodes {
            let rebased = match node {
                Node::Document(map) => Node::Document(
                    map.into_iter()
                        .map(|(k, v)| (k, rebase(v, offset)))
                        .collect(),
                ),
                Node::Array(items) => {
                    Node::Array(items.into_iter().map(|v| rebase(v, offset)).collect())
                }
            };
            self.nodes.push(rebased);
        }
        rebase(root, offset)
    }

    pub(crate) fn take_nodes(&mut self) -> Vec<Node> {
        std::mem::take(&mut self.nodes)
    }

    /// Writes `value` into the slot a referencing encoder reserved in one of
    /// this storage's container nodes.
    pub(crate) fn splice(&mut self, target: NodeId, slot: &PathComponent, value: ValueRef) {
        match (self.nodes.get_mut(target), slot) {
            (Some(Node::Document(map)), PathComponent::Key(key)) => {
                map.insert(key.clone(), value);
            }
            (Some(Node::Array(items)), PathComponent::Index(index)) => {
                if let Some(slot) = items.get_mut(*index) {
                    *slot = value;
                }
            }
            _ => {}
        }
    }

    /// Converts a finished value tree into a [`Bson`], consuming the nodes it
    /// references. Fails if a produced document would exceed the maximum BSON
    /// size or a key contains an interior null byte.
    pub(crate) fn resolve(&mut self, value: ValueRef) -> Result<Bson> {
        Ok(match value {
            ValueRef::Value(bson) => bson,
            ValueRef::Node(id) => {
                // each node is referenced from exactly one slot, so it can be
                // taken rather than cloned
                let node = std::mem::replace(&mut self.nodes[id], Node::Array(Vec::new()));
                match node {
                    Node::Document(map) => {
                        let mut writer = DocumentWriter::new();
                        for (key, entry) in map {
                            let resolved = self.resolve(entry)?;
                            writer.append(&key, &resolved)?;
                        }
                        Bson::Document(writer.finalize())
                    }
                    Node::Array(items) => {
                        let mut array = Vec::with_capacity(items.len());
                        for entry in items {
                            array.push(self.resolve(entry)?);
                        }
                        Bson::Array(array)
                    }
                }
            }
        })
    }
}

fn rebase(value: ValueRef, offset: usize) -> ValueRef {
    match value {
        ValueRef::Node(id) => ValueRef::Node(id + offset),
        value => value,
    }
}
