use std::ops::{Deref, DerefMut};

use crate::{
    Bson,
    Document,
    coding::PathComponent,
    encoder::{
        Encoder,
        storage::{NodeId, ValueRef},
    },
};

/// An encoder that splices its encoded value into a reserved slot of a
/// parent container when dropped.
///
/// This is the referencing-encoder construct behind
/// [`KeyedEncodingContainer::super_encoder`](crate::encoder::KeyedEncodingContainer::super_encoder)
/// and
/// [`UnkeyedEncodingContainer::super_encoder`](crate::encoder::UnkeyedEncodingContainer::super_encoder):
/// it inherits the parent's options and coding path (so
/// `can_encode_new_value` accounts for the inherited depth) and carries a
/// back-pointer to the parent container node and slot. If nothing is encoded
/// before the drop, an empty document is spliced.
pub struct SuperEncoder<'a> {
    parent: &'a mut Encoder,
    child: Encoder,
    target: NodeId,
    slot: PathComponent,
}

impl<'a> SuperEncoder<'a> {
    pub(crate) fn new(
        parent: &'a mut Encoder,
        target: NodeId,
        slot: PathComponent,
        path: Vec<PathComponent>,
    ) -> Self {
        let mut child = Encoder::with_options(parent.options.clone());
        child.base_path_len = path.len();
        child.coding_path = path;
        Self {
            parent,
            child,
            target,
            slot,
        }
    }

    /// The encoder to encode the super-class representation into.
    pub fn encoder(&mut self) -> &mut Encoder {
        &mut self.child
    }
}

impl Deref for SuperEncoder<'_> {
    type Target = Encoder;

    fn deref(&self) -> &Encoder {
        &self.child
    }
}

impl DerefMut for SuperEncoder<'_> {
    fn deref_mut(&mut self) -> &mut Encoder {
        &mut self.child
    }
}

impl Drop for SuperEncoder<'_> {
    fn drop(&mut self) {
        let root = match self.child.storage.pop() {
            Some(root) => root,
            None => ValueRef::Value(Bson::Document(Document::new())),
        };
        let nodes = self.child.storage.take_nodes();
        let adopted = self.parent.storage.adopt(nodes, root);
        self.parent.storage.splice(self.target, &self.slot, adopted);
    }
}
