use crate::{
    Bson,
    DateTime,
    coding::{CodingKey, PathComponent},
    encoder::{
        Encode,
        Encoder,
        KeyedEncodingContainer,
        SuperEncoder,
        storage::{NodeId, ValueRef},
    },
    error::{Error, Result},
};

/// A container that encodes values positionally, producing a BSON array.
pub struct UnkeyedEncodingContainer<'a> {
    encoder: &'a mut Encoder,
    node: NodeId,
    path: Vec<PathComponent>,
}

impl<'a> UnkeyedEncodingContainer<'a> {
    pub(crate) fn new(encoder: &'a mut Encoder, node: NodeId) -> Self {
        let path = encoder.coding_path.clone();
        Self::with_path(encoder, node, path)
    }

    pub(crate) fn with_path(
        encoder: &'a mut Encoder,
        node: NodeId,
        path: Vec<PathComponent>,
    ) -> Self {
        Self {
            encoder,
            node,
            path,
        }
    }

    /// The coding path of this container.
    pub fn coding_path(&self) -> &[PathComponent] {
        &self.path
    }

    /// The number of values encoded so far.
    pub fn count(&self) -> usize {
        self.encoder
            .storage
            .array_node(self.node)
            .map_or(0, |items| items.len())
    }

    fn push(&mut self, value: ValueRef) -> Result<()> {
        let path = &self.path;
        let items = self.encoder.storage.array_node_mut(self.node).ok_or_else(|| {
            Error::internal("unkeyed container node is no longer an array")
                .with_path(crate::coding::path_string(path))
        })?;
        items.push(value);
        Ok(())
    }

    /// Encodes a null value.
    pub fn encode_nil(&mut self) -> Result<()> {
        self.push(ValueRef::Value(Bson::Null))
    }

    /// Encodes a boolean.
    pub fn encode_bool(&mut self, value: bool) -> Result<()> {
        self.push(ValueRef::Value(Bson::Boolean(value)))
    }

    /// Encodes an `i8` as an `Int32`.
    pub fn encode_i8(&mut self, value: i8) -> Result<()> {
        self.push(ValueRef::Value(Bson::Int32(value.into())))
    }

    /// Encodes an `i16` as an `Int32`.
    pub fn encode_i16(&mut self, value: i16) -> Result<()> {
        self.push(ValueRef::Value(Bson::Int32(value.into())))
    }

    /// Encodes an `i32`.
    pub fn encode_i32(&mut self, value: i32) -> Result<()> {
        self.push(ValueRef::Value(Bson::Int32(value)))
    }

    /// Encodes an `i64`.
    pub fn encode_i64(&mut self, value: i64) -> Result<()> {
        self.push(ValueRef::Value(Bson::Int64(value)))
    }

    /// Encodes a `u8` as an `Int32`.
    pub fn encode_u8(&mut self, value: u8) -> Result<()> {
        self.push(ValueRef::Value(Bson::Int32(value.into())))
    }

    /// Encodes a `u16` as an `Int32`.
    pub fn encode_u16(&mut self, value: u16) -> Result<()> {
        self.push(ValueRef::Value(Bson::Int32(value.into())))
    }

    /// Encodes a `u32` as an `Int64`.
    pub fn encode_u32(&mut self, value: u32) -> Result<()> {
        self.push(ValueRef::Value(Bson::Int64(value.into())))
    }

    /// Encodes a `u64` as an `Int64` if it fits; fails with
    /// [`NumberOutOfRange`](crate::error::ErrorKind::NumberOutOfRange)
    /// otherwise.
    pub fn encode_u64(&mut self, value: u64) -> Result<()> {
        let index = self.count();
        let value = self
            .encoder
            .int64_from_u64(value)
            .map_err(|e| e.with_index(index))?;
        self.push(ValueRef::Value(Bson::Int64(value)))
    }

    /// Encodes an `f32` as a `Double`.
    pub fn encode_f32(&mut self, value: f32) -> Result<()> {
        self.push(ValueRef::Value(Bson::Double(value.into())))
    }

    /// Encodes an `f64`.
    pub fn encode_f64(&mut self, value: f64) -> Result<()> {
        self.push(ValueRef::Value(Bson::Double(value)))
    }

    /// Encodes a string.
    pub fn encode_str(&mut self, value: &str) -> Result<()> {
        self.push(ValueRef::Value(Bson::String(value.to_string())))
    }

    /// Encodes a datetime per the encoder's date strategy.
    pub fn encode_datetime(&mut self, value: DateTime) -> Result<()> {
        let boxed = self.with_index_path(|encoder| encoder.box_date(value))?;
        self.push(ValueRef::Value(boxed))
    }

    /// Encodes a UUID per the encoder's UUID strategy.
    pub fn encode_uuid(&mut self, value: uuid::Uuid) -> Result<()> {
        let boxed = self.with_index_path(|encoder| encoder.box_uuid(value))?;
        self.push(ValueRef::Value(boxed))
    }

    /// Encodes a byte buffer per the encoder's data strategy.
    pub fn encode_bytes(&mut self, value: &[u8]) -> Result<()> {
        let boxed = self.with_index_path(|encoder| encoder.box_bytes(value))?;
        self.push(ValueRef::Value(boxed))
    }

    /// Encodes any [`Encode`] value.
    pub fn encode_encodable<T: Encode + ?Sized>(&mut self, value: &T) -> Result<()> {
        let boxed = self.with_index_path(|encoder| encoder.box_value(value))?;
        self.push(ValueRef::Value(boxed))
    }

    /// Opens a nested keyed container at the next position.
    pub fn nested_keyed_container<NK: CodingKey>(
        &mut self,
    ) -> Result<KeyedEncodingContainer<'_, NK>> {
        let index = self.count();
        let child = self.encoder.storage.alloc_document();
        self.push(ValueRef::Node(child))?;

        let mut path = self.path.clone();
        path.push(PathComponent::Index(index));
        Ok(KeyedEncodingContainer::with_path(self.encoder, child, path))
    }

    /// Opens a nested unkeyed container at the next position.
    pub fn nested_unkeyed_container(&mut self) -> Result<UnkeyedEncodingContainer<'_>> {
        let index = self.count();
        let child = self.encoder.storage.alloc_array();
        self.push(ValueRef::Node(child))?;

        let mut path = self.path.clone();
        path.push(PathComponent::Index(index));
        Ok(UnkeyedEncodingContainer::with_path(self.encoder, child, path))
    }

    /// Returns an encoder whose encoded value is spliced into the next
    /// position of this container when it is dropped.
    pub fn super_encoder(&mut self) -> Result<SuperEncoder<'_>> {
        let index = self.count();
        // reserve the slot so splicing preserves this position
        self.push(ValueRef::Value(Bson::Null))?;

        let mut path = self.path.clone();
        path.push(PathComponent::Index(index));
        Ok(SuperEncoder::new(
            self.encoder,
            self.node,
            PathComponent::Index(index),
            path,
        ))
    }

    fn with_index_path<T>(&mut self, f: impl FnOnce(&mut Encoder) -> Result<T>) -> Result<T> {
        self.encoder
            .coding_path
            .push(PathComponent::Index(self.count()));
        let result = f(self.encoder);
        self.encoder.coding_path.pop();
        result
    }
}
