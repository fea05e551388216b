use std::marker::PhantomData;

use crate::{
    Bson,
    DateTime,
    coding::{CodingKey, PathComponent},
    encoder::{
        Encode,
        Encoder,
        SuperEncoder,
        UnkeyedEncodingContainer,
        storage::{NodeId, ValueRef},
    },
    error::{Error, Result},
};

/// A container that encodes values keyed by a [`CodingKey`].
///
/// Writes go into an ordered keyed node owned by the encoder; encoding the
/// same key twice replaces the value in place.
pub struct KeyedEncodingContainer<'a, K: CodingKey> {
    encoder: &'a mut Encoder,
    node: NodeId,
    path: Vec<PathComponent>,
    _marker: PhantomData<fn(&K)>,
}

impl<'a, K: CodingKey> KeyedEncodingContainer<'a, K> {
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
            _marker: PhantomData,
        }
    }

    /// The coding path of this container.
    pub fn coding_path(&self) -> &[PathComponent] {
        &self.path
    }

    fn insert(&mut self, key: String, value: ValueRef) -> Result<()> {
        let path = &self.path;
        let map = self
            .encoder
            .storage
            .document_node_mut(self.node)
            .ok_or_else(|| {
                Error::internal("keyed container node is no longer a document")
                    .with_path(crate::coding::path_string(path))
            })?;
        map.insert(key, value);
        Ok(())
    }

    fn put(&mut self, key: &K, value: Bson) -> Result<()> {
        self.insert(key.key().into_owned(), ValueRef::Value(value))
    }

    /// Encodes a null value for the given key.
    pub fn encode_nil(&mut self, key: &K) -> Result<()> {
        self.put(key, Bson::Null)
    }

    /// Encodes a boolean for the given key.
    pub fn encode_bool(&mut self, value: bool, key: &K) -> Result<()> {
        self.put(key, Bson::Boolean(value))
    }

    /// Encodes an `i8` as an `Int32` for the given key.
    pub fn encode_i8(&mut self, value: i8, key: &K) -> Result<()> {
        self.put(key, Bson::Int32(value.into()))
    }

    /// Encodes an `i16` as an `Int32` for the given key.
    pub fn encode_i16(&mut self, value: i16, key: &K) -> Result<()> {
        self.put(key, Bson::Int32(value.into()))
    }

    /// Encodes an `i32` for the given key.
    pub fn encode_i32(&mut self, value: i32, key: &K) -> Result<()> {
        self.put(key, Bson::Int32(value))
    }

    /// Encodes an `i64` for the given key.
    pub fn encode_i64(&mut self, value: i64, key: &K) -> Result<()> {
        self.put(key, Bson::Int64(value))
    }

    /// Encodes a `u8` as an `Int32` for the given key.
    pub fn encode_u8(&mut self, value: u8, key: &K) -> Result<()> {
        self.put(key, Bson::Int32(value.into()))
    }

    /// Encodes a `u16` as an `Int32` for the given key.
    pub fn encode_u16(&mut self, value: u16, key: &K) -> Result<()> {
        self.put(key, Bson::Int32(value.into()))
    }

    /// Encodes a `u32` as an `Int64` for the given key.
    pub fn encode_u32(&mut self, value: u32, key: &K) -> Result<()> {
        self.put(key, Bson::Int64(value.into()))
    }

    /// Encodes a `u64` as an `Int64` for the given key if it fits; fails
    /// with [`NumberOutOfRange`](crate::error::ErrorKind::NumberOutOfRange)
    /// otherwise.
    pub fn encode_u64(&mut self, value: u64, key: &K) -> Result<()> {
        let value = self
            .encoder
            .int64_from_u64(value)
            .map_err(|e| e.with_key(key.key()))?;
        self.put(key, Bson::Int64(value))
    }

    /// Encodes an `f32` as a `Double` for the given key.
    pub fn encode_f32(&mut self, value: f32, key: &K) -> Result<()> {
        self.put(key, Bson::Double(value.into()))
    }

    /// Encodes an `f64` for the given key.
    pub fn encode_f64(&mut self, value: f64, key: &K) -> Result<()> {
        self.put(key, Bson::Double(value))
    }

    /// Encodes a string for the given key.
    pub fn encode_str(&mut self, value: &str, key: &K) -> Result<()> {
        self.put(key, Bson::String(value.to_string()))
    }

    /// Encodes a datetime for the given key per the encoder's date strategy.
    pub fn encode_datetime(&mut self, value: DateTime, key: &K) -> Result<()> {
        let boxed = self.with_key_path(key, |encoder| encoder.box_date(value))?;
        self.put(key, boxed)
    }

    /// Encodes a UUID for the given key per the encoder's UUID strategy.
    pub fn encode_uuid(&mut self, value: uuid::Uuid, key: &K) -> Result<()> {
        let boxed = self.with_key_path(key, |encoder| encoder.box_uuid(value))?;
        self.put(key, boxed)
    }

    /// Encodes a byte buffer for the given key per the encoder's data
    /// strategy.
    pub fn encode_bytes(&mut self, value: &[u8], key: &K) -> Result<()> {
        let boxed = self.with_key_path(key, |encoder| encoder.box_bytes(value))?;
        self.put(key, boxed)
    }

    /// Encodes any [`Encode`] value for the given key.
    pub fn encode_encodable<T: Encode + ?Sized>(&mut self, value: &T, key: &K) -> Result<()> {
        let boxed = self.with_key_path(key, |encoder| encoder.box_value(value))?;
        self.put(key, boxed)
    }

    /// Opens a nested keyed container at the given key.
    pub fn nested_keyed_container<NK: CodingKey>(
        &mut self,
        key: &K,
    ) -> Result<KeyedEncodingContainer<'_, NK>> {
        let key_string = key.key().into_owned();
        let child = self.encoder.storage.alloc_document();
        self.insert(key_string.clone(), ValueRef::Node(child))?;

        let mut path = self.path.clone();
        path.push(PathComponent::Key(key_string));
        Ok(KeyedEncodingContainer::with_path(self.encoder, child, path))
    }

    /// Opens a nested unkeyed container at the given key.
    pub fn nested_unkeyed_container(&mut self, key: &K) -> Result<UnkeyedEncodingContainer<'_>> {
        let key_string = key.key().into_owned();
        let child = self.encoder.storage.alloc_array();
        self.insert(key_string.clone(), ValueRef::Node(child))?;

        let mut path = self.path.clone();
        path.push(PathComponent::Key(key_string));
        Ok(UnkeyedEncodingContainer::with_path(self.encoder, child, path))
    }

    /// Returns an encoder whose encoded value is spliced into the given key
    /// of this container when it is dropped. Supports encoding a super-class
    /// representation into a reserved slot.
    pub fn super_encoder(&mut self, key: &K) -> Result<SuperEncoder<'_>> {
        let key_string = key.key().into_owned();
        // reserve the slot so splicing preserves this position
        self.insert(key_string.clone(), ValueRef::Value(Bson::Null))?;

        let mut path = self.path.clone();
        path.push(PathComponent::Key(key_string.clone()));
        Ok(SuperEncoder::new(
            self.encoder,
            self.node,
            PathComponent::Key(key_string),
            path,
        ))
    }

    fn with_key_path<T>(
        &mut self,
        key: &K,
        f: impl FnOnce(&mut Encoder) -> Result<T>,
    ) -> Result<T> {
        self.encoder
            .coding_path
            .push(PathComponent::Key(key.key().into_owned()));
        let result = f(self.encoder);
        self.encoder.coding_path.pop();
        result
    }
}
