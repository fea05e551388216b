use std::marker::PhantomData;

use crate::{
    Bson,
    DateTime,
    Document,
    coding::{CodingKey, PathComponent, path_string},
    decoder::{
        Decode,
        Decoder,
        UnkeyedDecodingContainer,
        type_mismatch_for,
        unbox_bool,
        unbox_f32,
        unbox_f64,
        unbox_i8,
        unbox_i16,
        unbox_i32,
        unbox_i64,
        unbox_string,
        unbox_u8,
        unbox_u16,
        unbox_u32,
        unbox_u64,
    },
    error::{Error, Result},
};

/// A container that decodes values keyed by a [`CodingKey`].
///
/// Lookup requires an exact key match; a missing key reports
/// [`KeyNotFound`](crate::error::ErrorKind::KeyNotFound), while a key that is
/// present with a null value reports `true` from
/// [`decode_nil`](Self::decode_nil).
pub struct KeyedDecodingContainer<'a, K: CodingKey> {
    decoder: &'a mut Decoder,
    doc: Document,
    path: Vec<PathComponent>,
    _marker: PhantomData<fn(&K)>,
}

impl<'a, K: CodingKey> KeyedDecodingContainer<'a, K> {
    pub(crate) fn new(decoder: &'a mut Decoder, doc: Document) -> Self {
        let path = decoder.coding_path.clone();
        Self::with_path(decoder, doc, path)
    }

    pub(crate) fn with_path(
        decoder: &'a mut Decoder,
        doc: Document,
        path: Vec<PathComponent>,
    ) -> Self {
        Self {
            decoder,
            doc,
            path,
            _marker: PhantomData,
        }
    }

    /// The coding path of this container.
    pub fn coding_path(&self) -> &[PathComponent] {
        &self.path
    }

    /// All keys the document contains, in document order.
    pub fn keys(&self) -> Vec<String> {
        self.doc.keys().map(str::to_string).collect()
    }

    /// Whether the document contains the given key.
    pub fn contains(&self, key: &K) -> bool {
        self.doc.contains_key(key.key())
    }

    fn path_with(&self, key: &K) -> Vec<PathComponent> {
        let mut path = self.path.clone();
        path.push(PathComponent::Key(key.key().into_owned()));
        path
    }

    fn lookup(&self, key: &K) -> Result<Bson> {
        let name = key.key();
        self.doc.get(name.as_ref()).ok_or_else(|| {
            Error::key_not_found(name.into_owned()).with_path(path_string(&self.path))
        })
    }

    fn at_key(&self, key: &K, e: Error) -> Error {
        e.with_path(path_string(&self.path_with(key)))
    }

    /// Whether the value for the given key is null. A missing key is an
    /// error, distinct from an explicit null.
    pub fn decode_nil(&mut self, key: &K) -> Result<bool> {
        Ok(self.lookup(key)?.is_null())
    }

    /// Decodes a boolean for the given key.
    pub fn decode_bool(&mut self, key: &K) -> Result<bool> {
        let value = self.lookup(key)?;
        unbox_bool(&value).map_err(|e| self.at_key(key, e))
    }

    /// Decodes an `i8` for the given key, coercing exactly.
    pub fn decode_i8(&mut self, key: &K) -> Result<i8> {
        let value = self.lookup(key)?;
        unbox_i8(&value).map_err(|e| self.at_key(key, e))
    }

    /// Decodes an `i16` for the given key, coercing exactly.
    pub fn decode_i16(&mut self, key: &K) -> Result<i16> {
        let value = self.lookup(key)?;
        unbox_i16(&value).map_err(|e| self.at_key(key, e))
    }

    /// Decodes an `i32` for the given key, coercing exactly.
    pub fn decode_i32(&mut self, key: &K) -> Result<i32> {
        let value = self.lookup(key)?;
        unbox_i32(&value).map_err(|e| self.at_key(key, e))
    }

    /// Decodes an `i64` for the given key, coercing exactly.
    pub fn decode_i64(&mut self, key: &K) -> Result<i64> {
        let value = self.lookup(key)?;
        unbox_i64(&value).map_err(|e| self.at_key(key, e))
    }

    /// Decodes a `u8` for the given key, coercing exactly.
    pub fn decode_u8(&mut self, key: &K) -> Result<u8> {
        let value = self.lookup(key)?;
        unbox_u8(&value).map_err(|e| self.at_key(key, e))
    }

    /// Decodes a `u16` for the given key, coercing exactly.
    pub fn decode_u16(&mut self, key: &K) -> Result<u16> {
        let value = self.lookup(key)?;
        unbox_u16(&value).map_err(|e| self.at_key(key, e))
    }

    /// Decodes a `u32` for the given key, coercing exactly.
    pub fn decode_u32(&mut self, key: &K) -> Result<u32> {
        let value = self.lookup(key)?;
        unbox_u32(&value).map_err(|e| self.at_key(key, e))
    }

    /// Decodes a `u64` for the given key, coercing exactly.
    pub fn decode_u64(&mut self, key: &K) -> Result<u64> {
        let value = self.lookup(key)?;
        unbox_u64(&value).map_err(|e| self.at_key(key, e))
    }

    /// Decodes an `f32` for the given key, coercing exactly.
    pub fn decode_f32(&mut self, key: &K) -> Result<f32> {
        let value = self.lookup(key)?;
        unbox_f32(&value).map_err(|e| self.at_key(key, e))
    }

    /// Decodes an `f64` for the given key, coercing exactly.
    pub fn decode_f64(&mut self, key: &K) -> Result<f64> {
        let value = self.lookup(key)?;
        unbox_f64(&value).map_err(|e| self.at_key(key, e))
    }

    /// Decodes a string for the given key.
    pub fn decode_string(&mut self, key: &K) -> Result<String> {
        let value = self.lookup(key)?;
        unbox_string(&value).map_err(|e| self.at_key(key, e))
    }

    /// Decodes a datetime for the given key per the decoder's date strategy.
    pub fn decode_datetime(&mut self, key: &K) -> Result<DateTime> {
        let value = self.lookup(key)?;
        let path = self.path_with(key);
        self.decoder
            .unbox_date(&value)
            .map_err(|e| e.with_path(path_string(&path)))
    }

    /// Decodes a UUID for the given key per the decoder's UUID strategy.
    pub fn decode_uuid(&mut self, key: &K) -> Result<uuid::Uuid> {
        let value = self.lookup(key)?;
        let path = self.path_with(key);
        self.decoder
            .unbox_uuid(&value)
            .map_err(|e| e.with_path(path_string(&path)))
    }

    /// Decodes a byte buffer for the given key per the decoder's data
    /// strategy.
    pub fn decode_bytes(&mut self, key: &K) -> Result<Vec<u8>> {
        let value = self.lookup(key)?;
        let path = self.path_with(key);
        self.decoder
            .unbox_bytes(&value)
            .map_err(|e| e.with_path(path_string(&path)))
    }

    /// Decodes any [`Decode`] value for the given key.
    pub fn decode_decodable<T: Decode>(&mut self, key: &K) -> Result<T> {
        let value = self.lookup(key)?;
        let path = self.path_with(key);
        self.decoder.with_focused_at(value, path, T::decode)
    }

    /// Decodes a value for the given key if it is present and non-null.
    pub fn decode_if_present<T: Decode>(&mut self, key: &K) -> Result<Option<T>> {
        match self.doc.get(key.key().as_ref()) {
            None | Some(Bson::Null) => Ok(None),
            Some(value) => {
                let path = self.path_with(key);
                self.decoder
                    .with_focused_at(value, path, T::decode)
                    .map(Some)
            }
        }
    }

    /// Opens a nested keyed container at the given key.
    pub fn nested_keyed_container<NK: CodingKey>(
        &mut self,
        key: &K,
    ) -> Result<KeyedDecodingContainer<'_, NK>> {
        let value = self.lookup(key)?;
        let path = self.path_with(key);
        match value {
            Bson::Document(doc) => Ok(KeyedDecodingContainer::with_path(self.decoder, doc, path)),
            other => Err(type_mismatch_for("Document", &other).with_path(path_string(&path))),
        }
    }

    /// Opens a nested unkeyed container at the given key.
    pub fn nested_unkeyed_container(&mut self, key: &K) -> Result<UnkeyedDecodingContainer<'_>> {
        let value = self.lookup(key)?;
        let path = self.path_with(key);
        match value {
            Bson::Array(items) => Ok(UnkeyedDecodingContainer::with_path(
                self.decoder,
                items,
                path,
            )),
            other => Err(type_mismatch_for("Array", &other).with_path(path_string(&path))),
        }
    }

    /// Returns a decoder focused on the value for the given key, or on null
    /// if the key is missing. Supports decoding a super-class representation.
    pub fn super_decoder(&mut self, key: &K) -> Result<Decoder> {
        let value = self.doc.get(key.key().as_ref()).unwrap_or(Bson::Null);
        let mut decoder = Decoder::with_options(self.decoder.options.clone());
        decoder.coding_path = self.path_with(key);
        decoder.storage.push(value);
        Ok(decoder)
    }
}
