use crate::{
    Bson,
    DateTime,
    coding::{CodingKey, PathComponent, path_string},
    decoder::{
        Decode,
        Decoder,
        KeyedDecodingContainer,
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

/// A container that decodes values positionally from a BSON array.
///
/// The container tracks the index of the next value to decode; a failed
/// decode does not advance it. Exhausting the container reports
/// [`ValueNotFound`](crate::error::ErrorKind::ValueNotFound).
pub struct UnkeyedDecodingContainer<'a> {
    decoder: &'a mut Decoder,
    items: Vec<Bson>,
    path: Vec<PathComponent>,
    current_index: usize,
}

impl<'a> UnkeyedDecodingContainer<'a> {
    pub(crate) fn new(decoder: &'a mut Decoder, items: Vec<Bson>) -> Self {
        let path = decoder.coding_path.clone();
        Self::with_path(decoder, items, path)
    }

    pub(crate) fn with_path(
        decoder: &'a mut Decoder,
        items: Vec<Bson>,
        path: Vec<PathComponent>,
    ) -> Self {
        Self {
            decoder,
            items,
            path,
            current_index: 0,
        }
    }

    /// The coding path of this container.
    pub fn coding_path(&self) -> &[PathComponent] {
        &self.path
    }

    /// The total number of values in the container.
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// The index of the next value to decode.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Whether every value has been decoded.
    pub fn is_at_end(&self) -> bool {
        self.current_index >= self.items.len()
    }

    fn path_with_index(&self) -> Vec<PathComponent> {
        let mut path = self.path.clone();
        path.push(PathComponent::Index(self.current_index));
        path
    }

    fn peek(&self, expected: &str) -> Result<&Bson> {
        self.items.get(self.current_index).ok_or_else(|| {
            Error::value_not_found(expected)
                .with_index(self.current_index)
                .with_path(path_string(&self.path))
        })
    }

    fn at_index(&self, e: Error) -> Error {
        e.with_path(path_string(&self.path_with_index()))
    }

    /// Whether the next value is null, advancing past it if so.
    pub fn decode_nil(&mut self) -> Result<bool> {
        if self.peek("a null value")?.is_null() {
            self.current_index += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Decodes the next value as a boolean.
    pub fn decode_bool(&mut self) -> Result<bool> {
        let result = unbox_bool(self.peek("Boolean")?).map_err(|e| self.at_index(e))?;
        self.current_index += 1;
        Ok(result)
    }

    /// Decodes the next value as an `i8`, coercing exactly.
    pub fn decode_i8(&mut self) -> Result<i8> {
        let result = unbox_i8(self.peek("Int8")?).map_err(|e| self.at_index(e))?;
        self.current_index += 1;
        Ok(result)
    }

    /// Decodes the next value as an `i16`, coercing exactly.
    pub fn decode_i16(&mut self) -> Result<i16> {
        let result = unbox_i16(self.peek("Int16")?).map_err(|e| self.at_index(e))?;
        self.current_index += 1;
        Ok(result)
    }

    /// Decodes the next value as an `i32`, coercing exactly.
    pub fn decode_i32(&mut self) -> Result<i32> {
        let result = unbox_i32(self.peek("Int32")?).map_err(|e| self.at_index(e))?;
        self.current_index += 1;
        Ok(result)
    }

    /// Decodes the next value as an `i64`, coercing exactly.
    pub fn decode_i64(&mut self) -> Result<i64> {
        let result = unbox_i64(self.peek("Int64")?).map_err(|e| self.at_index(e))?;
        self.current_index += 1;
        Ok(result)
    }

    /// Decodes the next value as a `u8`, coercing exactly.
    pub fn decode_u8(&mut self) -> Result<u8> {
        let result = unbox_u8(self.peek("UInt8")?).map_err(|e| self.at_index(e))?;
        self.current_index += 1;
        Ok(result)
    }

    /// Decodes the next value as a `u16`, coercing exactly.
    pub fn decode_u16(&mut self) -> Result<u16> {
        let result = unbox_u16(self.peek("UInt16")?).map_err(|e| self.at_index(e))?;
        self.current_index += 1;
        Ok(result)
    }

    /// Decodes the next value as a `u32`, coercing exactly.
    pub fn decode_u32(&mut self) -> Result<u32> {
        let result = unbox_u32(self.peek("UInt32")?).map_err(|e| self.at_index(e))?;
        self.current_index += 1;
        Ok(result)
    }

    /// Decodes the next value as a `u64`, coercing exactly.
    pub fn decode_u64(&mut self) -> Result<u64> {
        let result = unbox_u64(self.peek("UInt64")?).map_err(|e| self.at_index(e))?;
        self.current_index += 1;
        Ok(result)
    }

    /// Decodes the next value as an `f32`, coercing exactly.
    pub fn decode_f32(&mut self) -> Result<f32> {
        let result = unbox_f32(self.peek("Float")?).map_err(|e| self.at_index(e))?;
        self.current_index += 1;
        Ok(result)
    }

    /// Decodes the next value as an `f64`, coercing exactly.
    pub fn decode_f64(&mut self) -> Result<f64> {
        let result = unbox_f64(self.peek("Double")?).map_err(|e| self.at_index(e))?;
        self.current_index += 1;
        Ok(result)
    }

    /// Decodes the next value as a string.
    pub fn decode_string(&mut self) -> Result<String> {
        let result = unbox_string(self.peek("String")?).map_err(|e| self.at_index(e))?;
        self.current_index += 1;
        Ok(result)
    }

    /// Decodes the next value as a datetime per the decoder's date strategy.
    pub fn decode_datetime(&mut self) -> Result<DateTime> {
        let value = self.peek("DateTime")?.clone();
        let path = self.path_with_index();
        let result = self
            .decoder
            .unbox_date(&value)
            .map_err(|e| e.with_path(path_string(&path)))?;
        self.current_index += 1;
        Ok(result)
    }

    /// Decodes the next value as a UUID per the decoder's UUID strategy.
    pub fn decode_uuid(&mut self) -> Result<uuid::Uuid> {
        let value = self.peek("Uuid")?.clone();
        let path = self.path_with_index();
        let result = self
            .decoder
            .unbox_uuid(&value)
            .map_err(|e| e.with_path(path_string(&path)))?;
        self.current_index += 1;
        Ok(result)
    }

    /// Decodes the next value as a byte buffer per the decoder's data
    /// strategy.
    pub fn decode_bytes(&mut self) -> Result<Vec<u8>> {
        let value = self.peek("Binary")?.clone();
        let path = self.path_with_index();
        let result = self
            .decoder
            .unbox_bytes(&value)
            .map_err(|e| e.with_path(path_string(&path)))?;
        self.current_index += 1;
        Ok(result)
    }

    /// Decodes the next value as any [`Decode`] type.
    pub fn decode_decodable<T: Decode>(&mut self) -> Result<T> {
        let value = self.peek(std::any::type_name::<T>())?.clone();
        let path = self.path_with_index();
        let result = self.decoder.with_focused_at(value, path, T::decode)?;
        self.current_index += 1;
        Ok(result)
    }

    /// Opens a keyed container over the next value.
    pub fn nested_keyed_container<NK: CodingKey>(
        &mut self,
    ) -> Result<KeyedDecodingContainer<'_, NK>> {
        let value = self.peek("Document")?.clone();
        let path = self.path_with_index();
        match value {
            Bson::Document(doc) => {
                self.current_index += 1;
                Ok(KeyedDecodingContainer::with_path(self.decoder, doc, path))
            }
            other => Err(type_mismatch_for("Document", &other).with_path(path_string(&path))),
        }
    }

    /// Opens an unkeyed container over the next value.
    pub fn nested_unkeyed_container(&mut self) -> Result<UnkeyedDecodingContainer<'_>> {
        let value = self.peek("Array")?.clone();
        let path = self.path_with_index();
        match value {
            Bson::Array(items) => {
                self.current_index += 1;
                Ok(UnkeyedDecodingContainer::with_path(
                    self.decoder,
                    items,
                    path,
                ))
            }
            other => Err(type_mismatch_for("Array", &other).with_path(path_string(&path))),
        }
    }

    /// Returns a decoder focused on the next value, advancing past it.
    pub fn super_decoder(&mut self) -> Result<Decoder> {
        let value = self.peek("a value")?.clone();
        let mut decoder = Decoder::with_options(self.decoder.options.clone());
        decoder.coding_path = self.path_with_index();
        decoder.storage.push(value);
        self.current_index += 1;
        Ok(decoder)
    }
}
