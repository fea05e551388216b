use crate::{
    Bson,
    DateTime,
    decoder::{
        Decode,
        Decoder,
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
    error::Result,
};

/// A container that decodes a single value from the decoder's current focus.
pub struct SingleValueDecodingContainer<'a> {
    decoder: &'a mut Decoder,
}

impl<'a> SingleValueDecodingContainer<'a> {
    pub(crate) fn new(decoder: &'a mut Decoder) -> Self {
        Self { decoder }
    }

    fn value(&self) -> Result<&Bson> {
        self.decoder.top()
    }

    fn at_path(&self, e: crate::error::Error) -> crate::error::Error {
        e.with_path(self.decoder.path_string())
    }

    /// The focused BSON value, as-is.
    pub fn decode_bson(&mut self) -> Result<Bson> {
        self.value().cloned()
    }

    /// Whether the focused value is null.
    pub fn decode_nil(&mut self) -> Result<bool> {
        Ok(self.value()?.is_null())
    }

    /// Decodes the focused value as a boolean.
    pub fn decode_bool(&mut self) -> Result<bool> {
        unbox_bool(self.value()?).map_err(|e| self.at_path(e))
    }

    /// Decodes the focused value as an `i8`, coercing exactly.
    pub fn decode_i8(&mut self) -> Result<i8> {
        unbox_i8(self.value()?).map_err(|e| self.at_path(e))
    }

    /// Decodes the focused value as an `i16`, coercing exactly.
    pub fn decode_i16(&mut self) -> Result<i16> {
        unbox_i16(self.value()?).map_err(|e| self.at_path(e))
    }

    /// Decodes the focused value as an `i32`, coercing exactly.
    pub fn decode_i32(&mut self) -> Result<i32> {
        unbox_i32(self.value()?).map_err(|e| self.at_path(e))
    }

    /// Decodes the focused value as an `i64`, coercing exactly.
    pub fn decode_i64(&mut self) -> Result<i64> {
        unbox_i64(self.value()?).map_err(|e| self.at_path(e))
    }

    /// Decodes the focused value as a `u8`, coercing exactly.
    pub fn decode_u8(&mut self) -> Result<u8> {
        unbox_u8(self.value()?).map_err(|e| self.at_path(e))
    }

    /// Decodes the focused value as a `u16`, coercing exactly.
    pub fn decode_u16(&mut self) -> Result<u16> {
        unbox_u16(self.value()?).map_err(|e| self.at_path(e))
    }

    /// Decodes the focused value as a `u32`, coercing exactly.
    pub fn decode_u32(&mut self) -> Result<u32> {
        unbox_u32(self.value()?).map_err(|e| self.at_path(e))
    }

    /// Decodes the focused value as a `u64`, coercing exactly.
    pub fn decode_u64(&mut self) -> Result<u64> {
        unbox_u64(self.value()?).map_err(|e| self.at_path(e))
    }

    /// Decodes the focused value as an `f32`, coercing exactly.
    pub fn decode_f32(&mut self) -> Result<f32> {
        unbox_f32(self.value()?).map_err(|e| self.at_path(e))
    }

    /// Decodes the focused value as an `f64`, coercing exactly.
    pub fn decode_f64(&mut self) -> Result<f64> {
        unbox_f64(self.value()?).map_err(|e| self.at_path(e))
    }

    /// Decodes the focused value as a string.
    pub fn decode_string(&mut self) -> Result<String> {
        unbox_string(self.value()?).map_err(|e| self.at_path(e))
    }

    /// Decodes the focused value as a datetime per the decoder's date
    /// strategy.
    pub fn decode_datetime(&mut self) -> Result<DateTime> {
        let value = self.value()?.clone();
        self.decoder
            .unbox_date(&value)
            .map_err(|e| e.with_path(self.decoder.path_string()))
    }

    /// Decodes the focused value as a UUID per the decoder's UUID strategy.
    pub fn decode_uuid(&mut self) -> Result<uuid::Uuid> {
        let value = self.value()?.clone();
        self.decoder
            .unbox_uuid(&value)
            .map_err(|e| e.with_path(self.decoder.path_string()))
    }

    /// Decodes the focused value as a byte buffer per the decoder's data
    /// strategy.
    pub fn decode_bytes(&mut self) -> Result<Vec<u8>> {
        let value = self.value()?.clone();
        self.decoder
            .unbox_bytes(&value)
            .map_err(|e| e.with_path(self.decoder.path_string()))
    }

    /// Decodes the focused value as any [`Decode`] type.
    pub fn decode_decodable<T: Decode>(&mut self) -> Result<T> {
        T::decode(self.decoder)
    }
}
