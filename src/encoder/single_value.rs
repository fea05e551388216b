use crate::{
    Bson,
    DateTime,
    coding::ByteBuf,
    encoder::{Encode, Encoder},
    error::Result,
};

/// A container that encodes exactly one value at the encoder's current
/// coding path.
///
/// Every method checks that no value has been encoded at this path yet, so
/// encoding twice through the same container reports an
/// [`Internal`](crate::error::ErrorKind::Internal) error.
pub struct SingleValueEncodingContainer<'a> {
    encoder: &'a mut Encoder,
}

impl<'a> SingleValueEncodingContainer<'a> {
    pub(crate) fn new(encoder: &'a mut Encoder) -> Self {
        Self { encoder }
    }

    /// Encodes a BSON value as-is.
    pub fn encode_bson(&mut self, value: Bson) -> Result<()> {
        self.encoder.assert_can_encode_new_value()?;
        self.encoder.storage.push_value(value);
        Ok(())
    }

    /// Encodes a null value.
    pub fn encode_nil(&mut self) -> Result<()> {
        self.encode_bson(Bson::Null)
    }

    /// Encodes a boolean.
    pub fn encode_bool(&mut self, value: bool) -> Result<()> {
        self.encode_bson(Bson::Boolean(value))
    }

    /// Encodes an `i8` as an `Int32`.
    pub fn encode_i8(&mut self, value: i8) -> Result<()> {
        self.encode_bson(Bson::Int32(value.into()))
    }

    /// Encodes an `i16` as an `Int32`.
    pub fn encode_i16(&mut self, value: i16) -> Result<()> {
        self.encode_bson(Bson::Int32(value.into()))
    }

    /// Encodes an `i32`.
    pub fn encode_i32(&mut self, value: i32) -> Result<()> {
        self.encode_bson(Bson::Int32(value))
    }

    /// Encodes an `i64`.
    pub fn encode_i64(&mut self, value: i64) -> Result<()> {
        self.encode_bson(Bson::Int64(value))
    }

    /// Encodes a `u8` as an `Int32`.
    pub fn encode_u8(&mut self, value: u8) -> Result<()> {
        self.encode_bson(Bson::Int32(value.into()))
    }

    /// Encodes a `u16` as an `Int32`.
    pub fn encode_u16(&mut self, value: u16) -> Result<()> {
        self.encode_bson(Bson::Int32(value.into()))
    }

    /// Encodes a `u32` as an `Int64`.
    pub fn encode_u32(&mut self, value: u32) -> Result<()> {
        self.encode_bson(Bson::Int64(value.into()))
    }

    /// Encodes a `u64` as an `Int64` if it fits; fails with
    /// [`NumberOutOfRange`](crate::error::ErrorKind::NumberOutOfRange)
    /// otherwise.
    pub fn encode_u64(&mut self, value: u64) -> Result<()> {
        let value = self.encoder.int64_from_u64(value)?;
        self.encode_bson(Bson::Int64(value))
    }

    /// Encodes an `f32` as a `Double`.
    pub fn encode_f32(&mut self, value: f32) -> Result<()> {
        self.encode_bson(Bson::Double(value.into()))
    }

    /// Encodes an `f64`.
    pub fn encode_f64(&mut self, value: f64) -> Result<()> {
        self.encode_bson(Bson::Double(value))
    }

    /// Encodes a string.
    pub fn encode_str(&mut self, value: &str) -> Result<()> {
        self.encode_bson(Bson::String(value.to_string()))
    }

    /// Encodes a datetime per the encoder's date strategy.
    pub fn encode_datetime(&mut self, value: DateTime) -> Result<()> {
        self.encoder.assert_can_encode_new_value()?;
        let boxed = self.encoder.box_date(value)?;
        self.encoder.storage.push_value(boxed);
        Ok(())
    }

    /// Encodes a UUID per the encoder's UUID strategy.
    pub fn encode_uuid(&mut self, value: uuid::Uuid) -> Result<()> {
        self.encoder.assert_can_encode_new_value()?;
        let boxed = self.encoder.box_uuid(value)?;
        self.encoder.storage.push_value(boxed);
        Ok(())
    }

    /// Encodes a byte buffer per the encoder's data strategy.
    pub fn encode_bytes(&mut self, value: &[u8]) -> Result<()> {
        self.encoder.assert_can_encode_new_value()?;
        let boxed = self.encoder.box_bytes(value)?;
        self.encoder.storage.push_value(boxed);
        Ok(())
    }

    /// Encodes any [`Encode`] value.
    pub fn encode_encodable<T: Encode + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.encoder.assert_can_encode_new_value()?;
        let boxed = self.encoder.box_value(value)?;
        self.encoder.storage.push_value(boxed);
        Ok(())
    }

    /// A convenience wrapper around [`ByteBuf`] encoding.
    pub fn encode_byte_buf(&mut self, value: &ByteBuf) -> Result<()> {
        self.encode_bytes(value.as_slice())
    }
}
