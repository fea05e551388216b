//! Module containing functionality related to BSON binary values.

use std::fmt::{self, Display};

use crate::{
    base64,
    error::{Error, Result},
    spec::BinarySubtype,
};

/// Represents a BSON binary value.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Binary {
    /// The subtype of the bytes.
    pub subtype: BinarySubtype,

    /// The binary bytes.
    pub bytes: Vec<u8>,
}

impl Display for Binary {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(
            fmt,
            "Binary({:#x}, {})",
            u8::from(self.subtype),
            base64::encode(&self.bytes)
        )
    }
}

impl Binary {
    /// Creates a [`Binary`] with the given subtype and bytes, validating the
    /// subtype's constraints: UUID subtypes (0x03 and 0x04) require exactly
    /// 16 bytes of data.
    pub fn new(subtype: BinarySubtype, bytes: Vec<u8>) -> Result<Self> {
        if matches!(subtype, BinarySubtype::Uuid | BinarySubtype::UuidOld) && bytes.len() != 16 {
            return Err(Error::invalid_argument(format!(
                "UUID binary values must contain 16 bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self { subtype, bytes })
    }

    /// Creates a [`Binary`] with subtype [`BinarySubtype::Generic`].
    pub fn generic(bytes: Vec<u8>) -> Self {
        Self {
            subtype: BinarySubtype::Generic,
            bytes,
        }
    }

    /// Creates a [`Binary`] from a base64 string and optional [`BinarySubtype`]. If the
    /// `subtype` argument is [`None`], the [`Binary`] constructed will default to
    /// [`BinarySubtype::Generic`].
    pub fn from_base64(
        input: impl AsRef<str>,
        subtype: impl Into<Option<BinarySubtype>>,
    ) -> Result<Self> {
        let bytes = base64::decode(input.as_ref())
            .map_err(|e| Error::invalid_argument(format!("invalid base64: {e}")))?;
        let subtype = match subtype.into() {
            Some(s) => s,
            None => BinarySubtype::Generic,
        };
        Binary::new(subtype, bytes)
    }

    /// Creates a [`Binary`] with subtype [`BinarySubtype::Uuid`] containing
    /// the UUID's big-endian bytes.
    pub fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self {
            subtype: BinarySubtype::Uuid,
            bytes: uuid.as_bytes().to_vec(),
        }
    }

    /// Interprets this [`Binary`] as a UUID. Fails unless the subtype is
    /// [`BinarySubtype::Uuid`].
    pub fn to_uuid(&self) -> Result<uuid::Uuid> {
        if self.subtype != BinarySubtype::Uuid {
            return Err(Error::invalid_argument(format!(
                "expected binary subtype {:#04x} for a UUID, got {:#04x}",
                u8::from(BinarySubtype::Uuid),
                u8::from(self.subtype),
            )));
        }
        let bytes: [u8; 16] = self.bytes.as_slice().try_into().map_err(|_| {
            Error::invalid_argument(format!(
                "expected 16 bytes of UUID data, got {}",
                self.bytes.len()
            ))
        })?;
        Ok(uuid::Uuid::from_bytes(bytes))
    }
}

impl From<uuid::Uuid> for Binary {
    fn from(uuid: uuid::Uuid) -> Self {
        Binary::from_uuid(uuid)
    }
}
