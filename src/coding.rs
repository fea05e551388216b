//! Shared plumbing for the container-based coding protocol: coding keys,
//! coding paths, and the byte-buffer wrapper type.

use std::borrow::Cow;
use std::fmt::{self, Display, Write};

/// A key used to encode or decode a value in a keyed container.
///
/// Most callers implement this on a field-name enum; `&str`, `String`, and
/// `usize` implementations are provided for ad-hoc use.
pub trait CodingKey {
    /// The string form of the key, as stored in documents and rendered in
    /// coding paths.
    fn key(&self) -> Cow<'_, str>;

    /// The integer form of the key, for keys that are semantically indices.
    fn int_value(&self) -> Option<usize> {
        None
    }
}

impl CodingKey for str {
    fn key(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl CodingKey for &str {
    fn key(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl CodingKey for String {
    fn key(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

impl CodingKey for usize {
    fn key(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn int_value(&self) -> Option<usize> {
        Some(*self)
    }
}

/// One step of the path an encoder or decoder has taken into a value: a
/// document key or an array index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathComponent {
    /// A document key.
    Key(String),
    /// An array index.
    Index(usize),
}

impl Display for PathComponent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PathComponent::Key(k) => f.write_str(k),
            PathComponent::Index(i) => write!(f, "[{i}]"),
        }
    }
}

/// Renders a coding path in dotted/indexed form, e.g. `pets[1].name`.
pub(crate) fn path_string(path: &[PathComponent]) -> String {
    let mut out = String::new();
    for component in path {
        match component {
            PathComponent::Key(k) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(k);
            }
            PathComponent::Index(i) => {
                let _ = write!(out, "[{i}]");
            }
        }
    }
    out
}

/// A byte buffer with its own coding behavior.
///
/// `Vec<u8>` encodes through the generic `Vec<T>` path as a BSON array of
/// integers; wrapping the bytes in a `ByteBuf` routes them through the
/// configured [data strategy](crate::encoder::DataEncodingStrategy) instead
/// (generic binary by default).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ByteBuf {
    bytes: Vec<u8>,
}

impl ByteBuf {
    /// Wraps a byte vector.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// The wrapped bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Unwraps the byte vector.
    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }
}

impl From<Vec<u8>> for ByteBuf {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<ByteBuf> for Vec<u8> {
    fn from(buf: ByteBuf) -> Self {
        buf.into_vec()
    }
}

impl AsRef<[u8]> for ByteBuf {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}
