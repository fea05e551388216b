//! Contains the error-related types for the `bsonic` crate.

use thiserror::Error;

use crate::spec::ElementType;

/// The result type for all methods that can return an error in the `bsonic` crate.
pub type Result<T> = std::result::Result<T, Error>;

/// An error that can occur in the `bsonic` crate.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,

    /// An optional message describing the error.
    pub message: Option<String>,

    /// The document key associated with the error, if any.
    pub key: Option<String>,

    /// The array index associated with the error, if any.
    pub index: Option<usize>,

    /// The coding path at which an encode or decode error occurred, rendered
    /// as a dotted/indexed string (e.g. `"pets[1].name"`), if any.
    pub path: Option<String>,

    /// The byte offset at which a parse error was detected, if any.
    pub offset: Option<usize>,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BSON error")?;

        if let Some(path) = self.path.as_deref() {
            write!(f, " at path \"{path}\"")?;
        } else if let Some(key) = self.key.as_deref() {
            write!(f, " at key \"{key}\"")?;
        } else if let Some(index) = self.index {
            write!(f, " at array index {index}")?;
        }

        if let Some(offset) = self.offset {
            write!(f, " (byte offset {offset})")?;
        }

        write!(f, ". Kind: {}", self.kind)?;
        if let Some(ref message) = self.message {
            write!(f, ". Message: {}", message)?;
        }

        write!(f, ".")
    }
}

/// The types of errors that can occur in the `bsonic` crate.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Malformed input was given to a constructor: bad hex, wrong UUID
    /// length, an invalid decimal string, a reserved binary subtype.
    #[error("An invalid argument was provided")]
    #[non_exhaustive]
    InvalidArgument {},

    /// A structural error occurred on input that was known to be valid, or
    /// the encoder/decoder reached an unexpected state.
    #[error("An internal error occurred")]
    #[non_exhaustive]
    Internal {},

    /// An append would push a document past the maximum size.
    #[error("Document size {attempted} would exceed the maximum of {maximum} bytes")]
    #[non_exhaustive]
    TooLarge {
        /// The total document size the append would have produced.
        attempted: usize,

        /// The maximum size of a BSON document.
        maximum: usize,
    },

    /// Decoding requested a type incompatible with the stored value.
    #[error("Type mismatch: expected {expected}, found {found}")]
    #[non_exhaustive]
    TypeMismatch {
        /// The type the caller requested.
        expected: String,

        /// The type of the stored value.
        found: String,
    },

    /// A keyed container had no entry for the requested key.
    #[error("Key not found: \"{key}\"")]
    #[non_exhaustive]
    KeyNotFound {
        /// The missing key.
        key: String,
    },

    /// An unkeyed container was exhausted.
    #[error("No value found: expected {expected}")]
    #[non_exhaustive]
    ValueNotFound {
        /// A description of what the caller expected to decode.
        expected: String,
    },

    /// A numeric coercion would lose precision.
    #[error("Number {value} cannot be represented exactly as {target}")]
    #[non_exhaustive]
    NumberOutOfRange {
        /// The stored value, rendered as a string.
        value: String,

        /// The requested target type.
        target: String,
    },

    /// The wire form violates the BSON grammar.
    #[error("Corrupted BSON bytes")]
    #[non_exhaustive]
    DataCorrupted {},

    /// An error occurred when attempting to access a value in a document.
    #[error("An error occurred when attempting to access a document value: {kind}")]
    #[non_exhaustive]
    ValueAccess {
        /// The kind of error that occurred.
        kind: ValueAccessErrorKind,
    },

    /// An IO error occurred.
    #[error("An IO error occurred")]
    #[non_exhaustive]
    Io {},
}

/// The types of errors that can occur when attempting to access a value in a
/// document via the typed getters.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum ValueAccessErrorKind {
    /// No value for the specified key was present in the document.
    #[error("the key was not present in the document")]
    #[non_exhaustive]
    NotPresent {},

    /// The type of the value in the document did not match the requested type.
    #[error("expected element of type {expected:?}, found {actual:?}")]
    #[non_exhaustive]
    UnexpectedType {
        /// The type requested.
        expected: ElementType,

        /// The type of the value in the document.
        actual: ElementType,
    },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            key: None,
            index: None,
            path: None,
            offset: None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::from(ErrorKind::Io {}).with_message(value)
    }
}

impl Error {
    pub(crate) fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub(crate) fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub(crate) fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub(crate) fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub(crate) fn with_message(mut self, message: impl ToString) -> Self {
        self.message = Some(message.to_string());
        self
    }

    pub(crate) fn invalid_argument(message: impl ToString) -> Self {
        Self::from(ErrorKind::InvalidArgument {}).with_message(message)
    }

    pub(crate) fn internal(message: impl ToString) -> Self {
        Self::from(ErrorKind::Internal {}).with_message(message)
    }

    pub(crate) fn too_large(attempted: usize, maximum: usize) -> Self {
        Self::from(ErrorKind::TooLarge { attempted, maximum })
    }

    pub(crate) fn type_mismatch(expected: impl ToString, found: impl ToString) -> Self {
        Self::from(ErrorKind::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        })
    }

    pub(crate) fn key_not_found(key: impl Into<String>) -> Self {
        Self::from(ErrorKind::KeyNotFound { key: key.into() })
    }

    pub(crate) fn value_not_found(expected: impl ToString) -> Self {
        Self::from(ErrorKind::ValueNotFound {
            expected: expected.to_string(),
        })
    }

    pub(crate) fn number_out_of_range(value: impl ToString, target: impl ToString) -> Self {
        Self::from(ErrorKind::NumberOutOfRange {
            value: value.to_string(),
            target: target.to_string(),
        })
    }

    pub(crate) fn data_corrupted(message: impl ToString) -> Self {
        Self::from(ErrorKind::DataCorrupted {}).with_message(message)
    }

    pub(crate) fn value_access_not_present() -> Self {
        Self::from(ErrorKind::ValueAccess {
            kind: ValueAccessErrorKind::NotPresent {},
        })
    }

    pub(crate) fn value_access_unexpected_type(expected: ElementType, actual: ElementType) -> Self {
        Self::from(ErrorKind::ValueAccess {
            kind: ValueAccessErrorKind::UnexpectedType { expected, actual },
        })
    }

    // Parse failure modes. Each is `DataCorrupted` tagged with the byte
    // offset at which detection occurred.

    pub(crate) fn invalid_length(message: impl ToString, offset: usize) -> Self {
        Self::data_corrupted(format!("invalid length: {}", message.to_string())).with_offset(offset)
    }

    pub(crate) fn truncated(offset: usize) -> Self {
        Self::data_corrupted("input ended before the document did").with_offset(offset)
    }

    pub(crate) fn missing_terminator(offset: usize) -> Self {
        Self::data_corrupted("document is not null terminated").with_offset(offset)
    }

    pub(crate) fn invalid_utf8(offset: usize) -> Self {
        Self::data_corrupted("invalid UTF-8").with_offset(offset)
    }

    pub(crate) fn unknown_type(tag: u8, offset: usize) -> Self {
        Self::data_corrupted(format!("unknown element type {:#04x}", tag)).with_offset(offset)
    }

    pub(crate) fn unsorted_regex_options(options: &str, offset: usize) -> Self {
        Self::data_corrupted(format!("regex options \"{options}\" are not sorted"))
            .with_offset(offset)
    }

    #[cfg(test)]
    pub(crate) fn is_data_corrupted(&self) -> bool {
        matches!(self.kind, ErrorKind::DataCorrupted { .. })
    }

    #[cfg(test)]
    pub(crate) fn is_invalid_argument(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidArgument { .. })
    }
}
