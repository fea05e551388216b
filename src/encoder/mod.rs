//! Encoder

mod keyed;
mod referencing;
mod single_value;
pub(crate) mod storage;
mod unkeyed;

pub use keyed::KeyedEncodingContainer;
pub use referencing::SuperEncoder;
pub use single_value::SingleValueEncodingContainer;
pub use unkeyed::UnkeyedEncodingContainer;

use std::{collections::BTreeMap, collections::HashMap, fmt, sync::Arc};

use time::format_description;

use crate::{
    Binary,
    Bson,
    DateTime,
    Decimal128,
    Document,
    base64,
    bson::{JavaScriptCodeWithScope, Regex, Timestamp},
    coding::{ByteBuf, CodingKey, PathComponent, path_string},
    error::{Error, Result},
    oid::ObjectId,
};

use storage::EncodingStorage;

/// A type that can encode itself into BSON through an [`Encoder`].
///
/// Implementations request one of the encoder's three containers and write
/// themselves into it:
///
/// ```
/// use bsonic::{Encode, Encoder, error::Result};
///
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// impl Encode for Point {
///     fn encode(&self, encoder: &mut Encoder) -> Result<()> {
///         let mut container = encoder.keyed_container::<&str>()?;
///         container.encode_i32(self.x, &"x")?;
///         container.encode_i32(self.y, &"y")?;
///         Ok(())
///     }
/// }
///
/// let doc = bsonic::to_document(&Point { x: 1, y: 2 })?;
/// assert_eq!(doc.get_i32("x")?, 1);
/// # Ok::<(), bsonic::error::Error>(())
/// ```
pub trait Encode {
    /// Encodes this value into the given encoder.
    fn encode(&self, encoder: &mut Encoder) -> Result<()>;
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode(&self, encoder: &mut Encoder) -> Result<()> {
        (**self).encode(encoder)
    }
}

/// The strategy used to encode [`DateTime`] values.
#[derive(Clone, Default)]
#[non_exhaustive]
pub enum DateEncodingStrategy {
    /// Defer to the datetime's native form: a double count of seconds since
    /// the Unix epoch.
    DeferredToNative,

    /// Encode as a BSON datetime element. The default.
    #[default]
    BsonDateTime,

    /// Encode as an `Int64` count of milliseconds since the Unix epoch.
    MillisecondsSince1970,

    /// Encode as a `Double` count of seconds since the Unix epoch.
    SecondsSince1970,

    /// Encode as an RFC 3339 / ISO-8601 formatted string.
    Iso8601,

    /// Encode as a string produced by the given `time` crate format
    /// description (e.g. `"[year]-[month]-[day]"`).
    Formatted(String),

    /// Encode with the given function, which may use any of the encoder's
    /// containers. If the function encodes nothing, an empty document is
    /// produced.
    Custom(Arc<dyn Fn(DateTime, &mut Encoder) -> Result<()> + Send + Sync>),
}

impl fmt::Debug for DateEncodingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::DeferredToNative => f.write_str("DeferredToNative"),
            Self::BsonDateTime => f.write_str("BsonDateTime"),
            Self::MillisecondsSince1970 => f.write_str("MillisecondsSince1970"),
            Self::SecondsSince1970 => f.write_str("SecondsSince1970"),
            Self::Iso8601 => f.write_str("Iso8601"),
            Self::Formatted(fmt_str) => f.debug_tuple("Formatted").field(fmt_str).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// The strategy used to encode [`uuid::Uuid`] values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum UuidEncodingStrategy {
    /// Defer to the UUID's native form: its hyphenated string.
    DeferredToNative,

    /// Encode as a BSON binary element with subtype 0x04. The default.
    #[default]
    Binary,
}

/// The strategy used to encode [`ByteBuf`] values.
#[derive(Clone, Default)]
#[non_exhaustive]
pub enum DataEncodingStrategy {
    /// Defer to the buffer's native form: an array of integers.
    DeferredToNative,

    /// Encode as a BSON binary element with the generic subtype (0x00). The
    /// default.
    #[default]
    Binary,

    /// Encode as a base64 string.
    Base64,

    /// Encode with the given function, which may use any of the encoder's
    /// containers. If the function encodes nothing, an empty document is
    /// produced.
    Custom(Arc<dyn Fn(&[u8], &mut Encoder) -> Result<()> + Send + Sync>),
}

impl fmt::Debug for DataEncodingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::DeferredToNative => f.write_str("DeferredToNative"),
            Self::Binary => f.write_str("Binary"),
            Self::Base64 => f.write_str("Base64"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Configuration for an [`Encoder`].
///
/// Each field is optional; an unset field means the default strategy. Options
/// compose with [`EncoderOptions::merged`], where explicitly set overrides
/// win.
#[derive(Clone, Debug, Default)]
#[non_exhaustive]
pub struct EncoderOptions {
    /// The strategy for [`DateTime`] values.
    pub date_encoding_strategy: Option<DateEncodingStrategy>,

    /// The strategy for [`uuid::Uuid`] values.
    pub uuid_encoding_strategy: Option<UuidEncodingStrategy>,

    /// The strategy for [`ByteBuf`] values.
    pub data_encoding_strategy: Option<DataEncodingStrategy>,
}

impl EncoderOptions {
    /// Merges two option sets; fields set in `overrides` win.
    pub fn merged(&self, overrides: EncoderOptions) -> EncoderOptions {
        EncoderOptions {
            date_encoding_strategy: overrides
                .date_encoding_strategy
                .or_else(|| self.date_encoding_strategy.clone()),
            uuid_encoding_strategy: overrides
                .uuid_encoding_strategy
                .or_else(|| self.uuid_encoding_strategy.clone()),
            data_encoding_strategy: overrides
                .data_encoding_strategy
                .or_else(|| self.data_encoding_strategy.clone()),
        }
    }
}

/// Encodes [`Encode`] values into BSON documents.
///
/// The encoder hands out keyed, unkeyed, and single-value containers;
/// containers write into an arena of in-progress nodes owned by the encoder,
/// and a stack tracks the value being built at the current coding path. A
/// successful top-level encode leaves exactly one finished container on the
/// stack, which must be a keyed one; it becomes the returned [`Document`].
pub struct Encoder {
    pub(crate) options: EncoderOptions,
    pub(crate) coding_path: Vec<PathComponent>,
    pub(crate) storage: EncodingStorage,

    /// The length of the coding path inherited from a parent encoder. Zero
    /// for every encoder except the child of a [`SuperEncoder`], which starts
    /// with its parent's path already in place.
    pub(crate) base_path_len: usize,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    /// Creates an encoder with default options.
    pub fn new() -> Self {
        Self::with_options(EncoderOptions::default())
    }

    /// Creates an encoder with the given options.
    pub fn with_options(options: EncoderOptions) -> Self {
        Self {
            options,
            coding_path: Vec::new(),
            storage: EncodingStorage::default(),
            base_path_len: 0,
        }
    }

    /// Creates a new encoder carrying this encoder's options merged with the
    /// given overrides (explicit overrides win).
    pub fn with_overrides(&self, overrides: EncoderOptions) -> Self {
        Self::with_options(self.options.merged(overrides))
    }

    /// The options this encoder was configured with.
    pub fn options(&self) -> &EncoderOptions {
        &self.options
    }

    /// Encodes a value to a [`Document`].
    ///
    /// Fails with [`InvalidArgument`](crate::error::ErrorKind::InvalidArgument)
    /// if the value encodes nothing or encodes something other than a keyed
    /// container at the top level.
    pub fn encode_to_document<T: Encode + ?Sized>(&mut self, value: &T) -> Result<Document> {
        match self.box_value_opt(value)? {
            Some(Bson::Document(doc)) => Ok(doc),
            Some(other) => Err(Error::invalid_argument(format!(
                "top-level value encoded as {:?} instead of a document",
                other.element_type()
            ))),
            None => Err(Error::invalid_argument(
                "top-level value did not encode anything",
            )),
        }
    }

    /// Encodes a value to a [`Bson`] value.
    pub fn encode_to_bson<T: Encode + ?Sized>(&mut self, value: &T) -> Result<Bson> {
        self.box_value_opt(value)?.ok_or_else(|| {
            Error::invalid_argument("top-level value did not encode anything")
        })
    }

    /// Returns a keyed encoding container for the current coding path.
    ///
    /// Fails with [`Internal`](crate::error::ErrorKind::Internal) if a
    /// non-keyed value was already encoded at this path.
    pub fn keyed_container<K: CodingKey>(&mut self) -> Result<KeyedEncodingContainer<'_, K>> {
        let node = if self.can_encode_new_value() {
            self.storage.push_keyed_container()
        } else {
            self.storage.top_document_node().ok_or_else(|| {
                Error::internal(
                    "attempt to open a keyed container after a value was already encoded at \
                     this path",
                )
                .with_path(self.path_string())
            })?
        };
        Ok(KeyedEncodingContainer::new(self, node))
    }

    /// Returns an unkeyed encoding container for the current coding path.
    pub fn unkeyed_container(&mut self) -> Result<UnkeyedEncodingContainer<'_>> {
        let node = if self.can_encode_new_value() {
            self.storage.push_unkeyed_container()
        } else {
            self.storage.top_array_node().ok_or_else(|| {
                Error::internal(
                    "attempt to open an unkeyed container after a value was already encoded \
                     at this path",
                )
                .with_path(self.path_string())
            })?
        };
        Ok(UnkeyedEncodingContainer::new(self, node))
    }

    /// Returns a single-value encoding container for the current coding path.
    pub fn single_value_container(&mut self) -> SingleValueEncodingContainer<'_> {
        SingleValueEncodingContainer::new(self)
    }

    /// Whether a new value can be encoded at the current coding path: one
    /// value has not already been pushed for it.
    pub(crate) fn can_encode_new_value(&self) -> bool {
        self.storage.len() == self.coding_path.len().saturating_sub(self.base_path_len)
    }

    pub(crate) fn assert_can_encode_new_value(&self) -> Result<()> {
        if self.can_encode_new_value() {
            Ok(())
        } else {
            Err(
                Error::internal("attempt to encode a second value at the same coding path")
                    .with_path(self.path_string()),
            )
        }
    }

    pub(crate) fn path_string(&self) -> String {
        path_string(&self.coding_path)
    }

    /// Encodes a nested value, returning the single value it pushed. If the
    /// value encodes nothing, an empty document stands in. Containers pushed
    /// by a failed encode are popped before the error propagates.
    pub(crate) fn box_value<T: Encode + ?Sized>(&mut self, value: &T) -> Result<Bson> {
        Ok(self
            .box_value_opt(value)?
            .unwrap_or_else(|| Bson::Document(Document::new())))
    }

    fn box_value_opt<T: Encode + ?Sized>(&mut self, value: &T) -> Result<Option<Bson>> {
        let depth = self.storage.len();
        if let Err(e) = value.encode(self) {
            self.storage.truncate(depth);
            return Err(e);
        }
        if self.storage.len() > depth {
            match self.storage.pop() {
                Some(root) => Ok(Some(self.storage.resolve(root)?)),
                None => Ok(None),
            }
        } else {
            Ok(None)
        }
    }

    /// Converts a datetime to its encoded form per the configured strategy.
    pub(crate) fn box_date(&mut self, dt: DateTime) -> Result<Bson> {
        let strategy = self
            .options
            .date_encoding_strategy
            .clone()
            .unwrap_or_default();
        Ok(match strategy {
            DateEncodingStrategy::BsonDateTime => Bson::DateTime(dt),
            DateEncodingStrategy::DeferredToNative => Bson::Double(dt.timestamp_secs_f64()),
            DateEncodingStrategy::MillisecondsSince1970 => Bson::Int64(dt.timestamp_millis()),
            DateEncodingStrategy::SecondsSince1970 => Bson::Double(dt.timestamp_secs_f64()),
            DateEncodingStrategy::Iso8601 => Bson::String(
                dt.try_to_rfc3339_string()
                    .map_err(|e| e.with_path(self.path_string()))?,
            ),
            DateEncodingStrategy::Formatted(fmt) => {
                let items = format_description::parse_owned::<2>(&fmt).map_err(|e| {
                    Error::invalid_argument(format!("invalid datetime format description: {e}"))
                        .with_path(self.path_string())
                })?;
                let odt = dt.to_time_private().ok_or_else(|| {
                    Error::invalid_argument(format!(
                        "datetime {} ms cannot be formatted",
                        dt.timestamp_millis()
                    ))
                    .with_path(self.path_string())
                })?;
                let formatted = odt.format(&items).map_err(|e| {
                    Error::invalid_argument(format!("failed to format datetime: {e}"))
                        .with_path(self.path_string())
                })?;
                Bson::String(formatted)
            }
            DateEncodingStrategy::Custom(f) => self.box_with_custom(|encoder| f(dt, encoder))?,
        })
    }

    /// Converts a UUID to its encoded form per the configured strategy.
    pub(crate) fn box_uuid(&mut self, uuid: uuid::Uuid) -> Result<Bson> {
        let strategy = self
            .options
            .uuid_encoding_strategy
            .clone()
            .unwrap_or_default();
        Ok(match strategy {
            UuidEncodingStrategy::Binary => Bson::Binary(Binary::from_uuid(uuid)),
            UuidEncodingStrategy::DeferredToNative => {
                Bson::String(uuid.hyphenated().to_string())
            }
        })
    }

    /// Converts a byte buffer to its encoded form per the configured
    /// strategy.
    pub(crate) fn box_bytes(&mut self, bytes: &[u8]) -> Result<Bson> {
        let strategy = self
            .options
            .data_encoding_strategy
            .clone()
            .unwrap_or_default();
        Ok(match strategy {
            DataEncodingStrategy::Binary => Bson::Binary(Binary::generic(bytes.to_vec())),
            DataEncodingStrategy::Base64 => Bson::String(base64::encode(bytes)),
            DataEncodingStrategy::DeferredToNative => {
                Bson::Array(bytes.iter().map(|b| Bson::Int32(*b as i32)).collect())
            }
            DataEncodingStrategy::Custom(f) => self.box_with_custom(|encoder| f(bytes, encoder))?,
        })
    }

    /// Runs a custom strategy function and pops whatever single value it
    /// encoded; an empty document stands in if it encoded nothing.
    fn box_with_custom(
        &mut self,
        f: impl FnOnce(&mut Encoder) -> Result<()>,
    ) -> Result<Bson> {
        let depth = self.storage.len();
        if let Err(e) = f(self) {
            self.storage.truncate(depth);
            return Err(e);
        }
        if self.storage.len() > depth {
            match self.storage.pop() {
                Some(root) => self.storage.resolve(root),
                None => Ok(Bson::Document(Document::new())),
            }
        } else {
            Ok(Bson::Document(Document::new()))
        }
    }

    /// Checked conversion used by every unsigned-integer encode.
    pub(crate) fn int64_from_u64(&self, value: u64) -> Result<i64> {
        i64::try_from(value).map_err(|_| {
            Error::number_out_of_range(value, "Int64").with_path(self.path_string())
        })
    }
}

/// Encodes a value into a [`Document`] using default options.
pub fn to_document<T: Encode + ?Sized>(value: &T) -> Result<Document> {
    Encoder::new().encode_to_document(value)
}

/// Encodes a value into a [`Bson`] value using default options.
pub fn to_bson<T: Encode + ?Sized>(value: &T) -> Result<Bson> {
    Encoder::new().encode_to_bson(value)
}

/// Encodes a value into its BSON bytes using default options.
pub fn to_vec<T: Encode + ?Sized>(value: &T) -> Result<Vec<u8>> {
    to_document(value).map(Document::into_bytes)
}

macro_rules! encode_via_single_value {
    ($($ty:ty => $method:ident),+ $(,)?) => {
        $(
            impl Encode for $ty {
                fn encode(&self, encoder: &mut Encoder) -> Result<()> {
                    encoder.single_value_container().$method(*self)
                }
            }
        )+
    };
}

encode_via_single_value! {
    bool => encode_bool,
    i8 => encode_i8,
    i16 => encode_i16,
    i32 => encode_i32,
    i64 => encode_i64,
    u8 => encode_u8,
    u16 => encode_u16,
    u32 => encode_u32,
    u64 => encode_u64,
    f32 => encode_f32,
    f64 => encode_f64,
    DateTime => encode_datetime,
    uuid::Uuid => encode_uuid,
}

impl Encode for str {
    fn encode(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.single_value_container().encode_str(self)
    }
}

impl Encode for String {
    fn encode(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.single_value_container().encode_str(self)
    }
}

impl Encode for ByteBuf {
    fn encode(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.single_value_container().encode_bytes(self.as_slice())
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode(&self, encoder: &mut Encoder) -> Result<()> {
        match self {
            Some(value) => value.encode(encoder),
            None => encoder.single_value_container().encode_nil(),
        }
    }
}

impl<T: Encode> Encode for [T] {
    fn encode(&self, encoder: &mut Encoder) -> Result<()> {
        let mut container = encoder.unkeyed_container()?;
        for value in self {
            container.encode_encodable(value)?;
        }
        Ok(())
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, encoder: &mut Encoder) -> Result<()> {
        self.as_slice().encode(encoder)
    }
}

impl<V: Encode> Encode for HashMap<String, V> {
    fn encode(&self, encoder: &mut Encoder) -> Result<()> {
        let mut container = encoder.keyed_container::<String>()?;
        for (key, value) in self {
            container.encode_encodable(value, key)?;
        }
        Ok(())
    }
}

impl<V: Encode> Encode for BTreeMap<String, V> {
    fn encode(&self, encoder: &mut Encoder) -> Result<()> {
        let mut container = encoder.keyed_container::<String>()?;
        for (key, value) in self {
            container.encode_encodable(value, key)?;
        }
        Ok(())
    }
}

macro_rules! encode_as_bson {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl Encode for $ty {
                fn encode(&self, encoder: &mut Encoder) -> Result<()> {
                    encoder
                        .single_value_container()
                        .encode_bson(Bson::$variant(self.clone()))
                }
            }
        )+
    };
}

encode_as_bson! {
    ObjectId => ObjectId,
    Binary => Binary,
    Decimal128 => Decimal128,
    Regex => RegularExpression,
    Timestamp => Timestamp,
    JavaScriptCodeWithScope => JavaScriptCodeWithScope,
    Document => Document,
}

impl Encode for Bson {
    fn encode(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.single_value_container().encode_bson(self.clone())
    }
}
