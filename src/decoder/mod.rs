//! Decoder

mod keyed;
mod single_value;
mod unkeyed;

pub use keyed::KeyedDecodingContainer;
pub use single_value::SingleValueDecodingContainer;
pub use unkeyed::UnkeyedDecodingContainer;

use std::{collections::BTreeMap, collections::HashMap, fmt, sync::Arc};

use time::{PrimitiveDateTime, format_description};

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

/// A type that can decode itself from BSON through a [`Decoder`].
///
/// ```
/// use bsonic::{Decode, Decoder, doc, error::Result};
///
/// #[derive(Debug, PartialEq)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// impl Decode for Point {
///     fn decode(decoder: &mut Decoder) -> Result<Self> {
///         let mut container = decoder.keyed_container::<&str>()?;
///         Ok(Point {
///             x: container.decode_i32(&"x")?,
///             y: container.decode_i32(&"y")?,
///         })
///     }
/// }
///
/// let point: Point = bsonic::from_document(doc! { "x": 1, "y": 2 })?;
/// assert_eq!(point, Point { x: 1, y: 2 });
/// # Ok::<(), bsonic::error::Error>(())
/// ```
pub trait Decode: Sized {
    /// Decodes an instance of this type from the decoder's current value.
    fn decode(decoder: &mut Decoder) -> Result<Self>;
}

/// The strategy used to decode [`DateTime`] values.
#[derive(Clone, Default)]
#[non_exhaustive]
pub enum DateDecodingStrategy {
    /// Defer to the datetime's native form: a double count of seconds since
    /// the Unix epoch, rounded to the nearest millisecond.
    DeferredToNative,

    /// Decode from a BSON datetime element. The default.
    ///
    /// The stored value must actually be a datetime; other numeric forms
    /// report a type mismatch rather than being routed through the native
    /// double decoding.
    #[default]
    BsonDateTime,

    /// Decode from an integer count of milliseconds since the Unix epoch.
    MillisecondsSince1970,

    /// Decode from a `Double` count of seconds since the Unix epoch.
    SecondsSince1970,

    /// Decode from an RFC 3339 / ISO-8601 formatted string.
    Iso8601,

    /// Decode from a string with the given `time` crate format description.
    /// The parsed datetime is taken as UTC.
    Formatted(String),

    /// Decode with the given function, which may use any of the decoder's
    /// containers.
    Custom(Arc<dyn Fn(&mut Decoder) -> Result<DateTime> + Send + Sync>),
}

impl fmt::Debug for DateDecodingStrategy {
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

/// The strategy used to decode [`uuid::Uuid`] values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum UuidDecodingStrategy {
    /// Defer to the UUID's native form: its hyphenated string.
    DeferredToNative,

    /// Decode from a BSON binary element with subtype 0x04. The default.
    #[default]
    Binary,
}

/// The strategy used to decode [`ByteBuf`] values.
#[derive(Clone, Default)]
#[non_exhaustive]
pub enum DataDecodingStrategy {
    /// Defer to the buffer's native form: an array of integers.
    DeferredToNative,

    /// Decode from a BSON binary element. The default.
    #[default]
    Binary,

    /// Decode from a base64 string.
    Base64,

    /// Decode with the given function, which may use any of the decoder's
    /// containers.
    Custom(Arc<dyn Fn(&mut Decoder) -> Result<Vec<u8>> + Send + Sync>),
}

impl fmt::Debug for DataDecodingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::DeferredToNative => f.write_str("DeferredToNative"),
            Self::Binary => f.write_str("Binary"),
            Self::Base64 => f.write_str("Base64"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Configuration for a [`Decoder`].
///
/// Each field is optional; an unset field means the default strategy. Every
/// decoding strategy is the bijective pair of the identically named encoding
/// strategy: decoding with one recovers what the other produced.
#[derive(Clone, Debug, Default)]
#[non_exhaustive]
pub struct DecoderOptions {
    /// The strategy for [`DateTime`] values.
    pub date_decoding_strategy: Option<DateDecodingStrategy>,

    /// The strategy for [`uuid::Uuid`] values.
    pub uuid_decoding_strategy: Option<UuidDecodingStrategy>,

    /// The strategy for [`ByteBuf`] values.
    pub data_decoding_strategy: Option<DataDecodingStrategy>,
}

impl DecoderOptions {
    /// Merges two option sets; fields set in `overrides` win.
    pub fn merged(&self, overrides: DecoderOptions) -> DecoderOptions {
        DecoderOptions {
            date_decoding_strategy: overrides
                .date_decoding_strategy
                .or_else(|| self.date_decoding_strategy.clone()),
            uuid_decoding_strategy: overrides
                .uuid_decoding_strategy
                .or_else(|| self.uuid_decoding_strategy.clone()),
            data_decoding_strategy: overrides
                .data_decoding_strategy
                .or_else(|| self.data_decoding_strategy.clone()),
        }
    }
}

/// Decodes [`Decode`] values from BSON documents and values.
///
/// The decoder keeps a stack of currently focused values: decoding a nested
/// value pushes it, runs the nested decode, and pops it again, with the
/// coding path tracking where in the original document the focus sits.
pub struct Decoder {
    pub(crate) options: DecoderOptions,
    pub(crate) coding_path: Vec<PathComponent>,
    pub(crate) storage: Vec<Bson>,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    /// Creates a decoder with default options.
    pub fn new() -> Self {
        Self::with_options(DecoderOptions::default())
    }

    /// Creates a decoder with the given options.
    pub fn with_options(options: DecoderOptions) -> Self {
        Self {
            options,
            coding_path: Vec::new(),
            storage: Vec::new(),
        }
    }

    /// Creates a new decoder carrying this decoder's options merged with the
    /// given overrides (explicit overrides win).
    pub fn with_overrides(&self, overrides: DecoderOptions) -> Self {
        Self::with_options(self.options.merged(overrides))
    }

    /// The options this decoder was configured with.
    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    /// Decodes a value from a [`Document`].
    pub fn decode_from_document<T: Decode>(&mut self, document: Document) -> Result<T> {
        self.with_focused(Bson::Document(document), None, T::decode)
    }

    /// Decodes a value from a [`Bson`] value.
    pub fn decode_from_bson<T: Decode>(&mut self, value: Bson) -> Result<T> {
        self.with_focused(value, None, T::decode)
    }

    /// Parses a document from its binary serialization and decodes a value
    /// from it.
    pub fn decode_from_slice<T: Decode>(&mut self, bytes: &[u8]) -> Result<T> {
        let document = Document::from_bytes(bytes.to_vec())?;
        self.decode_from_document(document)
    }

    /// The value currently focused.
    pub(crate) fn top(&self) -> Result<&Bson> {
        self.storage
            .last()
            .ok_or_else(|| Error::internal("decoder has no value in focus"))
    }

    pub(crate) fn path_string(&self) -> String {
        path_string(&self.coding_path)
    }

    /// Focuses `value`, runs `f`, and restores the previous focus. When
    /// `component` is given it extends the coding path for the duration.
    pub(crate) fn with_focused<T>(
        &mut self,
        value: Bson,
        component: Option<PathComponent>,
        f: impl FnOnce(&mut Decoder) -> Result<T>,
    ) -> Result<T> {
        let pushed_path = component.is_some();
        if let Some(component) = component {
            self.coding_path.push(component);
        }
        self.storage.push(value);
        let result = f(self);
        self.storage.pop();
        if pushed_path {
            self.coding_path.pop();
        }
        result
    }

    /// As [`with_focused`](Self::with_focused), but replaces the whole
    /// coding path for the duration; used by containers, whose own paths may
    /// be deeper than the decoder's.
    pub(crate) fn with_focused_at<T>(
        &mut self,
        value: Bson,
        path: Vec<PathComponent>,
        f: impl FnOnce(&mut Decoder) -> Result<T>,
    ) -> Result<T> {
        let saved = std::mem::replace(&mut self.coding_path, path);
        self.storage.push(value);
        let result = f(self);
        self.storage.pop();
        self.coding_path = saved;
        result
    }

    /// Returns a keyed decoding container over the focused document.
    pub fn keyed_container<K: CodingKey>(&mut self) -> Result<KeyedDecodingContainer<'_, K>> {
        let doc = match self.top()? {
            Bson::Document(doc) => doc.clone(),
            other => {
                return Err(type_mismatch_for("Document", other).with_path(self.path_string()));
            }
        };
        Ok(KeyedDecodingContainer::new(self, doc))
    }

    /// Returns an unkeyed decoding container over the focused array.
    pub fn unkeyed_container(&mut self) -> Result<UnkeyedDecodingContainer<'_>> {
        let items = match self.top()? {
            Bson::Array(items) => items.clone(),
            other => {
                return Err(type_mismatch_for("Array", other).with_path(self.path_string()));
            }
        };
        Ok(UnkeyedDecodingContainer::new(self, items))
    }

    /// Returns a single-value decoding container over the focused value.
    pub fn single_value_container(&mut self) -> SingleValueDecodingContainer<'_> {
        SingleValueDecodingContainer::new(self)
    }

    /// Decodes a datetime from `value` per the configured strategy.
    pub(crate) fn unbox_date(&mut self, value: &Bson) -> Result<DateTime> {
        let strategy = self
            .options
            .date_decoding_strategy
            .clone()
            .unwrap_or_default();
        match strategy {
            DateDecodingStrategy::BsonDateTime => value
                .as_datetime()
                .ok_or_else(|| type_mismatch_for("DateTime", value)),
            DateDecodingStrategy::DeferredToNative => match value {
                Bson::Double(secs) => DateTime::from_secs_f64(*secs),
                other => Err(type_mismatch_for("Double", other)),
            },
            DateDecodingStrategy::MillisecondsSince1970 => {
                unbox_i64(value).map(DateTime::from_millis)
            }
            DateDecodingStrategy::SecondsSince1970 => {
                unbox_f64(value).and_then(DateTime::from_secs_f64)
            }
            DateDecodingStrategy::Iso8601 => {
                let s = value
                    .as_str()
                    .ok_or_else(|| type_mismatch_for("String", value))?;
                DateTime::parse_rfc3339_str(s).map_err(|_| {
                    Error::data_corrupted(format!("invalid RFC 3339 datetime string {s:?}"))
                })
            }
            DateDecodingStrategy::Formatted(fmt) => {
                let s = value
                    .as_str()
                    .ok_or_else(|| type_mismatch_for("String", value))?;
                let items = format_description::parse_owned::<2>(&fmt).map_err(|e| {
                    Error::invalid_argument(format!("invalid datetime format description: {e}"))
                })?;
                let parsed = PrimitiveDateTime::parse(s, &items).map_err(|e| {
                    Error::data_corrupted(format!("datetime string {s:?} did not match: {e}"))
                })?;
                Ok(DateTime::from_time_private(parsed.assume_utc()))
            }
            DateDecodingStrategy::Custom(f) => self.with_focused(value.clone(), None, |d| f(d)),
        }
    }

    /// Decodes a UUID from `value` per the configured strategy.
    pub(crate) fn unbox_uuid(&mut self, value: &Bson) -> Result<uuid::Uuid> {
        let strategy = self
            .options
            .uuid_decoding_strategy
            .clone()
            .unwrap_or_default();
        match strategy {
            UuidDecodingStrategy::Binary => match value {
                Bson::Binary(binary) => binary.to_uuid().map_err(|_| {
                    Error::data_corrupted(format!(
                        "binary value with subtype {:#04x} is not a UUID",
                        u8::from(binary.subtype)
                    ))
                }),
                other => Err(type_mismatch_for("Binary", other)),
            },
            UuidDecodingStrategy::DeferredToNative => {
                let s = value
                    .as_str()
                    .ok_or_else(|| type_mismatch_for("String", value))?;
                uuid::Uuid::parse_str(s)
                    .map_err(|e| Error::data_corrupted(format!("invalid UUID string {s:?}: {e}")))
            }
        }
    }

    /// Decodes a byte buffer from `value` per the configured strategy.
    pub(crate) fn unbox_bytes(&mut self, value: &Bson) -> Result<Vec<u8>> {
        let strategy = self
            .options
            .data_decoding_strategy
            .clone()
            .unwrap_or_default();
        match strategy {
            DataDecodingStrategy::Binary => match value {
                Bson::Binary(binary) => Ok(binary.bytes.clone()),
                other => Err(type_mismatch_for("Binary", other)),
            },
            DataDecodingStrategy::Base64 => {
                let s = value
                    .as_str()
                    .ok_or_else(|| type_mismatch_for("String", value))?;
                base64::decode(s)
                    .map_err(|e| Error::data_corrupted(format!("invalid base64 string: {e}")))
            }
            DataDecodingStrategy::DeferredToNative => match value {
                Bson::Array(items) => items
                    .iter()
                    .map(|item| {
                        unbox_i64(item).and_then(|i| {
                            u8::try_from(i)
                                .map_err(|_| Error::number_out_of_range(i, "UInt8"))
                        })
                    })
                    .collect(),
                other => Err(type_mismatch_for("Array", other)),
            },
            DataDecodingStrategy::Custom(f) => self.with_focused(value.clone(), None, |d| f(d)),
        }
    }
}

/// Decodes a value from a [`Document`] using default options.
pub fn from_document<T: Decode>(document: Document) -> Result<T> {
    Decoder::new().decode_from_document(document)
}

/// Decodes a value from a [`Bson`] value using default options.
pub fn from_bson<T: Decode>(value: Bson) -> Result<T> {
    Decoder::new().decode_from_bson(value)
}

/// Parses a document from its binary serialization and decodes a value from
/// it, using default options.
pub fn from_slice<T: Decode>(bytes: &[u8]) -> Result<T> {
    Decoder::new().decode_from_slice(bytes)
}

pub(crate) fn type_mismatch_for(expected: &str, found: &Bson) -> Error {
    Error::type_mismatch(expected, format!("{:?}", found.element_type()))
}

pub(crate) fn is_numeric(value: &Bson) -> bool {
    matches!(
        value,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_)
    )
}

macro_rules! unbox_integer {
    ($($name:ident: $ty:ty as $target:literal via $coerce:ident),+ $(,)?) => {
        $(
            pub(crate) fn $name(value: &Bson) -> Result<$ty> {
                match value.$coerce() {
                    Some(v) => <$ty>::try_from(v)
                        .map_err(|_| Error::number_out_of_range(value, $target)),
                    None if is_numeric(value) => {
                        Err(Error::number_out_of_range(value, $target))
                    }
                    None => Err(type_mismatch_for("a numeric value", value)),
                }
            }
        )+
    };
}

unbox_integer! {
    unbox_i8: i8 as "Int8" via to_i32,
    unbox_i16: i16 as "Int16" via to_i32,
    unbox_i32: i32 as "Int32" via to_i32,
    unbox_i64: i64 as "Int64" via to_i64,
    unbox_u8: u8 as "UInt8" via to_i64,
    unbox_u16: u16 as "UInt16" via to_i64,
    unbox_u32: u32 as "UInt32" via to_i64,
    unbox_u64: u64 as "UInt64" via to_i64,
}

pub(crate) fn unbox_f64(value: &Bson) -> Result<f64> {
    match value.to_f64() {
        Some(v) => Ok(v),
        None if is_numeric(value) => Err(Error::number_out_of_range(value, "Double")),
        None => Err(type_mismatch_for("a numeric value", value)),
    }
}

pub(crate) fn unbox_f32(value: &Bson) -> Result<f32> {
    let wide = unbox_f64(value)?;
    let narrow = wide as f32;
    if f64::from(narrow) == wide || wide.is_nan() {
        Ok(narrow)
    } else {
        Err(Error::number_out_of_range(value, "Float"))
    }
}

pub(crate) fn unbox_bool(value: &Bson) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| type_mismatch_for("Boolean", value))
}

pub(crate) fn unbox_string(value: &Bson) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| type_mismatch_for("String", value))
}

macro_rules! decode_via_single_value {
    ($($ty:ty => $method:ident),+ $(,)?) => {
        $(
            impl Decode for $ty {
                fn decode(decoder: &mut Decoder) -> Result<Self> {
                    decoder.single_value_container().$method()
                }
            }
        )+
    };
}

decode_via_single_value! {
    bool => decode_bool,
    i8 => decode_i8,
    i16 => decode_i16,
    i32 => decode_i32,
    i64 => decode_i64,
    u8 => decode_u8,
    u16 => decode_u16,
    u32 => decode_u32,
    u64 => decode_u64,
    f32 => decode_f32,
    f64 => decode_f64,
    String => decode_string,
    DateTime => decode_datetime,
    uuid::Uuid => decode_uuid,
}

impl Decode for ByteBuf {
    fn decode(decoder: &mut Decoder) -> Result<Self> {
        decoder
            .single_value_container()
            .decode_bytes()
            .map(ByteBuf::new)
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode(decoder: &mut Decoder) -> Result<Self> {
        if decoder.top()?.is_null() {
            Ok(None)
        } else {
            T::decode(decoder).map(Some)
        }
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(decoder: &mut Decoder) -> Result<Self> {
        let mut container = decoder.unkeyed_container()?;
        let mut out = Vec::with_capacity(container.count());
        while !container.is_at_end() {
            out.push(container.decode_decodable::<T>()?);
        }
        Ok(out)
    }
}

impl<V: Decode> Decode for HashMap<String, V> {
    fn decode(decoder: &mut Decoder) -> Result<Self> {
        let mut container = decoder.keyed_container::<String>()?;
        let mut map = HashMap::new();
        for key in container.keys() {
            let value = container.decode_decodable::<V>(&key)?;
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<V: Decode> Decode for BTreeMap<String, V> {
    fn decode(decoder: &mut Decoder) -> Result<Self> {
        let mut container = decoder.keyed_container::<String>()?;
        let mut map = BTreeMap::new();
        for key in container.keys() {
            let value = container.decode_decodable::<V>(&key)?;
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl Decode for Bson {
    fn decode(decoder: &mut Decoder) -> Result<Self> {
        decoder.top().cloned()
    }
}

impl Decode for Document {
    fn decode(decoder: &mut Decoder) -> Result<Self> {
        match decoder.top()? {
            Bson::Document(doc) => Ok(doc.clone()),
            other => Err(type_mismatch_for("Document", other).with_path(decoder.path_string())),
        }
    }
}

macro_rules! decode_as_bson {
    ($($ty:ty => $variant:ident ($name:literal)),+ $(,)?) => {
        $(
            impl Decode for $ty {
                fn decode(decoder: &mut Decoder) -> Result<Self> {
                    match decoder.top()? {
                        Bson::$variant(v) => Ok(v.clone()),
                        other => Err(type_mismatch_for($name, other)
                            .with_path(decoder.path_string())),
                    }
                }
            }
        )+
    };
}

decode_as_bson! {
    ObjectId => ObjectId ("ObjectId"),
    Decimal128 => Decimal128 ("Decimal128"),
    Regex => RegularExpression ("RegularExpression"),
    Timestamp => Timestamp ("Timestamp"),
    JavaScriptCodeWithScope => JavaScriptCodeWithScope ("JavaScriptCodeWithScope"),
}

impl Decode for Binary {
    fn decode(decoder: &mut Decoder) -> Result<Self> {
        match decoder.top()? {
            Bson::Binary(binary) => Ok(binary.clone()),
            other => Err(type_mismatch_for("Binary", other).with_path(decoder.path_string())),
        }
    }
}
