//! BSON definition

use std::fmt::{self, Debug, Display};

use crate::{
    Binary,
    DateTime,
    Decimal128,
    Document,
    error::{Error, Result},
    oid::ObjectId,
    spec::ElementType,
};

/// Possible BSON value types.
#[derive(Clone, PartialEq)]
pub enum Bson {
    /// 64-bit binary floating point
    Double(f64),
    /// UTF-8 string
    String(String),
    /// Array
    Array(Array),
    /// Embedded document
    Document(Document),
    /// Boolean value
    Boolean(bool),
    /// Null value
    Null,
    /// Regular expression
    RegularExpression(Regex),
    /// JavaScript code
    JavaScriptCode(String),
    /// JavaScript code with scope
    JavaScriptCodeWithScope(JavaScriptCodeWithScope),
    /// 32-bit signed integer
    Int32(i32),
    /// 64-bit signed integer
    Int64(i64),
    /// Timestamp
    Timestamp(Timestamp),
    /// Binary data
    Binary(Binary),
    /// [ObjectId](http://dochub.mongodb.org/core/objectids)
    ObjectId(ObjectId),
    /// UTC datetime
    DateTime(DateTime),
    /// Symbol (deprecated)
    Symbol(Symbol),
    /// [128-bit decimal floating point](https://github.com/mongodb/specifications/blob/master/source/bson-decimal128/decimal128.md)
    Decimal128(Decimal128),
    /// Undefined value (deprecated)
    Undefined(Undefined),
    /// Max key
    MaxKey,
    /// Min key
    MinKey,
    /// DBPointer (deprecated)
    DbPointer(DbPointer),
}

/// Alias for `Vec<Bson>`.
pub type Array = Vec<Bson>;

/// Represents a BSON timestamp value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    /// Time in seconds since the Unix epoch.
    pub time: u32,

    /// An incrementing value to order timestamps with the same number of
    /// seconds in the `time` field.
    pub increment: u32,
}

impl Timestamp {
    pub(crate) fn to_le_bytes(self) -> [u8; 8] {
        let mut out = [0; 8];
        out[0..4].copy_from_slice(&self.increment.to_le_bytes());
        out[4..8].copy_from_slice(&self.time.to_le_bytes());
        out
    }

    pub(crate) fn from_le_bytes(bytes: [u8; 8]) -> Self {
        let mut increment = [0; 4];
        increment.copy_from_slice(&bytes[0..4]);
        let mut time = [0; 4];
        time.copy_from_slice(&bytes[4..8]);
        Self {
            time: u32::from_le_bytes(time),
            increment: u32::from_le_bytes(increment),
        }
    }
}

/// Represents a BSON regular expression value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Regex {
    /// The regex pattern to match.
    pub pattern: String,

    /// The options for the regex, stored in canonically sorted order.
    ///
    /// Options are identified by characters, which must be stored in
    /// alphabetical order. Valid options are `i` (case insensitive), `l`
    /// (locale dependent), `m` (multiline matching), `s` (dotall mode), `u`
    /// (make `\w`, `\W`, etc. match Unicode) and `x` (verbose mode).
    pub options: String,
}

impl Regex {
    /// Creates a new `Regex`, sorting `options` into its canonical order and
    /// rejecting unrecognized option characters.
    pub fn new(pattern: impl Into<String>, options: impl AsRef<str>) -> Result<Self> {
        let pattern = pattern.into();
        if pattern.contains('\0') {
            return Err(Error::invalid_argument(
                "regex pattern cannot contain interior null bytes",
            ));
        }

        let mut chars: Vec<char> = options.as_ref().chars().collect();
        for c in &chars {
            if !matches!(c, 'i' | 'l' | 'm' | 's' | 'u' | 'x') {
                return Err(Error::invalid_argument(format!(
                    "unrecognized regex option {c:?}"
                )));
            }
        }
        chars.sort_unstable();
        chars.dedup();

        Ok(Self {
            pattern,
            options: chars.into_iter().collect(),
        })
    }

    /// The option set for a host regex engine: the stored options minus `l`,
    /// which no locale-independent engine understands.
    pub fn engine_options(&self) -> String {
        self.options.chars().filter(|c| *c != 'l').collect()
    }
}

impl Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "/{}/{}", self.pattern, self.options)
    }
}

/// Represents a BSON code with scope value.
#[derive(Debug, Clone, PartialEq)]
pub struct JavaScriptCodeWithScope {
    /// The JavaScript code.
    pub code: String,

    /// The scope document containing variable bindings.
    pub scope: Document,
}

impl Display for JavaScriptCodeWithScope {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

/// Represents a BSON symbol value. (Deprecated)
///
/// Symbols cannot be constructed through the ordinary API; documents
/// containing them can still be read and round-tripped, and
/// [`legacy::symbol`](crate::legacy::symbol) builds one deliberately.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    pub(crate) value: String,
}

impl Symbol {
    pub(crate) fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// The symbol's string contents.
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Symbol").field(&self.value).finish()
    }
}

/// Represents the BSON undefined value. (Deprecated)
///
/// Undefined values cannot be constructed through the ordinary API;
/// documents containing them can still be read and round-tripped, and
/// [`legacy::undefined`](crate::legacy::undefined) builds one deliberately.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Undefined {
    _private: (),
}

impl Undefined {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

impl Debug for Undefined {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Undefined")
    }
}

/// Represents a DBPointer. (Deprecated)
///
/// DBPointers cannot be constructed through the ordinary API; documents
/// containing them can still be read and round-tripped, and
/// [`legacy::db_pointer`](crate::legacy::db_pointer) builds one deliberately.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DbPointer {
    pub(crate) namespace: String,
    pub(crate) id: ObjectId,
}

impl DbPointer {
    /// The namespace the pointer refers into.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The id of the referenced document.
    pub fn id(&self) -> ObjectId {
        self.id
    }
}

impl Bson {
    /// Get the [`ElementType`] of this value.
    pub fn element_type(&self) -> ElementType {
        match self {
            Bson::Double(..) => ElementType::Double,
            Bson::String(..) => ElementType::String,
            Bson::Array(..) => ElementType::Array,
            Bson::Document(..) => ElementType::EmbeddedDocument,
            Bson::Boolean(..) => ElementType::Boolean,
            Bson::Null => ElementType::Null,
            Bson::RegularExpression(..) => ElementType::RegularExpression,
            Bson::JavaScriptCode(..) => ElementType::JavaScriptCode,
            Bson::JavaScriptCodeWithScope(..) => ElementType::JavaScriptCodeWithScope,
            Bson::Int32(..) => ElementType::Int32,
            Bson::Int64(..) => ElementType::Int64,
            Bson::Timestamp(..) => ElementType::Timestamp,
            Bson::Binary(..) => ElementType::Binary,
            Bson::ObjectId(..) => ElementType::ObjectId,
            Bson::DateTime(..) => ElementType::DateTime,
            Bson::Symbol(..) => ElementType::Symbol,
            Bson::Decimal128(..) => ElementType::Decimal128,
            Bson::Undefined(..) => ElementType::Undefined,
            Bson::MaxKey => ElementType::MaxKey,
            Bson::MinKey => ElementType::MinKey,
            Bson::DbPointer(..) => ElementType::DbPointer,
        }
    }

    /// If this value is a `Double`, returns it. Returns `None` otherwise.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Bson::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// If this value is a `String`, returns its contents. Returns `None`
    /// otherwise.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Bson::String(s) => Some(s),
            _ => None,
        }
    }

    /// If this value is a `String`, returns a mutable reference to its
    /// contents. Returns `None` otherwise.
    pub fn as_str_mut(&mut self) -> Option<&mut str> {
        match self {
            Bson::String(s) => Some(s.as_mut_str()),
            _ => None,
        }
    }

    /// If this value is an `Array`, returns its contents. Returns `None`
    /// otherwise.
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Bson::Array(v) => Some(v),
            _ => None,
        }
    }

    /// If this value is an `Array`, returns a mutable reference to its
    /// contents. Returns `None` otherwise.
    pub fn as_array_mut(&mut self) -> Option<&mut Array> {
        match self {
            Bson::Array(v) => Some(v),
            _ => None,
        }
    }

    /// If this value is a `Document`, returns it. Returns `None` otherwise.
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Bson::Document(v) => Some(v),
            _ => None,
        }
    }

    /// If this value is a `Document`, returns a mutable reference to it.
    /// Returns `None` otherwise.
    pub fn as_document_mut(&mut self) -> Option<&mut Document> {
        match self {
            Bson::Document(v) => Some(v),
            _ => None,
        }
    }

    /// If this value is a `Boolean`, returns it. Returns `None` otherwise.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Bson::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// If this value is an `Int32`, returns it. Returns `None` otherwise.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Bson::Int32(v) => Some(*v),
            _ => None,
        }
    }

    /// If this value is an `Int64`, returns it. Returns `None` otherwise.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Bson::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// If this value is an `ObjectId`, returns it. Returns `None` otherwise.
    pub fn as_object_id(&self) -> Option<ObjectId> {
        match self {
            Bson::ObjectId(v) => Some(*v),
            _ => None,
        }
    }

    /// If this value is a `DateTime`, returns it. Returns `None` otherwise.
    pub fn as_datetime(&self) -> Option<DateTime> {
        match self {
            Bson::DateTime(v) => Some(*v),
            _ => None,
        }
    }

    /// If this value is a `Binary`, returns it. Returns `None` otherwise.
    pub fn as_binary(&self) -> Option<&Binary> {
        match self {
            Bson::Binary(v) => Some(v),
            _ => None,
        }
    }

    /// If this value is a `Decimal128`, returns it. Returns `None` otherwise.
    pub fn as_decimal128(&self) -> Option<Decimal128> {
        match self {
            Bson::Decimal128(v) => Some(*v),
            _ => None,
        }
    }

    /// If this value is a `RegularExpression`, returns it. Returns `None`
    /// otherwise.
    pub fn as_regex(&self) -> Option<&Regex> {
        match self {
            Bson::RegularExpression(v) => Some(v),
            _ => None,
        }
    }

    /// If this value is a `JavaScriptCode`, returns it. Returns `None`
    /// otherwise.
    pub fn as_javascript_code(&self) -> Option<&str> {
        match self {
            Bson::JavaScriptCode(s) => Some(s),
            _ => None,
        }
    }

    /// If this value is a `JavaScriptCodeWithScope`, returns it. Returns
    /// `None` otherwise.
    pub fn as_javascript_code_with_scope(&self) -> Option<&JavaScriptCodeWithScope> {
        match self {
            Bson::JavaScriptCodeWithScope(v) => Some(v),
            _ => None,
        }
    }

    /// If this value is a `Symbol`, returns its contents. Returns `None`
    /// otherwise.
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Bson::Symbol(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// If this value is a `DbPointer`, returns it. Returns `None` otherwise.
    pub fn as_db_pointer(&self) -> Option<&DbPointer> {
        match self {
            Bson::DbPointer(v) => Some(v),
            _ => None,
        }
    }

    /// If this value is a `Timestamp`, returns it. Returns `None` otherwise.
    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Bson::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    /// If this value is `Null`, returns `()`. Returns `None` otherwise.
    pub fn as_null(&self) -> Option<()> {
        match self {
            Bson::Null => Some(()),
            _ => None,
        }
    }

    /// Whether this value is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Bson::Null)
    }

    /// Coerce this value to an `i32` if the stored numeric value is exactly
    /// representable as one; returns `None` otherwise.
    pub fn to_i32(&self) -> Option<i32> {
        match self {
            Bson::Int32(i) => Some(*i),
            Bson::Int64(i) => i32::try_from(*i).ok(),
            Bson::Double(d) => {
                if d.is_finite()
                    && d.fract() == 0.0
                    && *d >= i32::MIN as f64
                    && *d <= i32::MAX as f64
                {
                    Some(*d as i32)
                } else {
                    None
                }
            }
            Bson::Decimal128(d) => d.to_i32_exact(),
            _ => None,
        }
    }

    /// Coerce this value to an `i64` if the stored numeric value is exactly
    /// representable as one; returns `None` otherwise.
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Bson::Int32(i) => Some(*i as i64),
            Bson::Int64(i) => Some(*i),
            Bson::Double(d) => {
                // the upper bound is 2^63 itself, which rounds out of range
                if d.is_finite()
                    && d.fract() == 0.0
                    && *d >= i64::MIN as f64
                    && *d < -(i64::MIN as f64)
                {
                    Some(*d as i64)
                } else {
                    None
                }
            }
            Bson::Decimal128(d) => d.to_i64_exact(),
            _ => None,
        }
    }

    /// Coerce this value to an `f64` if the stored numeric value is exactly
    /// representable as one; returns `None` otherwise.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Bson::Double(d) => Some(*d),
            Bson::Int32(i) => Some(*i as f64),
            Bson::Int64(i) => {
                let d = *i as f64;
                if d as i64 == *i && d.fract() == 0.0 {
                    Some(d)
                } else {
                    None
                }
            }
            Bson::Decimal128(d) => d.to_f64_exact(),
            _ => None,
        }
    }

    /// Coerce this value to a [`Decimal128`], going through the canonical
    /// string form of the stored numeric value.
    pub fn to_decimal128(&self) -> Option<Decimal128> {
        match self {
            Bson::Int32(i) => Some(Decimal128::from(*i)),
            Bson::Int64(i) => Some(Decimal128::from(*i)),
            Bson::Double(d) => Some(Decimal128::from_f64_lossy(*d)),
            Bson::Decimal128(d) => Some(*d),
            _ => None,
        }
    }

    /// Coerce this value to the platform-width integer if the stored numeric
    /// value is exactly representable as one.
    ///
    /// On 64-bit targets this behaves like [`Bson::to_i64`]; on 32-bit
    /// targets like [`Bson::to_i32`].
    pub fn to_int(&self) -> Option<isize> {
        #[cfg(target_pointer_width = "64")]
        {
            self.to_i64().map(|i| i as isize)
        }
        #[cfg(not(target_pointer_width = "64"))]
        {
            self.to_i32().map(|i| i as isize)
        }
    }
}

impl Display for Bson {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Bson::Double(v) if v.fract() == 0.0 && v.is_finite() => write!(fmt, "{:.1}", v),
            Bson::Double(v) => write!(fmt, "{}", v),
            Bson::String(s) => write!(fmt, "\"{}\"", s),
            Bson::Array(vec) => {
                fmt.write_str("[")?;
                let mut first = true;
                for bson in vec {
                    if !first {
                        fmt.write_str(", ")?;
                    }
                    write!(fmt, "{}", bson)?;
                    first = false;
                }
                fmt.write_str("]")
            }
            Bson::Document(doc) => write!(fmt, "{}", doc),
            Bson::Boolean(b) => write!(fmt, "{}", b),
            Bson::Null => write!(fmt, "null"),
            Bson::RegularExpression(re) => write!(fmt, "{}", re),
            Bson::JavaScriptCode(code) => write!(fmt, "{}", code),
            Bson::Symbol(s) => write!(fmt, "{}", s),
            Bson::JavaScriptCodeWithScope(cws) => write!(fmt, "{}", cws),
            Bson::Int32(i) => write!(fmt, "{}", i),
            Bson::Int64(i) => write!(fmt, "{}", i),
            Bson::Timestamp(ts) => write!(fmt, "Timestamp({}, {})", ts.time, ts.increment),
            Bson::Binary(bin) => write!(fmt, "{}", bin),
            Bson::ObjectId(id) => write!(fmt, "ObjectId(\"{}\")", id),
            Bson::DateTime(dt) => write!(fmt, "DateTime(\"{}\")", dt),
            Bson::Decimal128(d) => write!(fmt, "{}", d),
            Bson::Undefined(_) => write!(fmt, "undefined"),
            Bson::MinKey => write!(fmt, "MinKey"),
            Bson::MaxKey => write!(fmt, "MaxKey"),
            Bson::DbPointer(dbp) => {
                write!(fmt, "DbPointer(\"{}\", {})", dbp.namespace, dbp.id)
            }
        }
    }
}

impl Debug for Bson {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Bson::Double(v) => f.debug_tuple("Double").field(v).finish(),
            Bson::String(s) => f.debug_tuple("String").field(s).finish(),
            Bson::Array(vec) => f.debug_list().entries(vec).finish(),
            Bson::Document(doc) => Debug::fmt(doc, f),
            Bson::Boolean(b) => f.debug_tuple("Boolean").field(b).finish(),
            Bson::Null => f.write_str("Null"),
            Bson::RegularExpression(re) => Debug::fmt(re, f),
            Bson::JavaScriptCode(code) => f.debug_tuple("JavaScriptCode").field(code).finish(),
            Bson::JavaScriptCodeWithScope(cws) => f
                .debug_struct("JavaScriptCodeWithScope")
                .field("code", &cws.code)
                .field("scope", &cws.scope)
                .finish(),
            Bson::Int32(i) => f.debug_tuple("Int32").field(i).finish(),
            Bson::Int64(i) => f.debug_tuple("Int64").field(i).finish(),
            Bson::Timestamp(ts) => Debug::fmt(ts, f),
            Bson::Binary(bin) => Debug::fmt(bin, f),
            Bson::ObjectId(id) => Debug::fmt(id, f),
            Bson::DateTime(dt) => Debug::fmt(dt, f),
            Bson::Symbol(s) => Debug::fmt(s, f),
            Bson::Decimal128(d) => Debug::fmt(d, f),
            Bson::Undefined(u) => Debug::fmt(u, f),
            Bson::MinKey => f.write_str("MinKey"),
            Bson::MaxKey => f.write_str("MaxKey"),
            Bson::DbPointer(dbp) => Debug::fmt(dbp, f),
        }
    }
}

impl From<f32> for Bson {
    fn from(a: f32) -> Bson {
        Bson::Double(a.into())
    }
}

impl From<f64> for Bson {
    fn from(a: f64) -> Bson {
        Bson::Double(a)
    }
}

impl From<&str> for Bson {
    fn from(s: &str) -> Bson {
        Bson::String(s.to_owned())
    }
}

impl From<String> for Bson {
    fn from(a: String) -> Bson {
        Bson::String(a)
    }
}

impl From<bool> for Bson {
    fn from(a: bool) -> Bson {
        Bson::Boolean(a)
    }
}

impl From<i8> for Bson {
    fn from(a: i8) -> Bson {
        Bson::Int32(a.into())
    }
}

impl From<u8> for Bson {
    fn from(a: u8) -> Bson {
        Bson::Int32(a.into())
    }
}

impl From<i16> for Bson {
    fn from(a: i16) -> Bson {
        Bson::Int32(a.into())
    }
}

impl From<u16> for Bson {
    fn from(a: u16) -> Bson {
        Bson::Int32(a.into())
    }
}

impl From<i32> for Bson {
    fn from(a: i32) -> Bson {
        Bson::Int32(a)
    }
}

impl From<u32> for Bson {
    fn from(a: u32) -> Bson {
        Bson::Int64(a.into())
    }
}

impl From<i64> for Bson {
    fn from(a: i64) -> Bson {
        Bson::Int64(a)
    }
}

/// The width of the produced integer follows the target word size: `Int64`
/// on 64-bit targets, `Int32` on 32-bit targets.
impl From<isize> for Bson {
    fn from(a: isize) -> Bson {
        #[cfg(target_pointer_width = "64")]
        {
            Bson::Int64(a as i64)
        }
        #[cfg(not(target_pointer_width = "64"))]
        {
            Bson::Int32(a as i32)
        }
    }
}

impl TryFrom<u64> for Bson {
    type Error = Error;

    /// Fails when the value does not fit in the signed 64-bit BSON integer.
    fn try_from(a: u64) -> Result<Bson> {
        let signed = i64::try_from(a).map_err(|_| {
            Error::invalid_argument(format!("unsigned integer {a} cannot fit into BSON"))
        })?;
        Ok(Bson::Int64(signed))
    }
}

/// The width of the produced integer follows the target word size: `Int64`
/// on 64-bit targets, `Int32` on 32-bit targets. Fails when the value does
/// not fit in the signed integer of that width.
impl TryFrom<usize> for Bson {
    type Error = Error;

    fn try_from(a: usize) -> Result<Bson> {
        #[cfg(target_pointer_width = "64")]
        {
            i64::try_from(a).map(Bson::Int64).map_err(|_| {
                Error::invalid_argument(format!("unsigned integer {a} cannot fit into BSON"))
            })
        }
        #[cfg(not(target_pointer_width = "64"))]
        {
            i32::try_from(a).map(Bson::Int32).map_err(|_| {
                Error::invalid_argument(format!("unsigned integer {a} cannot fit into BSON"))
            })
        }
    }
}

impl<T: Into<Bson>> From<Vec<T>> for Bson {
    fn from(v: Vec<T>) -> Bson {
        Bson::Array(v.into_iter().map(|val| val.into()).collect())
    }
}

impl<T: Into<Bson>> From<Option<T>> for Bson {
    fn from(a: Option<T>) -> Bson {
        match a {
            None => Bson::Null,
            Some(t) => t.into(),
        }
    }
}

impl From<Document> for Bson {
    fn from(a: Document) -> Bson {
        Bson::Document(a)
    }
}

impl From<Regex> for Bson {
    fn from(a: Regex) -> Bson {
        Bson::RegularExpression(a)
    }
}

impl From<JavaScriptCodeWithScope> for Bson {
    fn from(a: JavaScriptCodeWithScope) -> Bson {
        Bson::JavaScriptCodeWithScope(a)
    }
}

impl From<Binary> for Bson {
    fn from(a: Binary) -> Bson {
        Bson::Binary(a)
    }
}

impl From<ObjectId> for Bson {
    fn from(a: ObjectId) -> Bson {
        Bson::ObjectId(a)
    }
}

impl From<DateTime> for Bson {
    fn from(a: DateTime) -> Bson {
        Bson::DateTime(a)
    }
}

impl From<Timestamp> for Bson {
    fn from(a: Timestamp) -> Bson {
        Bson::Timestamp(a)
    }
}

impl From<Decimal128> for Bson {
    fn from(a: Decimal128) -> Bson {
        Bson::Decimal128(a)
    }
}

impl From<uuid::Uuid> for Bson {
    fn from(a: uuid::Uuid) -> Bson {
        Bson::Binary(Binary::from_uuid(a))
    }
}

impl From<&Bson> for Bson {
    fn from(a: &Bson) -> Bson {
        a.clone()
    }
}

/// The conversion behind the [`bson!`](crate::bson!) and
/// [`doc!`](crate::doc!) value grammar.
///
/// It differs from the `From` conversions in one way: `i32` values are
/// stored at the target word width (as `isize` values already are), `Int64`
/// on 64-bit targets and `Int32` on 32-bit targets. Rust types unsuffixed
/// integer literals as `i32`, so this is what makes `bson!(7)`
/// width-conditional; spell the value `Bson::Int32(..)` (or suffix it
/// `i64`) in a literal when a specific width is required.
#[doc(hidden)]
pub trait IntoBsonLiteral {
    fn into_bson_literal(self) -> Bson;
}

macro_rules! literal_via_from {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl IntoBsonLiteral for $ty {
                fn into_bson_literal(self) -> Bson {
                    Bson::from(self)
                }
            }
        )+
    };
}

literal_via_from! {
    bool,
    f32,
    f64,
    &str,
    String,
    i8,
    u8,
    i16,
    u16,
    u32,
    i64,
    isize,
    Bson,
    &Bson,
    Document,
    Binary,
    ObjectId,
    DateTime,
    Timestamp,
    Decimal128,
    Regex,
    JavaScriptCodeWithScope,
    uuid::Uuid,
}

/// Unsuffixed integer literals default to `i32`; the literal macros widen
/// them to the target word width.
impl IntoBsonLiteral for i32 {
    fn into_bson_literal(self) -> Bson {
        Bson::from(self as isize)
    }
}

impl<T: Into<Bson>> IntoBsonLiteral for Vec<T> {
    fn into_bson_literal(self) -> Bson {
        Bson::from(self)
    }
}

impl<T: Into<Bson>> IntoBsonLiteral for Option<T> {
    fn into_bson_literal(self) -> Bson {
        Bson::from(self)
    }
}
