//! A BSON document: an ordered mapping of UTF-8 keys to BSON values, owned
//! as its canonical binary buffer.

use std::{
    fmt::{self, Debug, Display, Formatter},
    io::{Read, Write},
    iter::{Extend, FromIterator},
};

use crate::{
    Bson,
    DateTime,
    Decimal128,
    bson::{Array, Timestamp},
    error::{Error, Result},
    oid::ObjectId,
    raw::{DocumentWriter, MAX_DOCUMENT_SIZE, MIN_DOCUMENT_SIZE, RawElement, RawIter,
          validate_document},
    spec::{BinarySubtype, ElementType},
};

/// An ordered mapping of UTF-8 keys to BSON values, backed by the canonical
/// binary serialization.
///
/// A `Document` exclusively owns its buffer, and the buffer is fully
/// validated: every element header, every key, and every string payload has
/// been checked. Values are decoded on demand during lookup and iteration.
///
/// Two documents are equal when their canonical byte forms are equal.
///
/// ```
/// use bsonic::{doc, Bson};
///
/// let mut doc = doc! { "name": "Ada", "age": 36 };
/// assert_eq!(doc.get("name"), Some(Bson::String("Ada".to_string())));
///
/// doc.set("age", 37)?;
/// assert_eq!(doc.get("age"), Some(Bson::Int32(37)));
/// # Ok::<(), bsonic::error::Error>(())
/// ```
#[derive(Clone, PartialEq)]
pub struct Document {
    data: Vec<u8>,
}

impl Default for Document {
    fn default() -> Self {
        Document::new()
    }
}

impl Document {
    /// Creates a new empty `Document` with the canonical empty buffer
    /// `[5, 0, 0, 0, 0]`.
    pub fn new() -> Document {
        DocumentWriter::new().finalize()
    }

    /// Parses a `Document` from its binary serialization, validating the
    /// length prefix, the terminator, every element header, and the UTF-8 of
    /// every key and string payload, recursing into nested documents.
    pub fn from_bytes(data: Vec<u8>) -> Result<Document> {
        validate_document(&data, 0)?;
        Ok(Document { data })
    }

    /// Wraps an already-validated buffer.
    pub(crate) fn from_bytes_unchecked(data: Vec<u8>) -> Document {
        Document { data }
    }

    /// Reads a length-prefixed document from the reader and parses it.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Document> {
        let mut len_bytes = [0u8; 4];
        reader.read_exact(&mut len_bytes)?;
        let len = i32::from_le_bytes(len_bytes);
        if (len as usize) < MIN_DOCUMENT_SIZE || len as usize > MAX_DOCUMENT_SIZE {
            return Err(Error::invalid_length(
                format!("declared document length {len} out of range"),
                0,
            ));
        }

        let mut data = vec![0u8; len as usize];
        data[0..4].copy_from_slice(&len_bytes);
        reader.read_exact(&mut data[4..])?;
        Self::from_bytes(data)
    }

    /// Writes the canonical serialization to the writer.
    pub fn to_writer<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&self.data)?;
        Ok(())
    }

    /// The canonical serialized form.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the document, returning its buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Gets an iterator over the entries of the document, in document order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: RawIter::new(&self.data),
        }
    }

    /// Gets a streaming cursor over the document's elements, which does not
    /// decode payloads until asked.
    pub fn raw_iter(&self) -> RawIter<'_> {
        RawIter::new(&self.data)
    }

    /// Returns the value for the given key, decoded from the buffer. If the
    /// key appears more than once, the first occurrence is returned.
    pub fn get(&self, key: impl AsRef<str>) -> Option<Bson> {
        self.get_element(key.as_ref())?.value().ok()
    }

    /// Returns the entry at the given position in document order.
    pub fn get_at(&self, index: usize) -> Option<(&str, Bson)> {
        let element = self.raw_iter().nth(index)?.ok()?;
        Some((element.key(), element.value().ok()?))
    }

    /// Sets the value for the given key, replacing the first occurrence in
    /// place if the key is already present and appending otherwise. Returns
    /// the replaced value, if any.
    ///
    /// Fails if the key contains an interior null byte or the resulting
    /// document would exceed the maximum BSON size; the document is
    /// unchanged on failure.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Bson>) -> Result<Option<Bson>> {
        let key = key.into();
        let value = value.into();

        let mut writer = DocumentWriter::new();
        let mut replaced = None;
        for (k, v) in self.iter() {
            if replaced.is_none() && k == key {
                writer.append(&key, &value)?;
                replaced = Some(v);
            } else {
                writer.append(k, &v)?;
            }
        }
        if replaced.is_none() {
            writer.append(&key, &value)?;
        }

        *self = writer.finalize();
        Ok(replaced)
    }

    /// Removes the first occurrence of the given key, returning its value.
    pub fn remove(&mut self, key: impl AsRef<str>) -> Option<Bson> {
        let key = key.as_ref();

        let mut writer = DocumentWriter::new();
        let mut removed = None;
        for (k, v) in self.iter() {
            if removed.is_none() && k == key {
                removed = Some(v);
            } else if writer.append(k, &v).is_err() {
                // re-appending validated elements cannot fail; leave the
                // document untouched if it somehow does
                return None;
            }
        }
        removed.as_ref()?;

        *self = writer.finalize();
        removed
    }

    /// Clears the document, removing all values.
    pub fn clear(&mut self) {
        *self = Document::new();
    }

    /// Returns true if the document contains a value for the specified key.
    pub fn contains_key(&self, key: impl AsRef<str>) -> bool {
        self.get_element(key.as_ref()).is_some()
    }

    /// Gets an iterator over all keys in the document, in document order.
    pub fn keys(&self) -> Keys<'_> {
        Keys { inner: self.iter() }
    }

    /// Gets an iterator over all values in the document, in document order.
    pub fn values(&self) -> Values<'_> {
        Values { inner: self.iter() }
    }

    /// Returns the number of elements in the document.
    pub fn len(&self) -> usize {
        self.raw_iter().count()
    }

    /// Returns true if the document contains no elements.
    pub fn is_empty(&self) -> bool {
        self.data.len() == MIN_DOCUMENT_SIZE
    }

    fn get_element(&self, key: &str) -> Option<RawElement<'_>> {
        for element in self.raw_iter() {
            match element {
                Ok(element) if element.key() == key => return Some(element),
                Ok(_) => continue,
                Err(_) => return None,
            }
        }
        None
    }

    fn typed_get_error(&self, key: &str, expected: ElementType, found: &Bson) -> Error {
        Error::value_access_unexpected_type(expected, found.element_type()).with_key(key)
    }

    /// Gets the floating point value for this key if it exists and has the
    /// correct type.
    pub fn get_f64(&self, key: impl AsRef<str>) -> Result<f64> {
        let key = key.as_ref();
        match self.get(key) {
            Some(Bson::Double(v)) => Ok(v),
            Some(v) => Err(self.typed_get_error(key, ElementType::Double, &v)),
            None => Err(Error::value_access_not_present().with_key(key)),
        }
    }

    /// Gets the string slice for this key if it exists and has the correct
    /// type. The returned slice borrows from the document's buffer.
    pub fn get_str(&self, key: impl AsRef<str>) -> Result<&str> {
        let key = key.as_ref();
        let element = self
            .get_element(key)
            .ok_or_else(|| Error::value_access_not_present().with_key(key))?;
        if element.element_type() != ElementType::String {
            return Err(
                Error::value_access_unexpected_type(ElementType::String, element.element_type())
                    .with_key(key),
            );
        }
        element.str_value()
    }

    /// Gets the document value for this key if it exists and has the correct
    /// type.
    pub fn get_document(&self, key: impl AsRef<str>) -> Result<Document> {
        let key = key.as_ref();
        match self.get(key) {
            Some(Bson::Document(v)) => Ok(v),
            Some(v) => Err(self.typed_get_error(key, ElementType::EmbeddedDocument, &v)),
            None => Err(Error::value_access_not_present().with_key(key)),
        }
    }

    /// Gets the array value for this key if it exists and has the correct
    /// type.
    pub fn get_array(&self, key: impl AsRef<str>) -> Result<Array> {
        let key = key.as_ref();
        match self.get(key) {
            Some(Bson::Array(v)) => Ok(v),
            Some(v) => Err(self.typed_get_error(key, ElementType::Array, &v)),
            None => Err(Error::value_access_not_present().with_key(key)),
        }
    }

    /// Gets the bool value for this key if it exists and has the correct
    /// type.
    pub fn get_bool(&self, key: impl AsRef<str>) -> Result<bool> {
        let key = key.as_ref();
        match self.get(key) {
            Some(Bson::Boolean(v)) => Ok(v),
            Some(v) => Err(self.typed_get_error(key, ElementType::Boolean, &v)),
            None => Err(Error::value_access_not_present().with_key(key)),
        }
    }

    /// Gets the `i32` value for this key if it exists and has the correct
    /// type.
    pub fn get_i32(&self, key: impl AsRef<str>) -> Result<i32> {
        let key = key.as_ref();
        match self.get(key) {
            Some(Bson::Int32(v)) => Ok(v),
            Some(v) => Err(self.typed_get_error(key, ElementType::Int32, &v)),
            None => Err(Error::value_access_not_present().with_key(key)),
        }
    }

    /// Gets the `i64` value for this key if it exists and has the correct
    /// type.
    pub fn get_i64(&self, key: impl AsRef<str>) -> Result<i64> {
        let key = key.as_ref();
        match self.get(key) {
            Some(Bson::Int64(v)) => Ok(v),
            Some(v) => Err(self.typed_get_error(key, ElementType::Int64, &v)),
            None => Err(Error::value_access_not_present().with_key(key)),
        }
    }

    /// Gets the `ObjectId` value for this key if it exists and has the
    /// correct type.
    pub fn get_object_id(&self, key: impl AsRef<str>) -> Result<ObjectId> {
        let key = key.as_ref();
        match self.get(key) {
            Some(Bson::ObjectId(v)) => Ok(v),
            Some(v) => Err(self.typed_get_error(key, ElementType::ObjectId, &v)),
            None => Err(Error::value_access_not_present().with_key(key)),
        }
    }

    /// Gets the datetime value for this key if it exists and has the correct
    /// type.
    pub fn get_datetime(&self, key: impl AsRef<str>) -> Result<DateTime> {
        let key = key.as_ref();
        match self.get(key) {
            Some(Bson::DateTime(v)) => Ok(v),
            Some(v) => Err(self.typed_get_error(key, ElementType::DateTime, &v)),
            None => Err(Error::value_access_not_present().with_key(key)),
        }
    }

    /// Gets the timestamp value for this key if it exists and has the
    /// correct type.
    pub fn get_timestamp(&self, key: impl AsRef<str>) -> Result<Timestamp> {
        let key = key.as_ref();
        match self.get(key) {
            Some(Bson::Timestamp(v)) => Ok(v),
            Some(v) => Err(self.typed_get_error(key, ElementType::Timestamp, &v)),
            None => Err(Error::value_access_not_present().with_key(key)),
        }
    }

    /// Gets the `Decimal128` value for this key if it exists and has the
    /// correct type.
    pub fn get_decimal128(&self, key: impl AsRef<str>) -> Result<Decimal128> {
        let key = key.as_ref();
        match self.get(key) {
            Some(Bson::Decimal128(v)) => Ok(v),
            Some(v) => Err(self.typed_get_error(key, ElementType::Decimal128, &v)),
            None => Err(Error::value_access_not_present().with_key(key)),
        }
    }

    /// Gets the bytes of a generic binary value for this key if it exists
    /// and has the correct type and subtype.
    pub fn get_binary_generic(&self, key: impl AsRef<str>) -> Result<Vec<u8>> {
        let key = key.as_ref();
        match self.get(key) {
            Some(Bson::Binary(crate::Binary {
                subtype: BinarySubtype::Generic,
                bytes,
            })) => Ok(bytes),
            Some(v) => Err(self.typed_get_error(key, ElementType::Binary, &v)),
            None => Err(Error::value_access_not_present().with_key(key)),
        }
    }

    /// Returns whether this key has a null value.
    pub fn is_null(&self, key: impl AsRef<str>) -> bool {
        self.get(key) == Some(Bson::Null)
    }
}

impl Display for Document {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        fmt.write_str("{")?;

        let mut first = true;
        for (k, v) in self {
            if first {
                first = false;
                fmt.write_str(" ")?;
            } else {
                fmt.write_str(", ")?;
            }

            write!(fmt, "\"{}\": {}", k, v)?;
        }

        write!(fmt, "{}}}", if !first { " " } else { "" })
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str("Document(")?;
        f.debug_map().entries(self.iter()).finish()?;
        f.write_str(")")
    }
}

/// An iterator over a document's entries.
pub struct Iter<'a> {
    inner: RawIter<'a>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, Bson);

    fn next(&mut self) -> Option<(&'a str, Bson)> {
        // the buffer was validated at construction, so decoding cannot fail;
        // stop rather than panic if it somehow does
        let element = self.inner.next()?.ok()?;
        let value = element.value().ok()?;
        Some((element.key(), value))
    }
}

/// An iterator over a document's keys.
pub struct Keys<'a> {
    inner: Iter<'a>,
}

impl<'a> Iterator for Keys<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        self.inner.next().map(|(k, _)| k)
    }
}

/// An iterator over a document's values.
pub struct Values<'a> {
    inner: Iter<'a>,
}

impl<'a> Iterator for Values<'a> {
    type Item = Bson;

    fn next(&mut self) -> Option<Bson> {
        self.inner.next().map(|(_, v)| v)
    }
}

/// An owning iterator over a document's entries.
pub struct IntoIter {
    inner: std::vec::IntoIter<(String, Bson)>,
}

impl Iterator for IntoIter {
    type Item = (String, Bson);

    fn next(&mut self) -> Option<(String, Bson)> {
        self.inner.next()
    }
}

impl IntoIterator for Document {
    type Item = (String, Bson);
    type IntoIter = IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self
                .iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect::<Vec<_>>()
                .into_iter(),
        }
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a str, Bson);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Into<String>, B: Into<Bson>> FromIterator<(K, B)> for Document {
    /// Collects key/value pairs into a document.
    ///
    /// # Panics
    ///
    /// Panics if a key contains an interior null byte or the resulting
    /// document would exceed the maximum BSON size. Use
    /// [`Document::set`] to handle these cases fallibly.
    fn from_iter<T: IntoIterator<Item = (K, B)>>(iter: T) -> Self {
        let mut doc = Document::new();
        doc.extend(iter);
        doc
    }
}

impl<K: Into<String>, B: Into<Bson>> Extend<(K, B)> for Document {
    /// Inserts key/value pairs into the document.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as the
    /// [`FromIterator`](#impl-FromIterator<(K,+B)>-for-Document)
    /// implementation.
    fn extend<T: IntoIterator<Item = (K, B)>>(&mut self, iter: T) {
        for (k, v) in iter {
            if let Err(e) = self.set(k, v) {
                panic!("failed to extend document: {e}");
            }
        }
    }
}
