use crate::{
    Binary,
    Bson,
    DateTime,
    Decimal128,
    Document,
    bson::{DbPointer, JavaScriptCodeWithScope, Regex, Timestamp},
    error::{Error, Result},
    oid::ObjectId,
    raw::{MAX_DOCUMENT_SIZE, MIN_DOCUMENT_SIZE, write_cstring, write_string},
    spec::ElementType,
};

/// An append-only builder for BSON documents.
///
/// The internal buffer is a valid document at every step: each append
/// overwrites the trailing terminator with the new element, pushes a fresh
/// terminator, and patches the length prefix. An append that would push the
/// document past [`MAX_DOCUMENT_SIZE`] fails with
/// [`TooLarge`](crate::error::ErrorKind::TooLarge) and leaves the buffer
/// bit-exactly unchanged.
///
/// ```
/// # use bsonic::{DocumentWriter, error::Result};
/// # fn example() -> Result<()> {
/// let mut writer = DocumentWriter::new();
/// writer.append_int32("x", 7)?;
/// writer.append_string("greeting", "hello")?;
/// let doc = writer.finalize();
/// assert_eq!(doc.get("x"), Some(bsonic::Bson::Int32(7)));
/// # Ok(())
/// # }
/// ```
pub struct DocumentWriter {
    data: Vec<u8>,
    len: usize,
}

impl Default for DocumentWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentWriter {
    /// Creates a writer holding an empty document.
    pub fn new() -> Self {
        let mut data = Vec::new();
        data.extend((MIN_DOCUMENT_SIZE as i32).to_le_bytes());
        data.push(0);
        Self { data, len: 0 }
    }

    /// The number of elements appended so far.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether any elements have been appended.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The bytes accumulated so far, always a valid document.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the writer, yielding the accumulated [`Document`].
    pub fn finalize(self) -> Document {
        Document::from_bytes_unchecked(self.data)
    }

    /// Appends a key/value pair, dispatching on the value's variant.
    pub fn append(&mut self, key: impl AsRef<str>, value: &Bson) -> Result<()> {
        self.append_element(value.element_type(), key.as_ref(), |buf| {
            encode_value(buf, value)
        })
    }

    /// Appends a `Double` element.
    pub fn append_double(&mut self, key: impl AsRef<str>, value: f64) -> Result<()> {
        self.append_element(ElementType::Double, key.as_ref(), |buf| {
            buf.extend_from_slice(&value.to_le_bytes());
            Ok(())
        })
    }

    /// Appends a `String` element.
    pub fn append_string(&mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Result<()> {
        self.append_element(ElementType::String, key.as_ref(), |buf| {
            write_string(buf, value.as_ref());
            Ok(())
        })
    }

    /// Appends an embedded document, splicing in its canonical bytes.
    pub fn append_document(&mut self, key: impl AsRef<str>, value: &Document) -> Result<()> {
        self.append_element(ElementType::EmbeddedDocument, key.as_ref(), |buf| {
            buf.extend_from_slice(value.as_bytes());
            Ok(())
        })
    }

    /// Appends an array element; the elements are keyed `"0"`, `"1"`, … in
    /// order.
    pub fn append_array(&mut self, key: impl AsRef<str>, value: &[Bson]) -> Result<()> {
        self.append_element(ElementType::Array, key.as_ref(), |buf| {
            encode_array(buf, value)
        })
    }

    /// Appends a `Binary` element.
    pub fn append_binary(&mut self, key: impl AsRef<str>, value: &Binary) -> Result<()> {
        self.append_element(ElementType::Binary, key.as_ref(), |buf| {
            encode_binary(buf, value);
            Ok(())
        })
    }

    /// Appends an `ObjectId` element.
    pub fn append_oid(&mut self, key: impl AsRef<str>, value: ObjectId) -> Result<()> {
        self.append_element(ElementType::ObjectId, key.as_ref(), |buf| {
            buf.extend_from_slice(&value.bytes());
            Ok(())
        })
    }

    /// Appends a `Boolean` element.
    pub fn append_bool(&mut self, key: impl AsRef<str>, value: bool) -> Result<()> {
        self.append_element(ElementType::Boolean, key.as_ref(), |buf| {
            buf.push(value as u8);
            Ok(())
        })
    }

    /// Appends a `DateTime` element.
    pub fn append_datetime(&mut self, key: impl AsRef<str>, value: DateTime) -> Result<()> {
        self.append_element(ElementType::DateTime, key.as_ref(), |buf| {
            buf.extend_from_slice(&value.timestamp_millis().to_le_bytes());
            Ok(())
        })
    }

    /// Appends a `Null` element.
    pub fn append_null(&mut self, key: impl AsRef<str>) -> Result<()> {
        self.append_element(ElementType::Null, key.as_ref(), |_| Ok(()))
    }

    /// Appends a `RegularExpression` element.
    pub fn append_regex(&mut self, key: impl AsRef<str>, value: &Regex) -> Result<()> {
        self.append_element(ElementType::RegularExpression, key.as_ref(), |buf| {
            write_cstring(buf, &value.pattern)?;
            write_cstring(buf, &value.options)
        })
    }

    /// Appends a `DbPointer` element. Deprecated BSON type, retained for
    /// round-trip fidelity.
    pub fn append_db_pointer(&mut self, key: impl AsRef<str>, value: &DbPointer) -> Result<()> {
        self.append_element(ElementType::DbPointer, key.as_ref(), |buf| {
            write_string(buf, &value.namespace);
            buf.extend_from_slice(&value.id.bytes());
            Ok(())
        })
    }

    /// Appends a `JavaScriptCode` element.
    pub fn append_code(&mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Result<()> {
        self.append_element(ElementType::JavaScriptCode, key.as_ref(), |buf| {
            write_string(buf, value.as_ref());
            Ok(())
        })
    }

    /// Appends a `JavaScriptCodeWithScope` element.
    pub fn append_code_with_scope(
        &mut self,
        key: impl AsRef<str>,
        value: &JavaScriptCodeWithScope,
    ) -> Result<()> {
        self.append_element(ElementType::JavaScriptCodeWithScope, key.as_ref(), |buf| {
            encode_code_with_scope(buf, value);
            Ok(())
        })
    }

    /// Appends a `Symbol` element. Deprecated BSON type, retained for
    /// round-trip fidelity.
    pub fn append_symbol(&mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Result<()> {
        self.append_element(ElementType::Symbol, key.as_ref(), |buf| {
            write_string(buf, value.as_ref());
            Ok(())
        })
    }

    /// Appends an `Int32` element.
    pub fn append_int32(&mut self, key: impl AsRef<str>, value: i32) -> Result<()> {
        self.append_element(ElementType::Int32, key.as_ref(), |buf| {
            buf.extend_from_slice(&value.to_le_bytes());
            Ok(())
        })
    }

    /// Appends a `Timestamp` element.
    pub fn append_timestamp(&mut self, key: impl AsRef<str>, value: Timestamp) -> Result<()> {
        self.append_element(ElementType::Timestamp, key.as_ref(), |buf| {
            buf.extend_from_slice(&value.to_le_bytes());
            Ok(())
        })
    }

    /// Appends an `Int64` element.
    pub fn append_int64(&mut self, key: impl AsRef<str>, value: i64) -> Result<()> {
        self.append_element(ElementType::Int64, key.as_ref(), |buf| {
            buf.extend_from_slice(&value.to_le_bytes());
            Ok(())
        })
    }

    /// Appends a `Decimal128` element.
    pub fn append_decimal128(&mut self, key: impl AsRef<str>, value: Decimal128) -> Result<()> {
        self.append_element(ElementType::Decimal128, key.as_ref(), |buf| {
            buf.extend_from_slice(&value.bytes());
            Ok(())
        })
    }

    /// Appends a `MinKey` element.
    pub fn append_min_key(&mut self, key: impl AsRef<str>) -> Result<()> {
        self.append_element(ElementType::MinKey, key.as_ref(), |_| Ok(()))
    }

    /// Appends a `MaxKey` element.
    pub fn append_max_key(&mut self, key: impl AsRef<str>) -> Result<()> {
        self.append_element(ElementType::MaxKey, key.as_ref(), |_| Ok(()))
    }

    /// Appends an `Undefined` element. Deprecated BSON type, retained for
    /// round-trip fidelity.
    pub fn append_undefined(&mut self, key: impl AsRef<str>) -> Result<()> {
        self.append_element(ElementType::Undefined, key.as_ref(), |_| Ok(()))
    }

    fn append_element(
        &mut self,
        tag: ElementType,
        key: &str,
        encode_payload: impl FnOnce(&mut Vec<u8>) -> Result<()>,
    ) -> Result<()> {
        let original_len = self.data.len();

        let result = (|| {
            // the trailing terminator becomes the new element's type byte
            self.data[original_len - 1] = tag as u8;
            write_cstring(&mut self.data, key)?;
            encode_payload(&mut self.data)?;
            self.data.push(0);

            if self.data.len() > MAX_DOCUMENT_SIZE {
                return Err(Error::too_large(self.data.len(), MAX_DOCUMENT_SIZE));
            }
            Ok(())
        })();

        match result {
            Ok(()) => {
                let new_len = (self.data.len() as i32).to_le_bytes();
                self.data[0..4].copy_from_slice(&new_len);
                self.len += 1;
                Ok(())
            }
            Err(e) => {
                // bit-exact rollback: the only mutated byte below
                // `original_len` was the terminator
                self.data.truncate(original_len);
                self.data[original_len - 1] = 0;
                Err(e.with_key(key))
            }
        }
    }
}

/// Appends the payload of `value` (everything after the type byte and key).
pub(crate) fn encode_value(buf: &mut Vec<u8>, value: &Bson) -> Result<()> {
    match value {
        Bson::Double(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Bson::String(s) => write_string(buf, s),
        Bson::Document(doc) => buf.extend_from_slice(doc.as_bytes()),
        Bson::Array(arr) => encode_array(buf, arr)?,
        Bson::Boolean(b) => buf.push(*b as u8),
        Bson::Null | Bson::Undefined(_) | Bson::MinKey | Bson::MaxKey => {}
        Bson::RegularExpression(re) => {
            write_cstring(buf, &re.pattern)?;
            write_cstring(buf, &re.options)?;
        }
        Bson::JavaScriptCode(code) => write_string(buf, code),
        Bson::JavaScriptCodeWithScope(cws) => encode_code_with_scope(buf, cws),
        Bson::Int32(i) => buf.extend_from_slice(&i.to_le_bytes()),
        Bson::Int64(i) => buf.extend_from_slice(&i.to_le_bytes()),
        Bson::Timestamp(ts) => buf.extend_from_slice(&ts.to_le_bytes()),
        Bson::Binary(bin) => encode_binary(buf, bin),
        Bson::ObjectId(id) => buf.extend_from_slice(&id.bytes()),
        Bson::DateTime(dt) => buf.extend_from_slice(&dt.timestamp_millis().to_le_bytes()),
        Bson::Symbol(s) => write_string(buf, s.as_str()),
        Bson::Decimal128(d) => buf.extend_from_slice(&d.bytes()),
        Bson::DbPointer(dbp) => {
            write_string(buf, &dbp.namespace);
            buf.extend_from_slice(&dbp.id.bytes());
        }
    }
    Ok(())
}

/// Encodes an array payload: a 4-byte length slot is reserved, the elements
/// are written with keys `"0"`, `"1"`, …, and the slot is backpatched once
/// the terminator is in place.
fn encode_array(buf: &mut Vec<u8>, arr: &[Bson]) -> Result<()> {
    let start = buf.len();
    buf.extend_from_slice(&[0; 4]);
    for (index, value) in arr.iter().enumerate() {
        buf.push(value.element_type() as u8);
        write_cstring(buf, &index.to_string())?;
        encode_value(buf, value)?;
    }
    buf.push(0);
    let total = ((buf.len() - start) as i32).to_le_bytes();
    buf[start..start + 4].copy_from_slice(&total);
    Ok(())
}

fn encode_binary(buf: &mut Vec<u8>, bin: &Binary) {
    buf.extend_from_slice(&(bin.bytes.len() as i32).to_le_bytes());
    buf.push(u8::from(bin.subtype));
    buf.extend_from_slice(&bin.bytes);
}

fn encode_code_with_scope(buf: &mut Vec<u8>, cws: &JavaScriptCodeWithScope) {
    let total = 4 + (4 + cws.code.len() + 1) + cws.scope.as_bytes().len();
    buf.extend_from_slice(&(total as i32).to_le_bytes());
    write_string(buf, &cws.code);
    buf.extend_from_slice(cws.scope.as_bytes());
}
