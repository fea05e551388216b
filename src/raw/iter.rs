use crate::{
    Binary,
    Bson,
    DateTime,
    Decimal128,
    Document,
    bson::{DbPointer, JavaScriptCodeWithScope, Regex, Symbol, Timestamp, Undefined},
    error::{Error, Result},
    oid::ObjectId,
    raw::{
        MIN_DOCUMENT_SIZE,
        read_cstring,
        read_f64,
        read_i32,
        read_i64,
        read_lenencoded,
        validate_document_at_depth,
    },
    spec::{BinarySubtype, ElementType},
};

/// The smallest possible code-with-scope payload: a length, an empty string,
/// and an empty scope document.
const MIN_CODE_WITH_SCOPE_SIZE: usize = 4 + (4 + 1) + MIN_DOCUMENT_SIZE;

/// A streaming cursor over the elements of a document buffer.
///
/// Yields one [`RawElement`] per element in document order. Iteration is
/// single-pass: scalar headers are examined in place and nothing is
/// allocated until [`RawElement::value`] materializes a payload. After the
/// first error, all subsequent calls return [`None`].
pub struct RawIter<'a> {
    data: &'a [u8],
    offset: usize,

    /// Whether the underlying buffer is assumed to be valid or if an error
    /// has been encountered.
    valid: bool,
}

impl<'a> RawIter<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: 4,
            valid: true,
        }
    }

    fn verify_enough_bytes(&self, start: usize, num_bytes: usize) -> Result<()> {
        let end = checked_add(start, num_bytes)?;
        if self.data.get(start..end).is_none() {
            return Err(Error::truncated(self.data.len()).with_message(format!(
                "length {} exceeds remaining length of buffer",
                num_bytes
            )));
        }
        Ok(())
    }

    fn next_document_len(&self, starting_at: usize) -> Result<usize> {
        self.verify_enough_bytes(starting_at, MIN_DOCUMENT_SIZE)?;
        let size = read_i32(self.data, starting_at)?;
        if size < MIN_DOCUMENT_SIZE as i32 {
            return Err(Error::invalid_length(
                format!("nested document too small: {size} bytes"),
                starting_at,
            ));
        }
        let size = size as usize;
        self.verify_enough_bytes(starting_at, size)?;
        if self.data[starting_at + size - 1] != 0 {
            return Err(Error::missing_terminator(starting_at + size - 1));
        }
        Ok(size)
    }

    fn next_string_len(&self, starting_at: usize) -> Result<usize> {
        let len = read_i32(self.data, starting_at)?;
        if len < 1 {
            return Err(Error::invalid_length(
                format!("string length {len} must be at least 1"),
                starting_at,
            ));
        }
        checked_add(4, len as usize)
    }
}

impl<'a> Iterator for RawIter<'a> {
    type Item = Result<RawElement<'a>>;

    fn next(&mut self) -> Option<Result<RawElement<'a>>> {
        if !self.valid {
            return None;
        } else if self.data.len() < MIN_DOCUMENT_SIZE {
            self.valid = false;
            return Some(Err(Error::invalid_length(
                format!("document of {} bytes is below the 5 byte minimum", self.data.len()),
                0,
            )));
        } else if self.offset == self.data.len() - 1 {
            if self.data[self.offset] == 0 {
                // end of document marker
                return None;
            } else {
                self.valid = false;
                return Some(Err(Error::missing_terminator(self.offset)));
            }
        } else if self.offset >= self.data.len() {
            self.valid = false;
            return Some(Err(Error::truncated(self.data.len())
                .with_message("iteration overflowed document")));
        }

        let result = self.next_element();
        if result.is_err() {
            self.valid = false;
        }
        Some(result)
    }
}

impl<'a> RawIter<'a> {
    fn next_element(&mut self) -> Result<RawElement<'a>> {
        let tag_at = self.offset;
        let key = read_cstring(self.data, tag_at + 1)?;
        let offset = tag_at + 1 + key.len() + 1; // type specifier + key + \0

        let element_type = ElementType::from_u8(self.data[tag_at])
            .ok_or_else(|| Error::unknown_type(self.data[tag_at], tag_at).with_key(key))?;

        let element_size = match element_type {
            ElementType::Boolean => 1,
            ElementType::Int32 => 4,
            ElementType::Int64 => 8,
            ElementType::Double => 8,
            ElementType::DateTime => 8,
            ElementType::Timestamp => 8,
            ElementType::ObjectId => 12,
            ElementType::Decimal128 => 16,
            ElementType::Null => 0,
            ElementType::Undefined => 0,
            ElementType::MinKey => 0,
            ElementType::MaxKey => 0,
            ElementType::String => self.next_string_len(offset)?,
            ElementType::EmbeddedDocument => self.next_document_len(offset)?,
            ElementType::Array => self.next_document_len(offset)?,
            ElementType::Binary => {
                let len = read_i32(self.data, offset)?;
                if len < 0 {
                    return Err(Error::invalid_length(
                        format!("binary length {len} cannot be negative"),
                        offset,
                    )
                    .with_key(key));
                }
                checked_add(len as usize, 4 + 1)?
            }
            ElementType::RegularExpression => {
                let pattern = read_cstring(self.data, offset)?;
                let options = read_cstring(self.data, offset + pattern.len() + 1)?;
                pattern.len() + 1 + options.len() + 1
            }
            ElementType::DbPointer => checked_add(self.next_string_len(offset)?, 12)?,
            ElementType::Symbol => self.next_string_len(offset)?,
            ElementType::JavaScriptCode => self.next_string_len(offset)?,
            ElementType::JavaScriptCodeWithScope => {
                let len = read_i32(self.data, offset)?;
                if len < MIN_CODE_WITH_SCOPE_SIZE as i32 {
                    return Err(Error::invalid_length(
                        format!("code with scope length {len} too small"),
                        offset,
                    )
                    .with_key(key));
                }
                len as usize
            }
        };

        self.verify_enough_bytes(offset, element_size)
            .map_err(|e| e.with_key(key))?;
        self.offset = offset + element_size;

        Ok(RawElement {
            data: self.data,
            key,
            kind: element_type,
            start_at: offset,
            size: element_size,
        })
    }
}

/// A single element of a document: a view onto the key and the undecoded
/// payload bytes.
#[derive(Clone)]
pub struct RawElement<'a> {
    data: &'a [u8],
    key: &'a str,
    kind: ElementType,
    start_at: usize,
    size: usize,
}

impl<'a> RawElement<'a> {
    /// The element's key.
    pub fn key(&self) -> &'a str {
        self.key
    }

    /// The element's type.
    pub fn element_type(&self) -> ElementType {
        self.kind
    }

    /// The byte offset of the element's payload within the document.
    pub fn offset(&self) -> usize {
        self.start_at
    }

    fn slice(&self) -> &'a [u8] {
        &self.data[self.start_at..(self.start_at + self.size)]
    }

    /// The payload as a borrowed string slice. Only meaningful for the
    /// length-prefixed string kinds.
    pub(crate) fn str_value(&self) -> Result<&'a str> {
        read_lenencoded(self.data, self.start_at)
    }

    fn malformed(&self, message: impl ToString) -> Error {
        Error::data_corrupted(message)
            .with_key(self.key)
            .with_offset(self.start_at)
    }

    fn read_bool(&self) -> Result<bool> {
        match self.data[self.start_at] {
            0 => Ok(false),
            1 => Ok(true),
            b => Err(self.malformed(format!("boolean must be stored as 0 or 1, found {b}"))),
        }
    }

    fn oid_at(&self, at: usize) -> ObjectId {
        let mut bytes = [0u8; 12];
        bytes.copy_from_slice(&self.data[at..at + 12]);
        ObjectId::from_bytes(bytes)
    }

    fn binary_parts(&self) -> Result<(BinarySubtype, &'a [u8])> {
        let len = self.size - 4 - 1;
        let subtype_byte = self.data[self.start_at + 4];
        let subtype = BinarySubtype::try_from_u8(subtype_byte).map_err(|_| {
            self.malformed(format!(
                "binary subtype {subtype_byte:#04x} is in the reserved range"
            ))
        })?;
        let bytes = &self.data[self.start_at + 4 + 1..self.start_at + 4 + 1 + len];

        match subtype {
            BinarySubtype::Uuid | BinarySubtype::UuidOld if len != 16 => {
                Err(self.malformed(format!("UUID binary value has {len} bytes instead of 16")))
            }
            BinarySubtype::BinaryOld => {
                if len < 4 {
                    return Err(self.malformed("old binary subtype has no inner declared length"));
                }
                let inner = read_i32(self.data, self.start_at + 4 + 1)?;
                if inner < 0 || inner as usize + 4 != len {
                    return Err(
                        self.malformed("old binary subtype has wrong inner declared length")
                    );
                }
                Ok((subtype, bytes))
            }
            _ => Ok((subtype, bytes)),
        }
    }

    fn regex_parts(&self) -> Result<(&'a str, &'a str)> {
        let pattern = read_cstring(self.data, self.start_at)?;
        let options = read_cstring(self.data, self.start_at + pattern.len() + 1)?;
        if !options.as_bytes().is_sorted() {
            return Err(Error::unsorted_regex_options(
                options,
                self.start_at + pattern.len() + 1,
            )
            .with_key(self.key));
        }
        Ok((pattern, options))
    }

    fn code_with_scope_parts(&self) -> Result<(&'a str, &'a [u8])> {
        let slice = self.slice();
        let code = read_lenencoded(slice, 4)
            .map_err(|e| offset_rebase(e, self.start_at))?;
        let scope_start = 4 + 4 + code.len() + 1;
        if scope_start >= slice.len() {
            return Err(self.malformed("code with scope has no room for a scope document"));
        }
        Ok((code, &slice[scope_start..]))
    }

    /// Decodes the payload at the current position according to the element's
    /// type tag.
    pub fn value(&self) -> Result<Bson> {
        Ok(match self.kind {
            ElementType::Null => Bson::Null,
            ElementType::Undefined => Bson::Undefined(Undefined::new()),
            ElementType::MinKey => Bson::MinKey,
            ElementType::MaxKey => Bson::MaxKey,
            ElementType::Boolean => Bson::Boolean(self.read_bool()?),
            ElementType::Int32 => Bson::Int32(read_i32(self.data, self.start_at)?),
            ElementType::Int64 => Bson::Int64(read_i64(self.data, self.start_at)?),
            ElementType::Double => Bson::Double(read_f64(self.data, self.start_at)?),
            ElementType::DateTime => {
                Bson::DateTime(DateTime::from_millis(read_i64(self.data, self.start_at)?))
            }
            ElementType::Timestamp => {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(self.slice());
                Bson::Timestamp(Timestamp::from_le_bytes(bytes))
            }
            ElementType::ObjectId => Bson::ObjectId(self.oid_at(self.start_at)),
            ElementType::Decimal128 => {
                let mut bytes = [0u8; 16];
                bytes.copy_from_slice(self.slice());
                Bson::Decimal128(Decimal128::from_bytes(bytes))
            }
            ElementType::String => {
                Bson::String(read_lenencoded(self.data, self.start_at)?.to_string())
            }
            ElementType::JavaScriptCode => {
                Bson::JavaScriptCode(read_lenencoded(self.data, self.start_at)?.to_string())
            }
            ElementType::Symbol => {
                Bson::Symbol(Symbol::new(read_lenencoded(self.data, self.start_at)?))
            }
            ElementType::EmbeddedDocument => {
                Bson::Document(Document::from_bytes_unchecked(self.slice().to_vec()))
            }
            ElementType::Array => {
                let mut array = Vec::new();
                for element in RawIter::new(self.slice()) {
                    array.push(element.and_then(|e| e.value())
                        .map_err(|e| offset_rebase(e, self.start_at))?);
                }
                Bson::Array(array)
            }
            ElementType::Binary => {
                let (subtype, bytes) = self.binary_parts()?;
                Bson::Binary(Binary {
                    subtype,
                    bytes: bytes.to_vec(),
                })
            }
            ElementType::RegularExpression => {
                let (pattern, options) = self.regex_parts()?;
                Bson::RegularExpression(Regex {
                    pattern: pattern.to_string(),
                    options: options.to_string(),
                })
            }
            ElementType::DbPointer => Bson::DbPointer(DbPointer {
                namespace: read_lenencoded(self.data, self.start_at)?.to_string(),
                id: self.oid_at(self.start_at + self.size - 12),
            }),
            ElementType::JavaScriptCodeWithScope => {
                let (code, scope) = self.code_with_scope_parts()?;
                Bson::JavaScriptCodeWithScope(JavaScriptCodeWithScope {
                    code: code.to_string(),
                    scope: Document::from_bytes_unchecked(scope.to_vec()),
                })
            }
        })
    }

    /// Validates the payload without materializing owned values, recursing
    /// into nested documents.
    pub(crate) fn validate_at_depth(&self, depth: usize) -> Result<()> {
        match self.kind {
            ElementType::Boolean => {
                self.read_bool()?;
            }
            ElementType::String | ElementType::JavaScriptCode | ElementType::Symbol => {
                read_lenencoded(self.data, self.start_at)?;
            }
            ElementType::EmbeddedDocument | ElementType::Array => {
                validate_document_at_depth(self.slice(), self.start_at, depth + 1)
                    .map_err(|e| e.with_key(self.key))?;
            }
            ElementType::Binary => {
                self.binary_parts()?;
            }
            ElementType::RegularExpression => {
                self.regex_parts()?;
            }
            ElementType::DbPointer => {
                read_lenencoded(self.data, self.start_at)?;
            }
            ElementType::JavaScriptCodeWithScope => {
                let (_, scope) = self.code_with_scope_parts()?;
                let scope_at = self.start_at + (self.size - scope.len());
                validate_document_at_depth(scope, scope_at, depth + 1)
                    .map_err(|e| e.with_key(self.key))?;
            }
            _ => {}
        }
        Ok(())
    }
}

fn offset_rebase(mut e: Error, base: usize) -> Error {
    if let Some(offset) = e.offset {
        e.offset = Some(offset + base);
    }
    e
}

fn checked_add(lhs: usize, rhs: usize) -> Result<usize> {
    lhs.checked_add(rhs)
        .ok_or_else(|| Error::data_corrupted("element size overflows"))
}
