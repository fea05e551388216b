//! Byte-level plumbing for the BSON wire format: slice readers, buffer
//! writers, and the streaming element cursor.

mod iter;
mod writer;

pub use iter::{RawElement, RawIter};
pub use writer::DocumentWriter;

use crate::error::{Error, Result};

/// The number of bytes in the smallest possible document: the length prefix
/// and the terminator.
pub(crate) const MIN_DOCUMENT_SIZE: usize = 4 + 1;

/// The maximum size in bytes of a BSON document (16 MiB).
pub const MAX_DOCUMENT_SIZE: usize = 16 * 1024 * 1024;

/// The maximum document/array nesting depth accepted by validation.
pub(crate) const MAX_NESTING_DEPTH: usize = 256;

pub(crate) fn read_u8(data: &[u8], at: usize) -> Result<u8> {
    data.get(at).copied().ok_or_else(|| Error::truncated(at))
}

pub(crate) fn read_i32(data: &[u8], at: usize) -> Result<i32> {
    let bytes = data
        .get(at..at + 4)
        .ok_or_else(|| Error::truncated(data.len()))?;
    Ok(i32::from_le_bytes(bytes.try_into().unwrap_or([0; 4])))
}

pub(crate) fn read_i64(data: &[u8], at: usize) -> Result<i64> {
    let bytes = data
        .get(at..at + 8)
        .ok_or_else(|| Error::truncated(data.len()))?;
    Ok(i64::from_le_bytes(bytes.try_into().unwrap_or([0; 8])))
}

pub(crate) fn read_f64(data: &[u8], at: usize) -> Result<f64> {
    read_i64(data, at).map(|bits| f64::from_bits(bits as u64))
}

/// Validates that `data` is UTF-8 and converts it to a `&str`. The offset is
/// attached to the error on failure.
pub(crate) fn try_to_str(data: &[u8], at: usize) -> Result<&str> {
    simdutf8::basic::from_utf8(data).map_err(|_| Error::invalid_utf8(at))
}

/// Reads a null-terminated UTF-8 string starting at `at`, without consuming
/// the terminator.
pub(crate) fn read_cstring(data: &[u8], at: usize) -> Result<&str> {
    let tail = data.get(at..).ok_or_else(|| Error::truncated(data.len()))?;
    let nul = tail
        .iter()
        .position(|b| *b == 0)
        .ok_or_else(|| Error::truncated(data.len()))?;
    try_to_str(&tail[..nul], at)
}

/// Reads a length-prefixed string: `i32 len (including terminator) + utf8 +
/// \0`. Returns the string contents.
pub(crate) fn read_lenencoded(data: &[u8], at: usize) -> Result<&str> {
    let len = read_i32(data, at)?;
    if len < 1 {
        return Err(Error::invalid_length(
            format!("string length {len} must be at least 1"),
            at,
        ));
    }
    let start = at + 4;
    let end = start + len as usize;
    let bytes = data.get(start..end).ok_or_else(|| {
        Error::invalid_length(
            format!("string length {len} exceeds remaining buffer"),
            at,
        )
    })?;
    if bytes[bytes.len() - 1] != 0 {
        return Err(Error::data_corrupted("string is not null terminated").with_offset(end - 1));
    }
    try_to_str(&bytes[..bytes.len() - 1], start)
}

/// Appends a length-prefixed string to the buffer.
pub(crate) fn write_string(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as i32 + 1).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
}

/// Appends a null-terminated string to the buffer, rejecting interior null
/// bytes.
pub(crate) fn write_cstring(buf: &mut Vec<u8>, s: &str) -> Result<()> {
    if s.contains('\0') {
        return Err(Error::invalid_argument(format!(
            "cstring cannot contain interior null bytes: {s:?}"
        )));
    }
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
    Ok(())
}

/// Checks the framing of a document slice: minimum size, matching length
/// prefix, trailing null.
pub(crate) fn check_framing(data: &[u8], base: usize) -> Result<()> {
    if data.len() < MIN_DOCUMENT_SIZE {
        return Err(Error::invalid_length(
            format!("document of {} bytes is below the 5 byte minimum", data.len()),
            base,
        ));
    }
    if data.len() > MAX_DOCUMENT_SIZE {
        return Err(Error::too_large(data.len(), MAX_DOCUMENT_SIZE));
    }
    let declared = read_i32(data, 0)?;
    if declared as usize != data.len() {
        return Err(Error::invalid_length(
            format!(
                "declared length {declared} does not match buffer length {}",
                data.len()
            ),
            base,
        ));
    }
    if data[data.len() - 1] != 0 {
        return Err(Error::missing_terminator(base + data.len() - 1));
    }
    Ok(())
}

/// Fully validates a document slice: framing, every element header and
/// payload, UTF-8 of every key and materialized string, recursing into
/// nested documents, arrays, and code scopes. Errors carry the byte offset
/// relative to the top-level document (`base` is this slice's offset in it).
pub(crate) fn validate_document(data: &[u8], base: usize) -> Result<()> {
    validate_document_at_depth(data, base, 0)
}

pub(crate) fn validate_document_at_depth(data: &[u8], base: usize, depth: usize) -> Result<()> {
    if depth > MAX_NESTING_DEPTH {
        return Err(Error::data_corrupted(format!(
            "nesting deeper than {MAX_NESTING_DEPTH} levels"
        ))
        .with_offset(base));
    }
    check_framing(data, base)?;
    let mut iter = RawIter::new(data);
    for element in &mut iter {
        let element = element.map_err(|e| offset_error(e, base))?;
        element
            .validate_at_depth(depth)
            .map_err(|e| offset_error(e, base))?;
    }
    Ok(())
}

/// Rebases a relative byte offset in a nested error onto the enclosing
/// document.
fn offset_error(mut e: Error, base: usize) -> Error {
    if let Some(offset) = e.offset {
        e.offset = Some(offset + base);
    }
    e
}
