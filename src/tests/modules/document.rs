use assert_matches::assert_matches;
use pretty_assertions::assert_eq;

use crate::{
    Bson,
    Document,
    doc,
    error::{ErrorKind, ValueAccessErrorKind},
    oid::ObjectId,
};

#[test]
fn empty_document_bytes() {
    let doc = Document::new();
    assert_eq!(doc.as_bytes(), &[0x05, 0x00, 0x00, 0x00, 0x00]);
    assert!(doc.is_empty());
    assert_eq!(doc.len(), 0);
}

#[test]
fn single_int32_bytes() {
    let mut doc = Document::new();
    doc.set("x", Bson::Int32(7)).unwrap();
    assert_eq!(
        doc.as_bytes(),
        &[
            0x0C, 0x00, 0x00, 0x00, // total length 12
            0x10, // int32 tag
            b'x', 0x00, // key
            0x07, 0x00, 0x00, 0x00, // value
            0x00, // terminator
        ]
    );
}

#[test]
fn byte_round_trip() {
    let doc = doc! {
        "double": 1.5,
        "string": "hello",
        "doc": { "nested": true },
        "array": [1, 2, 3],
        "null": null,
        "int64": 4_000_000_000_i64,
        "oid": ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap(),
    };
    let parsed = Document::from_bytes(doc.as_bytes().to_vec()).unwrap();
    assert_eq!(parsed, doc);
}

#[test]
fn get_returns_first_occurrence() {
    // duplicate keys cannot be built through `set`, so splice them manually
    let first = doc! { "a": Bson::Int32(1) };
    let second = doc! { "a": Bson::Int32(2) };
    let mut bytes = Vec::new();
    let first_body = &first.as_bytes()[4..first.as_bytes().len() - 1];
    let second_body = &second.as_bytes()[4..second.as_bytes().len() - 1];
    bytes.extend(((4 + first_body.len() + second_body.len() + 1) as i32).to_le_bytes());
    bytes.extend(first_body);
    bytes.extend(second_body);
    bytes.push(0);

    let doc = Document::from_bytes(bytes).unwrap();
    assert_eq!(doc.len(), 2);
    assert_eq!(doc.get("a"), Some(Bson::Int32(1)));
    let values: Vec<Bson> = doc.values().collect();
    assert_eq!(values, vec![Bson::Int32(1), Bson::Int32(2)]);
}

#[test]
fn set_preserves_insertion_order() {
    let mut doc = Document::new();
    doc.set("one", 1).unwrap();
    doc.set("two", 2).unwrap();
    doc.set("three", 3).unwrap();

    let keys: Vec<&str> = doc.keys().collect();
    assert_eq!(keys, vec!["one", "two", "three"]);

    // replacement keeps the original position
    let old = doc.set("two", 22).unwrap();
    assert_eq!(old, Some(Bson::Int32(2)));
    let entries: Vec<(&str, Bson)> = doc.iter().collect();
    assert_eq!(
        entries,
        vec![
            ("one", Bson::Int32(1)),
            ("two", Bson::Int32(22)),
            ("three", Bson::Int32(3)),
        ]
    );
}

#[test]
fn remove() {
    let mut doc = doc! { "a": 1, "b": 2, "c": 3 };
    assert_eq!(doc.remove("b"), Some(Bson::from(2_isize)));
    assert_eq!(doc.get("b"), None);
    assert_eq!(doc.remove("b"), None);
    let keys: Vec<&str> = doc.keys().collect();
    assert_eq!(keys, vec!["a", "c"]);
}

#[test]
fn nested_array_layout() {
    let doc = doc! { "a": [Bson::Int32(1), "hi"] };

    let array = doc.get_array("a").unwrap();
    assert_eq!(
        array,
        vec![Bson::Int32(1), Bson::String("hi".to_string())]
    );

    // the embedded array document is keyed "0", "1"
    let bytes = doc.as_bytes();
    assert!(bytes.windows(3).any(|w| w == [0x10, b'0', 0x00]));
    assert!(bytes.windows(3).any(|w| w == [0x02, b'1', 0x00]));

    let parsed = Document::from_bytes(bytes.to_vec()).unwrap();
    assert_eq!(parsed, doc);
}

#[test]
fn typed_getters() {
    let doc = doc! {
        "f": 1.5,
        "s": "text",
        "b": true,
        "i": Bson::Int32(7),
        "l": 7_i64,
        "n": null,
    };
    assert_eq!(doc.get_f64("f").unwrap(), 1.5);
    assert_eq!(doc.get_str("s").unwrap(), "text");
    assert!(doc.get_bool("b").unwrap());
    assert_eq!(doc.get_i32("i").unwrap(), 7);
    assert_eq!(doc.get_i64("l").unwrap(), 7);
    assert!(doc.is_null("n"));
    assert!(!doc.is_null("f"));

    assert_matches!(
        doc.get_i32("l").unwrap_err().kind,
        ErrorKind::ValueAccess {
            kind: ValueAccessErrorKind::UnexpectedType { .. }
        }
    );
    assert_matches!(
        doc.get_i32("missing").unwrap_err().kind,
        ErrorKind::ValueAccess {
            kind: ValueAccessErrorKind::NotPresent {}
        }
    );
}

#[test]
fn equality_is_canonical_bytes() {
    assert_eq!(doc! { "a": 1 }, doc! { "a": 1 });
    assert_ne!(doc! { "a": Bson::Int32(1) }, doc! { "a": 1_i64 });
    assert_ne!(doc! { "a": 1, "b": 2 }, doc! { "b": 2, "a": 1 });
}

#[test]
fn reader_writer_round_trip() {
    let doc = doc! { "a": 1, "b": [true, null] };
    let mut buf = Vec::new();
    doc.to_writer(&mut buf).unwrap();
    let read = Document::from_reader(buf.as_slice()).unwrap();
    assert_eq!(read, doc);
}

#[test]
fn from_reader_rejects_bad_lengths() {
    assert!(Document::from_reader(&[0x02, 0x00, 0x00, 0x00][..]).is_err());
    assert!(Document::from_reader(&[0x05, 0x00, 0x00, 0x00][..]).is_err());
}

#[test]
fn get_at_and_contains() {
    let doc = doc! { "a": Bson::Int32(1), "b": "x" };
    assert_eq!(doc.get_at(0), Some(("a", Bson::Int32(1))));
    assert_eq!(doc.get_at(1), Some(("b", Bson::String("x".to_string()))));
    assert_eq!(doc.get_at(2), None);
    assert!(doc.contains_key("a"));
    assert!(!doc.contains_key("z"));
}

#[test]
fn clear() {
    let mut doc = doc! { "a": 1 };
    doc.clear();
    assert_eq!(doc, Document::new());
}

#[test]
fn set_rejects_null_bytes_in_keys() {
    let mut doc = Document::new();
    let err = doc.set("a\0b", 1).unwrap_err();
    assert_matches!(err.kind, ErrorKind::InvalidArgument {});
    assert!(doc.is_empty());
}

#[test]
fn display() {
    let doc = doc! { "a": 1, "b": "x" };
    assert_eq!(doc.to_string(), "{ \"a\": 1, \"b\": \"x\" }");
    assert_eq!(Document::new().to_string(), "{}");
}

#[test]
fn owned_iteration() {
    let doc = doc! { "a": 1, "b": 2 };
    let owned: Vec<(String, Bson)> = doc.into_iter().collect();
    assert_eq!(
        owned,
        vec![
            ("a".to_string(), Bson::from(1_isize)),
            ("b".to_string(), Bson::from(2_isize)),
        ]
    );
}
