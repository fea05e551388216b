use assert_matches::assert_matches;

use crate::{
    Binary,
    Bson,
    DateTime,
    Decimal128,
    DocumentWriter,
    Regex,
    Timestamp,
    doc,
    error::ErrorKind,
    oid::ObjectId,
    raw::MAX_DOCUMENT_SIZE,
};

#[test]
fn empty_writer_finalizes_to_empty_document() {
    let writer = DocumentWriter::new();
    assert!(writer.is_empty());
    assert_eq!(writer.finalize().as_bytes(), &[0x05, 0x00, 0x00, 0x00, 0x00]);
}

#[test]
fn single_int32_layout() {
    let mut writer = DocumentWriter::new();
    writer.append_int32("x", 7).unwrap();
    assert_eq!(
        writer.finalize().as_bytes(),
        &[0x0C, 0x00, 0x00, 0x00, 0x10, b'x', 0x00, 0x07, 0x00, 0x00, 0x00, 0x00]
    );
}

#[test]
fn all_variants_round_trip() {
    let oid = ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap();
    let decimal: Decimal128 = "1.25".parse().unwrap();
    let scope = doc! { "x": 1 };

    let mut writer = DocumentWriter::new();
    writer.append_double("double", 1.5).unwrap();
    writer.append_string("string", "hello").unwrap();
    writer.append_document("document", &doc! { "a": 1 }).unwrap();
    writer
        .append_array("array", &[Bson::Int32(1), Bson::String("two".to_string())])
        .unwrap();
    writer
        .append_binary("binary", &Binary::generic(vec![1, 2, 3]))
        .unwrap();
    writer.append_undefined("undefined").unwrap();
    writer.append_oid("oid", oid).unwrap();
    writer.append_bool("bool", true).unwrap();
    writer
        .append_datetime("datetime", DateTime::from_millis(1_700_000_000_000))
        .unwrap();
    writer.append_null("null").unwrap();
    writer
        .append_regex("regex", &Regex::new("^a", "im").unwrap())
        .unwrap();
    writer.append_code("code", "function() {}").unwrap();
    writer.append_symbol("symbol", "sym").unwrap();
    writer
        .append_code_with_scope(
            "codeWithScope",
            &crate::JavaScriptCodeWithScope {
                code: "function(x) {}".to_string(),
                scope,
            },
        )
        .unwrap();
    writer.append_int32("int32", -12).unwrap();
    writer
        .append_timestamp(
            "timestamp",
            Timestamp {
                time: 500,
                increment: 3,
            },
        )
        .unwrap();
    writer.append_int64("int64", 1 << 40).unwrap();
    writer.append_decimal128("decimal128", decimal).unwrap();
    writer.append_min_key("minKey").unwrap();
    writer.append_max_key("maxKey").unwrap();

    assert_eq!(writer.len(), 20);
    let doc = writer.finalize();

    assert_eq!(doc.get("double"), Some(Bson::Double(1.5)));
    assert_eq!(doc.get("string"), Some(Bson::String("hello".to_string())));
    assert_eq!(doc.get_document("document").unwrap(), doc! { "a": 1 });
    assert_eq!(
        doc.get("array"),
        Some(Bson::Array(vec![
            Bson::Int32(1),
            Bson::String("two".to_string())
        ]))
    );
    assert_eq!(
        doc.get("binary"),
        Some(Bson::Binary(Binary::generic(vec![1, 2, 3])))
    );
    assert_eq!(doc.get("undefined"), Some(crate::legacy::undefined()));
    assert_eq!(doc.get("oid"), Some(Bson::ObjectId(oid)));
    assert_eq!(doc.get("bool"), Some(Bson::Boolean(true)));
    assert_eq!(
        doc.get("datetime"),
        Some(Bson::DateTime(DateTime::from_millis(1_700_000_000_000)))
    );
    assert_eq!(doc.get("null"), Some(Bson::Null));
    assert_eq!(
        doc.get("regex"),
        Some(Bson::RegularExpression(Regex::new("^a", "im").unwrap()))
    );
    assert_eq!(
        doc.get("code"),
        Some(Bson::JavaScriptCode("function() {}".to_string()))
    );
    assert_eq!(doc.get("symbol"), Some(crate::legacy::symbol("sym")));
    assert_matches!(
        doc.get("codeWithScope"),
        Some(Bson::JavaScriptCodeWithScope(_))
    );
    assert_eq!(doc.get("int32"), Some(Bson::Int32(-12)));
    assert_eq!(
        doc.get("timestamp"),
        Some(Bson::Timestamp(Timestamp {
            time: 500,
            increment: 3
        }))
    );
    assert_eq!(doc.get("int64"), Some(Bson::Int64(1 << 40)));
    assert_eq!(doc.get("decimal128"), Some(Bson::Decimal128(decimal)));
    assert_eq!(doc.get("minKey"), Some(Bson::MinKey));
    assert_eq!(doc.get("maxKey"), Some(Bson::MaxKey));

    // the writer's output survives a validating re-parse
    let reparsed = crate::Document::from_bytes(doc.as_bytes().to_vec()).unwrap();
    assert_eq!(reparsed, doc);
}

#[test]
fn db_pointer_round_trips_through_generic_append() {
    // DbPointer cannot be constructed directly; read one out of crafted
    // bytes and append it again.
    let oid = ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap();
    let mut bytes = Vec::new();
    bytes.extend(0i32.to_le_bytes()); // patched below
    bytes.push(0x0C);
    bytes.extend(b"ptr\0");
    bytes.extend(3i32.to_le_bytes());
    bytes.extend(b"db\0");
    bytes.extend(oid.bytes());
    bytes.push(0);
    let total = (bytes.len() as i32).to_le_bytes();
    bytes[0..4].copy_from_slice(&total);

    let doc = crate::Document::from_bytes(bytes).unwrap();
    let pointer = doc.get("ptr").unwrap();
    assert_matches!(&pointer, Bson::DbPointer(p) if p.namespace() == "db" && p.id() == oid);

    let mut writer = DocumentWriter::new();
    writer.append("ptr", &pointer).unwrap();
    assert_eq!(writer.finalize(), doc);
}

#[test]
fn size_cap_rolls_back_exactly() {
    let mut writer = DocumentWriter::new();
    writer.append_int32("a", 1).unwrap();
    let before = writer.as_bytes().to_vec();

    let big = Binary::generic(vec![0u8; MAX_DOCUMENT_SIZE]);
    let err = writer.append_binary("blob", &big).unwrap_err();
    assert_matches!(err.kind, ErrorKind::TooLarge { .. });
    assert_eq!(err.key.as_deref(), Some("blob"));

    // bit-exact rollback
    assert_eq!(writer.as_bytes(), before.as_slice());
    assert_eq!(writer.len(), 1);

    let doc = writer.finalize();
    assert_eq!(doc, doc! { "a": Bson::Int32(1) });
}

#[test]
fn size_cap_allows_documents_up_to_the_limit() {
    let mut writer = DocumentWriter::new();
    writer
        .append_binary("a", &Binary::generic(vec![0u8; 8 * 1024 * 1024]))
        .unwrap();
    writer
        .append_binary("b", &Binary::generic(vec![0u8; 7 * 1024 * 1024]))
        .unwrap();
    let err = writer
        .append_binary("c", &Binary::generic(vec![0u8; 2 * 1024 * 1024]))
        .unwrap_err();
    assert_matches!(err.kind, ErrorKind::TooLarge { .. });
    assert_eq!(writer.len(), 2);
}

#[test]
fn keys_with_null_bytes_are_rejected() {
    let mut writer = DocumentWriter::new();
    let err = writer.append_int32("a\0b", 1).unwrap_err();
    assert_matches!(err.kind, ErrorKind::InvalidArgument {});
    assert!(writer.is_empty());
    assert_eq!(writer.as_bytes(), &[0x05, 0x00, 0x00, 0x00, 0x00]);
}

#[test]
fn dropping_without_finalize_is_safe() {
    let mut writer = DocumentWriter::new();
    writer.append_string("k", "v").unwrap();
    drop(writer);
}
