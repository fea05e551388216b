use std::{borrow::Cow, sync::Arc};

use assert_matches::assert_matches;

use crate::{
    Bson,
    CodingKey,
    DateEncodingStrategy,
    DateTime,
    Encode,
    Encoder,
    EncoderOptions,
    UuidEncodingStrategy,
    coding::ByteBuf,
    doc,
    encoder::DataEncodingStrategy,
    error::{ErrorKind, Result},
    to_bson,
    to_document,
    to_vec,
};

#[derive(Debug, Clone, PartialEq)]
struct Pet {
    name: String,
}

impl Encode for Pet {
    fn encode(&self, encoder: &mut Encoder) -> Result<()> {
        let mut container = encoder.keyed_container::<&str>()?;
        container.encode_str(&self.name, &"name")?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Person {
    name: String,
    age: u32,
    pets: Vec<Pet>,
    nickname: Option<String>,
}

enum PersonKey {
    Name,
    Age,
    Pets,
    Nickname,
}

impl CodingKey for PersonKey {
    fn key(&self) -> Cow<'_, str> {
        Cow::Borrowed(match self {
            PersonKey::Name => "name",
            PersonKey::Age => "age",
            PersonKey::Pets => "pets",
            PersonKey::Nickname => "nickname",
        })
    }
}

impl Encode for Person {
    fn encode(&self, encoder: &mut Encoder) -> Result<()> {
        let mut container = encoder.keyed_container::<PersonKey>()?;
        container.encode_str(&self.name, &PersonKey::Name)?;
        container.encode_u32(self.age, &PersonKey::Age)?;
        container.encode_encodable(&self.pets, &PersonKey::Pets)?;
        container.encode_encodable(&self.nickname, &PersonKey::Nickname)?;
        Ok(())
    }
}

fn person() -> Person {
    Person {
        name: "Ada".to_string(),
        age: 36,
        pets: vec![
            Pet {
                name: "Byron".to_string(),
            },
            Pet {
                name: "Lovelace".to_string(),
            },
        ],
        nickname: None,
    }
}

#[test]
fn struct_to_document() {
    let doc = to_document(&person()).unwrap();
    assert_eq!(
        doc,
        doc! {
            "name": "Ada",
            "age": 36_i64,
            "pets": [{ "name": "Byron" }, { "name": "Lovelace" }],
            "nickname": null,
        }
    );
    let keys: Vec<&str> = doc.keys().collect();
    assert_eq!(keys, vec!["name", "age", "pets", "nickname"]);
}

#[test]
fn to_vec_produces_parseable_bytes() {
    let bytes = to_vec(&person()).unwrap();
    let doc = crate::Document::from_bytes(bytes).unwrap();
    assert_eq!(doc.get_str("name").unwrap(), "Ada");
}

#[test]
fn top_level_scalars() {
    assert_eq!(to_bson(&5_i32).unwrap(), Bson::Int32(5));
    assert_eq!(to_bson(&true).unwrap(), Bson::Boolean(true));
    assert_eq!(
        to_bson(&vec![1_i32, 2]).unwrap(),
        Bson::Array(vec![Bson::Int32(1), Bson::Int32(2)])
    );

    let err = to_document(&5_i32).unwrap_err();
    assert_matches!(err.kind, ErrorKind::InvalidArgument {});
}

#[test]
fn explicit_nested_containers() {
    struct Matrix;

    impl Encode for Matrix {
        fn encode(&self, encoder: &mut Encoder) -> Result<()> {
            let mut container = encoder.keyed_container::<&str>()?;
            let mut rows = container.nested_unkeyed_container(&"rows")?;
            for row in 0..2 {
                let mut cells = rows.nested_unkeyed_container()?;
                cells.encode_i32(row)?;
                cells.encode_i32(row + 10)?;
            }
            let mut meta = container.nested_keyed_container::<&str>(&"meta")?;
            meta.encode_bool(true, &"square")?;
            Ok(())
        }
    }

    let doc = to_document(&Matrix).unwrap();
    assert_eq!(
        doc,
        doc! {
            "rows": [
                [Bson::Int32(0), Bson::Int32(10)],
                [Bson::Int32(1), Bson::Int32(11)],
            ],
            "meta": { "square": true },
        }
    );
}

#[test]
fn keyed_container_replaces_in_place() {
    struct Dupe;

    impl Encode for Dupe {
        fn encode(&self, encoder: &mut Encoder) -> Result<()> {
            let mut container = encoder.keyed_container::<&str>()?;
            container.encode_i32(1, &"a")?;
            container.encode_i32(2, &"b")?;
            container.encode_i32(10, &"a")?;
            Ok(())
        }
    }

    let doc = to_document(&Dupe).unwrap();
    let entries: Vec<(&str, Bson)> = doc.iter().collect();
    assert_eq!(
        entries,
        vec![("a", Bson::Int32(10)), ("b", Bson::Int32(2))]
    );
}

#[test]
fn super_encoder_splices_into_reserved_slot() {
    struct Base {
        id: i32,
    }

    impl Encode for Base {
        fn encode(&self, encoder: &mut Encoder) -> Result<()> {
            let mut container = encoder.keyed_container::<&str>()?;
            container.encode_i32(self.id, &"id")?;
            Ok(())
        }
    }

    struct Derived {
        base: Base,
        extra: String,
    }

    impl Encode for Derived {
        fn encode(&self, encoder: &mut Encoder) -> Result<()> {
            let mut container = encoder.keyed_container::<&str>()?;
            let mut sup = container.super_encoder(&"super")?;
            self.base.encode(sup.encoder())?;
            drop(sup);
            container.encode_str(&self.extra, &"extra")?;
            Ok(())
        }
    }

    let doc = to_document(&Derived {
        base: Base { id: 7 },
        extra: "more".to_string(),
    })
    .unwrap();

    // the slot was reserved before "extra" was encoded, so it keeps its place
    let keys: Vec<&str> = doc.keys().collect();
    assert_eq!(keys, vec!["super", "extra"]);
    assert_eq!(
        doc.get_document("super").unwrap(),
        doc! { "id": Bson::Int32(7) }
    );
}

#[test]
fn unused_super_encoder_splices_an_empty_document() {
    struct Quiet;

    impl Encode for Quiet {
        fn encode(&self, encoder: &mut Encoder) -> Result<()> {
            let mut container = encoder.keyed_container::<&str>()?;
            let sup = container.super_encoder(&"super")?;
            drop(sup);
            Ok(())
        }
    }

    let doc = to_document(&Quiet).unwrap();
    assert_eq!(doc, doc! { "super": {} });
}

#[test]
fn super_encoder_in_unkeyed_container() {
    struct Mixed;

    impl Encode for Mixed {
        fn encode(&self, encoder: &mut Encoder) -> Result<()> {
            let mut container = encoder.keyed_container::<&str>()?;
            let mut items = container.nested_unkeyed_container(&"items")?;
            items.encode_i32(1)?;
            {
                let mut sup = items.super_encoder()?;
                42_i32.encode(sup.encoder())?;
            }
            items.encode_i32(3)?;
            Ok(())
        }
    }

    let doc = to_document(&Mixed).unwrap();
    assert_eq!(
        doc.get_array("items").unwrap(),
        vec![Bson::Int32(1), Bson::Int32(42), Bson::Int32(3)]
    );
}

#[test]
fn encoding_twice_at_one_path_is_an_error() {
    struct Twice;

    impl Encode for Twice {
        fn encode(&self, encoder: &mut Encoder) -> Result<()> {
            let mut container = encoder.single_value_container();
            container.encode_i32(1)?;
            container.encode_i32(2)?;
            Ok(())
        }
    }

    let err = to_bson(&Twice).unwrap_err();
    assert_matches!(err.kind, ErrorKind::Internal {});
}

#[test]
fn failed_nested_encode_pops_its_containers() {
    struct FailsInside;

    impl Encode for FailsInside {
        fn encode(&self, encoder: &mut Encoder) -> Result<()> {
            let mut container = encoder.keyed_container::<&str>()?;
            container.encode_u64(u64::MAX, &"boom")?;
            Ok(())
        }
    }

    struct Outer;

    impl Encode for Outer {
        fn encode(&self, encoder: &mut Encoder) -> Result<()> {
            let mut container = encoder.keyed_container::<&str>()?;
            match container.encode_encodable(&FailsInside, &"inner") {
                Ok(()) => Ok(()),
                Err(_) => {
                    // the failed nested encode must leave the encoder usable
                    container.encode_i32(1, &"fallback")?;
                    Ok(())
                }
            }
        }
    }

    let doc = to_document(&Outer).unwrap();
    assert_eq!(doc, doc! { "fallback": Bson::Int32(1) });
}

#[test]
fn u64_out_of_range() {
    let err = to_bson(&u64::MAX).unwrap_err();
    assert_matches!(err.kind, ErrorKind::NumberOutOfRange { .. });
    assert_eq!(to_bson(&(5_u64)).unwrap(), Bson::Int64(5));
}

#[test]
fn date_strategies_produce_the_documented_forms() {
    let dt = DateTime::from_millis(1_700_000_000_000);

    // default: a BSON datetime element
    let doc = doc_with_date(dt, None);
    assert_eq!(doc.get("when"), Some(Bson::DateTime(dt)));
    assert_eq!(
        doc.as_bytes()[4], // first element's type byte
        0x09
    );

    let cases: Vec<(DateEncodingStrategy, Bson)> = vec![
        (
            DateEncodingStrategy::MillisecondsSince1970,
            Bson::Int64(1_700_000_000_000),
        ),
        (
            DateEncodingStrategy::SecondsSince1970,
            Bson::Double(1_700_000_000.0),
        ),
        (
            DateEncodingStrategy::DeferredToNative,
            Bson::Double(1_700_000_000.0),
        ),
        (
            DateEncodingStrategy::Iso8601,
            Bson::String("2023-11-14T22:13:20Z".to_string()),
        ),
    ];
    for (strategy, expected) in cases {
        let doc = doc_with_date(dt, Some(strategy.clone()));
        assert_eq!(doc.get("when"), Some(expected), "strategy {strategy:?}");
    }

    let formatted = DateEncodingStrategy::Formatted("[year]-[month]-[day]".to_string());
    let doc = doc_with_date(dt, Some(formatted));
    assert_eq!(doc.get_str("when").unwrap(), "2023-11-14");

    let custom = DateEncodingStrategy::Custom(Arc::new(|dt, encoder| {
        encoder
            .single_value_container()
            .encode_i64(dt.timestamp_millis() / 1000)
    }));
    let doc = doc_with_date(dt, Some(custom));
    assert_eq!(doc.get_i64("when").unwrap(), 1_700_000_000);
}

struct DateDoc {
    when: DateTime,
}

impl Encode for DateDoc {
    fn encode(&self, encoder: &mut Encoder) -> Result<()> {
        let mut container = encoder.keyed_container::<&str>()?;
        container.encode_datetime(self.when, &"when")?;
        Ok(())
    }
}

fn doc_with_date(when: DateTime, strategy: Option<DateEncodingStrategy>) -> crate::Document {
    let options = EncoderOptions {
        date_encoding_strategy: strategy,
        ..Default::default()
    };
    Encoder::with_options(options)
        .encode_to_document(&DateDoc { when })
        .unwrap()
}

#[test]
fn uuid_strategies() {
    let uuid = uuid::Uuid::new_v4();

    let binary = Encoder::new().encode_to_bson(&uuid).unwrap();
    assert_matches!(&binary, Bson::Binary(b) if b.bytes == uuid.as_bytes().to_vec());

    let options = EncoderOptions {
        uuid_encoding_strategy: Some(UuidEncodingStrategy::DeferredToNative),
        ..Default::default()
    };
    let string = Encoder::with_options(options).encode_to_bson(&uuid).unwrap();
    assert_eq!(string, Bson::String(uuid.hyphenated().to_string()));
}

#[test]
fn data_strategies() {
    let data = ByteBuf::new(vec![1, 2, 254]);

    let default = Encoder::new().encode_to_bson(&data).unwrap();
    assert_matches!(&default, Bson::Binary(b) if b.bytes == vec![1, 2, 254]);

    let base64 = Encoder::with_options(EncoderOptions {
        data_encoding_strategy: Some(DataEncodingStrategy::Base64),
        ..Default::default()
    })
    .encode_to_bson(&data)
    .unwrap();
    assert_eq!(base64, Bson::String(crate::base64::encode([1, 2, 254])));

    let native = Encoder::with_options(EncoderOptions {
        data_encoding_strategy: Some(DataEncodingStrategy::DeferredToNative),
        ..Default::default()
    })
    .encode_to_bson(&data)
    .unwrap();
    assert_eq!(
        native,
        Bson::Array(vec![Bson::Int32(1), Bson::Int32(2), Bson::Int32(254)])
    );

    let custom = Encoder::with_options(EncoderOptions {
        data_encoding_strategy: Some(DataEncodingStrategy::Custom(Arc::new(
            |bytes, encoder| {
                encoder
                    .single_value_container()
                    .encode_i64(bytes.len() as i64)
            },
        ))),
        ..Default::default()
    })
    .encode_to_bson(&data)
    .unwrap();
    assert_eq!(custom, Bson::Int64(3));
}

#[test]
fn options_merge_prefers_overrides() {
    let base = Encoder::with_options(EncoderOptions {
        date_encoding_strategy: Some(DateEncodingStrategy::MillisecondsSince1970),
        data_encoding_strategy: Some(DataEncodingStrategy::Binary),
        ..Default::default()
    });
    let merged = base.with_overrides(EncoderOptions {
        data_encoding_strategy: Some(DataEncodingStrategy::Base64),
        ..Default::default()
    });

    assert_matches!(
        merged.options().date_encoding_strategy,
        Some(DateEncodingStrategy::MillisecondsSince1970)
    );
    assert_matches!(
        merged.options().data_encoding_strategy,
        Some(DataEncodingStrategy::Base64)
    );
    assert_matches!(merged.options().uuid_encoding_strategy, None);
}

#[test]
fn maps_encode_as_documents() {
    let mut map = std::collections::BTreeMap::new();
    map.insert("a".to_string(), 1_i32);
    map.insert("b".to_string(), 2_i32);
    let doc = to_document(&map).unwrap();
    assert_eq!(doc, doc! { "a": Bson::Int32(1), "b": Bson::Int32(2) });
}
