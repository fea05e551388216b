use std::sync::Arc;

use assert_matches::assert_matches;

use crate::{
    Bson,
    DataDecodingStrategy,
    DataEncodingStrategy,
    DateDecodingStrategy,
    DateEncodingStrategy,
    DateTime,
    Decode,
    Decoder,
    DecoderOptions,
    Encode,
    Encoder,
    EncoderOptions,
    UuidDecodingStrategy,
    UuidEncodingStrategy,
    coding::ByteBuf,
    doc,
    error::{ErrorKind, Result},
    from_bson,
    from_document,
    from_slice,
};

#[derive(Debug, Clone, PartialEq)]
struct Pet {
    name: String,
}

impl Decode for Pet {
    fn decode(decoder: &mut Decoder) -> Result<Self> {
        let mut container = decoder.keyed_container::<&str>()?;
        Ok(Pet {
            name: container.decode_string(&"name")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Person {
    name: String,
    age: u32,
    pets: Vec<Pet>,
    nickname: Option<String>,
}

impl Decode for Person {
    fn decode(decoder: &mut Decoder) -> Result<Self> {
        let mut container = decoder.keyed_container::<&str>()?;
        Ok(Person {
            name: container.decode_string(&"name")?,
            age: container.decode_u32(&"age")?,
            pets: container.decode_decodable(&"pets")?,
            nickname: container.decode_if_present(&"nickname")?,
        })
    }
}

#[test]
fn struct_from_document() {
    let doc = doc! {
        "name": "Ada",
        "age": 36,
        "pets": [{ "name": "Byron" }],
        "nickname": null,
    };
    let person: Person = from_document(doc).unwrap();
    assert_eq!(
        person,
        Person {
            name: "Ada".to_string(),
            age: 36,
            pets: vec![Pet {
                name: "Byron".to_string()
            }],
            nickname: None,
        }
    );
}

#[test]
fn struct_from_slice() {
    let bytes = doc! { "name": "Ada", "age": 1, "pets": [] }
        .as_bytes()
        .to_vec();
    let person: Person = from_slice(&bytes).unwrap();
    assert_eq!(person.pets, vec![]);
    assert_eq!(person.nickname, None);
}

#[test]
fn missing_key() {
    let err = from_document::<Person>(doc! { "name": "Ada" }).unwrap_err();
    assert_matches!(err.kind, ErrorKind::KeyNotFound { ref key } if key == "age");
}

#[test]
fn decode_nil_distinguishes_null_from_missing() {
    #[derive(Debug)]
    struct Probe {
        has_null: bool,
    }

    impl Decode for Probe {
        fn decode(decoder: &mut Decoder) -> Result<Self> {
            let mut container = decoder.keyed_container::<&str>()?;
            Ok(Probe {
                has_null: container.decode_nil(&"a")?,
            })
        }
    }

    assert!(from_document::<Probe>(doc! { "a": null }).unwrap().has_null);
    assert!(!from_document::<Probe>(doc! { "a": 1 }).unwrap().has_null);
    let err = from_document::<Probe>(doc! {}).unwrap_err();
    assert_matches!(err.kind, ErrorKind::KeyNotFound { .. });
}

#[test]
fn exact_numeric_coercions() {
    // a small int64 decodes into narrower requests
    assert_eq!(from_bson::<u32>(Bson::Int64(5)).unwrap(), 5);
    assert_eq!(from_bson::<i32>(Bson::Double(5.0)).unwrap(), 5);
    assert_eq!(from_bson::<u8>(Bson::Int32(255)).unwrap(), 255);
    assert_eq!(from_bson::<f64>(Bson::Int32(3)).unwrap(), 3.0);
    assert_eq!(from_bson::<f32>(Bson::Double(0.5)).unwrap(), 0.5);

    // a stored int64 past the requested width is out of range, not a mismatch
    let err = from_bson::<i32>(Bson::Int64(1 << 40)).unwrap_err();
    assert_matches!(err.kind, ErrorKind::NumberOutOfRange { .. });
    assert_eq!(from_bson::<i64>(Bson::Int64(1 << 40)).unwrap(), 1 << 40);

    let err = from_bson::<u32>(Bson::Int64(-1)).unwrap_err();
    assert_matches!(err.kind, ErrorKind::NumberOutOfRange { .. });

    let err = from_bson::<i32>(Bson::Double(5.5)).unwrap_err();
    assert_matches!(err.kind, ErrorKind::NumberOutOfRange { .. });

    let err = from_bson::<f32>(Bson::Double(1e40)).unwrap_err();
    assert_matches!(err.kind, ErrorKind::NumberOutOfRange { .. });

    // non-numeric values are a type mismatch instead
    let err = from_bson::<i32>(Bson::String("5".to_string())).unwrap_err();
    assert_matches!(err.kind, ErrorKind::TypeMismatch { .. });
}

#[test]
fn type_mismatch_reports_the_coding_path() {
    let doc = doc! {
        "name": "Ada",
        "age": 36,
        "pets": [{ "name": 7 }],
    };
    let err = from_document::<Person>(doc).unwrap_err();
    assert_matches!(err.kind, ErrorKind::TypeMismatch { .. });
    assert_eq!(err.path.as_deref(), Some("pets[0].name"));
}

#[test]
fn unkeyed_container_tracks_indices() {
    struct Triple(i32, String, bool);

    impl Decode for Triple {
        fn decode(decoder: &mut Decoder) -> Result<Self> {
            let mut container = decoder.unkeyed_container()?;
            assert_eq!(container.count(), 3);
            assert_eq!(container.current_index(), 0);
            let a = container.decode_i32()?;
            assert_eq!(container.current_index(), 1);
            let b = container.decode_string()?;
            let c = container.decode_bool()?;
            assert!(container.is_at_end());
            Ok(Triple(a, b, c))
        }
    }

    let triple: Triple = from_bson(Bson::Array(vec![
        Bson::Int32(9),
        Bson::String("mid".to_string()),
        Bson::Boolean(true),
    ]))
    .unwrap();
    assert_eq!(triple.0, 9);
    assert_eq!(triple.1, "mid");
    assert!(triple.2);
}

#[test]
fn exhausted_unkeyed_container() {
    #[derive(Debug)]
    struct TooGreedy;

    impl Decode for TooGreedy {
        fn decode(decoder: &mut Decoder) -> Result<Self> {
            let mut container = decoder.unkeyed_container()?;
            container.decode_i32()?;
            container.decode_i32()?;
            Ok(TooGreedy)
        }
    }

    let err = from_bson::<TooGreedy>(Bson::Array(vec![Bson::Int32(1)])).unwrap_err();
    assert_matches!(err.kind, ErrorKind::ValueNotFound { .. });
}

#[test]
fn failed_decode_does_not_advance_the_index() {
    struct Recovering(i32);

    impl Decode for Recovering {
        fn decode(decoder: &mut Decoder) -> Result<Self> {
            let mut container = decoder.unkeyed_container()?;
            assert!(container.decode_string().is_err());
            assert_eq!(container.current_index(), 0);
            Ok(Recovering(container.decode_i32()?))
        }
    }

    let value: Recovering = from_bson(Bson::Array(vec![Bson::Int32(11)])).unwrap();
    assert_eq!(value.0, 11);
}

#[test]
fn decode_nil_in_unkeyed_container_does_not_advance_past_values() {
    struct NilProbe {
        nils: usize,
        value: i32,
    }

    impl Decode for NilProbe {
        fn decode(decoder: &mut Decoder) -> Result<Self> {
            let mut container = decoder.unkeyed_container()?;
            let mut nils = 0;
            while container.decode_nil()? {
                nils += 1;
            }
            Ok(NilProbe {
                nils,
                value: container.decode_i32()?,
            })
        }
    }

    let probe: NilProbe =
        from_bson(Bson::Array(vec![Bson::Null, Bson::Null, Bson::Int32(3)])).unwrap();
    assert_eq!(probe.nils, 2);
    assert_eq!(probe.value, 3);
}

#[test]
fn super_decoder() {
    struct Base {
        id: i32,
    }

    impl Decode for Base {
        fn decode(decoder: &mut Decoder) -> Result<Self> {
            let mut container = decoder.keyed_container::<&str>()?;
            Ok(Base {
                id: container.decode_i32(&"id")?,
            })
        }
    }

    struct Derived {
        base: Base,
        extra: String,
    }

    impl Decode for Derived {
        fn decode(decoder: &mut Decoder) -> Result<Self> {
            let mut container = decoder.keyed_container::<&str>()?;
            let mut sup = container.super_decoder(&"super")?;
            Ok(Derived {
                base: Base::decode(&mut sup)?,
                extra: container.decode_string(&"extra")?,
            })
        }
    }

    let derived: Derived =
        from_document(doc! { "super": { "id": 5 }, "extra": "x" }).unwrap();
    assert_eq!(derived.base.id, 5);
    assert_eq!(derived.extra, "x");
}

#[test]
fn date_strategy_bijections() {
    let dt = DateTime::from_millis(1_700_000_000_123);

    let pairs: Vec<(DateEncodingStrategy, DateDecodingStrategy)> = vec![
        (
            DateEncodingStrategy::BsonDateTime,
            DateDecodingStrategy::BsonDateTime,
        ),
        (
            DateEncodingStrategy::MillisecondsSince1970,
            DateDecodingStrategy::MillisecondsSince1970,
        ),
        (
            DateEncodingStrategy::SecondsSince1970,
            DateDecodingStrategy::SecondsSince1970,
        ),
        (
            DateEncodingStrategy::DeferredToNative,
            DateDecodingStrategy::DeferredToNative,
        ),
        (DateEncodingStrategy::Iso8601, DateDecodingStrategy::Iso8601),
        (
            DateEncodingStrategy::Formatted(
                "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]".to_string(),
            ),
            DateDecodingStrategy::Formatted(
                "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]".to_string(),
            ),
        ),
        (
            DateEncodingStrategy::Custom(Arc::new(|dt, encoder| {
                encoder
                    .single_value_container()
                    .encode_i64(dt.timestamp_millis())
            })),
            DateDecodingStrategy::Custom(Arc::new(|decoder| {
                decoder
                    .single_value_container()
                    .decode_i64()
                    .map(DateTime::from_millis)
            })),
        ),
    ];

    for (encoding, decoding) in pairs {
        let debug = format!("{encoding:?}");
        let encoded = Encoder::with_options(EncoderOptions {
            date_encoding_strategy: Some(encoding),
            ..Default::default()
        })
        .encode_to_bson(&dt)
        .unwrap();
        let decoded: DateTime = Decoder::with_options(DecoderOptions {
            date_decoding_strategy: Some(decoding),
            ..Default::default()
        })
        .decode_from_bson(encoded)
        .unwrap();
        assert_eq!(decoded, dt, "strategy {debug}");
    }
}

#[test]
fn default_date_decoding_requires_a_datetime_element() {
    // a double of seconds is not silently reinterpreted
    let err = from_bson::<DateTime>(Bson::Double(1_700_000_000.0)).unwrap_err();
    assert_matches!(err.kind, ErrorKind::TypeMismatch { .. });

    let dt = DateTime::from_millis(42);
    assert_eq!(from_bson::<DateTime>(Bson::DateTime(dt)).unwrap(), dt);
}

#[test]
fn uuid_strategy_bijections() {
    let uuid = uuid::Uuid::new_v4();

    let pairs = [
        (UuidEncodingStrategy::Binary, UuidDecodingStrategy::Binary),
        (
            UuidEncodingStrategy::DeferredToNative,
            UuidDecodingStrategy::DeferredToNative,
        ),
    ];
    for (encoding, decoding) in pairs {
        let encoded = Encoder::with_options(EncoderOptions {
            uuid_encoding_strategy: Some(encoding.clone()),
            ..Default::default()
        })
        .encode_to_bson(&uuid)
        .unwrap();
        let decoded: uuid::Uuid = Decoder::with_options(DecoderOptions {
            uuid_decoding_strategy: Some(decoding),
            ..Default::default()
        })
        .decode_from_bson(encoded)
        .unwrap();
        assert_eq!(decoded, uuid, "strategy {encoding:?}");
    }
}

#[test]
fn data_strategy_bijections() {
    let data = ByteBuf::new(vec![0, 1, 2, 253, 254, 255]);

    let pairs: Vec<(DataEncodingStrategy, DataDecodingStrategy)> = vec![
        (DataEncodingStrategy::Binary, DataDecodingStrategy::Binary),
        (DataEncodingStrategy::Base64, DataDecodingStrategy::Base64),
        (
            DataEncodingStrategy::DeferredToNative,
            DataDecodingStrategy::DeferredToNative,
        ),
        (
            DataEncodingStrategy::Custom(Arc::new(|bytes, encoder| {
                encoder
                    .single_value_container()
                    .encode_str(&crate::base64::encode(bytes))
            })),
            DataDecodingStrategy::Custom(Arc::new(|decoder| {
                let s = decoder.single_value_container().decode_string()?;
                crate::base64::decode(&s).map_err(|e| {
                    crate::error::Error::invalid_argument(format!("bad base64: {e}"))
                })
            })),
        ),
    ];

    for (encoding, decoding) in pairs {
        let debug = format!("{encoding:?}");
        let encoded = Encoder::with_options(EncoderOptions {
            data_encoding_strategy: Some(encoding),
            ..Default::default()
        })
        .encode_to_bson(&data)
        .unwrap();
        let decoded: ByteBuf = Decoder::with_options(DecoderOptions {
            data_decoding_strategy: Some(decoding),
            ..Default::default()
        })
        .decode_from_bson(encoded)
        .unwrap();
        assert_eq!(decoded, data, "strategy {debug}");
    }
}

#[test]
fn decoder_options_merge_prefers_overrides() {
    let base = Decoder::with_options(DecoderOptions {
        date_decoding_strategy: Some(DateDecodingStrategy::Iso8601),
        ..Default::default()
    });
    let merged = base.with_overrides(DecoderOptions {
        date_decoding_strategy: Some(DateDecodingStrategy::MillisecondsSince1970),
        ..Default::default()
    });
    assert_matches!(
        merged.options().date_decoding_strategy,
        Some(DateDecodingStrategy::MillisecondsSince1970)
    );
}

#[test]
fn maps_round_trip() {
    let mut map = std::collections::HashMap::new();
    map.insert("a".to_string(), 1_i64);
    map.insert("b".to_string(), 2_i64);

    let doc = crate::to_document(&map).unwrap();
    let back: std::collections::HashMap<String, i64> = from_document(doc).unwrap();
    assert_eq!(back, map);
}

#[test]
fn bson_and_document_pass_through() {
    let doc = doc! { "a": 1 };
    let value: Bson = from_bson(Bson::Document(doc.clone())).unwrap();
    assert_eq!(value, Bson::Document(doc.clone()));

    let decoded: crate::Document = from_document(doc.clone()).unwrap();
    assert_eq!(decoded, doc);
}

#[test]
fn crate_types_decode_from_their_variants() {
    let oid = crate::oid::ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap();
    assert_eq!(
        from_bson::<crate::oid::ObjectId>(Bson::ObjectId(oid)).unwrap(),
        oid
    );

    let err = from_bson::<crate::oid::ObjectId>(Bson::Int32(1)).unwrap_err();
    assert_matches!(err.kind, ErrorKind::TypeMismatch { .. });

    let ts = crate::Timestamp {
        time: 1,
        increment: 2,
    };
    assert_eq!(from_bson::<crate::Timestamp>(Bson::Timestamp(ts)).unwrap(), ts);

    let decimal: crate::Decimal128 = "1.5".parse().unwrap();
    assert_eq!(
        from_bson::<crate::Decimal128>(Bson::Decimal128(decimal)).unwrap(),
        decimal
    );
}

#[test]
fn encode_then_decode_round_trip() {
    #[derive(Debug, Clone, PartialEq)]
    struct Everything {
        flag: bool,
        count: u16,
        ratio: f64,
        label: String,
        tags: Vec<String>,
        nested: Option<Box<EverythingInner>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct EverythingInner {
        id: i64,
    }

    impl Encode for Everything {
        fn encode(&self, encoder: &mut Encoder) -> Result<()> {
            let mut container = encoder.keyed_container::<&str>()?;
            container.encode_bool(self.flag, &"flag")?;
            container.encode_u16(self.count, &"count")?;
            container.encode_f64(self.ratio, &"ratio")?;
            container.encode_str(&self.label, &"label")?;
            container.encode_encodable(&self.tags, &"tags")?;
            match &self.nested {
                Some(inner) => {
                    let mut nested = container.nested_keyed_container::<&str>(&"nested")?;
                    nested.encode_i64(inner.id, &"id")?;
                }
                None => container.encode_nil(&"nested")?,
            }
            Ok(())
        }
    }

    impl Decode for Everything {
        fn decode(decoder: &mut Decoder) -> Result<Self> {
            let mut container = decoder.keyed_container::<&str>()?;
            let nested = if container.decode_nil(&"nested")? {
                None
            } else {
                let mut nested = container.nested_keyed_container::<&str>(&"nested")?;
                Some(Box::new(EverythingInner {
                    id: nested.decode_i64(&"id")?,
                }))
            };
            Ok(Everything {
                flag: container.decode_bool(&"flag")?,
                count: container.decode_u16(&"count")?,
                ratio: container.decode_f64(&"ratio")?,
                label: container.decode_string(&"label")?,
                tags: container.decode_decodable(&"tags")?,
                nested,
            })
        }
    }

    let value = Everything {
        flag: true,
        count: 65535,
        ratio: -0.25,
        label: "λ".to_string(),
        tags: vec!["a".to_string(), "b".to_string()],
        nested: Some(Box::new(EverythingInner { id: i64::MIN })),
    };

    let doc = crate::to_document(&value).unwrap();
    let back: Everything = from_document(doc).unwrap();
    assert_eq!(back, value);
}
