#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[doc(inline)]
pub use self::{
    binary::Binary,
    bson::{Array, Bson, DbPointer, JavaScriptCodeWithScope, Regex, Symbol, Timestamp, Undefined},
    coding::{ByteBuf, CodingKey, PathComponent},
    datetime::DateTime,
    decoder::{
        DataDecodingStrategy,
        DateDecodingStrategy,
        Decode,
        Decoder,
        DecoderOptions,
        KeyedDecodingContainer,
        SingleValueDecodingContainer,
        UnkeyedDecodingContainer,
        UuidDecodingStrategy,
        from_bson,
        from_document,
        from_slice,
    },
    decimal128::Decimal128,
    document::Document,
    encoder::{
        DataEncodingStrategy,
        DateEncodingStrategy,
        Encode,
        Encoder,
        EncoderOptions,
        KeyedEncodingContainer,
        SingleValueEncodingContainer,
        SuperEncoder,
        UnkeyedEncodingContainer,
        UuidEncodingStrategy,
        to_bson,
        to_document,
        to_vec,
    },
    raw::{DocumentWriter, MAX_DOCUMENT_SIZE, RawElement, RawIter},
};

#[doc(hidden)]
pub use self::bson::IntoBsonLiteral;

#[macro_use]
mod macros;
mod base64;
pub mod binary;
mod bson;
pub mod coding;
pub mod datetime;
pub mod decimal128;
pub mod decoder;
pub mod document;
pub mod encoder;
pub mod error;
pub mod legacy;
pub mod oid;
pub mod raw;
pub mod spec;

#[cfg(test)]
mod tests;
