//! Constructors for deprecated BSON types.
//!
//! `undefined`, `symbol`, and DBPointer elements are deprecated in the BSON
//! specification. This crate reads and round-trips them, but keeps them out
//! of the ordinary construction API: [`Symbol`](crate::Symbol),
//! [`Undefined`](crate::Undefined), and [`DbPointer`](crate::DbPointer)
//! have no public constructors of their own. The functions here exist for
//! callers that need to produce such documents deliberately, e.g. fixtures
//! exercising round-trip fidelity. New documents should not contain these
//! types.

use crate::{
    Bson,
    bson::{DbPointer, Symbol, Undefined},
    oid::ObjectId,
};

/// Creates the deprecated `undefined` value.
pub fn undefined() -> Bson {
    Bson::Undefined(Undefined::new())
}

/// Creates a deprecated symbol value with the given contents.
pub fn symbol(value: impl Into<String>) -> Bson {
    Bson::Symbol(Symbol::new(value))
}

/// Creates a deprecated DBPointer value referring into `namespace`.
pub fn db_pointer(namespace: impl Into<String>, id: ObjectId) -> Bson {
    Bson::DbPointer(DbPointer {
        namespace: namespace.into(),
        id,
    })
}
