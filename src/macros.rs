// The structure of these macros (a token-tree muncher per container kind)
// is adapted from serde_json's `json!`.

/// Constructs a [`Document`](crate::Document) from the given key/value
/// literals.
///
/// Keys may be any expression convertible into a `String`; values accept the
/// same grammar as [`bson!`], so nested documents, arrays, and `null` work
/// without further annotation. As with [`bson!`], integer values are stored
/// at the target word width (`Int64` on 64-bit targets); see that macro's
/// documentation for pinning an exact width.
///
/// ```
/// use bsonic::doc;
///
/// let title = "title";
/// let doc = doc! {
///     "_id": bsonic::oid::ObjectId::new(),
///     title: "Moby-Dick",
///     "chapters": [1, 2, 3],
///     "author": {
///         "surname": "Melville",
///         "middle_name": null,
///     },
/// };
/// assert_eq!(doc.get_str("title")?, "Moby-Dick");
/// # Ok::<(), bsonic::error::Error>(())
/// ```
///
/// # Panics
///
/// Panics if a key contains an interior null byte or the resulting document
/// would exceed the maximum BSON size; fall back to
/// [`Document::set`](crate::Document::set) to handle those cases fallibly.
#[macro_export]
macro_rules! doc {
    () => { $crate::Document::new() };
    ( $($tt:tt)+ ) => {{
        let mut object = $crate::Document::new();
        $crate::bson!(@object object () ($($tt)+) ($($tt)+));
        object
    }};
}

/// Constructs a [`Bson`](crate::Bson) value from a literal.
///
/// ```
/// use bsonic::{bson, Bson};
///
/// let values = bson!([1, "two", { "three": null }]);
/// assert!(matches!(values, Bson::Array(_)));
/// ```
///
/// Integer values are stored at the target word width: `bson!(7)` produces
/// an `Int64` on 64-bit targets and an `Int32` on 32-bit targets. (Rust
/// types an unsuffixed literal as `i32`, and the macros widen `i32` and
/// `isize` values to the word width.) `i64`-suffixed and `u32` values
/// always produce an `Int64`, the narrower integer types always produce an
/// `Int32`, and `Bson::Int32(..)` pins an exact width regardless of target.
#[macro_export]
macro_rules! bson {
    //////////////////////////////////////////////////////////////////////////
    // TT muncher for parsing the inside of an array [...].
    // Produces a Vec<Bson> of the elements.
    //////////////////////////////////////////////////////////////////////////

    // Done with trailing comma.
    (@array [$($elems:expr,)*]) => {
        ::std::vec![$($elems,)*]
    };

    // Done without trailing comma.
    (@array [$($elems:expr),*]) => {
        ::std::vec![$($elems),*]
    };

    // Next element is `null`.
    (@array [$($elems:expr,)*] null $($rest:tt)*) => {
        $crate::bson!(@array [$($elems,)* $crate::bson!(null)] $($rest)*)
    };

    // Next element is an array.
    (@array [$($elems:expr,)*] [$($array:tt)*] $($rest:tt)*) => {
        $crate::bson!(@array [$($elems,)* $crate::bson!([$($array)*])] $($rest)*)
    };

    // Next element is a document.
    (@array [$($elems:expr,)*] {$($map:tt)*} $($rest:tt)*) => {
        $crate::bson!(@array [$($elems,)* $crate::bson!({$($map)*})] $($rest)*)
    };

    // Next element is an expression followed by a comma.
    (@array [$($elems:expr,)*] $next:expr, $($rest:tt)*) => {
        $crate::bson!(@array [$($elems,)* $crate::bson!($next),] $($rest)*)
    };

    // Last element is an expression with no trailing comma.
    (@array [$($elems:expr,)*] $last:expr) => {
        $crate::bson!(@array [$($elems,)* $crate::bson!($last)])
    };

    // Comma after the most recent element.
    (@array [$($elems:expr),*] , $($rest:tt)*) => {
        $crate::bson!(@array [$($elems,)*] $($rest)*)
    };

    // Unexpected token after most recent element.
    (@array [$($elems:expr),*] $unexpected:tt $($rest:tt)*) => {
        $crate::bson_unexpected!($unexpected)
    };

    //////////////////////////////////////////////////////////////////////////
    // TT muncher for parsing the inside of a document {...}.
    // Each entry is inserted into the given document variable.
    //////////////////////////////////////////////////////////////////////////

    // Done.
    (@object $object:ident () () ()) => {};

    // Insert the current entry followed by a trailing comma.
    (@object $object:ident [$($key:tt)+] ($value:expr) , $($rest:tt)*) => {
        $object.extend([(($($key)+), $value)]);
        $crate::bson!(@object $object () ($($rest)*) ($($rest)*));
    };

    // Current entry followed by an unexpected token.
    (@object $object:ident [$($key:tt)+] ($value:expr) $unexpected:tt $($rest:tt)*) => {
        $crate::bson_unexpected!($unexpected)
    };

    // Insert the last entry without a trailing comma.
    (@object $object:ident [$($key:tt)+] ($value:expr)) => {
        $object.extend([(($($key)+), $value)]);
    };

    // Next value is `null`.
    (@object $object:ident ($($key:tt)+) (: null $($rest:tt)*) $copy:tt) => {
        $crate::bson!(@object $object [$($key)+] ($crate::bson!(null)) $($rest)*);
    };

    // Next value is an array.
    (@object $object:ident ($($key:tt)+) (: [$($array:tt)*] $($rest:tt)*) $copy:tt) => {
        $crate::bson!(@object $object [$($key)+] ($crate::bson!([$($array)*])) $($rest)*);
    };

    // Next value is a document.
    (@object $object:ident ($($key:tt)+) (: {$($map:tt)*} $($rest:tt)*) $copy:tt) => {
        $crate::bson!(@object $object [$($key)+] ($crate::bson!({$($map)*})) $($rest)*);
    };

    // Next value is an expression followed by a comma.
    (@object $object:ident ($($key:tt)+) (: $value:expr , $($rest:tt)*) $copy:tt) => {
        $crate::bson!(@object $object [$($key)+] ($crate::bson!($value)) , $($rest)*);
    };

    // Last value is an expression with no trailing comma.
    (@object $object:ident ($($key:tt)+) (: $value:expr) $copy:tt) => {
        $crate::bson!(@object $object [$($key)+] ($crate::bson!($value)));
    };

    // Missing value for the last entry.
    (@object $object:ident ($($key:tt)+) (:) $copy:tt) => {
        $crate::bson_unexpected!(:)
    };

    // Misplaced colon.
    (@object $object:ident () (: $($rest:tt)*) ($colon:tt $($copy:tt)*)) => {
        $crate::bson_unexpected!($colon)
    };

    // Comma inside a key.
    (@object $object:ident ($($key:tt)*) (, $($rest:tt)*) ($comma:tt $($copy:tt)*)) => {
        $crate::bson_unexpected!($comma)
    };

    // Key is fully parenthesized.
    (@object $object:ident () (($key:expr) : $($rest:tt)*) $copy:tt) => {
        $crate::bson!(@object $object ($key) (: $($rest)*) (: $($rest)*));
    };

    // Munch a token into the current key.
    (@object $object:ident ($($key:tt)*) ($tt:tt $($rest:tt)*) $copy:tt) => {
        $crate::bson!(@object $object ($($key)* $tt) ($($rest)*) ($($rest)*));
    };

    //////////////////////////////////////////////////////////////////////////
    // Main entry points.
    //////////////////////////////////////////////////////////////////////////

    (null) => {
        $crate::Bson::Null
    };

    ([]) => {
        $crate::Bson::Array(::std::vec::Vec::new())
    };

    ([ $($tt:tt)+ ]) => {
        $crate::Bson::Array($crate::bson!(@array [] $($tt)+))
    };

    ({}) => {
        $crate::Bson::Document($crate::Document::new())
    };

    ({ $($tt:tt)+ }) => {
        $crate::Bson::Document($crate::doc!{$($tt)+})
    };

    // Any other value. Unsuffixed integer literals (typed `i32` by Rust's
    // defaulting) are stored at the target word width.
    ($other:expr) => {
        $crate::IntoBsonLiteral::into_bson_literal($other)
    };
}

// Produces a compile error pointing at the unexpected token.
#[macro_export]
#[doc(hidden)]
macro_rules! bson_unexpected {
    () => {};
}
