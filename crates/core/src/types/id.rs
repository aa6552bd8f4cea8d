//! Identifiers as issued by the storefront API.
//!
//! The backend hands out identifiers that are sometimes JSON integers and
//! sometimes JSON strings. [`EntityKey`] keeps whichever form it was given, so
//! documents written back to storage look the way they were read.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types.

use std::borrow::Cow;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A raw identifier: a JSON integer or a JSON string.
///
/// Derived equality is strict, so `1` and `"1"` are different keys. Use
/// [`EntityKey::loosely_eq`] where both forms must be treated as the same
/// entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityKey {
    /// Numeric identifier.
    Int(i64),
    /// Textual identifier (also used for name-derived keys).
    Text(String),
}

impl EntityKey {
    /// The string form of the key, used for loose comparison.
    #[must_use]
    pub fn normalized(&self) -> Cow<'_, str> {
        match self {
            Self::Int(n) => Cow::Owned(n.to_string()),
            Self::Text(s) => Cow::Borrowed(s.as_str()),
        }
    }

    /// Compare two keys by their string form.
    #[must_use]
    pub fn loosely_eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for EntityKey {
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

impl From<i32> for EntityKey {
    fn from(id: i32) -> Self {
        Self::Int(i64::from(id))
    }
}

impl From<&str> for EntityKey {
    fn from(id: &str) -> Self {
        Self::Text(id.to_owned())
    }
}

impl From<String> for EntityKey {
    fn from(id: String) -> Self {
        Self::Text(id)
    }
}

/// Parses command-line or URL input: digits become [`EntityKey::Int`],
/// anything else [`EntityKey::Text`].
impl FromStr for EntityKey {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.parse::<i64>().map_or_else(|_| Self::from(s), Self::Int))
    }
}

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around [`EntityKey`] with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Accessors: `new()`, `key()`, `normalized()`, `same_as()`
/// - `From<i64>`, `From<i32>`, `From<&str>`, `From<String>` and `FromStr` implementations
///
/// # Example
///
/// ```rust
/// # use kos_core::define_id;
/// define_id!(ShipmentId);
///
/// let numeric = ShipmentId::from(7);
/// let textual = ShipmentId::from("7");
///
/// assert_ne!(numeric, textual);
/// assert!(numeric.same_as(&textual));
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name($crate::EntityKey);

        impl $name {
            /// Wrap a raw key.
            #[must_use]
            pub const fn new(key: $crate::EntityKey) -> Self {
                Self(key)
            }

            /// Get the underlying key.
            #[must_use]
            pub const fn key(&self) -> &$crate::EntityKey {
                &self.0
            }

            /// The string form of the ID.
            #[must_use]
            pub fn normalized(&self) -> ::std::borrow::Cow<'_, str> {
                self.0.normalized()
            }

            /// Whether two IDs name the same entity, ignoring numeric vs.
            /// string representation.
            #[must_use]
            pub fn same_as(&self, other: &Self) -> bool {
                self.0.loosely_eq(&other.0)
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self($crate::EntityKey::from(id))
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self($crate::EntityKey::from(id))
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self($crate::EntityKey::from(id))
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self($crate::EntityKey::from(id))
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::convert::Infallible;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.parse::<$crate::EntityKey>().map(Self)
            }
        }
    };
}

define_id!(ProductId);
define_id!(CategoryId);
define_id!(OrderId);
define_id!(UserId);
define_id!(ReviewId);

impl ProductId {
    /// The key a product is filed under: its ID, or its name when the catalog
    /// entry has none.
    #[must_use]
    pub fn or_name(id: Option<Self>, name: &str) -> Self {
        id.unwrap_or_else(|| Self::from(name))
    }
}
