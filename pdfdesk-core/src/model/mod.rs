//! Backend resource types
//!
//! Wire-level enumerations are generated by [`wire_enum!`], which gives each
//! variant a fixed string representation and serde support. Enumerations the
//! backend may extend carry a fallback variant that absorbs unknown values.

pub mod batch;
pub mod client;
pub mod field;
pub mod form_set;
pub mod mapping;
pub mod page;
pub mod template;
pub mod user;

pub use batch::{BatchStatus, FormGenerationBatch, FormStatus, GenerateFormsRequest, GeneratedForm};
pub use client::{Client, ClientFilters, ClientRecord};
pub use field::{
    Condition, FieldCategory, FieldType, Operator, RelationshipKind, RelationshipRule, RuleKind,
    StandardizedField, StandardizedFieldCategory, ValidationRule,
};
pub use form_set::FormSet;
pub use mapping::{Binding, FieldMapping};
pub use page::{ListQuery, Page};
pub use template::{FormAffiliation, FormType, Template, TemplateCategory};
pub use user::{AuthUser, BrokerCompany, QuotaUsage, Role, User, UserActivity};

use serde::{Deserialize, Deserializer};

/// A string that does not name any variant of a wire enumeration
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Define a string-backed wire enumeration.
///
/// ```rust,ignore
/// wire_enum! {
///     /// Template category
///     pub enum TemplateCategory { Broker => "broker", Chubb => "chubb" }
/// }
/// ```
///
/// Appending `fallback Variant` makes deserialization lenient: unknown
/// strings map to that variant instead of failing.
macro_rules! wire_enum {
    (@base $(#[$meta:meta])* $vis:vis enum $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::model::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err($crate::model::UnknownVariant {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }
    };

    ($(#[$meta:meta])* $vis:vis enum $name:ident { $($body:tt)+ } fallback $fallback:ident) => {
        $crate::model::wire_enum!(@base $(#[$meta])* $vis enum $name { $($body)+ });

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = <String as serde::Deserialize>::deserialize(deserializer)?;
                Ok(raw.parse().unwrap_or($name::$fallback))
            }
        }
    };

    ($(#[$meta:meta])* $vis:vis enum $name:ident { $($body:tt)+ }) => {
        $crate::model::wire_enum!(@base $(#[$meta])* $vis enum $name { $($body)+ });

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = <String as serde::Deserialize>::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use wire_enum;

/// Serde default for flags the backend treats as true when omitted
pub(crate) fn default_true() -> bool {
    true
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

/// Identifiers arrive as strings or integers depending on the resource
pub(crate) fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawId::deserialize(deserializer).map(String::from)
}

pub(crate) fn opt_id_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Option::<RawId>::deserialize(deserializer).map(|raw| raw.map(String::from))
}
