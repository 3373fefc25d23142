//! Newtype domain identifiers.
//!
//! Every domain concept that has an identity is represented as a distinct newtype
//! wrapping a primitive. This prevents accidentally interchanging, for example,
//! an [`ArticleNumber`] with a [`VariationNumber`] even though both are `u32`
//! under the hood.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.trim().is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Macro for 1-based ordinal newtypes.
// Generates: struct (Copy, Ord), new(), get(), first(), Display.
// ---------------------------------------------------------------------------
macro_rules! ordinal_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(u32);

        impl $name {
            /// Creates an ordinal from a raw integer.
            ///
            /// Zero is representable so that malformed input can reach the
            /// validator and be reported; it never names a real slot.
            pub fn new(value: u32) -> Self {
                Self(value)
            }

            /// The first slot (`1`).
            pub fn first() -> Self {
                Self(1)
            }

            /// Returns the underlying integer value.
            pub fn get(self) -> u32 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: ordinal
// ---------------------------------------------------------------------------

ordinal_id! {
    /// Position of an article within the newsletter document (1-based).
    ArticleNumber
}

ordinal_id! {
    /// Which of the composed posts for one article is meant (1-based).
    VariationNumber
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single orchestrator or scheduler invocation.
///
/// Generated fresh for every command; recorded on spans and in the run record
/// so all activity from a single run can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers: String-backed (external systems)
// ---------------------------------------------------------------------------

string_id! {
    /// Identifies the newsletter document in the document store.
    DocumentId
}

string_id! {
    /// Identifier the social platform assigned to a published post.
    PostId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_ids_reject_blank_values() {
        assert!(DocumentId::new("").is_none());
        assert!(PostId::new("   ").is_none());
        assert_eq!(DocumentId::new("1kZMd").unwrap().as_str(), "1kZMd");
    }

    #[test]
    fn test_article_number_serialises_as_map_key() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(ArticleNumber::new(3), "three");

        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"3":"three"}"#);

        let back: std::collections::BTreeMap<ArticleNumber, String> =
            serde_json::from_str(&json).unwrap();
        assert_eq!(back[&ArticleNumber::new(3)], "three");
    }
}
