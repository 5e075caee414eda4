//! Newtype domain identifiers.
//!
//! A [`ServerId`] names an endpoint in the registry and is chosen by the user;
//! a [`SessionId`] is generated internally for every live connection so that
//! log output from one connection can be correlated.

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
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
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

string_id! {
    /// Identifies an endpoint descriptor in the server registry.
    ///
    /// Unique across the registry and immutable once the entry is created;
    /// `update` matches on it and never changes it.
    ServerId
}

/// Identifies one live connection to an endpoint.
///
/// Generated fresh on every successful connect; a reconnect to the same
/// [`ServerId`] gets a new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generates a new random session identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_id_rejects_empty() {
        assert!(ServerId::new("").is_none());
        assert_eq!(ServerId::new("s1").unwrap().as_str(), "s1");
    }

    #[test]
    fn server_id_serialises_as_plain_string() {
        let id = ServerId::new("local").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""local""#);
    }

    #[test]
    fn sessions_are_distinct() {
        assert_ne!(SessionId::new_random(), SessionId::new_random());
    }
}
