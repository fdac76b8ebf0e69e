use serde::{Deserialize, Serialize};
use std::fmt;

/// Declares a string-backed identifier that cannot be mixed up with other id kinds
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Identifier of a room on the rooms service
    RoomId
);

string_id!(
    /// One connected participant. Distinct from the application-level user identity.
    SessionId
);

string_id!(
    /// A published media track, assigned by the server on `Produced`
    ProducerId
);

string_id!(
    /// A received remote track, assigned by the server on `Consumed`
    ConsumerId
);
