//! Workflow enums mapping to SMALLSERIAL/SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data order (1-based)
//! in the corresponding lookup table, and each variant carries the wire
//! string used in API payloads and route paths.

use crate::error::CoreError;

/// Lookup ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal => $str:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database lookup ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Resolve a variant from its database lookup ID.
            pub fn from_id(id: StatusId) -> Result<Self, CoreError> {
                match id {
                    $( $val => Ok(Self::$variant), )+
                    _ => Err(CoreError::Validation(format!(
                        concat!("Unknown ", stringify!($name), " id {}"),
                        id
                    ))),
                }
            }

            /// Return the wire string used in API payloads and paths.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $str ),+
                }
            }

            /// Parse a variant from its wire string.
            pub fn parse(s: &str) -> Result<Self, CoreError> {
                match s {
                    $( $str => Ok(Self::$variant), )+
                    _ => Err(CoreError::Validation(format!(
                        concat!("Invalid ", stringify!($name), " '{}'. Must be one of: {}"),
                        s,
                        [$($str),+].join(", ")
                    ))),
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
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

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = <String as serde::Deserialize>::deserialize(deserializer)?;
                Self::parse(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

define_status_enum! {
    /// Essay-submission category an annotation or correction belongs to.
    /// The essay id space is only unique together with this tag.
    OriginTable {
        Regular = 1 => "regular",
        SimulatedExam = 2 => "simulated_exam",
        Exercise = 3 => "exercise",
    }
}

define_status_enum! {
    /// Lifecycle of a single corrector's grading record.
    CorrectionStatus {
        Draft = 1 => "draft",
        Incomplete = 2 => "incomplete",
        Finalized = 3 => "finalized",
        Returned = 4 => "returned",
    }
}

define_status_enum! {
    /// Rendering state of the essay image.
    RenderStatus {
        Pending = 1 => "pending",
        Rendering = 2 => "rendering",
        Ready = 3 => "ready",
        Error = 4 => "error",
    }
}

define_status_enum! {
    /// One of the two independent grading sessions attached to an essay.
    /// Always carried explicitly by the caller, never inferred.
    CorrectorSlot {
        One = 1 => "corrector1",
        Two = 2 => "corrector2",
    }
}
