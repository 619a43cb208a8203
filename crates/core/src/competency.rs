//! The five fixed essay-evaluation competencies.
//!
//! Each competency has a fixed display color used for its overlay
//! regions. The palette is not configurable.

use crate::error::CoreError;

/// One of the five evaluation dimensions, scored 0-200 each.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Competency {
    C1 = 1,
    C2 = 2,
    C3 = 3,
    C4 = 4,
    C5 = 5,
}

/// All competencies in display order.
pub const ALL_COMPETENCIES: [Competency; 5] = [
    Competency::C1,
    Competency::C2,
    Competency::C3,
    Competency::C4,
    Competency::C5,
];

impl Competency {
    /// Return the competency number (1-5) as stored in the database.
    pub fn id(self) -> i16 {
        self as i16
    }

    /// Resolve a competency from its stored number.
    pub fn from_id(id: i16) -> Result<Self, CoreError> {
        match id {
            1 => Ok(Self::C1),
            2 => Ok(Self::C2),
            3 => Ok(Self::C3),
            4 => Ok(Self::C4),
            5 => Ok(Self::C5),
            _ => Err(CoreError::Validation(format!(
                "Invalid competency {id}. Must be between 1 and 5"
            ))),
        }
    }

    /// Fixed display color for this competency's overlay regions.
    pub fn color(self) -> &'static str {
        match self {
            Self::C1 => "#E53935",
            Self::C2 => "#43A047",
            Self::C3 => "#1E88E5",
            Self::C4 => "#FB8C00",
            Self::C5 => "#8E24AA",
        }
    }

    /// Human-facing label.
    pub fn label(self) -> &'static str {
        match self {
            Self::C1 => "Competency 1",
            Self::C2 => "Competency 2",
            Self::C3 => "Competency 3",
            Self::C4 => "Competency 4",
            Self::C5 => "Competency 5",
        }
    }
}

impl serde::Serialize for Competency {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i16(self.id())
    }
}

impl<'de> serde::Deserialize<'de> for Competency {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let id = <i16 as serde::Deserialize>::deserialize(deserializer)?;
        Self::from_id(id).map_err(serde::de::Error::custom)
    }
}
