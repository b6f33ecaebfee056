//! Catalog type definitions
//!
//! Two dataset kinds are supported:
//! - courses: one record per course section
//! - rooms: one record per bookable room

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Value kind of a catalog field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Compared with LT/GT/EQ, aggregatable with MAX/MIN/AVG/SUM
    Numeric,
    /// Compared with IS wildcard patterns
    Textual,
}

impl FieldKind {
    /// Returns the kind name for error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Numeric => "numeric",
            FieldKind::Textual => "textual",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldKind::Numeric)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of dataset a record collection was ingested as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Courses,
    Rooms,
}

impl DatasetKind {
    /// All supported kinds, in catalog order
    pub const ALL: [DatasetKind; 2] = [DatasetKind::Courses, DatasetKind::Rooms];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::Courses => "courses",
            DatasetKind::Rooms => "rooms",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DatasetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "courses" => Ok(DatasetKind::Courses),
            "rooms" => Ok(DatasetKind::Rooms),
            other => Err(format!(
                "dataset kind can only be 'rooms' or 'courses', is '{}'",
                other
            )),
        }
    }
}

/// A single field definition in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Bare field name, without dataset prefix
    pub name: &'static str,
    /// Value kind
    pub kind: FieldKind,
}

impl FieldDef {
    pub const fn numeric(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Numeric,
        }
    }

    pub const fn textual(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Textual,
        }
    }
}
