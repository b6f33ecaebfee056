//! The field registry
//!
//! Built once per process and never mutated. Query keys are resolved
//! against the union of all kinds, because the dataset kind is not known
//! until records are loaded; ingested records are checked against the
//! fields of their own kind.

use std::sync::OnceLock;

use super::types::{DatasetKind, FieldDef, FieldKind};

const COURSE_FIELDS: &[FieldDef] = &[
    FieldDef::textual("dept"),
    FieldDef::textual("id"),
    FieldDef::textual("instructor"),
    FieldDef::textual("title"),
    FieldDef::textual("uuid"),
    FieldDef::numeric("avg"),
    FieldDef::numeric("pass"),
    FieldDef::numeric("fail"),
    FieldDef::numeric("audit"),
    FieldDef::numeric("year"),
];

const ROOM_FIELDS: &[FieldDef] = &[
    FieldDef::textual("fullname"),
    FieldDef::textual("shortname"),
    FieldDef::textual("number"),
    FieldDef::textual("name"),
    FieldDef::textual("address"),
    FieldDef::textual("type"),
    FieldDef::textual("furniture"),
    FieldDef::textual("href"),
    FieldDef::numeric("lat"),
    FieldDef::numeric("lon"),
    FieldDef::numeric("seats"),
];

static GLOBAL: OnceLock<FieldCatalog> = OnceLock::new();

/// Read-only registry of known fields per dataset kind
#[derive(Debug, Clone)]
pub struct FieldCatalog {
    courses: &'static [FieldDef],
    rooms: &'static [FieldDef],
}

impl FieldCatalog {
    /// Creates the standard catalog
    pub fn new() -> Self {
        Self {
            courses: COURSE_FIELDS,
            rooms: ROOM_FIELDS,
        }
    }

    /// Returns the process-wide catalog
    pub fn global() -> &'static FieldCatalog {
        GLOBAL.get_or_init(FieldCatalog::new)
    }

    /// Returns all fields defined for a dataset kind
    pub fn fields(&self, kind: DatasetKind) -> &[FieldDef] {
        match kind {
            DatasetKind::Courses => self.courses,
            DatasetKind::Rooms => self.rooms,
        }
    }

    /// Looks up a field for a specific dataset kind
    pub fn field_kind_for(&self, kind: DatasetKind, field: &str) -> Option<FieldKind> {
        self.fields(kind)
            .iter()
            .find(|def| def.name == field)
            .map(|def| def.kind)
    }

    /// Looks up a field across every supported kind.
    ///
    /// No field name is shared between kinds with different value kinds,
    /// so the first match is the only match.
    pub fn field_kind(&self, field: &str) -> Option<FieldKind> {
        DatasetKind::ALL
            .iter()
            .find_map(|kind| self.field_kind_for(*kind, field))
    }
}

impl Default for FieldCatalog {
    fn default() -> Self {
        Self::new()
    }
}
