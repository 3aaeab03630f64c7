//! Organization-chart entries (one staff member or position per entry).
//!
//! Entries arrive from `GET /api/organization` as a flat list; the parent
//! graph is expressed only through `parent_id`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::DbId;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Fixed set of roles an entry can carry. Drives card accent colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    Lurah,
    Sekretaris,
    Kasi,
    Bendahara,
    Pengurus,
    #[default]
    Staf,
}

impl Role {
    /// All roles in the order the edit form lists them.
    pub const ALL: [Role; 6] = [
        Role::Lurah,
        Role::Sekretaris,
        Role::Kasi,
        Role::Bendahara,
        Role::Pengurus,
        Role::Staf,
    ];

    /// Wire value, as stored by the backend.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Lurah => "lurah",
            Role::Sekretaris => "sekretaris",
            Role::Kasi => "kasi",
            Role::Bendahara => "bendahara",
            Role::Pengurus => "pengurus",
            Role::Staf => "staf",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Role::Lurah => "Lurah",
            Role::Sekretaris => "Sekretaris",
            Role::Kasi => "Kepala Seksi",
            Role::Bendahara => "Bendahara",
            Role::Pengurus => "Pengurus",
            Role::Staf => "Staf",
        }
    }

    /// Card border colour (CSS hex).
    pub fn accent_color(self) -> &'static str {
        match self {
            Role::Lurah => "#3B82F6",
            Role::Sekretaris => "#10B981",
            Role::Kasi => "#F59E0B",
            Role::Bendahara | Role::Pengurus => "#8B5CF6",
            Role::Staf => "#6B7280",
        }
    }

    /// Parse a wire value. Unknown values fall back to [`Role::Staf`].
    pub fn parse(value: &str) -> Role {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(value.trim()))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Role::parse).unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// DirectoryEntry
// ---------------------------------------------------------------------------

/// Legacy placeholder some rows carry instead of an empty photo.
const PHOTO_PLACEHOLDER: &str = "foto";

/// One row of the organization chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub id: DbId,
    /// `None` marks a root.
    #[serde(default)]
    pub parent_id: Option<DbId>,
    /// Row hint supplied by whoever wrote the entry; not re-derived on read.
    #[serde(default, deserialize_with = "null_as_default")]
    pub level: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub position: String,
    #[serde(default)]
    pub role: Role,
    /// Empty, or an embedded image (data URL).
    #[serde(default, deserialize_with = "null_as_default")]
    pub photo: String,
}

impl DirectoryEntry {
    /// Minimal entry, mostly useful in tests and fixtures.
    pub fn new(id: DbId, parent_id: Option<DbId>, level: u32) -> Self {
        Self {
            id,
            parent_id,
            level,
            name: String::new(),
            position: String::new(),
            role: Role::default(),
            photo: String::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Whether the entry carries a real photo payload.
    pub fn has_photo(&self) -> bool {
        !self.photo.is_empty() && self.photo != PHOTO_PLACEHOLDER
    }

    /// Name shown on the card; `-` when blank.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            "-"
        } else {
            &self.name
        }
    }

    /// `"{position} - {name}"` as used in the parent picker.
    pub fn picker_label(&self) -> String {
        let name = if self.name.trim().is_empty() {
            "Kosong"
        } else {
            self.name.as_str()
        };
        format!("{} - {}", self.position, name)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// EntryDraft
// ---------------------------------------------------------------------------

/// Body for `POST /api/organization` and `PUT /api/organization/{id}`.
///
/// The backend stores `level` as given, so the draft carries a level
/// resolved from the chosen parent (see [`EntryDraft::resolve_level`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryDraft {
    pub name: String,
    pub position: String,
    pub photo: String,
    pub parent_id: Option<DbId>,
    pub role: Role,
    pub level: u32,
}

impl Default for EntryDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            position: String::new(),
            photo: String::new(),
            parent_id: None,
            role: Role::Staf,
            level: 0,
        }
    }
}

impl EntryDraft {
    /// Empty draft placed under `parent_id` ("add subordinate").
    pub fn child_of(parent_id: Option<DbId>) -> Self {
        Self {
            parent_id,
            ..Self::default()
        }
    }

    /// Draft pre-filled from an existing entry ("edit").
    pub fn from_entry(entry: &DirectoryEntry) -> Self {
        Self {
            name: entry.name.clone(),
            position: entry.position.clone(),
            photo: entry.photo.clone(),
            parent_id: entry.parent_id,
            role: entry.role,
            level: entry.level,
        }
    }

    /// Set `level` from the parent currently present in `entries`.
    pub fn resolve_level(mut self, entries: &[DirectoryEntry]) -> Self {
        self.level = crate::hierarchy::resolve_level(self.parent_id, entries);
        self
    }
}
