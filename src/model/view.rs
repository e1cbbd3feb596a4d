use std::fmt;

use serde::{Deserialize, Serialize};

/// What the visible task list is ordered by
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKind {
    /// Store order (most recently added first)
    None,
    /// Due date
    Date,
    /// Category display order (stored as `FILTER`)
    Category,
    /// Progress tag display order
    Progress,
    /// A name this version does not know; kept verbatim, sorts like store order
    Unrecognized(String),
}

impl SortKind {
    /// Parse a sort name, ignoring case. Unknown names are preserved.
    pub fn parse(name: &str) -> SortKind {
        match name.trim().to_ascii_uppercase().as_str() {
            "NONE" => SortKind::None,
            "DATE" => SortKind::Date,
            "FILTER" | "CATEGORY" => SortKind::Category,
            "PROGRESS" => SortKind::Progress,
            _ => SortKind::Unrecognized(name.to_string()),
        }
    }

    /// The name written to storage
    pub fn as_str(&self) -> &str {
        match self {
            SortKind::None => "NONE",
            SortKind::Date => "DATE",
            SortKind::Category => "FILTER",
            SortKind::Progress => "PROGRESS",
            SortKind::Unrecognized(raw) => raw,
        }
    }

    /// Sort options offered to front ends, as (key, label) pairs
    pub fn options() -> [(&'static str, &'static str); 4] {
        [
            ("None", "None"),
            ("Filter", "Filter"),
            ("Progress", "Progress"),
            ("Date", "Date"),
        ]
    }
}

impl fmt::Display for SortKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SortKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SortKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(SortKind::parse(&raw))
    }
}

/// Sort kind plus direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub kind: SortKind,
    pub ascending: bool,
}

impl SortSpec {
    pub fn new(kind: SortKind, ascending: bool) -> Self {
        SortSpec { kind, ascending }
    }
}

impl Default for SortSpec {
    fn default() -> Self {
        SortSpec {
            kind: SortKind::None,
            ascending: true,
        }
    }
}

/// Category and progress keys currently checked in the filter.
///
/// Both lists empty means no filter has been configured yet and every task is
/// shown. Any other combination is conjunctive: an empty list matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub categories: Vec<String>,
    pub progress: Vec<String>,
}

impl Selection {
    pub fn new(categories: Vec<String>, progress: Vec<String>) -> Self {
        Selection {
            categories,
            progress,
        }
    }

    /// True for the bootstrap "nothing configured" state
    pub fn is_unconfigured(&self) -> bool {
        self.categories.is_empty() && self.progress.is_empty()
    }

    pub fn admits(&self, category: &str, progress: &str) -> bool {
        self.categories.iter().any(|c| c == category) && self.progress.iter().any(|p| p == progress)
    }
}
