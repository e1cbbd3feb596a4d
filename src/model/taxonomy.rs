use std::fmt;
use std::marker::PhantomData;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Which taxonomy a front-end request targets.
///
/// The numeric values are the discriminators front ends send (`1` for
/// categories, `2` for progress tags).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Category = 1,
    Progress = 2,
}

impl EntryKind {
    /// Map a numeric discriminator to a kind
    pub fn from_code(code: u8) -> Option<EntryKind> {
        match code {
            1 => Some(EntryKind::Category),
            2 => Some(EntryKind::Progress),
            _ => None,
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Category => write!(f, "category"),
            EntryKind::Progress => write!(f, "progress tag"),
        }
    }
}

/// Static behavior of one taxonomy flavor.
pub trait TaxonomyKind {
    const KIND: EntryKind;
    /// Whether the label is always a copy of the key
    const LABEL_IS_KEY: bool;
    /// Whether labels must be unique across the whole collection
    const UNIQUE_LABELS: bool;
    /// Entries a brand-new board starts with, in display order
    const DEFAULTS: &'static [(&'static str, &'static str)];
}

/// Categories: the label mirrors the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category;

/// Progress tags: the label is a hex color, unique per collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress;

impl TaxonomyKind for Category {
    const KIND: EntryKind = EntryKind::Category;
    const LABEL_IS_KEY: bool = true;
    const UNIQUE_LABELS: bool = false;
    const DEFAULTS: &'static [(&'static str, &'static str)] = &[
        ("Work", "Work"),
        ("Personal", "Personal"),
        ("Health", "Health"),
        ("Education", "Education"),
        ("Finance", "Finance"),
        ("Other", "Other"),
    ];
}

impl TaxonomyKind for Progress {
    const KIND: EntryKind = EntryKind::Progress;
    const LABEL_IS_KEY: bool = false;
    const UNIQUE_LABELS: bool = true;
    const DEFAULTS: &'static [(&'static str, &'static str)] = &[
        ("Not Started", "#791a22"),
        ("Low Progress", "#8d772e"),
        ("Medium Progress", "#183b58"),
        ("High Progress", "#351853"),
        ("Completed", "#0e3f1a"),
    ];
}

/// One (key, label) pair as handed to front ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyEntry {
    pub key: String,
    pub label: String,
}

/// An ordered, uniquely keyed registry of labels.
///
/// Lookup and display order live in the same `IndexMap`, so the key set and
/// the order can never disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Taxonomy<K> {
    pub(crate) entries: IndexMap<String, String>,
    kind: PhantomData<K>,
}

/// Registry of task categories
pub type CategoryRegistry = Taxonomy<Category>;
/// Registry of progress tags
pub type ProgressRegistry = Taxonomy<Progress>;

impl<K: TaxonomyKind> Taxonomy<K> {
    /// Registry seeded with the flavor's default entries
    pub fn with_defaults() -> Self {
        Taxonomy {
            entries: K::DEFAULTS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            kind: PhantomData,
        }
    }

    /// An empty registry. Only used while rebuilding from stored entries;
    /// callers must not hand an empty registry to a board.
    pub(crate) fn empty() -> Self {
        Taxonomy {
            entries: IndexMap::new(),
            kind: PhantomData,
        }
    }

    pub fn kind(&self) -> EntryKind {
        K::KIND
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Label stored under `key`, if any
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|s| s.as_str())
    }

    /// Display index of `key`
    pub fn position(&self, key: &str) -> Option<usize> {
        self.entries.get_index_of(key)
    }

    /// Keys in display order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    /// (key, label) pairs in display order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Owned snapshot of the entries in display order
    pub fn list(&self) -> Vec<TaxonomyEntry> {
        self.iter()
            .map(|(key, label)| TaxonomyEntry {
                key: key.to_string(),
                label: label.to_string(),
            })
            .collect()
    }
}
