use std::fmt;

use crate::model::taxonomy::{EntryKind, Taxonomy, TaxonomyKind};

/// Direction for moving an entry in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn from_up(up: bool) -> Direction {
        if up { Direction::Up } else { Direction::Down }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// Error type for taxonomy operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaxonomyError {
    #[error("{kind} already exists: {key}")]
    DuplicateKey { kind: EntryKind, key: String },
    #[error("a progress tag with color {0} already exists")]
    DuplicateColor(String),
    #[error("{kind} not found: {key}")]
    NotFound { kind: EntryKind, key: String },
    #[error("cannot delete {key}: it is the last {kind}")]
    LastEntry { kind: EntryKind, key: String },
    #[error("edit does not change the {kind} or the new name already exists: {key}")]
    NoOpEdit { kind: EntryKind, key: String },
    #[error("cannot move {key} further {direction}")]
    Boundary { key: String, direction: Direction },
}

impl<K: TaxonomyKind> Taxonomy<K> {
    /// Rebuild a registry from stored (key, label) pairs, keeping their order.
    ///
    /// Pairs that would break an invariant are skipped with a warning.
    /// Returns `None` when nothing usable remains.
    pub fn from_entries<I>(pairs: I) -> Option<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut taxonomy = Self::empty();
        for (key, label) in pairs {
            let label = if K::LABEL_IS_KEY { key.clone() } else { label };
            if let Err(e) = taxonomy.add(&key, &label) {
                tracing::warn!(kind = %K::KIND, "skipping stored entry: {e}");
            }
        }
        if taxonomy.is_empty() { None } else { Some(taxonomy) }
    }

    fn not_found(key: &str) -> TaxonomyError {
        TaxonomyError::NotFound {
            kind: K::KIND,
            key: key.to_string(),
        }
    }

    fn label_taken(&self, label: &str, except: Option<&str>) -> bool {
        K::UNIQUE_LABELS
            && self
                .entries
                .iter()
                .any(|(k, v)| v == label && Some(k.as_str()) != except)
    }

    /// Append a new entry at the end of the display order.
    pub fn add(&mut self, key: &str, label: &str) -> Result<(), TaxonomyError> {
        if self.contains(key) {
            return Err(TaxonomyError::DuplicateKey {
                kind: K::KIND,
                key: key.to_string(),
            });
        }
        if self.label_taken(label, None) {
            return Err(TaxonomyError::DuplicateColor(label.to_string()));
        }
        self.entries.insert(key.to_string(), label.to_string());
        Ok(())
    }

    /// Remove an entry. The last remaining entry can never be removed.
    pub fn delete(&mut self, key: &str) -> Result<(), TaxonomyError> {
        if !self.contains(key) {
            return Err(Self::not_found(key));
        }
        if self.len() <= 1 {
            return Err(TaxonomyError::LastEntry {
                kind: K::KIND,
                key: key.to_string(),
            });
        }
        self.entries.shift_remove(key);
        Ok(())
    }

    /// Rename (and, for progress tags, optionally recolor) an entry in place.
    ///
    /// `new_label` is ignored for flavors whose label mirrors the key; for the
    /// others `None` keeps the current label.
    pub fn rename(
        &mut self,
        original: &str,
        new_key: &str,
        new_label: Option<&str>,
    ) -> Result<(), TaxonomyError> {
        let index = self
            .position(original)
            .ok_or_else(|| Self::not_found(original))?;
        let current = self.entries[index].clone();
        let label = if K::LABEL_IS_KEY {
            new_key.to_string()
        } else {
            new_label.map(str::to_string).unwrap_or_else(|| current.clone())
        };

        let key_changed = new_key != original;
        let key_taken = key_changed && self.contains(new_key);
        let no_op = if K::LABEL_IS_KEY {
            !key_changed || key_taken
        } else {
            key_taken || (!key_changed && label == current)
        };
        if no_op {
            return Err(TaxonomyError::NoOpEdit {
                kind: K::KIND,
                key: new_key.to_string(),
            });
        }
        if label != current && self.label_taken(&label, Some(original)) {
            return Err(TaxonomyError::DuplicateColor(label));
        }

        if key_changed {
            self.entries.shift_remove_index(index);
            self.entries.shift_insert(index, new_key.to_string(), label);
        } else {
            self.entries[index] = label;
        }
        Ok(())
    }

    /// Swap an entry with its neighbour in the given direction.
    pub fn reorder(&mut self, key: &str, direction: Direction) -> Result<(), TaxonomyError> {
        let index = self.position(key).ok_or_else(|| Self::not_found(key))?;
        let boundary = || TaxonomyError::Boundary {
            key: key.to_string(),
            direction,
        };
        let neighbour = match direction {
            Direction::Up => index.checked_sub(1).ok_or_else(boundary)?,
            Direction::Down => {
                if index + 1 >= self.len() {
                    return Err(boundary());
                }
                index + 1
            }
        };
        self.entries.swap_indices(index, neighbour);
        Ok(())
    }
}
