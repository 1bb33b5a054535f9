use std::collections::HashSet;

use thiserror::Error;

use crate::model::ids::{ItemId, SetIdentity};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ItemError {
    #[error("item prompt cannot be empty")]
    EmptyPrompt,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SetError {
    #[error("set level cannot be empty")]
    EmptyLevel,

    #[error("set name cannot be empty")]
    EmptyName,

    #[error("item {0} appears more than once in the set")]
    DuplicateItem(ItemId),
}

//
// ─── ITEM ──────────────────────────────────────────────────────────────────────
//

/// A single vocabulary entry.
///
/// `reading` and `meaning` may be blank; question generation decides what can
/// be asked from what is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    id: ItemId,
    prompt: String,
    reading: String,
    meaning: String,
}

impl Item {
    /// # Errors
    ///
    /// Returns `ItemError::EmptyPrompt` if the prompt is blank.
    pub fn new(
        id: ItemId,
        prompt: impl Into<String>,
        reading: impl Into<String>,
        meaning: impl Into<String>,
    ) -> Result<Self, ItemError> {
        let prompt = prompt.into();
        if is_blank(&prompt) {
            return Err(ItemError::EmptyPrompt);
        }
        Ok(Self {
            id,
            prompt,
            reading: reading.into(),
            meaning: meaning.into(),
        })
    }

    #[must_use]
    pub fn id(&self) -> ItemId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn reading(&self) -> &str {
        &self.reading
    }

    #[must_use]
    pub fn meaning(&self) -> &str {
        &self.meaning
    }

    #[must_use]
    pub fn has_reading(&self) -> bool {
        !is_blank(&self.reading)
    }

    #[must_use]
    pub fn has_meaning(&self) -> bool {
        !is_blank(&self.meaning)
    }
}

/// Empty after trimming surrounding whitespace.
#[must_use]
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

//
// ─── SET ───────────────────────────────────────────────────────────────────────
//

/// A named, leveled collection of items in presentation-independent order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSet {
    level: String,
    name: String,
    items: Vec<Item>,
}

impl ItemSet {
    /// # Errors
    ///
    /// Returns `SetError` if level or name is blank, or an item id repeats.
    pub fn new(
        level: impl Into<String>,
        name: impl Into<String>,
        items: Vec<Item>,
    ) -> Result<Self, SetError> {
        let level = level.into();
        let name = name.into();
        if is_blank(&level) {
            return Err(SetError::EmptyLevel);
        }
        if is_blank(&name) {
            return Err(SetError::EmptyName);
        }

        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(item.id()) {
                return Err(SetError::DuplicateItem(item.id()));
            }
        }

        Ok(Self { level, name, items })
    }

    #[must_use]
    pub fn level(&self) -> &str {
        &self.level
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn identity(&self) -> SetIdentity {
        SetIdentity::from_parts(&self.level, &self.name)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
