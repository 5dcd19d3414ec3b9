use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("no clip is mapped to index {index} (selectable: 1..={max})")]
    UnknownIndex { index: u32, max: usize },

    #[error("at least one selectable clip is required")]
    NoSelections,

    #[error("background clip path is empty")]
    NoBackground,
}

/// Clip addressing: index 0 is the background loop, 1..=N the selections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipCatalog {
    background: PathBuf,
    selections: Vec<PathBuf>,
}

impl ClipCatalog {
    pub const BACKGROUND_INDEX: u32 = 0;

    pub fn new(background: PathBuf, selections: Vec<PathBuf>) -> Result<Self, CatalogError> {
        let catalog = Self {
            background,
            selections,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Checks a catalog that came from deserialization.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.background.as_os_str().is_empty() {
            return Err(CatalogError::NoBackground);
        }
        if self.selections.is_empty() {
            return Err(CatalogError::NoSelections);
        }
        Ok(())
    }

    pub fn background(&self) -> &Path {
        &self.background
    }

    /// Path for a selectable index. Index 0 is not selectable.
    pub fn selection(&self, index: u32) -> Result<&Path, CatalogError> {
        let unknown = CatalogError::UnknownIndex {
            index,
            max: self.selections.len(),
        };
        if index == Self::BACKGROUND_INDEX {
            return Err(unknown);
        }
        self.selections
            .get(index as usize - 1)
            .map(PathBuf::as_path)
            .ok_or(unknown)
    }

    pub fn selectable(&self) -> usize {
        self.selections.len()
    }
}
