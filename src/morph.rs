// src/morph.rs
//! Morphological dictionary: surface form → ranked lemma candidates.
//!
//! The dictionary is produced offline by the same analyzer that prepared the
//! training corpus and ships as `lemmas.json` next to the model weights. At
//! runtime it is read-only; a missing or malformed file aborts startup.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};

#[derive(Debug)]
pub struct MorphDict {
    forms: HashMap<String, Vec<String>>,
}

impl MorphDict {
    /// Load the dictionary artifact.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read lemma dictionary {}", path.display()))?;
        let forms: HashMap<String, Vec<String>> =
            serde_json::from_str(&raw).context("parse lemma dictionary")?;
        Ok(Self { forms })
    }

    /// Build a dictionary directly from entries (tests, tooling).
    pub fn from_entries(entries: impl IntoIterator<Item = (String, Vec<String>)>) -> Self {
        Self {
            forms: entries.into_iter().collect(),
        }
    }

    /// Dictionary base form of a word.
    ///
    /// Candidates are stored in analyzer rank order and the first one wins;
    /// no further disambiguation happens here. A form the dictionary does
    /// not know lemmatizes to itself.
    pub fn normal_form(&self, form: &str) -> String {
        self.forms
            .get(form)
            .and_then(|candidates| candidates.first())
            .cloned()
            .unwrap_or_else(|| form.to_string())
    }
}
