//! Value Provenance
//!
//! Records where each normalized Spec field came from so a caller can tell a
//! user-entered number from a filled-in default.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// ValueSource determines which authority supplied a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    /// Entered on the form
    Form,
    /// Product-category profile or stand-type defaults
    Profile,
    /// Engine fallback (counts of 1, zero gaps)
    System,
}

impl Default for ValueSource {
    fn default() -> Self {
        Self::System
    }
}

/// Field name (camelCase, dotted) to the source that supplied it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Provenance {
    fields: BTreeMap<String, ValueSource>,
}

impl Provenance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, field: &str, source: ValueSource) {
        self.fields.insert(field.to_string(), source);
    }

    pub fn source_of(&self, field: &str) -> Option<ValueSource> {
        self.fields.get(field).copied()
    }

    /// Fields that were not entered on the form.
    pub fn defaulted(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(_, source)| **source != ValueSource::Form)
            .map(|(field, _)| field.as_str())
            .collect()
    }
}
