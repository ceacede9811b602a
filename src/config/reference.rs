//! Reference data configuration loading from reference.toml
//!
//! This module describes the statuses, types, categories and subcategories
//! used to seed an empty ledger, plus the per-category defaults used to
//! backfill categories that ended up without subcategories. The repository's
//! `reference.toml` is compiled in as the default document.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

const DEFAULT_REFERENCE: &str = include_str!("../../reference.toml");

/// Configuration structure representing the entire reference.toml file
#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceConfig {
    /// Status tags to seed
    #[serde(default)]
    pub statuses: Vec<NamedEntry>,
    /// Types to seed, each with its categories
    #[serde(default)]
    pub types: Vec<TypeEntry>,
    /// Defaults for categories without subcategories
    #[serde(default)]
    pub backfill: BackfillConfig,
}

/// A lookup row that has only a name and a description
#[derive(Debug, Clone, Deserialize)]
pub struct NamedEntry {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A type together with the categories it owns
#[derive(Debug, Clone, Deserialize)]
pub struct TypeEntry {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub categories: Vec<CategoryEntry>,
}

/// A category together with the names of its subcategories
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryEntry {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub subcategories: Vec<String>,
}

/// Default subcategories keyed by category name.
///
/// Categories under `income_type` use the `income` map, all others the
/// `expense` map; names missing from the map get `fallback`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackfillConfig {
    #[serde(default)]
    pub income_type: String,
    #[serde(default)]
    pub fallback: Vec<String>,
    #[serde(default)]
    pub income: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub expense: BTreeMap<String, Vec<String>>,
}

impl BackfillConfig {
    /// Subcategory names to add to a category, given the name of its type.
    #[must_use]
    pub fn defaults_for(&self, type_name: &str, category_name: &str) -> &[String] {
        let table = if type_name == self.income_type {
            &self.income
        } else {
            &self.expense
        };
        table
            .get(category_name)
            .map_or(self.fallback.as_slice(), Vec::as_slice)
    }
}

/// Parses a reference document from TOML text.
pub fn parse_reference_config(contents: &str) -> Result<ReferenceConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse reference data: {e}"),
    })
}

/// Loads reference data from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_reference_config<P: AsRef<Path>>(path: P) -> Result<ReferenceConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!(
            "Failed to read reference file {}: {e}",
            path.as_ref().display()
        ),
    })?;
    parse_reference_config(&contents)
}

/// Returns the reference data bundled with the binary.
pub fn default_reference_config() -> Result<ReferenceConfig> {
    parse_reference_config(DEFAULT_REFERENCE)
}
