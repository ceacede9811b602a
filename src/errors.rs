//! Unified error types for the ledger.
//!
//! Failures fall into three groups: user-correctable input problems
//! ([`Error::Validation`], [`Error::Hierarchy`], [`Error::InvalidAmount`]),
//! unknown ids ([`Error::NotFound`]) and integrity conflicts
//! ([`Error::Integrity`]). Nothing here is treated as transient.

use std::collections::BTreeMap;
use std::fmt;

use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use thiserror::Error;

use crate::core::{hierarchy::HierarchyError, record::AmountError};

/// Field-level and form-level validation messages collected while binding input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormErrors {
    /// Messages keyed by form field name
    pub fields: BTreeMap<String, Vec<String>>,
    /// Messages that concern the form as a whole
    pub non_field: Vec<String>,
}

impl FormErrors {
    /// Records a message against a single field.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Records a message that is not tied to a single field.
    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.non_field.push(message.into());
    }

    /// Builds an error set holding one field message.
    #[must_use]
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }

    /// Whether the given field carries at least one message.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = self.non_field.clone();
        for (field, messages) in &self.fields {
            parts.push(format!("{field}: {}", messages.join(" ")));
        }
        f.write_str(&parts.join("; "))
    }
}

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(DbErr),

    #[error("Validation failed: {0}")]
    Validation(FormErrors),

    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),

    #[error("Invalid amount {amount}: {reason}")]
    InvalidAmount { amount: String, reason: AmountError },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Integrity error: {message}")]
    Integrity { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<DbErr> for Error {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => Self::Integrity {
                message: format!("an entry with this name already exists ({detail})"),
            },
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => Self::Integrity {
                message: format!("the entry is still referenced ({detail})"),
            },
            _ => Self::Database(err),
        }
    }
}

impl From<FormErrors> for Error {
    fn from(errors: FormErrors) -> Self {
        Self::Validation(errors)
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
