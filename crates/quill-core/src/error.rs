//! Domain-level error types.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Field-keyed validation failures, e.g. `slug -> "has already been taken"`.
///
/// Serializes as a flat `field: reason` object so callers can render inline
/// field feedback. A `BTreeMap` keeps iteration order stable for tests and
/// for rendered output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    #[serde(flatten)]
    errors: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation on `field`. A later violation on the same field
    /// replaces the earlier one.
    pub fn add(&mut self, field: &str, reason: impl Into<String>) {
        self.errors.insert(field.to_string(), reason.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, reason) in &self.errors {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{} {}", field, reason)?;
            first = false;
        }
        Ok(())
    }
}

/// Domain errors - business logic failures.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("{entity} not found: {ident}")]
    NotFound { entity: &'static str, ident: String },

    #[error("actor does not own this entity")]
    Forbidden,

    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Shorthand for a single-field validation failure.
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, reason);
        DomainError::Validation(errors)
    }
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("database connection failed: {0}")]
    Connection(String),

    #[error("query execution failed: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("unique constraint violation on {field}")]
    UniqueViolation { field: &'static str },
}

/// A race-lost duplicate write surfaces from storage as `UniqueViolation`;
/// re-express it as the same field error a synchronous check would produce.
impl From<RepoError> for DomainError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::UniqueViolation { field } => {
                DomainError::invalid(field, "has already been taken")
            }
            other => DomainError::Internal(other.to_string()),
        }
    }
}
