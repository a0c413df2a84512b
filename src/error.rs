//! # Errors
//!
//! Two disjoint classes of failure:
//! - [`ConfigError`]: building a merge went wrong. Raised immediately, never recovered.
//! - [`ResolutionError`]: a single field could not be resolved. Collected by the
//!   [`FusionContext`](crate::context::FusionContext) as a [`FusionError`] and never
//!   propagated out of a merge.

use std::fmt;
use thiserror::Error;

/// Build-time configuration error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no field named `{field}` is declared for {record}")]
    UnknownField { record: &'static str, field: String },

    #[error("getter not found for field `{field}` of {record}")]
    MissingGetter { record: &'static str, field: String },

    #[error("setter not found for field `{field}` of {record}")]
    MissingSetter { record: &'static str, field: String },

    #[error("field `{field}` of {record} has type {actual}, not {requested}")]
    FieldTypeMismatch {
        record: &'static str,
        field: String,
        actual: &'static str,
        requested: &'static str,
    },

    #[error("{record} has no field accessor table; declare fields by getter and setter instead")]
    NoAccessorTable { record: &'static str },

    #[error("cannot correspond to a previous field: no field of {record} has been finished yet")]
    NoPreviousField { record: &'static str },
}

/// Why a single resolution failed
#[derive(Error, Debug)]
pub enum ResolutionError {
    /// More than one distinct value survived the resolution
    #[error("{} distinct values remain: {}", .values.len(), .values.join(", "))]
    Unresolved { values: Vec<String> },

    /// A strategy panicked while resolving
    #[error("resolution panicked: {0}")]
    Panicked(String),

    /// Any other failure raised by a strategy
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ResolutionError {
    /// Create an unresolved error from the values that are still in conflict
    pub fn unresolved<T: fmt::Debug>(values: impl IntoIterator<Item = T>) -> Self {
        Self::Unresolved {
            values: values.into_iter().map(|v| format!("{:?}", v)).collect(),
        }
    }
}

/// A field-level failure recorded during one merge.
#[derive(Debug)]
pub struct FusionError {
    /// Human-readable description of the field that failed
    pub field: String,
    /// The candidate values that were in conflict, rendered for display
    pub conflicting_values: Vec<String>,
    /// The underlying failure
    pub cause: ResolutionError,
}

impl FusionError {
    pub fn new(field: impl Into<String>, conflicting_values: Vec<String>, cause: ResolutionError) -> Self {
        Self {
            field: field.into(),
            conflicting_values,
            cause,
        }
    }
}

impl fmt::Display for FusionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Could not fully resolve {} between ", self.field)?;
        match self.conflicting_values.split_last() {
            Some((last, rest)) if !rest.is_empty() => {
                write!(f, "{} and {}", rest.join(", "), last)?;
            }
            Some((last, _)) => write!(f, "{}", last)?,
            None => write!(f, "no values")?,
        }
        write!(f, " ({})", self.cause)
    }
}

impl std::error::Error for FusionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fusion_error_message() {
        let error = FusionError::new(
            "gender",
            vec!["Female".to_string(), "Male".to_string()],
            ResolutionError::unresolved(["Female", "Male"]),
        );
        let message = error.to_string();
        assert!(message.starts_with("Could not fully resolve gender between Female and Male"));
        assert!(message.contains("2 distinct values remain"));
    }

    #[test]
    fn test_fusion_error_message_three_values() {
        let error = FusionError::new(
            "city",
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
            ResolutionError::Panicked("boom".to_string()),
        );
        assert_eq!(
            error.to_string(),
            "Could not fully resolve city between a, b and c (resolution panicked: boom)"
        );
    }

    #[test]
    fn test_config_error_names_field() {
        let error = ConfigError::MissingSetter {
            record: "Person",
            field: "id".to_string(),
        };
        assert_eq!(error.to_string(), "setter not found for field `id` of Person");
    }

    #[test]
    fn test_other_from_anyhow() {
        let error: ResolutionError = anyhow::anyhow!("bad input").into();
        assert_eq!(error.to_string(), "bad input");
    }
}
