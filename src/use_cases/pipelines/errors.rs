use std::{collections::BTreeMap, fmt};

use sea_orm::DbErr;
use serde::Serialize;

use crate::{pipelines::ContextKey, signals::SignalError};

pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Field name (or [`NON_FIELD_ERRORS`]) to human readable messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationError {
    pub errors: BTreeMap<String, Vec<String>>,
}

impl ValidationError {
    pub fn non_field(message: impl Into<String>) -> Self {
        Self::field(NON_FIELD_ERRORS, message)
    }

    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut error = Self::default();
        error.add(field, message);
        error
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages = self
            .errors
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
            .collect::<Vec<_>>();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("Step '{step}' requires '{key}' but no earlier step produces it")]
    MissingKey {
        step: &'static str,
        key: ContextKey,
    },
    #[error("Step '{step}' returned '{key}' which it does not declare")]
    UndeclaredKey {
        step: &'static str,
        key: ContextKey,
    },
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    #[error(transparent)]
    Signal(#[from] SignalError),
}
