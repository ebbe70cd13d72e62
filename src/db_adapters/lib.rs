pub mod user_adapter;

use sea_orm::{DbErr, SqlErr};

/// True when the error comes from a unique constraint, e.g. a duplicate email.
pub fn is_unique_violation(e: &DbErr) -> bool {
    matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
