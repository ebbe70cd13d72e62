//! Multi-step operations composed from ordered [`base::Step`]s over a typed context.

pub mod base;
mod errors;
pub mod user_activate;

pub use base::{ContextKey, ContextUpdate, Pipeline, PipelineContext, Step};
pub use errors::{PipelineError, ValidationError, NON_FIELD_ERRORS};
