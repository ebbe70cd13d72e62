use std::sync::Arc;

use sea_orm::DbConn;
use utils::auth::tokens::TokenGenerator;

use crate::{
    error_500,
    pipelines::{user_activate, Pipeline},
    signals::EventBus,
    users::types::{ActivationRequest, UserVisible},
    UseCaseError,
};

/// Runs the activation pipeline for one `uid`/`token` pair.
#[tracing::instrument(name = "Activating user", skip_all, fields(request_id = %request.request_id))]
pub async fn activate_user(
    db: &DbConn,
    tokens: Arc<TokenGenerator>,
    bus: Arc<EventBus>,
    request: ActivationRequest,
) -> Result<UserVisible, UseCaseError> {
    let pipeline = Pipeline::new(request, user_activate::steps(db.clone(), tokens, bus))?;
    let user = pipeline
        .run()
        .await?
        .into_user()
        .ok_or_else(|| error_500("Activation finished without a user"))?;
    Ok(user.into())
}
