use common::settings::types::Settings;
use db_adapters::user_adapter::{UserAdapter, UserFilter, UserQuery};
use utils::{auth::tokens::TokenGenerator, emails::Mailer};

use crate::{
    constants::EMAIL_NOT_FOUND, error_500, users::activation_email::send_activation_email,
    UseCaseError,
};

#[tracing::instrument(name = "Resending activation email", skip(settings, tokens, mailer, user_adapter))]
pub async fn resend_activation_email<'a>(
    email: String,
    settings: &Settings,
    tokens: &TokenGenerator,
    mailer: &dyn Mailer,
    user_adapter: UserAdapter<'a>,
) -> Result<(), UseCaseError> {
    let user = user_adapter
        .filter_eq_is_active(false)
        .get_by_email(email)
        .await
        .map_err(error_500)?
        .ok_or_else(|| {
            tracing::event!(target: "backend", tracing::Level::INFO, "No inactive user for this email.");
            UseCaseError::NotFound(EMAIL_NOT_FOUND.to_string())
        })?;

    send_activation_email(settings, tokens, mailer, &user).await?;
    tracing::event!(target: "backend", tracing::Level::INFO, "Activation email re-sent successfully.");
    Ok(())
}
