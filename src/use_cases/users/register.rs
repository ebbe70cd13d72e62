use common::settings::types::Settings;
use db_adapters::{
    is_unique_violation,
    user_adapter::{CreateUserParams, UserAdapter, UserMutation},
};
use utils::{
    auth::{password, tokens::TokenGenerator},
    emails::Mailer,
};

use crate::{
    constants::{BLANK_FIELD_ERROR, EMAIL_ALREADY_REGISTERED},
    error_500,
    pipelines::ValidationError,
    users::{
        activation_email::send_activation_email,
        types::{RegisterRequest, UserVisible},
    },
    UseCaseError,
};

/// Creates the user, inactive unless `email.no_verify` is set, and mails the activation link.
#[tracing::instrument(
    name = "Adding a new user",
    skip(params, settings, tokens, mailer, user_adapter),
    fields(new_user_mail = %params.email)
)]
pub async fn register_user<'a>(
    params: RegisterRequest,
    settings: &Settings,
    tokens: &TokenGenerator,
    mailer: &dyn Mailer,
    user_adapter: UserAdapter<'a>,
) -> Result<UserVisible, UseCaseError> {
    let mut errors = ValidationError::default();
    for (field, value) in [("email", &params.email), ("password", &params.password)] {
        if value.trim().is_empty() {
            errors.add(field, BLANK_FIELD_ERROR);
        }
    }
    if !errors.is_empty() {
        return Err(UseCaseError::BadRequest(
            serde_json::to_string(&errors).unwrap_or_else(|_| errors.to_string()),
        ));
    }

    let hashed_password = password::hash(params.password.as_bytes()).map_err(error_500)?;
    let user = user_adapter
        .create(CreateUserParams {
            email: params.email,
            password: hashed_password,
            first_name: params.first_name,
            last_name: params.last_name,
            is_active: settings.email.no_verify,
        })
        .await
        .map_err(|e| match is_unique_violation(&e) {
            true => UseCaseError::Conflict(EMAIL_ALREADY_REGISTERED.to_string()),
            false => {
                tracing::event!(target: "backend", tracing::Level::ERROR, "Failed to create user: {:#?}", e);
                error_500(e)
            }
        })?;

    if !settings.email.no_verify {
        send_activation_email(settings, tokens, mailer, &user).await?;
    }

    tracing::event!(target: "backend", tracing::Level::INFO, user_id = user.id, "User created successfully.");
    Ok(user.into())
}
