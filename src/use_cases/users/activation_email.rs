use common::settings::types::Settings;
use entities::user;
use utils::{
    auth::{tokens::TokenGenerator, uid::encode_uid},
    emails::{activation_email, Mailer},
};

use crate::{error_500, UseCaseError};

pub fn activation_link(
    settings: &Settings,
    tokens: &TokenGenerator,
    user: &user::Model,
) -> Result<String, UseCaseError> {
    let token = tokens.make_token(user).map_err(error_500)?;
    Ok(settings.activation_url(&encode_uid(user.id), &token))
}

#[tracing::instrument(name = "Sending activation email", skip_all, fields(user_id = %user.id))]
pub async fn send_activation_email(
    settings: &Settings,
    tokens: &TokenGenerator,
    mailer: &dyn Mailer,
    user: &user::Model,
) -> Result<(), UseCaseError> {
    let link = activation_link(settings, tokens, user)?;
    let message = activation_email(settings, user, &link).map_err(error_500)?;
    mailer.send(&message).await.map_err(|e| {
        tracing::event!(target: "backend", tracing::Level::ERROR, "Failed to send activation email: {}", e);
        error_500(e)
    })
}
