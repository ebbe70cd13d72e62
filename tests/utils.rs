use std::sync::Arc;

use common::settings::{get_test_settings, types::Settings};
use sea_orm::{DbConn, DbErr};
use test_utils::RecordingMailer;
use use_cases::{signals::EventBus, users::subscribers::subscribe_confirmation_email};
use utils::auth::tokens::TokenGenerator;

pub struct Connections {
    pub db: DbConn,
    pub settings: Settings,
    pub tokens: Arc<TokenGenerator>,
    pub bus: Arc<EventBus>,
    pub mailer: Arc<RecordingMailer>,
}

/// Wires the application the way the binary does, with mail recorded instead of sent.
pub async fn init_app(settings: Settings) -> Result<Connections, DbErr> {
    let db = test_utils::init_db().await?;
    let tokens = Arc::new(TokenGenerator::for_activation(&settings).unwrap());
    let mailer = Arc::new(RecordingMailer::default());
    let bus = Arc::new(EventBus::new());
    subscribe_confirmation_email(&bus, &settings, mailer.clone());

    Ok(Connections {
        db,
        settings,
        tokens,
        bus,
        mailer,
    })
}

pub fn confirming_settings() -> Settings {
    let mut settings = get_test_settings();
    settings.email.send_activation_confirmation = true;
    settings
}

/// Pulls `(uid, token)` out of the activation link in an email body.
pub fn uid_and_token(settings: &Settings, body: &str) -> (String, String) {
    let prefix = format!("{}/activate/", settings.application.frontend_url);
    let start = body.find(&prefix).unwrap() + prefix.len();
    let link = body[start..]
        .split(|c: char| c.is_whitespace() || c == '"' || c == '<')
        .next()
        .unwrap();
    let (uid, token) = link.split_once('/').unwrap();
    (uid.to_string(), token.to_string())
}
