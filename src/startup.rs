use std::sync::Arc;

use common::{db::init_db, settings::types::Settings};
use sea_orm::{DbConn, DbErr};
use use_cases::{signals::EventBus, users::subscribers::subscribe_confirmation_email};
use utils::{
    auth::tokens::{TokenError, TokenGenerator},
    emails::{mailer_from_settings, MailError, Mailer},
};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Failed to open DB connection: {0}")]
    Database(#[from] DbErr),
    #[error("Failed to build token generator: {0}")]
    Tokens(#[from] TokenError),
    #[error("Failed to build mailer: {0}")]
    Mailer(#[from] MailError),
}

/// Everything a command needs, built once from settings.
pub struct Application {
    pub settings: Settings,
    pub db: DbConn,
    pub tokens: Arc<TokenGenerator>,
    pub bus: Arc<EventBus>,
    pub mailer: Arc<dyn Mailer>,
}

impl Application {
    pub async fn build(settings: Settings) -> Result<Self, StartupError> {
        let db = init_db(&settings).await?;
        let tokens = Arc::new(TokenGenerator::for_activation(&settings)?);
        let mailer = mailer_from_settings(&settings)?;

        let bus = Arc::new(EventBus::new());
        subscribe_confirmation_email(&bus, &settings, mailer.clone());

        Ok(Self {
            settings,
            db,
            tokens,
            bus,
            mailer,
        })
    }
}
