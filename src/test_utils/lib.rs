use std::sync::{Mutex, PoisonError};

use common::{db::init_db as init_db_fn, settings::get_test_settings};
use sea_orm::{DbConn, DbErr};
use utils::emails::{EmailMessage, MailError, Mailer};

pub async fn init_db() -> Result<DbConn, DbErr> {
    let settings = get_test_settings();
    init_db_fn(&settings).await
}

/// Keeps every email instead of sending it. Fails on demand.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<EmailMessage>>,
    pub fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait::async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::UnknownTemplate("failing mailer".to_string()));
        }
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).push(message.clone());
        Ok(())
    }
}
