use std::sync::Arc;

use common::settings::types::Settings;
use utils::emails::{confirmation_email, Mailer};

use crate::signals::{EventBus, HandlerError, Signal, SignalKind, Subscriber};

pub const CONFIRMATION_EMAIL_SUBSCRIBER: &str = "users::send_activation_confirmation";

struct ConfirmationEmail {
    settings: Settings,
    mailer: Arc<dyn Mailer>,
}

#[async_trait::async_trait]
impl Subscriber for ConfirmationEmail {
    async fn handle(&self, signal: &Signal) -> Result<(), HandlerError> {
        match signal {
            Signal::UserActivated(event) => {
                let message = confirmation_email(&self.settings, &event.user)
                    .map_err(|e| HandlerError(e.to_string()))?;
                self.mailer
                    .send(&message)
                    .await
                    .map_err(|e| HandlerError(e.to_string()))
            }
        }
    }
}

/// Mails a confirmation to every activated user. No-op unless
/// `email.send_activation_confirmation` is set.
pub fn subscribe_confirmation_email(bus: &EventBus, settings: &Settings, mailer: Arc<dyn Mailer>) {
    if !settings.email.send_activation_confirmation {
        return;
    }

    bus.subscribe_with(
        SignalKind::UserActivated,
        CONFIRMATION_EMAIL_SUBSCRIBER,
        Arc::new(ConfirmationEmail {
            settings: settings.clone(),
            mailer,
        }),
    );
}

#[cfg(test)]
mod tests {
    use common::settings::get_test_settings;
    use test_utils::RecordingMailer;

    use super::*;
    use crate::{
        signals::{SignalError, UserActivated},
        users::types::ActivationRequest,
    };

    fn activated_signal() -> Signal {
        let now = chrono::Utc::now().into();
        Signal::UserActivated(UserActivated {
            sender: "tests",
            user: entities::user::Model {
                id: 3,
                email: "lynx@test.com".to_string(),
                password: "password".to_string(),
                first_name: "Lynx".to_string(),
                last_name: "Levin".to_string(),
                is_active: true,
                last_login: None,
                created_at: now,
                updated_at: now,
            },
            request: ActivationRequest::new("Mw", "token"),
        })
    }

    #[test]
    fn disabled_by_default() {
        let bus = EventBus::new();

        subscribe_confirmation_email(&bus, &get_test_settings(), Arc::new(RecordingMailer::default()));

        assert_eq!(bus.subscriber_count(SignalKind::UserActivated), 0);
    }

    #[tokio::test]
    async fn sends_confirmation_on_activation() {
        let bus = EventBus::new();
        let mut settings = get_test_settings();
        settings.email.send_activation_confirmation = true;
        let mailer = Arc::new(RecordingMailer::default());
        subscribe_confirmation_email(&bus, &settings, mailer.clone());

        bus.publish(&activated_signal()).await.unwrap();

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "Lynx Levin <lynx@test.com>");
        assert!(sent[0].subject.ends_with("Your account is active"));
    }

    #[tokio::test]
    async fn mail_failure_reaches_publisher() {
        let bus = EventBus::new();
        let mut settings = get_test_settings();
        settings.email.send_activation_confirmation = true;
        subscribe_confirmation_email(&bus, &settings, Arc::new(RecordingMailer::failing()));

        let res = bus.publish(&activated_signal()).await;

        match res {
            Err(SignalError::Subscriber { subscriber, .. }) => {
                assert_eq!(subscriber, CONFIRMATION_EMAIL_SUBSCRIBER)
            }
            Ok(_) => panic!("Publication should fail."),
        }
    }
}
