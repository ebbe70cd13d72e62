use std::sync::Arc;

use common::settings::types::Settings;
use entities::{custom_methods::user::UserMailboxTrait, user};
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::{
        authentication::{Credentials, Mechanism},
        PoolConfig,
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use once_cell::sync::Lazy;

static ENV: Lazy<minijinja::Environment<'static>> = Lazy::new(minijinja::Environment::new);

const TEMPLATES: &[(&str, &str)] = &[
    (
        "activation_email.html",
        include_str!("templates/activation_email.html"),
    ),
    (
        "activation_email.txt",
        include_str!("templates/activation_email.txt"),
    ),
    (
        "confirmation_email.html",
        include_str!("templates/confirmation_email.html"),
    ),
    (
        "confirmation_email.txt",
        include_str!("templates/confirmation_email.txt"),
    ),
];

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Unknown email template: {0}")]
    UnknownTemplate(String),
    #[error("Cannot render email template: {0}")]
    Template(#[from] minijinja::Error),
    #[error("Invalid mailbox: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("Cannot build email: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("Could not send email: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("No SMTP host configured")]
    MissingHost,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;
}

pub struct SmtpMailer {
    sender: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn from_settings(settings: &Settings) -> Result<Self, MailError> {
        let credentials = Credentials::new(
            settings.email.host_user.clone(),
            settings.email.host_user_password.clone(),
        );
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.email.host)?
            .credentials(credentials)
            .authentication(vec![Mechanism::Plain])
            .pool_config(PoolConfig::new().max_size(20))
            .build();

        Ok(Self {
            sender: settings.email.sender.parse()?,
            transport,
        })
    }

    fn build_message(&self, message: &EmailMessage) -> Result<Message, MailError> {
        Ok(Message::builder()
            .from(self.sender.clone())
            .to(message.to.parse()?)
            .subject(message.subject.clone())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(message.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(message.html.clone()),
                    ),
            )?)
    }
}

#[async_trait::async_trait]
impl Mailer for SmtpMailer {
    #[tracing::instrument(name = "Sending email over SMTP", skip(self, message), fields(recipient = %message.to))]
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let email = self.build_message(message)?;
        match self.transport.send(email).await {
            Ok(_) => {
                tracing::event!(target: "backend", tracing::Level::INFO, "Email successfully sent!");
                Ok(())
            }
            Err(e) => {
                tracing::event!(target: "backend", tracing::Level::ERROR, "Could not send email: {:#?}", e);
                Err(e.into())
            }
        }
    }
}

/// Writes emails to the log instead of delivering them. Debug builds only: bodies carry live tokens
/// and are logged at DEBUG.
pub struct LoggingMailer;

#[async_trait::async_trait]
impl Mailer for LoggingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        tracing::event!(
            target: "backend",
            tracing::Level::INFO,
            recipient = %message.to,
            subject = %message.subject,
            "Email not delivered (no SMTP host configured)."
        );
        tracing::event!(target: "backend", tracing::Level::DEBUG, "Email body:\n{}", message.text);
        Ok(())
    }
}

/// Without an SMTP host, falls back to [`LoggingMailer`] in debug and refuses otherwise.
pub fn mailer_from_settings(settings: &Settings) -> Result<Arc<dyn Mailer>, MailError> {
    match (settings.email.host.is_empty(), settings.debug) {
        (true, true) => Ok(Arc::new(LoggingMailer)),
        (true, false) => Err(MailError::MissingHost),
        (false, _) => Ok(Arc::new(SmtpMailer::from_settings(settings)?)),
    }
}

fn render(name: &str, ctx: minijinja::Value) -> Result<String, MailError> {
    let source = TEMPLATES
        .iter()
        .find(|(template_name, _)| *template_name == name)
        .map(|(_, source)| *source)
        .ok_or_else(|| MailError::UnknownTemplate(name.to_string()))?;
    Ok(ENV.render_named_str(name, source, ctx)?)
}

pub fn activation_email(
    settings: &Settings,
    user: &user::Model,
    activation_link: &str,
) -> Result<EmailMessage, MailError> {
    let title = format!("{} - Activate your account", settings.application.app_name);
    let expires_at =
        chrono::Local::now() + chrono::Duration::minutes(settings.secret.token_expiration);
    let ctx = minijinja::context! {
        title => &title,
        name => &user.full_name(),
        activation_link => activation_link,
        domain => &settings.application.frontend_url,
        expiration_time => &settings.secret.token_expiration,
        exact_time => &expires_at.format("%A %B %d, %Y at %r").to_string(),
    };

    Ok(EmailMessage {
        to: user.mailbox(),
        subject: title,
        html: render("activation_email.html", ctx.clone())?,
        text: render("activation_email.txt", ctx)?,
    })
}

pub fn confirmation_email(
    settings: &Settings,
    user: &user::Model,
) -> Result<EmailMessage, MailError> {
    let title = format!("{} - Your account is active", settings.application.app_name);
    let ctx = minijinja::context! {
        title => &title,
        name => &user.full_name(),
        domain => &settings.application.frontend_url,
    };

    Ok(EmailMessage {
        to: user.mailbox(),
        subject: title,
        html: render("confirmation_email.html", ctx.clone())?,
        text: render("confirmation_email.txt", ctx)?,
    })
}
