//! Account activation: `serialize_request` -> `perform` -> `signal`.

use std::sync::Arc;

use db_adapters::user_adapter::{UserAdapter, UserMutation, UserQuery};
use sea_orm::DbConn;
use utils::auth::{
    tokens::{TokenCheck, TokenGenerator},
    uid::decode_uid,
};

use crate::{
    constants::{BLANK_FIELD_ERROR, INVALID_TOKEN_ERROR, INVALID_UID_ERROR, STALE_TOKEN_ERROR},
    pipelines::{ContextKey, ContextUpdate, PipelineContext, PipelineError, Step, ValidationError},
    signals::{EventBus, Signal, UserActivated},
    users::types::{ActivationData, ValidatedActivation},
};

/// Steps of the activation pipeline, in order.
pub fn steps(db: DbConn, tokens: Arc<TokenGenerator>, bus: Arc<EventBus>) -> Vec<Box<dyn Step>> {
    vec![
        Box::new(SerializeRequest::new(db.clone(), tokens)),
        Box::new(Perform::new(db)),
        Box::new(SignalActivation::new(bus)),
    ]
}

/// Resolves the user behind `uid` and proves `token` was issued for it.
pub struct SerializeRequest {
    db: DbConn,
    tokens: Arc<TokenGenerator>,
}

impl SerializeRequest {
    pub const NAME: &'static str = "user_activate::serialize_request";

    pub fn new(db: DbConn, tokens: Arc<TokenGenerator>) -> Self {
        Self { db, tokens }
    }
}

fn validate_fields(data: &ActivationData) -> Result<(), ValidationError> {
    let mut errors = ValidationError::default();
    if data.uid.trim().is_empty() {
        errors.add("uid", BLANK_FIELD_ERROR);
    }
    if data.token.trim().is_empty() {
        errors.add("token", BLANK_FIELD_ERROR);
    }
    match errors.is_empty() {
        true => Ok(()),
        false => Err(errors),
    }
}

#[async_trait::async_trait]
impl Step for SerializeRequest {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn requires(&self) -> &'static [ContextKey] {
        &[ContextKey::Request]
    }

    fn produces(&self) -> &'static [ContextKey] {
        &[ContextKey::Serializer]
    }

    async fn run(&self, context: &PipelineContext) -> Result<ContextUpdate, PipelineError> {
        let data = &context.request().data;
        validate_fields(data)?;

        // A malformed uid and an unknown user are reported the same way.
        let user = match decode_uid(&data.uid) {
            Ok(user_id) => UserAdapter::init(&self.db).get_by_id(user_id).await?,
            Err(e) => {
                tracing::event!(target: "backend", tracing::Level::DEBUG, "Cannot decode uid: {}", e);
                None
            }
        };
        let user = user.ok_or_else(|| ValidationError::non_field(INVALID_UID_ERROR))?;

        match self.tokens.check_token(&user, &data.token) {
            TokenCheck::Invalid => Err(ValidationError::non_field(INVALID_TOKEN_ERROR).into()),
            TokenCheck::Stale => Err(ValidationError::non_field(STALE_TOKEN_ERROR).into()),
            TokenCheck::Valid if user.is_active => {
                Err(ValidationError::non_field(STALE_TOKEN_ERROR).into())
            }
            TokenCheck::Valid => {
                Ok(ContextUpdate::default().with_serializer(ValidatedActivation { user }))
            }
        }
    }
}

/// Flips the validated user's active flag.
pub struct Perform {
    db: DbConn,
}

impl Perform {
    pub const NAME: &'static str = "user_activate::perform";

    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl Step for Perform {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn requires(&self) -> &'static [ContextKey] {
        &[ContextKey::Serializer]
    }

    fn produces(&self) -> &'static [ContextKey] {
        &[ContextKey::User]
    }

    async fn run(&self, context: &PipelineContext) -> Result<ContextUpdate, PipelineError> {
        let user = context.serializer(Self::NAME)?.user.clone();
        let user = UserAdapter::init(&self.db).activate(user).await?;
        tracing::event!(target: "backend", tracing::Level::INFO, user_id = user.id, "User was activated.");
        Ok(ContextUpdate::default().with_user(user))
    }
}

/// Publishes [`Signal::UserActivated`].
pub struct SignalActivation {
    bus: Arc<EventBus>,
}

impl SignalActivation {
    pub const NAME: &'static str = "user_activate::signal";

    pub fn new(bus: Arc<EventBus>) -> Self {
        Self { bus }
    }
}

#[async_trait::async_trait]
impl Step for SignalActivation {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn requires(&self) -> &'static [ContextKey] {
        &[ContextKey::Request, ContextKey::User]
    }

    fn produces(&self) -> &'static [ContextKey] {
        &[]
    }

    async fn run(&self, context: &PipelineContext) -> Result<ContextUpdate, PipelineError> {
        let signal = Signal::UserActivated(UserActivated {
            sender: Self::NAME,
            user: context.user(Self::NAME)?.clone(),
            request: context.request().clone(),
        });
        self.bus.publish(&signal).await?;
        Ok(ContextUpdate::default())
    }
}
