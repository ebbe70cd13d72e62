//! In-process event bus.
//!
//! Subscribers are registered explicitly on an [`EventBus`] instance that is handed to
//! whoever publishes; there is no global registry. `publish` awaits every subscriber of the
//! signal's kind one after another in registration order and stops at the first failure,
//! which is returned to the publisher.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, PoisonError, RwLock},
};

use entities::user;

use crate::users::types::ActivationRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    UserActivated,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalKind::UserActivated => write!(f, "user_activated"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserActivated {
    pub sender: &'static str,
    pub user: user::Model,
    pub request: ActivationRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    UserActivated(UserActivated),
}

impl Signal {
    pub fn kind(&self) -> SignalKind {
        match self {
            Signal::UserActivated(_) => SignalKind::UserActivated,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct HandlerError(pub String);

#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("Subscriber '{subscriber}' of {kind} failed: {source}")]
    Subscriber {
        subscriber: String,
        kind: SignalKind,
        #[source]
        source: HandlerError,
    },
}

#[async_trait::async_trait]
pub trait Subscriber: Send + Sync {
    async fn handle(&self, signal: &Signal) -> Result<(), HandlerError>;
}

/// Adapts a plain closure into a [`Subscriber`].
struct FnSubscriber<F>(F);

#[async_trait::async_trait]
impl<F> Subscriber for FnSubscriber<F>
where
    F: Fn(&Signal) -> Result<(), HandlerError> + Send + Sync,
{
    async fn handle(&self, signal: &Signal) -> Result<(), HandlerError> {
        (self.0)(signal)
    }
}

pub type Handler = Arc<dyn Subscriber>;

#[derive(Default)]
pub struct EventBus {
    subscribers: RwLock<HashMap<SignalKind, Vec<(String, Handler)>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, kind: SignalKind, name: impl Into<String>, handler: F)
    where
        F: Fn(&Signal) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.subscribe_with(kind, name, Arc::new(FnSubscriber(handler)));
    }

    pub fn subscribe_with(&self, kind: SignalKind, name: impl Into<String>, handler: Handler) {
        let name = name.into();
        tracing::event!(target: "backend", tracing::Level::DEBUG, "Subscribing '{}' to {}.", name, kind);
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(kind)
            .or_default()
            .push((name, handler));
    }

    pub fn subscriber_count(&self, kind: SignalKind) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .map_or(0, Vec::len)
    }

    /// Returns how many subscribers were called.
    #[tracing::instrument(name = "Publishing signal", skip(self, signal), fields(kind = %signal.kind()))]
    pub async fn publish(&self, signal: &Signal) -> Result<usize, SignalError> {
        // Handlers run without the lock held so they may subscribe further handlers.
        let handlers = self
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&signal.kind())
            .cloned()
            .unwrap_or_default();

        for (name, handler) in handlers.iter() {
            handler.handle(signal).await.map_err(|source| {
                tracing::event!(target: "backend", tracing::Level::ERROR, "Subscriber '{}' failed: {}", name, source);
                SignalError::Subscriber {
                    subscriber: name.clone(),
                    kind: signal.kind(),
                    source,
                }
            })?;
        }
        Ok(handlers.len())
    }
}
