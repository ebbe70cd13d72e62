use std::{collections::BTreeSet, fmt};

use entities::user;

use crate::{
    pipelines::PipelineError,
    users::types::{ActivationRequest, ValidatedActivation},
};

/// Slots of a [`PipelineContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContextKey {
    Request,
    Serializer,
    User,
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextKey::Request => write!(f, "request"),
            ContextKey::Serializer => write!(f, "serializer"),
            ContextKey::User => write!(f, "user"),
        }
    }
}

/// Context shared by the steps of one pipeline run.
///
/// Starts with the request only and grows as steps return [`ContextUpdate`]s.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineContext {
    request: ActivationRequest,
    serializer: Option<ValidatedActivation>,
    user: Option<user::Model>,
}

impl PipelineContext {
    pub fn new(request: ActivationRequest) -> Self {
        Self {
            request,
            serializer: None,
            user: None,
        }
    }

    pub fn has(&self, key: ContextKey) -> bool {
        match key {
            ContextKey::Request => true,
            ContextKey::Serializer => self.serializer.is_some(),
            ContextKey::User => self.user.is_some(),
        }
    }

    pub fn request(&self) -> &ActivationRequest {
        &self.request
    }

    pub fn serializer(&self, step: &'static str) -> Result<&ValidatedActivation, PipelineError> {
        self.serializer.as_ref().ok_or(PipelineError::MissingKey {
            step,
            key: ContextKey::Serializer,
        })
    }

    pub fn user(&self, step: &'static str) -> Result<&user::Model, PipelineError> {
        self.user.as_ref().ok_or(PipelineError::MissingKey {
            step,
            key: ContextKey::User,
        })
    }

    pub fn into_user(self) -> Option<user::Model> {
        self.user
    }

    /// Right-biased: slots present in `update` replace the current ones.
    pub fn merge(mut self, update: ContextUpdate) -> Self {
        if let Some(request) = update.request {
            self.request = request;
        }
        if let Some(serializer) = update.serializer {
            self.serializer = Some(serializer);
        }
        if let Some(user) = update.user {
            self.user = Some(user);
        }
        self
    }
}

/// Partial context returned by a step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextUpdate {
    pub request: Option<ActivationRequest>,
    pub serializer: Option<ValidatedActivation>,
    pub user: Option<user::Model>,
}

impl ContextUpdate {
    pub fn with_serializer(mut self, serializer: ValidatedActivation) -> Self {
        self.serializer = Some(serializer);
        self
    }

    pub fn with_user(mut self, user: user::Model) -> Self {
        self.user = Some(user);
        self
    }

    pub fn keys(&self) -> Vec<ContextKey> {
        let mut keys = Vec::new();
        if self.request.is_some() {
            keys.push(ContextKey::Request);
        }
        if self.serializer.is_some() {
            keys.push(ContextKey::Serializer);
        }
        if self.user.is_some() {
            keys.push(ContextKey::User);
        }
        keys
    }
}

#[async_trait::async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &'static str;
    /// Keys that must be in the context before this step runs.
    fn requires(&self) -> &'static [ContextKey];
    /// Keys this step may return.
    fn produces(&self) -> &'static [ContextKey];
    async fn run(&self, context: &PipelineContext) -> Result<ContextUpdate, PipelineError>;
}

/// Rejects step lists where a step requires a key that no earlier step produces.
pub fn check_composition(steps: &[Box<dyn Step>]) -> Result<(), PipelineError> {
    let mut available = BTreeSet::from([ContextKey::Request]);
    for step in steps {
        if let Some(key) = step
            .requires()
            .iter()
            .find(|key| !available.contains(*key))
        {
            return Err(PipelineError::MissingKey {
                step: step.name(),
                key: *key,
            });
        }
        available.extend(step.produces().iter().copied());
    }
    Ok(())
}

pub struct Pipeline {
    request: ActivationRequest,
    steps: Vec<Box<dyn Step>>,
}

impl Pipeline {
    pub fn new(
        request: ActivationRequest,
        steps: Vec<Box<dyn Step>>,
    ) -> Result<Self, PipelineError> {
        check_composition(&steps)?;
        Ok(Self { request, steps })
    }

    /// Runs the steps in order. The first failing step aborts the run; earlier steps are
    /// not rolled back.
    #[tracing::instrument(name = "Running pipeline", skip(self), fields(request_id = %self.request.request_id))]
    pub async fn run(self) -> Result<PipelineContext, PipelineError> {
        let mut context = PipelineContext::new(self.request);
        for step in self.steps.iter() {
            if let Some(key) = step.requires().iter().find(|key| !context.has(**key)) {
                return Err(PipelineError::MissingKey {
                    step: step.name(),
                    key: *key,
                });
            }

            let update = match step.run(&context).await {
                Ok(update) => update,
                Err(e) => {
                    tracing::event!(target: "backend", tracing::Level::INFO, "Step '{}' failed: {}", step.name(), e);
                    return Err(e);
                }
            };
            if let Some(key) = update
                .keys()
                .into_iter()
                .find(|key| !step.produces().contains(key))
            {
                return Err(PipelineError::UndeclaredKey {
                    step: step.name(),
                    key,
                });
            }

            tracing::event!(target: "backend", tracing::Level::DEBUG, "Step '{}' done.", step.name());
            context = context.merge(update);
        }
        Ok(context)
    }
}
