//! Single-use account tokens.
//!
//! A token is a PASETO `v4.local` token whose claims hold the user id, an expiry and a
//! fingerprint of the user fields that change once the token has been used (password,
//! last login, active flag, email). Nothing is stored server side: changing any of those
//! fields makes every previously issued token stale.

use chrono::{DateTime, Duration, Utc};
use common::settings::types::Settings;
use entities::user;
use pasetors::{
    claims::Claims,
    keys::SymmetricKey,
    local,
    token::UntrustedToken,
    version4::{LocalToken, V4},
    Local,
};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

const USER_ID_CLAIM: &str = "user_id";
const STATE_CLAIM: &str = "state";
const PURPOSE_CLAIM: &str = "purpose";

pub const ACTIVATION_PURPOSE: &str = "user_activation";

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Secret key must be 32 bytes long: {0}")]
    InvalidKey(String),
    #[error("Cannot issue token: {0}")]
    Issue(String),
}

/// Outcome of checking a token against a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCheck {
    Valid,
    /// Issued for this user, but expired or the bound fields changed since issuance.
    Stale,
    /// Not a token of ours, or issued for someone else.
    Invalid,
}

pub struct TokenGenerator {
    key: SymmetricKey<V4>,
    implicit_assertion: Vec<u8>,
    expiration: Duration,
    purpose: &'static str,
}

impl TokenGenerator {
    pub fn new(
        secret_key: &[u8],
        implicit_assertion: &[u8],
        expiration: Duration,
        purpose: &'static str,
    ) -> Result<Self, TokenError> {
        let key = SymmetricKey::<V4>::from(secret_key)
            .map_err(|e| TokenError::InvalidKey(e.to_string()))?;
        Ok(Self {
            key,
            implicit_assertion: implicit_assertion.to_vec(),
            expiration,
            purpose,
        })
    }

    pub fn for_activation(settings: &Settings) -> Result<Self, TokenError> {
        Self::new(
            settings.secret.secret_key.as_bytes(),
            settings.secret.hmac_secret.as_bytes(),
            Duration::minutes(settings.secret.token_expiration),
            ACTIVATION_PURPOSE,
        )
    }

    #[tracing::instrument(name = "Issuing user token", skip(self, user), fields(user_id = %user.id))]
    pub fn make_token(&self, user: &user::Model) -> Result<String, TokenError> {
        self.make_token_with_expiry(user, Utc::now() + self.expiration)
    }

    fn make_token_with_expiry(
        &self,
        user: &user::Model,
        expires_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let issue = |e: pasetors::errors::Error| TokenError::Issue(e.to_string());

        let mut claims = Claims::new().map_err(issue)?;
        claims.expiration(&expires_at.to_rfc3339()).map_err(issue)?;
        claims
            .add_additional(USER_ID_CLAIM, serde_json::json!(user.id))
            .map_err(issue)?;
        claims
            .add_additional(STATE_CLAIM, serde_json::json!(state_fingerprint(user)))
            .map_err(issue)?;
        claims
            .add_additional(PURPOSE_CLAIM, serde_json::json!(self.purpose))
            .map_err(issue)?;

        local::encrypt(
            &self.key,
            &claims,
            None,
            Some(self.implicit_assertion.as_slice()),
        )
        .map_err(issue)
    }

    #[tracing::instrument(name = "Checking user token", skip(self, user, token), fields(user_id = %user.id))]
    pub fn check_token(&self, user: &user::Model, token: &str) -> TokenCheck {
        let untrusted = match UntrustedToken::<Local, V4>::try_from(token) {
            Ok(untrusted) => untrusted,
            Err(e) => {
                tracing::event!(target: "backend", tracing::Level::DEBUG, "Malformed token: {:?}", e);
                return TokenCheck::Invalid;
            }
        };
        let trusted = match LocalToken::decrypt(
            &self.key,
            &untrusted,
            None,
            Some(self.implicit_assertion.as_slice()),
        ) {
            Ok(trusted) => trusted,
            Err(e) => {
                tracing::event!(target: "backend", tracing::Level::DEBUG, "Cannot decrypt token: {:?}", e);
                return TokenCheck::Invalid;
            }
        };
        let claims = match Claims::from_string(trusted.payload()) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::event!(target: "backend", tracing::Level::DEBUG, "Unreadable claims: {:?}", e);
                return TokenCheck::Invalid;
            }
        };

        let purpose = claims.get_claim(PURPOSE_CLAIM).and_then(|p| p.as_str());
        let user_id = claims.get_claim(USER_ID_CLAIM).and_then(|id| id.as_i64());
        if purpose != Some(self.purpose) || user_id != Some(i64::from(user.id)) {
            return TokenCheck::Invalid;
        }

        let not_expired = claims
            .get_claim("exp")
            .and_then(|exp| exp.as_str())
            .and_then(|exp| DateTime::parse_from_rfc3339(exp).ok())
            .is_some_and(|exp| exp > Utc::now());
        if !not_expired {
            return TokenCheck::Stale;
        }

        let fingerprint = claims
            .get_claim(STATE_CLAIM)
            .and_then(|state| state.as_str())
            .unwrap_or_default();
        let current = state_fingerprint(user);
        if bool::from(fingerprint.as_bytes().ct_eq(current.as_bytes())) {
            TokenCheck::Valid
        } else {
            TokenCheck::Stale
        }
    }
}

/// Hash of the user fields a token is bound to.
fn state_fingerprint(user: &user::Model) -> String {
    let last_login = user
        .last_login
        .map(|last_login| last_login.timestamp_micros().to_string())
        .unwrap_or_default();

    let mut hasher = Sha256::new();
    for part in [
        user.id.to_string(),
        user.password.clone(),
        last_login,
        user.is_active.to_string(),
        user.email.clone(),
    ] {
        hasher.update(part.as_bytes());
        hasher.update([0]);
    }
    hex::encode(hasher.finalize())
}
