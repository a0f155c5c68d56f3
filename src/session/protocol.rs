use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::crypto::mac::TokenSigner;
use crate::session::replay::ReplayStore;
use crate::session::token::{self, SessionPayload};

/// Why a step-2 validation was denied. Diagnostic only; never rendered to the
/// user beyond routing them back to step 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    NoToken,
    InvalidToken,
    WrongLink,
    Step1NotCompleted,
    Expired,
    AlreadyUsed,
}

/// Result of a step-2 validation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Step2Validation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<DenialReason>,
}

impl Step2Validation {
    fn valid() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    fn denied(reason: DenialReason) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
        }
    }
}

/// The gate session protocol: a stateless signed-token state machine tracking
/// `Step1Pending -> Step1Completed -> Consumed`.
///
/// No per-session state is held server-side; everything round-trips through the
/// client inside the token. The replay store is the single piece of shared
/// mutable state, and only terminal consumption touches it.
pub struct GateSessions {
    signer: TokenSigner,
    expiry_ms: i64,
    replay: Arc<dyn ReplayStore>,
}

impl GateSessions {
    /// Creates the protocol instance from the token-signing secret, the expiry
    /// window in seconds, and an injected replay store.
    pub fn new(token_secret: &str, expiry_secs: i64, replay: Arc<dyn ReplayStore>) -> Self {
        Self {
            signer: TokenSigner::new(token_secret),
            expiry_ms: expiry_secs * 1000,
            replay,
        }
    }

    fn is_expired(&self, payload: &SessionPayload) -> bool {
        Utc::now().timestamp_millis() - payload.created_at > self.expiry_ms
    }

    /// Mints a `Step1Pending` token for a slug. Pure construction, no failure mode.
    pub fn create_session(&self, slug: &str) -> String {
        let payload = SessionPayload {
            slug: slug.to_string(),
            step1_completed: false,
            created_at: Utc::now().timestamp_millis(),
            nonce: token::generate_nonce(),
        };
        token::encode(&payload, &self.signer)
    }

    /// Transitions a session to `Step1Completed`.
    ///
    /// Returns `None` if the token does not verify, is scoped to a different
    /// slug, or has expired. On success a new token is minted with a freshly
    /// rotated nonce, so the step-1 token can never re-mint step-2 access after
    /// the step-2 token is consumed.
    pub fn complete_step1(&self, token: &str, slug: &str) -> Option<String> {
        let payload = token::decode(token, &self.signer)?;

        if payload.slug != slug || self.is_expired(&payload) {
            return None;
        }

        let next = SessionPayload {
            slug: payload.slug,
            step1_completed: true,
            created_at: payload.created_at,
            nonce: token::generate_nonce(),
        };
        Some(token::encode(&next, &self.signer))
    }

    /// Read-only step-2 access check. The first failing check wins.
    pub fn validate_step2(&self, token: Option<&str>, slug: &str) -> Step2Validation {
        let Some(token) = token else {
            return Step2Validation::denied(DenialReason::NoToken);
        };

        let Some(payload) = token::decode(token, &self.signer) else {
            return Step2Validation::denied(DenialReason::InvalidToken);
        };

        if payload.slug != slug {
            return Step2Validation::denied(DenialReason::WrongLink);
        }

        if !payload.step1_completed {
            return Step2Validation::denied(DenialReason::Step1NotCompleted);
        }

        if self.is_expired(&payload) {
            return Step2Validation::denied(DenialReason::Expired);
        }

        if self.replay.has_consumed(&payload.nonce) {
            return Step2Validation::denied(DenialReason::AlreadyUsed);
        }

        Step2Validation::valid()
    }

    /// Records a token's nonce in the replay guard.
    ///
    /// Returns `false` only if the token does not verify. Insertion is
    /// idempotent; a second logical use is rejected by `validate_step2`, which
    /// must run before this at every consumption site.
    pub fn consume(&self, token: &str) -> bool {
        let Some(payload) = token::decode(token, &self.signer) else {
            return false;
        };

        self.replay.mark_consumed(&payload.nonce);
        tracing::debug!("Gate session consumed");
        true
    }
}
