use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, Result},
    session::protocol::DenialReason,
    state::AppState,
};

/// The request payload carrying a session token between steps.
#[derive(Deserialize, Debug)]
pub struct TokenRequest {
    pub token: String,
}

/// The response payload for session initialization.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: String,
    pub timer_secs: u64,
}

/// The response payload for step-1 completion.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Step1Response {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step2_url: Option<String>,
}

/// The response payload for the final redirect.
#[derive(Serialize)]
pub struct RedirectResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The response payload for step-2 validation, carrying the second countdown
/// length alongside the access check.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Step2Response {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<DenialReason>,
    pub timer_secs: u64,
}

/// Query parameters of step-2 validation (`?t=<token>`).
#[derive(Deserialize)]
pub struct Step2Query {
    pub t: Option<String>,
}

/// Mints a step-1 session token for a gated link.
///
/// The slug is validated (decrypt-and-discard) without exposing the URL; an
/// invalid slug yields the collapsed tamper error, never a hint of why.
#[axum::debug_handler]
pub async fn init_session(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<SessionResponse>> {
    if !state.vault.is_valid(&slug) {
        return Err(AppError::InvalidOrTamperedLink);
    }

    let token = state.sessions.create_session(&slug);
    tracing::debug!("Gate session created");
    Ok(Json(SessionResponse {
        token,
        timer_secs: state.config.page1_timer_secs,
    }))
}

/// Completes step 1, returning the step-2 URL with the rotated token.
///
/// Failures carry no reason; the UI routes the user back to the start.
#[axum::debug_handler]
pub async fn complete_step1(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(payload): Json<TokenRequest>,
) -> Json<Step1Response> {
    match state.sessions.complete_step1(&payload.token, &slug) {
        Some(next_token) => Json(Step1Response {
            success: true,
            step2_url: Some(format!("/go/{}/step2?t={}", slug, next_token)),
        }),
        None => {
            tracing::debug!("Step-1 completion rejected");
            Json(Step1Response {
                success: false,
                step2_url: None,
            })
        }
    }
}

/// Read-only step-2 access check for the second interstitial page.
///
/// The structured reason is for diagnostics; the UI only branches on `valid`.
#[axum::debug_handler]
pub async fn validate_step2(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<Step2Query>,
) -> Json<Step2Response> {
    let validation = state.sessions.validate_step2(query.t.as_deref(), &slug);
    if !validation.valid {
        tracing::debug!(reason = ?validation.reason, "Step-2 validation denied");
    }
    Json(Step2Response {
        valid: validation.valid,
        reason: validation.reason,
        timer_secs: state.config.page2_timer_secs,
    })
}

/// Final redirect: validate, decrypt, then consume, in that order.
///
/// The token is only marked used after its payload was successfully acted
/// upon; a crash between decrypt and consume permits at most one extra replay
/// inside the expiry window, never an indefinite bypass.
#[axum::debug_handler]
pub async fn final_redirect(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(payload): Json<TokenRequest>,
) -> Json<RedirectResponse> {
    let validation = state.sessions.validate_step2(Some(&payload.token), &slug);
    if !validation.valid {
        tracing::debug!(reason = ?validation.reason, "Redirect denied");
        return Json(RedirectResponse {
            success: false,
            url: None,
            error: Some("Session expired or invalid".to_string()),
        });
    }

    let url = match state.vault.decrypt(&slug) {
        Ok(url) => url,
        Err(_) => {
            return Json(RedirectResponse {
                success: false,
                url: None,
                error: Some("Invalid link".to_string()),
            });
        }
    };

    state.sessions.consume(&payload.token);
    tracing::info!("✅ Gate passed, destination released");

    Json(RedirectResponse {
        success: true,
        url: Some(url),
        error: None,
    })
}
