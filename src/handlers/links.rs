use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::{
    error::{AppError, Result},
    state::AppState,
    validation::url::normalize_destination,
};

/// Hard cap on URLs per bulk request.
const BULK_MAX_URLS: usize = 1000;

/// The request payload for single-link conversion.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ConvertRequest {
    pub api_key: Option<String>,
    pub url: Option<String>,
}

/// The request payload for bulk conversion.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BulkRequest {
    pub api_key: Option<String>,
    pub urls: Option<Vec<String>>,
}

/// The response payload for single-link conversion.
#[derive(Serialize)]
pub struct ConvertResponse {
    pub success: bool,
    pub original: String,
    pub safelink: String,
}

/// One entry of a bulk conversion result.
#[derive(Serialize)]
pub struct BulkResult {
    pub original: String,
    pub safelink: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The response payload for bulk conversion.
#[derive(Serialize)]
pub struct BulkResponse {
    pub success: bool,
    pub total: usize,
    pub converted: usize,
    pub failed: usize,
    pub results: Vec<BulkResult>,
}

/// Query parameters of the quick-conversion endpoint.
#[derive(Deserialize)]
pub struct QuickQuery {
    pub format: Option<String>,
}

/// Compares a presented API key against the configured one in constant time.
fn check_api_key(state: &AppState, presented: Option<&str>) -> Result<()> {
    let presented = presented.ok_or(AppError::Unauthorized)?;
    let matches: bool = presented
        .as_bytes()
        .ct_eq(state.config.api_key.as_bytes())
        .into();
    if matches { Ok(()) } else { Err(AppError::Unauthorized) }
}

fn render_safelink(state: &AppState, slug: &str) -> String {
    format!("{}/go/{}", state.config.public_base_url, slug)
}

/// Converts a single destination URL into a safelink.
#[axum::debug_handler]
pub async fn convert(
    State(state): State<AppState>,
    Json(payload): Json<ConvertRequest>,
) -> Result<Json<ConvertResponse>> {
    check_api_key(&state, payload.api_key.as_deref())?;

    let raw = payload
        .url
        .ok_or_else(|| AppError::Validation("URL is required".to_string()))?;
    let destination = normalize_destination(&raw)?;
    let slug = state.vault.encrypt(&destination)?;

    tracing::info!("🔗 Safelink generated");
    Ok(Json(ConvertResponse {
        success: true,
        original: destination,
        safelink: render_safelink(&state, &slug),
    }))
}

/// Converts up to [`BULK_MAX_URLS`] destination URLs in one request.
///
/// Invalid entries fail individually; the batch itself still succeeds.
#[axum::debug_handler]
pub async fn bulk(
    State(state): State<AppState>,
    Json(payload): Json<BulkRequest>,
) -> Result<Json<BulkResponse>> {
    check_api_key(&state, payload.api_key.as_deref())?;

    let urls = payload
        .urls
        .ok_or_else(|| AppError::Validation("URLs array is required".to_string()))?;
    if urls.len() > BULK_MAX_URLS {
        return Err(AppError::Validation(format!(
            "Maximum {} URLs per request",
            BULK_MAX_URLS
        )));
    }

    let results: Vec<BulkResult> = urls
        .iter()
        .map(|raw| {
            match normalize_destination(raw).and_then(|dest| state.vault.encrypt(&dest)) {
                Ok(slug) => BulkResult {
                    original: raw.clone(),
                    safelink: render_safelink(&state, &slug),
                    success: true,
                    error: None,
                },
                Err(_) => BulkResult {
                    original: raw.clone(),
                    safelink: String::new(),
                    success: false,
                    error: Some("Invalid URL format".to_string()),
                },
            }
        })
        .collect();

    let converted = results.iter().filter(|r| r.success).count();
    let failed = results.len() - converted;
    tracing::info!(total = results.len(), converted, failed, "🔗 Bulk conversion completed");

    Ok(Json(BulkResponse {
        success: true,
        total: results.len(),
        converted,
        failed,
        results,
    }))
}

/// Quick path-based conversion: `GET /api/{key}/{url}`.
///
/// Defaults to redirecting to the generated safelink; `?format=json` and
/// `?format=text` return it instead.
#[axum::debug_handler]
pub async fn quick(
    State(state): State<AppState>,
    Path((key, target)): Path<(String, String)>,
    Query(query): Query<QuickQuery>,
) -> Result<Response> {
    check_api_key(&state, Some(&key))?;

    let destination = normalize_destination(&target)?;
    let slug = state.vault.encrypt(&destination)?;
    let safelink = render_safelink(&state, &slug);
    tracing::info!("🔗 Quick safelink generated");

    Ok(match query.format.as_deref() {
        Some("json") => Json(ConvertResponse {
            success: true,
            original: destination,
            safelink,
        })
        .into_response(),
        Some("text") => safelink.into_response(),
        _ => Redirect::temporary(&safelink).into_response(),
    })
}
