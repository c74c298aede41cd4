use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use super::{auth_lang, reconcile, respond};
use crate::error::ApiError;
use crate::providers::Provider;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleSignIn {
    pub google_access_token: Option<String>,
    pub notification_token: Option<String>,
}

/// POST /admin/auth/google - continue with Google
pub async fn continue_with_google(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<GoogleSignIn>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let access_token = body
        .google_access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::bad_request("Google access token is required"))?;
    let lang = auth_lang(&headers);

    let identity = state.google.exchange(&access_token).await?;
    let outcome = reconcile(
        &state.pool,
        identity,
        Provider::Google,
        body.notification_token,
    )
    .await?;
    respond(outcome, lang)
}
