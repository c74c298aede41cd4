use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;

use super::{auth_lang, reconcile, respond};
use crate::error::ApiError;
use crate::providers::Provider;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppleSignIn {
    pub authorization_code: Option<String>,
    #[serde(default)]
    pub use_bundle_id: bool,
    pub notification_token: Option<String>,
}

/// POST /admin/auth/apple - continue with Apple
pub async fn continue_with_apple(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<AppleSignIn>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let code = body
        .authorization_code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::bad_request("Authorization code is required"))?;
    let lang = auth_lang(&headers);

    let identity = state.apple.exchange(&code, body.use_bundle_id).await?;
    let outcome = reconcile(
        &state.pool,
        identity,
        Provider::Apple,
        body.notification_token,
    )
    .await?;
    respond(outcome, lang)
}

/// POST /admin/auth/apple/callback - diagnostic echo
pub async fn apple_callback(
    Query(query): Query<HashMap<String, String>>,
    body: Option<Json<Value>>,
) -> Json<Value> {
    let body = body.map(|Json(v)| v).unwrap_or(Value::Null);
    tracing::info!(body = %body, query = ?query, "apple callback");
    Json(json!({ "body": body, "params": {}, "query": query }))
}
