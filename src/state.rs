//! Shared application state. Every external-facing client is constructed
//! once at process start and injected here; handlers never reach for
//! module-level globals.

use sqlx::PgPool;
use std::sync::Arc;

use crate::providers::{AppleAuth, GoogleAuth};
use crate::storage::ObjectStore;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub store: Arc<ObjectStore>,
    pub apple: Arc<AppleAuth>,
    pub google: Arc<GoogleAuth>,
}
