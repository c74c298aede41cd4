use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use medina_api::config;
use medina_api::database;
use medina_api::handlers::{auth, media, resource as resource_handlers};
use medina_api::providers::{AppleAuth, GoogleAuth};
use medina_api::resource::defs;
use medina_api::state::AppState;
use medina_api::storage::ObjectStore;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = config::config();
    tracing::info!("Starting Medina API on port {}", config.server.port);

    let pool = database::connect_pool()
        .await
        .unwrap_or_else(|e| panic!("database setup failed: {}", e));

    // External clients are built once here and travel through state.
    let http = reqwest::Client::new();
    let store = Arc::new(ObjectStore::connect(&config.storage).await);
    let apple = Arc::new(AppleAuth::new(http.clone(), config.apple.clone()));
    let google = Arc::new(GoogleAuth::new(http, config.google.clone()));

    let state = AppState {
        pool,
        store,
        apple,
        google,
    };
    let app = app(state);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("listening on http://{}", bind_addr);
    axum::serve(listener, app).await.expect("server");
}

fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Provider sign-in
        .merge(auth_routes())
        // Generic resource endpoints
        .nest("/admin/banners", resource_handlers::routes(&defs::BANNERS))
        .nest("/admin/categories", resource_handlers::routes(&defs::CATEGORIES))
        .nest("/admin/products", resource_handlers::routes(&defs::PRODUCTS))
        // Media relay
        .route(
            "/admin/media/:folder",
            post(media::upload).delete(media::remove),
        )
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/auth/apple", post(auth::apple::continue_with_apple))
        .route("/admin/auth/apple/callback", post(auth::apple::apple_callback))
        .route("/admin/auth/google", post(auth::google::continue_with_google))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Medina API",
            "version": version,
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/admin/auth/apple, /admin/auth/apple/callback, /admin/auth/google",
                "resources": "/admin/{banners,categories,products}[/:id]",
                "media": "/admin/media/:folder",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match database::health_check(&state.pool).await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "message": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
