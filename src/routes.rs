//! Router composition. Pure dispatch; no logic beyond the health probe.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::users;
use crate::store::SharedStore;

pub fn app(store: SharedStore) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api", user_routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

fn user_routes() -> Router<SharedStore> {
    Router::new()
        .route("/", get(users::list_users).post(users::create_user))
        .route("/:id", patch(users::update_user).delete(users::delete_user))
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": "Roster API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "users": "/api[/:id]",
            "health": "/health",
        },
    }))
}

async fn health(State(store): State<SharedStore>) -> (StatusCode, Json<Value>) {
    let now = chrono::Utc::now();
    match store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "database": "ok", "timestamp": now })),
        ),
        Err(error) => {
            tracing::error!(%error, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "database": "unavailable", "timestamp": now })),
            )
        }
    }
}
