//! enforcement-service: server-side authorization enforcement.
//!
//! Every privileged mutation is re-validated here against the caller's
//! token claims and tenant scope, independently of whatever the client
//! gate allowed; client gates are UX only. Each successful mutation
//! writes exactly one audit record before the response.

pub mod audit;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod store;
pub mod token;

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Json, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::middleware::auth_middleware;
use crate::store::DirectoryStore;
use crate::token::TokenService;

#[derive(Clone)]
pub struct AppState {
    pub tokens: TokenService,
    pub store: Arc<dyn DirectoryStore>,
}

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/admin/users/:id/role", post(handlers::users::set_user_role))
        .route(
            "/admin/users/:id/approval",
            post(handlers::users::approve_user),
        )
        .route("/admin/users/:id", delete(handlers::users::delete_user))
        .route("/classes", post(handlers::classes::create_class))
        .route(
            "/classes/:id",
            put(handlers::classes::update_class).delete(handlers::classes::delete_class),
        )
        .route("/classes/:id/students", post(handlers::classes::add_student))
        .route(
            "/classes/:id/students/:student_id",
            delete(handlers::classes::remove_student),
        )
        .route(
            "/classes/:id/grades/release",
            post(handlers::grades::release_grades),
        )
        .route("/tasks", post(handlers::tasks::create_task))
        .route(
            "/tasks/:id",
            put(handlers::tasks::update_task).delete(handlers::tasks::delete_task),
        )
        .route("/admin/export", get(handlers::admin::export_school))
        .route("/admin/stats", get(handlers::admin::school_stats))
        .route("/admin/audit", get(handlers::admin::list_audit))
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
