use std::path::Path;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::services::ServeDir;

use crate::{handlers, system};

/// Конфигурация всех роутов приложения
pub fn configure_routes(files_dir: &Path) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // SYSTEM AUTH ROUTES (PUBLIC)
        // ========================================
        .route(
            "/api/system/auth/login",
            post(system::handlers::auth::login),
        )
        .route(
            "/api/system/auth/refresh",
            post(system::handlers::auth::refresh),
        )
        .route(
            "/api/system/auth/logout",
            post(system::handlers::auth::logout),
        )
        // System auth routes (protected)
        .route(
            "/api/system/auth/me",
            get(system::handlers::auth::current_agent)
                .layer(middleware::from_fn(system::auth::middleware::require_auth)),
        )
        // System agents management (admin only)
        .route(
            "/api/system/agents",
            get(system::handlers::agents::list)
                .post(system::handlers::agents::create)
                .layer(middleware::from_fn(system::auth::middleware::require_admin)),
        )
        .route(
            "/api/system/agents/:id",
            get(system::handlers::agents::get_by_id)
                .put(system::handlers::agents::update)
                .delete(system::handlers::agents::delete)
                .layer(middleware::from_fn(system::auth::middleware::require_admin)),
        )
        .route(
            "/api/system/agents/:id/change-password",
            post(system::handlers::agents::change_password)
                .layer(middleware::from_fn(system::auth::middleware::require_auth)),
        )
        // ========================================
        // CONSUMER PIPELINE ROUTES (AUTH REQUIRED)
        // ========================================
        .route(
            "/api/consumers",
            get(handlers::a001_consumer::list)
                .post(handlers::a001_consumer::register)
                .layer(middleware::from_fn(system::auth::middleware::require_auth)),
        )
        .route(
            "/api/consumers/export",
            get(handlers::a001_consumer::export)
                .layer(middleware::from_fn(system::auth::middleware::require_auth)),
        )
        .route(
            "/api/consumers/:id",
            get(handlers::a001_consumer::get_by_id)
                .layer(middleware::from_fn(system::auth::middleware::require_auth)),
        )
        .route(
            "/api/consumers/:id/actions",
            get(handlers::a001_consumer::available_actions)
                .post(handlers::a001_consumer::apply_action)
                .layer(middleware::from_fn(system::auth::middleware::require_auth)),
        )
        .route(
            "/api/consumers/:id/evaluation",
            post(handlers::a001_consumer::attach_evaluation)
                .layer(middleware::from_fn(system::auth::middleware::require_auth)),
        )
        .route(
            "/api/consumers/:id/proposal",
            post(handlers::a001_consumer::attach_proposal)
                .layer(middleware::from_fn(system::auth::middleware::require_auth)),
        )
        .route(
            "/api/consumers/:id/payment/enable",
            post(handlers::a001_consumer::enable_payment)
                .layer(middleware::from_fn(system::auth::middleware::require_auth)),
        )
        .route(
            "/api/consumers/:id/payment/paid",
            post(handlers::a001_consumer::mark_paid)
                .layer(middleware::from_fn(system::auth::middleware::require_auth)),
        )
        .route(
            "/api/consumers/:id/comments",
            post(handlers::a001_consumer::add_comment)
                .layer(middleware::from_fn(system::auth::middleware::require_auth)),
        )
        .route(
            "/api/consumers/:id/worklist",
            put(handlers::a001_consumer::save_work_list)
                .layer(middleware::from_fn(system::auth::middleware::require_auth)),
        )
        // ========================================
        // FILE STORAGE
        // ========================================
        .route(
            "/api/files",
            post(handlers::files::upload)
                .layer(middleware::from_fn(system::auth::middleware::require_auth)),
        )
        .nest_service("/api/files/download", ServeDir::new(files_dir))
}
