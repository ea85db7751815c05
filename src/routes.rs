// src/routes.rs

use axum::{
    Router,
    http::Method,
    middleware,
    routing::{delete, get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, dashboard, jobs},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, jobs, dashboard, admin).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (store façade, config, generation client).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/challenge", get(auth::get_challenge))
        .route("/login", post(auth::login));

    let job_routes = Router::new()
        .route("/", get(jobs::list_jobs))
        .route("/{id}", get(jobs::get_job))
        .route("/{id}/export", get(jobs::export_job))
        // Protected job routes
        .merge(
            Router::new()
                .route("/", post(jobs::create_job))
                .route("/{id}", delete(jobs::delete_job))
                .route("/{id}/publish", put(jobs::toggle_publish))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let dashboard_routes = Router::new()
        .route("/", get(dashboard::get_dashboard))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let admin_routes = Router::new()
        .route("/keys", get(admin::list_api_keys).post(admin::add_api_key))
        .route("/keys/bulk", post(admin::upload_api_keys))
        .route("/keys/reset", post(admin::reset_api_key_stats))
        .route("/keys/{key}", delete(admin::delete_api_key))
        .route("/users", get(admin::list_users).post(admin::create_user))
        .route("/users/bulk", post(admin::upload_users))
        .route(
            "/users/{id}",
            put(admin::update_user).delete(admin::delete_user),
        )
        .route(
            "/settings",
            get(admin::get_settings).put(admin::save_settings),
        )
        .route("/settings/test", post(admin::test_connection))
        .route("/logs", get(admin::list_logs).delete(admin::clear_logs))
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/jobs", job_routes)
        .nest("/api/dashboard", dashboard_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
