//! wolgate-server: HTTP Wake-on-LAN gateway
//!
//! Serves three surfaces from one router:
//! - A public landing page and `/wake` endpoint that sends a magic packet
//!   and returns a timed redirect page
//! - A password (+ optional TOTP) protected admin panel over the roster
//! - A JSON health check

pub mod admin;
pub mod handlers;
pub mod pages;
pub mod session;
pub mod state;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::state::SharedState;

/// Build the full gateway router over shared state.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(handlers::landing_handler))
        .route("/wake", get(handlers::wake_handler))
        .route("/health", get(handlers::health_handler))
        .route("/admin/login", get(admin::login_page).post(admin::login_submit))
        .route("/admin/logout", get(admin::logout))
        .route("/admin/", get(admin::dashboard))
        .route(
            "/admin/server/add",
            get(admin::add_server_page).post(admin::add_server_submit),
        )
        .route(
            "/admin/server/edit/{id}",
            get(admin::edit_server_page).post(admin::edit_server_submit),
        )
        .route("/admin/server/delete/{id}", post(admin::delete_server))
        .route(
            "/admin/security",
            get(admin::security_page).post(admin::security_submit),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
