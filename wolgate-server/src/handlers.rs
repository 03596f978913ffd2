//! Public HTTP handlers: landing page, wake endpoint, health check.

use std::net::SocketAddr;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::Deserialize;

use wolgate_core::wol::MagicPacket;

use crate::pages;
use crate::state::SharedState;

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "wolgate-server"
    }))
}

/// Landing page with a wake button per roster entry.
pub async fn landing_handler(State(state): State<SharedState>) -> Html<String> {
    let config = state.config.read().await;
    Html(pages::landing_page(&config.servers))
}

#[derive(Deserialize)]
pub struct WakeParams {
    /// Roster entry ID or exact name; omitted picks the first entry.
    pub server: Option<String>,
}

/// Send a magic packet for the selected entry and return the waiting page.
pub async fn wake_handler(
    State(state): State<SharedState>,
    Query(params): Query<WakeParams>,
) -> Response {
    // Snapshot what we need so the packet send happens outside the lock.
    let (name, packet, target, page) = {
        let config = state.config.read().await;
        if config.servers.is_empty() {
            return (
                StatusCode::NOT_FOUND,
                "No servers are configured. Add one in the admin panel.",
            )
                .into_response();
        }
        let Some(server) = config.resolve_server(params.server.as_deref()) else {
            return (StatusCode::NOT_FOUND, "No server matches that name or id.").into_response();
        };
        (
            server.name.clone(),
            MagicPacket::new(server.mac_address),
            SocketAddr::from((server.broadcast_address, state.wol_port)),
            pages::waiting_page(server),
        )
    };

    match packet.send_to(target).await {
        Ok(()) => {
            tracing::info!("WOL magic packet sent for {name:?} via {target}");
            Html(page).into_response()
        }
        Err(e) => {
            tracing::error!("WOL send failed for {name:?}: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("WOL Error: could not send magic packet: {e}"),
            )
                .into_response()
        }
    }
}
