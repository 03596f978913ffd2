//! Admin panel routes: login, roster CRUD, security settings.
//!
//! Every route here is behind [`require_admin`]: a disabled panel is a hard
//! 403 regardless of session state, and a missing session redirects to the
//! login page. Login failures all render the same generic message so a
//! probing client cannot tell which field was wrong.

use std::net::Ipv4Addr;

use axum::Form;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{AppendHeaders, Html, IntoResponse, Redirect, Response};
use qrcode::QrCode;
use qrcode::render::svg;
use serde::Deserialize;

use wolgate_core::config::{ConfigError, ServerEntry};
use wolgate_core::creds;
use wolgate_core::totp::{self, Totp};
use wolgate_core::wol::MacAddr;

use crate::pages;
use crate::session;
use crate::state::{AppState, SharedState};

const GENERIC_LOGIN_ERROR: &str = "Invalid username or password";
const PANEL_DISABLED: &str = "Admin panel is disabled. Enable it in the credentials file.";

/// Gate for every admin operation: panel enabled first, session second.
async fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), Response> {
    if !state.creds.read().await.enabled {
        return Err((StatusCode::FORBIDDEN, PANEL_DISABLED).into_response());
    }
    let logged_in = match session::session_token(headers) {
        Some(token) => state.sessions.is_valid(&token).await,
        None => false,
    };
    if logged_in {
        Ok(())
    } else {
        Err(Redirect::to("/admin/login").into_response())
    }
}

fn internal_error(e: impl std::fmt::Display) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {e}")).into_response()
}

#[derive(Deserialize)]
pub struct NoticeParams {
    pub notice: Option<String>,
}

// -- Login / logout --

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub totp_code: String,
}

pub async fn login_page(State(state): State<SharedState>) -> Response {
    let creds = state.creds.read().await;
    if !creds.enabled {
        return (StatusCode::FORBIDDEN, PANEL_DISABLED).into_response();
    }
    Html(pages::login_page(None, creds.totp_enabled)).into_response()
}

pub async fn login_submit(
    State(state): State<SharedState>,
    Form(form): Form<LoginForm>,
) -> Response {
    let creds = state.creds.read().await.clone();
    if !creds.enabled {
        return (StatusCode::FORBIDDEN, PANEL_DISABLED).into_response();
    }

    let first_factor = creds.verify_login(&form.username, &form.password);
    let second_factor = if creds.totp_enabled {
        Totp::new(&creds.totp_secret, &creds.username)
            .map(|t| t.verify(&form.totp_code))
            .unwrap_or(false)
    } else {
        true
    };

    if !(first_factor && second_factor) {
        tracing::warn!("failed admin login for {:?}", form.username);
        return Html(pages::login_page(Some(GENERIC_LOGIN_ERROR), creds.totp_enabled))
            .into_response();
    }

    let token = state.sessions.create().await;
    tracing::info!("admin {:?} logged in", creds.username);
    (
        AppendHeaders([(header::SET_COOKIE, session::session_cookie(&token))]),
        Redirect::to("/admin/"),
    )
        .into_response()
}

pub async fn logout(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    if let Some(token) = session::session_token(&headers) {
        state.sessions.remove(&token).await;
    }
    (
        AppendHeaders([(header::SET_COOKIE, session::clear_session_cookie())]),
        Redirect::to("/admin/login"),
    )
        .into_response()
}

// -- Dashboard --

pub async fn dashboard(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(params): Query<NoticeParams>,
) -> Response {
    if let Err(resp) = require_admin(&state, &headers).await {
        return resp;
    }
    let config = state.config.read().await;
    let notice = params.notice.as_deref().and_then(pages::notice_text);
    Html(pages::dashboard_page(&config.servers, config.port, notice)).into_response()
}

// -- Roster CRUD --

#[derive(Deserialize)]
pub struct ServerForm {
    pub name: String,
    pub mac: String,
    #[serde(default)]
    pub broadcast: String,
    pub url: String,
    pub wait_time: String,
}

/// Turn a submitted form into a validated entry, with user-facing errors.
fn parse_server_form(form: &ServerForm) -> Result<ServerEntry, String> {
    let mac: MacAddr = form.mac.trim().parse().map_err(|e| format!("{e}"))?;
    let broadcast_raw = form.broadcast.trim();
    let broadcast: Ipv4Addr = if broadcast_raw.is_empty() {
        Ipv4Addr::BROADCAST
    } else {
        broadcast_raw
            .parse()
            .map_err(|_| format!("Invalid broadcast address {broadcast_raw:?}"))?
    };
    let wait: u32 = form
        .wait_time
        .trim()
        .parse()
        .map_err(|_| "Wait time must be a whole number of seconds".to_string())?;
    if wait == 0 {
        return Err("Wait time must be greater than zero".to_string());
    }
    if form.name.trim().is_empty() {
        return Err("Server name must not be empty".to_string());
    }
    if form.url.trim().is_empty() {
        return Err("Site URL must not be empty".to_string());
    }
    Ok(ServerEntry::new(
        form.name.trim(),
        mac,
        broadcast,
        form.url.trim(),
        wait,
    ))
}

pub async fn add_server_page(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    if let Err(resp) = require_admin(&state, &headers).await {
        return resp;
    }
    Html(pages::server_form_page("Add", None, None)).into_response()
}

pub async fn add_server_submit(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Form(form): Form<ServerForm>,
) -> Response {
    if let Err(resp) = require_admin(&state, &headers).await {
        return resp;
    }
    let entry = match parse_server_form(&form) {
        Ok(entry) => entry,
        Err(e) => return Html(pages::server_form_page("Add", None, Some(&e))).into_response(),
    };
    match state.update_config(|config| config.add_server(entry)).await {
        Ok(()) => Redirect::to("/admin/?notice=server-added").into_response(),
        Err(e @ ConfigError::DuplicateName(_)) => {
            Html(pages::server_form_page("Add", None, Some(&e.to_string()))).into_response()
        }
        Err(e) => internal_error(e),
    }
}

pub async fn edit_server_page(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = require_admin(&state, &headers).await {
        return resp;
    }
    let config = state.config.read().await;
    match config.get_server(&id) {
        Some(server) => Html(pages::server_form_page("Edit", Some(server), None)).into_response(),
        None => (StatusCode::NOT_FOUND, "Unknown server").into_response(),
    }
}

pub async fn edit_server_submit(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Form(form): Form<ServerForm>,
) -> Response {
    if let Err(resp) = require_admin(&state, &headers).await {
        return resp;
    }
    let current = state.config.read().await.get_server(&id).cloned();
    let Some(current) = current else {
        return (StatusCode::NOT_FOUND, "Unknown server").into_response();
    };
    let entry = match parse_server_form(&form) {
        Ok(entry) => entry,
        Err(e) => {
            return Html(pages::server_form_page("Edit", Some(&current), Some(&e)))
                .into_response();
        }
    };
    match state
        .update_config(|config| config.update_server(&id, entry))
        .await
    {
        Ok(()) => Redirect::to("/admin/?notice=server-updated").into_response(),
        Err(ConfigError::UnknownServer(_)) => {
            (StatusCode::NOT_FOUND, "Unknown server").into_response()
        }
        Err(e @ ConfigError::DuplicateName(_)) => {
            Html(pages::server_form_page("Edit", Some(&current), Some(&e.to_string())))
                .into_response()
        }
        Err(e) => internal_error(e),
    }
}

pub async fn delete_server(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = require_admin(&state, &headers).await {
        return resp;
    }
    match state
        .update_config(|config| config.remove_server(&id))
        .await
    {
        Ok(removed) => {
            tracing::info!("deleted server {:?}", removed.name);
            Redirect::to("/admin/?notice=server-deleted").into_response()
        }
        Err(ConfigError::UnknownServer(_)) => {
            (StatusCode::NOT_FOUND, "Unknown server").into_response()
        }
        Err(e) => internal_error(e),
    }
}

// -- Security settings --

#[derive(Deserialize)]
pub struct SecurityForm {
    pub action: String,
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub totp_code: String,
}

pub async fn security_page(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(params): Query<NoticeParams>,
) -> Response {
    if let Err(resp) = require_admin(&state, &headers).await {
        return resp;
    }
    let totp_enabled = state.creds.read().await.totp_enabled;
    let notice = params.notice.as_deref().and_then(pages::notice_text);
    Html(pages::security_page(totp_enabled, notice, None)).into_response()
}

pub async fn security_submit(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Form(form): Form<SecurityForm>,
) -> Response {
    if let Err(resp) = require_admin(&state, &headers).await {
        return resp;
    }
    match form.action.as_str() {
        "change_password" => change_password(&state, &form).await,
        "enable_2fa" => enable_totp(&state).await,
        "verify_2fa" => verify_totp(&state, &form).await,
        "disable_2fa" => disable_totp(&state, &form).await,
        _ => (StatusCode::BAD_REQUEST, "Unknown action").into_response(),
    }
}

async fn change_password(state: &AppState, form: &SecurityForm) -> Response {
    let creds = state.creds.read().await.clone();
    let error = if !creds::verify_password(&form.current_password, &creds.password_hash) {
        Some("Current password is incorrect".to_string())
    } else if form.new_password != form.confirm_password {
        Some("New passwords do not match".to_string())
    } else {
        None
    };
    if let Some(e) = error {
        return Html(pages::security_page(creds.totp_enabled, None, Some(&e))).into_response();
    }

    let new_password = form.new_password.clone();
    match state
        .update_creds(move |creds| creds.set_password(&new_password))
        .await
    {
        Ok(()) => Redirect::to("/admin/security?notice=password-changed").into_response(),
        Err(e @ creds::CredsError::WeakPassword) => {
            Html(pages::security_page(creds.totp_enabled, None, Some(&e.to_string())))
                .into_response()
        }
        Err(e) => internal_error(e),
    }
}

/// Start enrollment: persist a pending secret (second factor still off)
/// and show the QR + manual code. Abandoning this page leaves the pending
/// secret inert until a code is verified.
async fn enable_totp(state: &AppState) -> Response {
    let secret = totp::generate_secret();
    let username = state.creds.read().await.username.clone();

    let pending = secret.clone();
    if let Err(e) = state
        .update_creds(move |creds| {
            creds.totp_secret = pending;
            creds.totp_enabled = false;
            Ok(())
        })
        .await
    {
        return internal_error(e);
    }

    render_totp_setup(&secret, &username, None)
}

async fn verify_totp(state: &AppState, form: &SecurityForm) -> Response {
    let creds = state.creds.read().await.clone();
    if creds.totp_secret.is_empty() {
        return Html(pages::security_page(
            creds.totp_enabled,
            None,
            Some("Two-factor enrollment has not been started"),
        ))
        .into_response();
    }

    let verified = Totp::new(&creds.totp_secret, &creds.username)
        .map(|t| t.verify(&form.totp_code))
        .unwrap_or(false);
    if !verified {
        return render_totp_setup(
            &creds.totp_secret,
            &creds.username,
            Some("Invalid code. Please try again."),
        );
    }

    match state
        .update_creds(|creds| {
            creds.totp_enabled = true;
            Ok(())
        })
        .await
    {
        Ok(()) => Redirect::to("/admin/security?notice=2fa-enabled").into_response(),
        Err(e) => internal_error(e),
    }
}

async fn disable_totp(state: &AppState, form: &SecurityForm) -> Response {
    let creds = state.creds.read().await.clone();
    if !creds::verify_password(&form.password, &creds.password_hash) {
        return Html(pages::security_page(
            creds.totp_enabled,
            None,
            Some("Incorrect password"),
        ))
        .into_response();
    }

    match state
        .update_creds(|creds| {
            creds.totp_enabled = false;
            creds.totp_secret.clear();
            Ok(())
        })
        .await
    {
        Ok(()) => Redirect::to("/admin/security?notice=2fa-disabled").into_response(),
        Err(e) => internal_error(e),
    }
}

fn render_totp_setup(secret: &str, username: &str, error: Option<&str>) -> Response {
    let totp = match Totp::new(secret, username) {
        Ok(totp) => totp,
        Err(e) => return internal_error(e),
    };
    let uri = totp.otpauth_uri();
    let qr_svg = match QrCode::new(uri.as_bytes()) {
        Ok(code) => code.render::<svg::Color>().min_dimensions(220, 220).build(),
        Err(e) => return internal_error(e),
    };
    Html(pages::totp_setup_page(&qr_svg, secret, error)).into_response()
}
