//! End-to-end tests driving the full router: login, roster CRUD, and the
//! wake flow with a loopback UDP listener standing in for the network.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tokio::net::UdpSocket;
use tower::ServiceExt;

use wolgate_core::config::{GatewayConfig, ServerEntry};
use wolgate_core::creds::AdminCredentials;
use wolgate_core::totp::{self, Totp};
use wolgate_core::wol::MAGIC_PACKET_LEN;
use wolgate_server::router;
use wolgate_server::state::{AppState, SharedState};

const PASSWORD: &str = "hunter42";

fn test_state(dir: &tempfile::TempDir, wol_port: u16) -> SharedState {
    test_state_with(dir, wol_port, |_| {})
}

fn test_state_with(
    dir: &tempfile::TempDir,
    wol_port: u16,
    tweak_creds: impl FnOnce(&mut AdminCredentials),
) -> SharedState {
    let config = GatewayConfig {
        port: 5000,
        servers: vec![ServerEntry::new(
            "NAS",
            "00:11:22:33:44:55".parse().unwrap(),
            Ipv4Addr::LOCALHOST,
            "http://nas.local",
            30,
        )],
    };
    let config_path = dir.path().join("gateway.json");
    config.save_to(&config_path).unwrap();

    let creds_path = dir.path().join("admin.json");
    let mut creds = AdminCredentials::load_or_init(&creds_path).unwrap();
    creds.enabled = true;
    creds.set_password(PASSWORD).unwrap();
    tweak_creds(&mut creds);
    creds.save_to(&creds_path).unwrap();

    Arc::new(AppState::new(config, config_path, creds, creds_path).with_wol_port(wol_port))
}

async fn send(app: &Router, request: Request<Body>) -> axum::response::Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> axum::response::Response {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    send(app, builder.body(Body::empty()).unwrap()).await
}

async fn post_form(
    app: &Router,
    uri: &str,
    body: &str,
    cookie: Option<&str>,
) -> axum::response::Response {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    send(app, builder.body(Body::from(body.to_string())).unwrap()).await
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// A 6-digit code that is definitely not valid for `secret` right now.
fn wrong_code(secret: &str) -> String {
    let totp = Totp::new(secret, "admin").unwrap();
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
    let valid: Vec<String> = [now - 30, now, now + 30]
        .into_iter()
        .map(|t| totp.code_at(t))
        .collect();
    ["000000", "111111", "222222", "333333"]
        .into_iter()
        .find(|c| !valid.iter().any(|v| v == c))
        .unwrap()
        .to_string()
}

/// Log in and return the session cookie pair (`name=token`).
async fn login(app: &Router) -> String {
    let response = post_form(
        app,
        "/admin/login",
        &format!("username=admin&password={PASSWORD}"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("login should set a session cookie")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

#[tokio::test]
async fn test_wake_sends_one_packet_and_renders_waiting_page() {
    let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let wol_port = receiver.local_addr().unwrap().port();
    let dir = tempfile::tempdir().unwrap();
    let app = router(test_state(&dir, wol_port));

    let response = get(&app, "/wake?server=NAS", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("content=\"30;url=http://nas.local\""));
    assert!(html.contains("30 seconds"));

    let mut buf = [0u8; 256];
    let (len, _) = tokio::time::timeout(Duration::from_secs(2), receiver.recv_from(&mut buf))
        .await
        .expect("no magic packet arrived")
        .unwrap();
    assert_eq!(len, MAGIC_PACKET_LEN);
    assert!(buf[..6].iter().all(|&b| b == 0xFF));
    assert_eq!(&buf[6..12], &[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);

    // Fire-and-forget means exactly one datagram.
    assert!(
        tokio::time::timeout(Duration::from_millis(200), receiver.recv_from(&mut buf))
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_wake_unknown_server_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let app = router(test_state(&dir, 19));

    let response = get(&app, "/wake?server=nope", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_requires_session() {
    let dir = tempfile::tempdir().unwrap();
    let app = router(test_state(&dir, 19));

    let response = get(&app, "/admin/", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/admin/login"
    );
}

#[tokio::test]
async fn test_disabled_panel_is_forbidden_even_with_session() {
    let dir = tempfile::tempdir().unwrap();
    let app = router(test_state(&dir, 19));
    let cookie = login(&app).await;

    // Disabling the panel locks out existing sessions too.
    let state = test_state_with(&dir, 19, |creds| creds.enabled = false);
    let app = router(state);
    let response = get(&app, "/admin/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get(&app, "/admin/login", None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_login_rejects_wrong_password_with_generic_error() {
    let dir = tempfile::tempdir().unwrap();
    let app = router(test_state(&dir, 19));

    let response = post_form(
        &app,
        "/admin/login",
        "username=admin&password=wrongwrong",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("Invalid username or password"));
}

#[tokio::test]
async fn test_login_with_totp_requires_fresh_code() {
    let secret = totp::generate_secret();
    let dir = tempfile::tempdir().unwrap();
    let secret_for_creds = secret.clone();
    let app = router(test_state_with(&dir, 19, move |creds| {
        creds.totp_secret = secret_for_creds;
        creds.totp_enabled = true;
    }));

    // Wrong code: same generic error as a wrong password.
    let bad = wrong_code(&secret);
    let response = post_form(
        &app,
        "/admin/login",
        &format!("username=admin&password={PASSWORD}&totp_code={bad}"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("Invalid username or password"));

    // Current code: logged in.
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
    let code = Totp::new(&secret, "admin").unwrap().code_at(now);
    let response = post_form(
        &app,
        "/admin/login",
        &format!("username=admin&password={PASSWORD}&totp_code={code}"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_totp_enrollment_flips_only_on_valid_code() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir, 19);
    let app = router(state.clone());
    let cookie = login(&app).await;

    // Begin enrollment: a pending secret is stored, second factor still off.
    let response = post_form(&app, "/admin/security", "action=enable_2fa", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let pending = state.creds.read().await.clone();
    assert!(!pending.totp_enabled);
    assert!(!pending.totp_secret.is_empty());
    let html = body_string(response).await;
    assert!(html.contains(&pending.totp_secret));

    // A wrong code leaves enrollment off.
    let bad = wrong_code(&pending.totp_secret);
    let response = post_form(
        &app,
        "/admin/security",
        &format!("action=verify_2fa&totp_code={bad}"),
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!state.creds.read().await.totp_enabled);

    // A code from the pending secret flips it on.
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
    let code = Totp::new(&pending.totp_secret, "admin").unwrap().code_at(now);
    let response = post_form(
        &app,
        "/admin/security",
        &format!("action=verify_2fa&totp_code={code}"),
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(state.creds.read().await.totp_enabled);
}

#[tokio::test]
async fn test_add_server_grows_roster_and_wake_targets_it() {
    let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let wol_port = receiver.local_addr().unwrap().port();
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir, wol_port);
    let app = router(state.clone());
    let cookie = login(&app).await;

    let response = post_form(
        &app,
        "/admin/server/add",
        "name=Backup&mac=00%3AAA%3ABB%3ACC%3ADD%3AEE&broadcast=127.0.0.1&url=http%3A%2F%2Fbackup.local&wait_time=45",
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    // Persisted to disk with the submitted fields.
    let on_disk = GatewayConfig::load_from(&state.config_path).unwrap();
    assert_eq!(on_disk.servers.len(), 2);
    let added = &on_disk.servers[1];
    assert_eq!(added.name, "Backup");
    assert_eq!(added.mac_address.to_string(), "00:AA:BB:CC:DD:EE");
    assert_eq!(added.broadcast_address, Ipv4Addr::LOCALHOST);
    assert_eq!(added.site_url, "http://backup.local");
    assert_eq!(added.wait_seconds, 45);

    // Waking the new entry broadcasts its MAC and embeds its redirect.
    let response = get(&app, "/wake?server=Backup", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("content=\"45;url=http://backup.local\""));

    let mut buf = [0u8; 256];
    let (len, _) = tokio::time::timeout(Duration::from_secs(2), receiver.recv_from(&mut buf))
        .await
        .expect("no magic packet arrived")
        .unwrap();
    assert_eq!(len, MAGIC_PACKET_LEN);
    assert_eq!(&buf[6..12], &[0x00, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE]);
}

#[tokio::test]
async fn test_add_rejects_duplicate_name_without_mutating() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir, 19);
    let app = router(state.clone());
    let cookie = login(&app).await;

    let response = post_form(
        &app,
        "/admin/server/add",
        "name=NAS&mac=00%3AAA%3ABB%3ACC%3ADD%3AEE&url=http%3A%2F%2Fother.local&wait_time=45",
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("already exists"));
    assert_eq!(state.config.read().await.servers.len(), 1);
}

#[tokio::test]
async fn test_edit_unknown_id_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir, 19);
    let app = router(state.clone());
    let cookie = login(&app).await;

    let response = post_form(
        &app,
        "/admin/server/edit/no-such-id",
        "name=X&mac=00%3A11%3A22%3A33%3A44%3A55&url=http%3A%2F%2Fx&wait_time=5",
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(state.config.read().await.servers[0].name, "NAS");
}

#[tokio::test]
async fn test_delete_removes_entry_and_logout_ends_session() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir, 19);
    let app = router(state.clone());
    let cookie = login(&app).await;

    let id = state.config.read().await.servers[0].id.clone();
    let response = post_form(
        &app,
        &format!("/admin/server/delete/{id}"),
        "",
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(state.config.read().await.servers.is_empty());

    let response = get(&app, "/admin/logout", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    // The old cookie no longer grants access.
    let response = get(&app, "/admin/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/admin/login"
    );
}
