//! HTML page rendering.
//!
//! Plain format-string templates; every user-supplied value goes through
//! [`escape`] before it is interpolated.

use wolgate_core::config::ServerEntry;

const STYLE: &str = r#"
    * { margin: 0; padding: 0; box-sizing: border-box; }
    body { font-family: -apple-system, "Segoe UI", Roboto, sans-serif; background: #f5f5f5; padding: 40px 20px; }
    .container { max-width: 960px; margin: 0 auto; }
    .card { background: white; padding: 30px; border-radius: 10px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); margin-bottom: 20px; }
    h1 { color: #333; font-size: 24px; margin-bottom: 20px; }
    h2 { color: #333; font-size: 20px; margin-bottom: 15px; }
    p { color: #555; margin: 8px 0; }
    a.button, button { display: inline-block; padding: 10px 20px; background: #3498db; color: white; border: none; border-radius: 5px; font-size: 14px; cursor: pointer; text-decoration: none; }
    a.button:hover, button:hover { background: #2980b9; }
    .danger { background: #e74c3c; }
    .danger:hover { background: #c0392b; }
    .success { background: #27ae60; }
    .success:hover { background: #229954; }
    .nav { display: flex; gap: 10px; margin-bottom: 20px; }
    .alert { padding: 12px; border-radius: 5px; margin-bottom: 20px; }
    .alert-success { background: #d4edda; color: #155724; border-left: 4px solid #28a745; }
    .alert-error { background: #f8d7da; color: #721c24; border-left: 4px solid #dc3545; }
    table { width: 100%; border-collapse: collapse; }
    th { background: #f8f9fa; padding: 10px; text-align: left; border-bottom: 2px solid #e0e0e0; color: #333; }
    td { padding: 10px; border-bottom: 1px solid #e0e0e0; color: #555; }
    label { display: block; margin: 12px 0 4px; color: #333; font-weight: 500; }
    input { width: 100%; padding: 10px; border: 2px solid #e0e0e0; border-radius: 5px; font-size: 14px; }
    input:focus { outline: none; border-color: #3498db; }
    .help { font-size: 12px; color: #999; margin-top: 3px; }
    .loader { border: 8px solid #f3f3f3; border-top: 8px solid #3498db; border-radius: 50%; width: 50px; height: 50px; animation: spin 2s linear infinite; margin: 20px auto; }
    @keyframes spin { 0% { transform: rotate(0deg); } 100% { transform: rotate(360deg); } }
    .secret { background: #e8f4f8; padding: 12px; border-radius: 5px; text-align: center; margin: 15px 0; font-size: 16px; letter-spacing: 2px; font-family: monospace; }
    .qr { text-align: center; margin: 15px 0; }
"#;

/// Minimal HTML attribute/text escaping.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<title>{title}</title>\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <style>{STYLE}</style>\n</head>\n<body>\n<div class=\"container\">\n{body}\n</div>\n</body>\n</html>\n",
        title = escape(title),
    )
}

fn alert(class: &str, message: &str) -> String {
    format!("<div class=\"alert alert-{class}\">{}</div>", escape(message))
}

/// Human text for the fixed notice tokens carried across redirects.
pub fn notice_text(token: &str) -> Option<&'static str> {
    match token {
        "server-added" => Some("Server added."),
        "server-updated" => Some("Server updated."),
        "server-deleted" => Some("Server deleted."),
        "password-changed" => Some("Password changed."),
        "2fa-enabled" => Some("Two-factor authentication enabled."),
        "2fa-disabled" => Some("Two-factor authentication disabled."),
        _ => None,
    }
}

/// Landing page: one wake button per roster entry.
pub fn landing_page(servers: &[ServerEntry]) -> String {
    let body = if servers.is_empty() {
        "<p>No servers are configured yet. Add one in the admin panel.</p>".to_string()
    } else {
        servers
            .iter()
            .map(|s| {
                format!(
                    "<p><a class=\"button\" href=\"/wake?server={id}\">Start {name}</a></p>",
                    id = escape(&s.id),
                    name = escape(&s.name),
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };
    layout(
        "Server Gateway",
        &format!(
            "<div class=\"card\">\n<h1>Server Gateway</h1>\n\
             <p>Click a button below to wake a server. You will be redirected once it has booted.</p>\n{body}\n</div>",
        ),
    )
}

/// The timed waiting page returned after a magic packet is sent.
pub fn waiting_page(server: &ServerEntry) -> String {
    let wait = server.wait_seconds;
    let url = escape(&server.site_url);
    let name = escape(&server.name);
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<title>Server Starting...</title>\n\
         <meta http-equiv=\"refresh\" content=\"{wait};url={url}\">\n\
         <style>{STYLE}</style>\n</head>\n<body>\n<div class=\"container\">\n<div class=\"card\" style=\"text-align:center\">\n\
         <h1>Starting {name}...</h1>\n<div class=\"loader\"></div>\n\
         <p>Wake-on-LAN signal sent. Please wait approximately <strong>{wait} seconds</strong>.</p>\n\
         <p>You will be redirected automatically.</p>\n\
         <p>If the page fails to load, the server may still be booting. Please try refreshing.</p>\n\
         </div>\n</div>\n</body>\n</html>\n",
    )
}

pub fn login_page(error: Option<&str>, require_totp: bool) -> String {
    let error_html = error.map(|e| alert("error", e)).unwrap_or_default();
    let totp_field = if require_totp {
        "<label for=\"totp_code\">2FA Code</label>\n\
         <input type=\"text\" id=\"totp_code\" name=\"totp_code\" required pattern=\"[0-9]{6}\" maxlength=\"6\" placeholder=\"6-digit code\">"
    } else {
        ""
    };
    layout(
        "Admin Login",
        &format!(
            "<div class=\"card\" style=\"max-width:400px;margin:0 auto\">\n<h1>WOL Gateway Admin</h1>\n{error_html}\n\
             <form method=\"POST\" action=\"/admin/login\">\n\
             <label for=\"username\">Username</label>\n\
             <input type=\"text\" id=\"username\" name=\"username\" required autofocus>\n\
             <label for=\"password\">Password</label>\n\
             <input type=\"password\" id=\"password\" name=\"password\" required>\n{totp_field}\n\
             <p><button type=\"submit\">Login</button></p>\n</form>\n</div>",
        ),
    )
}

pub fn dashboard_page(servers: &[ServerEntry], port: u16, notice: Option<&str>) -> String {
    let notice_html = notice.map(|n| alert("success", n)).unwrap_or_default();
    let rows = servers
        .iter()
        .map(|s| {
            format!(
                "<tr><td><strong>{name}</strong></td><td><code>{mac}</code></td><td>{broadcast}</td>\
                 <td>{url}</td><td>{wait}s</td>\
                 <td><a class=\"button\" href=\"/admin/server/edit/{id}\">Edit</a> \
                 <form method=\"POST\" action=\"/admin/server/delete/{id}\" style=\"display:inline\" \
                 onsubmit=\"return confirm('Delete {name}?');\">\
                 <button type=\"submit\" class=\"danger\">Delete</button></form></td></tr>",
                name = escape(&s.name),
                mac = s.mac_address,
                broadcast = s.broadcast_address,
                url = escape(&s.site_url),
                wait = s.wait_seconds,
                id = escape(&s.id),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let table = if servers.is_empty() {
        "<p>No servers configured yet.</p>".to_string()
    } else {
        format!(
            "<table>\n<thead><tr><th>Name</th><th>MAC Address</th><th>Broadcast</th>\
             <th>Site URL</th><th>Wait</th><th>Actions</th></tr></thead>\n<tbody>\n{rows}\n</tbody>\n</table>",
        )
    };
    layout(
        "Admin Dashboard",
        &format!(
            "<div class=\"nav\">\n\
             <a class=\"button\" href=\"/admin/security\">Security</a>\n\
             <a class=\"button\" href=\"/\" target=\"_blank\">Main Site</a>\n\
             <a class=\"button danger\" href=\"/admin/logout\">Logout</a>\n</div>\n{notice_html}\n\
             <div class=\"card\">\n<h2>Gateway</h2>\n\
             <p>Listening on port <strong>{port}</strong>. Changing the port requires editing the config file and restarting.</p>\n</div>\n\
             <div class=\"card\">\n<h2>Servers</h2>\n\
             <p><a class=\"button success\" href=\"/admin/server/add\">Add New Server</a></p>\n{table}\n</div>",
        ),
    )
}

pub fn server_form_page(action: &str, server: Option<&ServerEntry>, error: Option<&str>) -> String {
    let error_html = error.map(|e| alert("error", e)).unwrap_or_default();
    let post_url = match server {
        Some(s) => format!("/admin/server/edit/{}", escape(&s.id)),
        None => "/admin/server/add".to_string(),
    };
    let name = server.map(|s| escape(&s.name)).unwrap_or_default();
    let mac = server.map(|s| s.mac_address.to_string()).unwrap_or_default();
    let broadcast = server
        .map(|s| s.broadcast_address.to_string())
        .unwrap_or_else(|| "255.255.255.255".to_string());
    let url = server.map(|s| escape(&s.site_url)).unwrap_or_default();
    let wait = server.map(|s| s.wait_seconds.to_string()).unwrap_or_else(|| "60".to_string());
    layout(
        &format!("{action} Server"),
        &format!(
            "<div class=\"card\">\n<h1>{action} Server</h1>\n{error_html}\n\
             <form method=\"POST\" action=\"{post_url}\">\n\
             <label for=\"name\">Server Name</label>\n\
             <input type=\"text\" id=\"name\" name=\"name\" required value=\"{name}\">\n\
             <div class=\"help\">A friendly name for this server (e.g., \"NAS\")</div>\n\
             <label for=\"mac\">MAC Address</label>\n\
             <input type=\"text\" id=\"mac\" name=\"mac\" required value=\"{mac}\" \
             pattern=\"([0-9A-Fa-f]{{2}}[:-]){{5}}([0-9A-Fa-f]{{2}})\" placeholder=\"00:11:22:33:44:55\">\n\
             <div class=\"help\">Format XX:XX:XX:XX:XX:XX or XX-XX-XX-XX-XX-XX</div>\n\
             <label for=\"broadcast\">Broadcast Address</label>\n\
             <input type=\"text\" id=\"broadcast\" name=\"broadcast\" value=\"{broadcast}\">\n\
             <div class=\"help\">Network broadcast address (default: 255.255.255.255)</div>\n\
             <label for=\"url\">Site URL</label>\n\
             <input type=\"text\" id=\"url\" name=\"url\" required value=\"{url}\" placeholder=\"http://192.168.1.100:8080\">\n\
             <div class=\"help\">Where to redirect after waking the server</div>\n\
             <label for=\"wait_time\">Wait Time (seconds)</label>\n\
             <input type=\"number\" id=\"wait_time\" name=\"wait_time\" required min=\"1\" value=\"{wait}\">\n\
             <div class=\"help\">How long to wait before redirecting (typically 30-120 seconds)</div>\n\
             <p><button type=\"submit\" class=\"success\">Save Server</button> \
             <a class=\"button\" href=\"/admin/\">Cancel</a></p>\n</form>\n</div>",
        ),
    )
}

pub fn security_page(totp_enabled: bool, notice: Option<&str>, error: Option<&str>) -> String {
    let notice_html = notice.map(|n| alert("success", n)).unwrap_or_default();
    let error_html = error.map(|e| alert("error", e)).unwrap_or_default();
    let totp_card = if totp_enabled {
        "<p>Status: <strong>Enabled</strong></p>\n\
         <p>Enter your password to disable two-factor authentication.</p>\n\
         <form method=\"POST\" action=\"/admin/security\">\n\
         <input type=\"hidden\" name=\"action\" value=\"disable_2fa\">\n\
         <label for=\"password\">Password</label>\n\
         <input type=\"password\" id=\"password\" name=\"password\" required>\n\
         <p><button type=\"submit\" class=\"danger\">Disable 2FA</button></p>\n</form>"
    } else {
        "<p>Status: <strong>Disabled</strong></p>\n\
         <p>Require a 6-digit code from an authenticator app (Google Authenticator, Authy, ...) when logging in.</p>\n\
         <form method=\"POST\" action=\"/admin/security\">\n\
         <input type=\"hidden\" name=\"action\" value=\"enable_2fa\">\n\
         <p><button type=\"submit\" class=\"success\">Enable 2FA</button></p>\n</form>"
    };
    layout(
        "Security Settings",
        &format!(
            "<div class=\"nav\"><a class=\"button\" href=\"/admin/\">Back to Dashboard</a></div>\n\
             {notice_html}\n{error_html}\n\
             <div class=\"card\">\n<h2>Change Password</h2>\n\
             <form method=\"POST\" action=\"/admin/security\">\n\
             <input type=\"hidden\" name=\"action\" value=\"change_password\">\n\
             <label for=\"current_password\">Current Password</label>\n\
             <input type=\"password\" id=\"current_password\" name=\"current_password\" required>\n\
             <label for=\"new_password\">New Password</label>\n\
             <input type=\"password\" id=\"new_password\" name=\"new_password\" required minlength=\"6\">\n\
             <label for=\"confirm_password\">Confirm New Password</label>\n\
             <input type=\"password\" id=\"confirm_password\" name=\"confirm_password\" required minlength=\"6\">\n\
             <p><button type=\"submit\">Update Password</button></p>\n</form>\n</div>\n\
             <div class=\"card\">\n<h2>Two-Factor Authentication</h2>\n{totp_card}\n</div>",
        ),
    )
}

/// 2FA enrollment page: QR code, manual secret, verification form.
pub fn totp_setup_page(qr_svg: &str, secret: &str, error: Option<&str>) -> String {
    let error_html = error.map(|e| alert("error", e)).unwrap_or_default();
    layout(
        "Setup Two-Factor Authentication",
        &format!(
            "<div class=\"card\">\n<h1>Setup Two-Factor Authentication</h1>\n{error_html}\n\
             <p>Scan this QR code with your authenticator app:</p>\n\
             <div class=\"qr\">{qr_svg}</div>\n\
             <p>Or enter this code manually:</p>\n\
             <div class=\"secret\">{secret}</div>\n\
             <p>Then enter the 6-digit code from the app to complete setup. \
             Two-factor login stays off until a code has been verified.</p>\n\
             <form method=\"POST\" action=\"/admin/security\">\n\
             <input type=\"hidden\" name=\"action\" value=\"verify_2fa\">\n\
             <label for=\"totp_code\">6-Digit Code</label>\n\
             <input type=\"text\" id=\"totp_code\" name=\"totp_code\" required pattern=\"[0-9]{{6}}\" maxlength=\"6\" placeholder=\"000000\" autofocus>\n\
             <p><button type=\"submit\" class=\"success\">Verify and Enable 2FA</button> \
             <a class=\"button\" href=\"/admin/security\">Cancel</a></p>\n</form>\n</div>",
            secret = escape(secret),
        ),
    )
}
