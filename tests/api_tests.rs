//! HTTP integration tests
//!
//! Each test serves the app on an ephemeral local port and drives it with
//! a client that neither follows redirects nor keeps cookies, so every
//! cookie change is visible in the responses.

use reqwest::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use reqwest::{redirect, Client, Response, StatusCode};
use serde_json::Value;
use std::net::SocketAddr;

use royalty_desk::api::serve_on;
use royalty_desk::config::Config;

struct TestServer {
    addr: SocketAddr,
    client: Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let _ = serve_on(listener, Config::default()).await;
        });
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .build()
            .unwrap();

        Self { addr, client, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn get(&self, path: &str, cookie: Option<&str>) -> Response {
        let mut request = self.client.get(self.url(path));
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }
        request.send().await.unwrap()
    }

    async fn post(&self, path: &str, cookie: Option<&str>) -> Response {
        let mut request = self.client.post(self.url(path));
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }
        request.send().await.unwrap()
    }

    async fn login(&self, username: &str, password: &str, remember_me: bool) -> Response {
        let mut form = vec![("username", username), ("password", password)];
        if remember_me {
            form.push(("remember_me", "on"));
        }
        self.client
            .post(self.url("/login"))
            .form(&form)
            .send()
            .await
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(String::from)
        .collect()
}

/// `name=value` part of a Set-Cookie header
fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap_or_default().to_string()
}

async fn signed_in_cookie(server: &TestServer, remember_me: bool) -> String {
    let response = server.login("admin", "admin123", remember_me).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    cookie_pair(&set_cookies(&response)[0])
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = TestServer::start().await;
    let response = server.get("/api/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], "healthy");
}

#[tokio::test]
async fn test_index_without_session_shows_login() {
    let server = TestServer::start().await;
    let response = server.get("/", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = response.text().await.unwrap();
    assert!(html.contains(r#"id="login-form""#));
    assert!(!html.contains("idle-warning"));
}

#[tokio::test]
async fn test_bad_credentials_rerender_login() {
    let server = TestServer::start().await;
    let response = server.login("admin", "nope", true).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&response).is_empty());
    let html = response.text().await.unwrap();
    assert!(html.contains("Invalid username or password"));
    assert!(html.contains(r#"value="admin""#));
}

#[tokio::test]
async fn test_remember_me_sets_persistent_cookie() {
    let server = TestServer::start().await;
    let response = server.login("admin", "admin123", true).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/");

    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with("royalty_desk_remember_session="));
    assert!(cookies[0].contains("Max-Age=2592000"));
    assert!(cookies[0].contains("HttpOnly"));
}

#[tokio::test]
async fn test_session_only_sets_session_cookie() {
    let server = TestServer::start().await;
    let response = server.login("viewer", "viewer123", false).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with("royalty_desk_session="));
    assert!(!cookies[0].contains("Max-Age"));
}

#[tokio::test]
async fn test_index_with_session_shows_app() {
    let server = TestServer::start().await;
    let cookie = signed_in_cookie(&server, false).await;

    let html = server.get("/", Some(&cookie)).await.text().await.unwrap();
    assert!(html.contains("/sections/royalties"));
    assert!(html.contains(r#"id="idle-warning""#));
    assert!(html.contains("/assets/idle.js"));
}

#[tokio::test]
async fn test_session_info_reflects_cookie() {
    let server = TestServer::start().await;

    let anonymous: Value = server.get("/api/session", None).await.json().await.unwrap();
    assert_eq!(anonymous["data"]["view"], "login");
    assert!(anonymous["data"]["username"].is_null());

    let cookie = signed_in_cookie(&server, true).await;
    let body: Value = server
        .get("/api/session", Some(&cookie))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["view"], "app");
    assert_eq!(body["data"]["username"], "admin");
    assert_eq!(body["data"]["role"], "administrator");
    assert_eq!(body["data"]["mode"], "durable");
    assert_eq!(
        body["data"]["permissions"],
        serde_json::json!(["read", "write", "delete", "admin"])
    );
}

#[tokio::test]
async fn test_session_info_lists_role_permissions() {
    let server = TestServer::start().await;

    let anonymous: Value = server.get("/api/session", None).await.json().await.unwrap();
    assert_eq!(anonymous["data"]["permissions"], serde_json::json!([]));

    let response = server.login("viewer", "viewer123", false).await;
    let cookie = cookie_pair(&set_cookies(&response)[0]);
    let body: Value = server
        .get("/api/session", Some(&cookie))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["permissions"], serde_json::json!(["read"]));
}

#[tokio::test]
async fn test_tampered_cookie_is_no_session() {
    let server = TestServer::start().await;
    let cookie = signed_in_cookie(&server, true).await;
    let tampered = format!("{}x", cookie);

    let body: Value = server
        .get("/api/session", Some(&tampered))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["view"], "login");
}

#[tokio::test]
async fn test_sections_gated_by_session() {
    let server = TestServer::start().await;

    let html = server.get("/sections/audit", None).await.text().await.unwrap();
    assert!(html.contains(r#"id="login-form""#));
    assert!(html.contains("Audit Log"));

    let cookie = signed_in_cookie(&server, false).await;
    let html = server
        .get("/sections/audit", Some(&cookie))
        .await
        .text()
        .await
        .unwrap();
    assert!(html.contains(r#"data-section="audit""#));

    let missing = server.get("/sections/billing", Some(&cookie)).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_idle_channel_requires_session() {
    let server = TestServer::start().await;
    let response = server.get("/ws", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_prompt_then_confirm() {
    let server = TestServer::start().await;
    let cookie = signed_in_cookie(&server, true).await;

    let prompt = server.get("/logout", Some(&cookie)).await;
    assert_eq!(prompt.status(), StatusCode::OK);
    assert!(set_cookies(&prompt).is_empty());
    let html = prompt.text().await.unwrap();
    assert!(html.contains(r#"id="confirm-logout-btn""#));
    assert!(html.contains(r#"id="cancel-logout-btn""#));

    let confirmed = server.post("/logout/confirm", Some(&cookie)).await;
    assert_eq!(confirmed.status(), StatusCode::SEE_OTHER);
    assert_eq!(confirmed.headers()[LOCATION], "/");
    let cookies = set_cookies(&confirmed);
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with("royalty_desk_remember_session=;"));
    assert!(cookies[0].contains("Max-Age=0"));
}

#[tokio::test]
async fn test_logout_prompt_without_session_redirects() {
    let server = TestServer::start().await;
    let response = server.get("/logout", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_automatic_logout_clears_session_cookie() {
    let server = TestServer::start().await;
    let cookie = signed_in_cookie(&server, false).await;

    let response = server.post("/logout/auto", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with("royalty_desk_session=;"));

    // Logging out with nothing to clear is harmless
    let again = server.post("/logout/auto", None).await;
    assert_eq!(again.status(), StatusCode::SEE_OTHER);
    assert!(set_cookies(&again).is_empty());
}

#[tokio::test]
async fn test_static_assets_served() {
    let server = TestServer::start().await;

    let script = server.get("/assets/idle.js", None).await;
    assert_eq!(script.status(), StatusCode::OK);
    assert_eq!(script.headers()[CONTENT_TYPE], "application/javascript");

    let missing = server.get("/assets/nope.js", None).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}
