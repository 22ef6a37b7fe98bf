//! Fake account and membership API.
//!
//! Serves the two endpoints the gate calls, keyed by the exact `Cookie`
//! header value, and counts every request.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header::COOKIE};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing::get};
use collab_gate::config::ApiConfig;
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Default)]
struct Directory {
    users: HashMap<String, (String, String)>,
    roles: HashMap<(String, String, String), u16>,
    garbage_sessions: Vec<String>,
    failing_sessions: Vec<String>,
    membership_delay: Option<Duration>,
    identity_calls: AtomicUsize,
    membership_calls: AtomicUsize,
}

/// Builder for the fake API.
#[derive(Default)]
pub struct FakeAccounts {
    directory: Directory,
}

impl FakeAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session cookie resolving to a user.
    pub fn user(mut self, cookie: &str, id: &str, name: &str) -> Self {
        self.directory
            .users
            .insert(cookie.to_string(), (id.to_string(), name.to_string()));
        self
    }

    /// Give the session a role in `workspace/project`.
    pub fn role(mut self, cookie: &str, workspace: &str, project: &str, role: u16) -> Self {
        self.directory.roles.insert(
            (cookie.to_string(), workspace.to_string(), project.to_string()),
            role,
        );
        self
    }

    /// Identity lookups for this session answer 200 with a non-JSON body.
    pub fn garbage_identity(mut self, cookie: &str) -> Self {
        self.directory.garbage_sessions.push(cookie.to_string());
        self
    }

    /// Membership lookups for this session answer 500.
    pub fn failing_membership(mut self, cookie: &str) -> Self {
        self.directory.failing_sessions.push(cookie.to_string());
        self
    }

    /// Delay every membership answer.
    pub fn membership_delay(mut self, delay: Duration) -> Self {
        self.directory.membership_delay = Some(delay);
        self
    }

    pub async fn spawn(self) -> RunningAccounts {
        let directory = Arc::new(self.directory);
        let app = Router::new()
            .route("/api/users/me/", get(me))
            .route(
                "/api/workspaces/:workspace/projects/:project/project-members/me/",
                get(membership),
            )
            .with_state(directory.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake accounts");
        let addr = listener.local_addr().expect("fake accounts addr");
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        RunningAccounts {
            addr,
            directory,
            task,
        }
    }
}

/// A running fake API. Aborted on drop.
pub struct RunningAccounts {
    addr: SocketAddr,
    directory: Arc<Directory>,
    task: JoinHandle<()>,
}

impl RunningAccounts {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig::new(self.base_url().parse().expect("valid base url"))
    }

    pub fn identity_calls(&self) -> usize {
        self.directory.identity_calls.load(Ordering::SeqCst)
    }

    pub fn membership_calls(&self) -> usize {
        self.directory.membership_calls.load(Ordering::SeqCst)
    }
}

impl Drop for RunningAccounts {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn cookie(headers: &HeaderMap) -> String {
    headers
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn me(State(dir): State<Arc<Directory>>, headers: HeaderMap) -> Response {
    dir.identity_calls.fetch_add(1, Ordering::SeqCst);
    let cookie = cookie(&headers);
    if dir.garbage_sessions.contains(&cookie) {
        return "<html>maintenance</html>".into_response();
    }
    match dir.users.get(&cookie) {
        Some((id, name)) => Json(json!({
            "id": id,
            "display_name": name,
            "email": format!("{name}@example.com"),
            "is_bot": false,
        }))
        .into_response(),
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn membership(
    State(dir): State<Arc<Directory>>,
    Path((workspace, project)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    dir.membership_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(delay) = dir.membership_delay {
        tokio::time::sleep(delay).await;
    }
    let cookie = cookie(&headers);
    if dir.failing_sessions.contains(&cookie) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    match dir.roles.get(&(cookie, workspace, project.clone())) {
        Some(role) => {
            Json(json!({ "id": "m-1", "role": role, "project": project })).into_response()
        }
        None => (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "You are not a member of this project" })),
        )
            .into_response(),
    }
}
