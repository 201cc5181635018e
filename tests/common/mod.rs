#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use cms_api::{app, auth::AuthGate, testing::RecordingStore, AppState};

pub const JWT_SECRET: &str = "integration-test-secret";

pub struct TestServer {
    pub base_url: String,
    pub store: RecordingStore,
    pub auth: AuthGate,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Bearer token for an arbitrary role, signed with the server's secret
    pub fn token_for(&self, user: &str, role: &str) -> String {
        let claims = self.auth.claims(user.to_string(), Some(1), role.to_string());
        self.auth.issue(&claims).expect("token")
    }
}

/// Serve the full router over a scripted store on an unused port
pub async fn spawn_server() -> Result<TestServer> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let base_url = format!("http://127.0.0.1:{}", port);

    let mut config = cms_api::config::config().clone();
    config.security.jwt_secret = JWT_SECRET.to_string();
    config.security.bcrypt_cost = 4;

    let store = RecordingStore::new();
    let state = AppState::new(Arc::new(store.clone()), &config);
    let auth = state.auth.clone();

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app(state, false)).await {
            eprintln!("test server stopped: {e}");
        }
    });

    Ok(TestServer {
        base_url,
        store,
        auth,
    })
}
