//! Test server harness for E2E testing.
//!
//! Provides `TestServer`, which runs the real router, relay actor and token
//! service on an ephemeral port.

use crate::fixtures::test_token_config;
use signaling_relay::actors::RelayActorHandle;
use signaling_relay::observability::HealthState;
use signaling_relay::routes::{build_routes, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use token_service::{TokenConfig, TokenService};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Options for [`TestServer::spawn_with`].
#[derive(Debug, Clone)]
pub struct TestServerOptions {
    pub require_token: bool,
    pub token_config: TokenConfig,
}

impl Default for TestServerOptions {
    fn default() -> Self {
        Self {
            require_token: false,
            token_config: test_token_config(),
        }
    }
}

/// A running signaling server bound to `127.0.0.1:0`.
///
/// Everything is cancelled when the server is dropped.
///
/// # Example
/// ```rust,ignore
/// let server = TestServer::spawn().await?;
/// let mut client = TestClient::connect(&server.ws_url()).await?;
/// ```
pub struct TestServer {
    addr: SocketAddr,
    relay: RelayActorHandle,
    tokens: Arc<TokenService>,
    cancel_token: CancellationToken,
    _server: JoinHandle<()>,
    _relay_task: JoinHandle<()>,
}

impl TestServer {
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_with(TestServerOptions::default()).await
    }

    pub async fn spawn_with(options: TestServerOptions) -> Result<Self, anyhow::Error> {
        let cancel_token = CancellationToken::new();
        let (relay, relay_task) = RelayActorHandle::spawn(cancel_token.child_token());
        let tokens = Arc::new(TokenService::new(&options.token_config));

        let health = Arc::new(HealthState::new());
        health.set_ready();

        let app = build_routes(AppState {
            relay: relay.clone(),
            tokens: Arc::clone(&tokens),
            health,
            require_token: options.require_token,
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let shutdown = cancel_token.child_token();
        let server = tokio::spawn(async move {
            let serve = axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.cancelled().await });
            if let Err(e) = serve.await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            relay,
            tokens,
            cancel_token,
            _server: server,
            _relay_task: relay_task,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base HTTP URL.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Signaling WebSocket URL without a token.
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub fn ws_url_with_token(&self, token: &str) -> String {
        format!("ws://{}/ws?token={}", self.addr, token)
    }

    /// Handle to the server's relay actor, for status queries.
    pub fn relay(&self) -> &RelayActorHandle {
        &self.relay
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
