//! Development server for built sites.

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use tower_http::services::ServeDir;

use crate::reload::{reload_client_script, ReloadHub, ReloadMessage};

/// Configuration for the development server.
#[derive(Debug, Clone)]
pub struct ServeConfig {
    /// Directory to serve (the build output)
    pub root: PathBuf,

    /// Port to listen on
    pub port: u16,

    /// Host to bind to
    pub host: String,

    /// Open browser on start
    pub open: bool,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("dist"),
            port: 3000,
            host: "127.0.0.1".to_string(),
            open: true,
        }
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid address {0}")]
    Address(String),

    #[error("failed to bind {0}: {1}")]
    Bind(SocketAddr, String),
}

/// Static file server with a reload WebSocket endpoint.
pub struct DevServer {
    config: ServeConfig,
}

impl DevServer {
    pub fn new(config: ServeConfig) -> Self {
        Self { config }
    }

    /// Serve until the process is stopped.
    pub async fn serve(self, hub: ReloadHub) -> Result<(), ServerError> {
        let raw_addr = format!("{}:{}", self.config.host, self.config.port);
        let addr: SocketAddr = raw_addr
            .parse()
            .map_err(|_| ServerError::Address(raw_addr))?;

        let app = Router::new()
            .route("/__reload", get(ws_handler))
            .route("/__reload.js", get(script_handler))
            .fallback_service(ServeDir::new(&self.config.root))
            .with_state(hub);

        tracing::info!(
            "serving {} at http://{}",
            self.config.root.display(),
            addr
        );

        if self.config.open {
            let _ = open::that(format!("http://{}", addr));
        }

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(addr, e.to_string()))?;

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Bind(addr, e.to_string()))?;

        Ok(())
    }
}

/// Handler for the reload WebSocket endpoint.
async fn ws_handler(ws: WebSocketUpgrade, State(hub): State<ReloadHub>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| forward_reloads(socket, hub))
}

/// Forward hub messages to one connected client.
async fn forward_reloads(mut socket: WebSocket, hub: ReloadHub) {
    let mut rx = hub.subscribe();

    let msg = serde_json::to_string(&ReloadMessage::Connected).unwrap();
    if socket.send(Message::Text(msg.into())).await.is_err() {
        return;
    }

    while let Ok(reload_msg) = rx.recv().await {
        let json = serde_json::to_string(&reload_msg).unwrap();
        if socket.send(Message::Text(json.into())).await.is_err() {
            break;
        }
    }
}

/// Handler for the reload client script.
async fn script_handler() -> impl IntoResponse {
    (
        [("content-type", "application/javascript")],
        reload_client_script(),
    )
}
