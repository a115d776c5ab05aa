//! Preview server command.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::services::ServeDir;

use crate::config;

/// Run the serve command.
pub async fn run(port: u16, dir: Option<PathBuf>) -> Result<()> {
    let file_config = config::load()?;
    let dir = dir.unwrap_or_else(|| PathBuf::from(&file_config.paths.output));

    if !dir.exists() {
        anyhow::bail!(
            "directory not found: {}. Run 'lamina build' first.",
            dir.display()
        );
    }

    let addr: SocketAddr = format!("127.0.0.1:{}", port)
        .parse()
        .context("invalid address")?;

    tracing::info!("serving {} at http://{}", dir.display(), addr);

    let app = Router::new().fallback_service(ServeDir::new(&dir));

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let url = format!("http://{}", addr);
    let _ = open::that(&url);

    axum::serve(listener, app).await?;

    Ok(())
}
