//! Development command: build, watch and serve with live reload.

use std::sync::Arc;

use anyhow::{Context, Result};
use lamina_build::{ReloadSink, SiteBuilder};
use lamina_server::{reload_snippet, DevServer, FileWatcher, ReloadHub, ServeConfig, StageRouter};

use crate::config;

/// Run the dev server.
pub async fn run(port: u16, open: bool) -> Result<()> {
    let file_config = config::load()?;
    let mut build_config = file_config.into_build_config(None, None)?;
    build_config.reload_snippet = Some(reload_snippet());

    let hub = ReloadHub::new();
    let builder = Arc::new(
        SiteBuilder::new(build_config.clone())
            .with_reload(Arc::new(hub.clone()) as Arc<dyn ReloadSink>),
    );

    // Initial full pass. Page failures are reported but the server still
    // starts, so a fix is picked up by the watcher.
    {
        let builder = Arc::clone(&builder);
        let result = tokio::task::spawn_blocking(move || builder.build()).await??;
        tracing::info!(
            "rendered {} pages in {}ms",
            result.pages,
            result.duration_ms
        );
        for failure in &result.failed {
            tracing::error!("page {} failed: {}", failure.page, failure.message);
        }
    }

    let router = StageRouter::new(&build_config);
    let (watcher, mut events) =
        FileWatcher::new(&router.watch_paths()).context("failed to start file watcher")?;

    // A single consumer drains the event queue, so rebuilds never overlap:
    // a change arriving mid-rebuild waits for the running stage to finish.
    let rebuild_builder = Arc::clone(&builder);
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let Some(stage) = router.stage_for(event.path()) else {
                continue;
            };
            tracing::info!(
                "{} changed, rebuilding {}",
                event.path().display(),
                stage.name()
            );

            let builder = Arc::clone(&rebuild_builder);
            match tokio::task::spawn_blocking(move || builder.run_stage(stage)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!("rebuild failed: {e}"),
                Err(e) => tracing::error!("rebuild task panicked: {e}"),
            }
        }
        drop(watcher);
    });

    let serve_config = ServeConfig {
        root: build_config.output_dir.clone(),
        port,
        open,
        ..Default::default()
    };

    DevServer::new(serve_config).serve(hub).await?;

    Ok(())
}
