//! One-shot site build command.

use std::path::PathBuf;

use anyhow::Result;
use lamina_build::SiteBuilder;

use crate::config;

/// Run the build command.
pub async fn run(output: Option<PathBuf>, minify: Option<bool>) -> Result<()> {
    tracing::info!("building site...");

    let file_config = config::load()?;
    let build_config = file_config.into_build_config(output, minify)?;

    let result = SiteBuilder::new(build_config).build()?;

    tracing::info!(
        "rendered {} pages in {}ms",
        result.pages,
        result.duration_ms
    );
    if result.warnings > 0 {
        tracing::warn!("{} warnings recorded during the build", result.warnings);
    }
    tracing::info!("output: {}", result.output_dir.display());

    if !result.failed.is_empty() {
        for failure in &result.failed {
            tracing::error!("page {} failed: {}", failure.page, failure.message);
        }
        anyhow::bail!(
            "{} of {} pages failed to render",
            result.failed.len(),
            result.failed.len() + result.pages
        );
    }

    Ok(())
}
