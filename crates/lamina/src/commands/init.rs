//! Initialize a site in the current directory.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Run the init command.
pub async fn run(yes: bool) -> Result<()> {
    tracing::info!("initializing site...");

    let src = Path::new("src");
    if src.exists() && !yes {
        tracing::warn!("src/ directory already exists. Use --yes to overwrite.");
        return Ok(());
    }

    for dir in [
        "src/templates/pages",
        "src/templates/layouts",
        "src/templates/components",
        "src/data",
        "src/styles",
        "src/scripts",
        "src/webfonts",
        "images",
    ] {
        fs::create_dir_all(dir).with_context(|| format!("failed to create {dir}"))?;
    }

    write_if_absent("site.toml", DEFAULT_CONFIG, yes)?;
    write_if_absent(
        "src/templates/layouts/layout.html",
        DEFAULT_LAYOUT,
        yes,
    )?;
    write_if_absent("src/templates/pages/index.html", DEFAULT_INDEX, yes)?;
    write_if_absent("src/templates/components/nav.html", DEFAULT_NAV, yes)?;
    write_if_absent("src/data/index.json", DEFAULT_DATA, yes)?;
    write_if_absent("src/styles/main.css", DEFAULT_CSS, yes)?;
    write_if_absent("src/scripts/main.js", DEFAULT_JS, yes)?;

    tracing::info!("initialization complete!");
    tracing::info!("Run 'lamina dev' to start the development server.");

    Ok(())
}

fn write_if_absent(path: &str, content: &str, overwrite: bool) -> Result<()> {
    let target = Path::new(path);
    if !target.exists() || overwrite {
        fs::write(target, content).with_context(|| format!("failed to write {path}"))?;
        tracing::info!("created {path}");
    }
    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# Lamina configuration

[paths]
# Template tree: pages/, layouts/, components/
templates = "src/templates"

# Page data files
data = "src/data"

# Static asset trees
styles = "src/styles"
scripts = "src/scripts"
fonts = "src/webfonts"
images = "images"

# Output directory for the built site
output = "dist"

[build]
# Minify CSS and JS
minify = true

# "layout": inject pages into the shared layout and expand
# {{ key }} / <component> tags. "include": render pages with the
# template engine's own include syntax.
mode = "layout"

[data]
# "per-page": src/data/<page>.json per page. "global": one shared file.
mode = "per-page"
"#;

const DEFAULT_LAYOUT: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{{title}}</title>
  <link rel="stylesheet" href="styles/main.css">
</head>
<body>
  <component name="nav"></component>
  {{content}}
  <script src="scripts/main.js"></script>
</body>
</html>
"#;

const DEFAULT_INDEX: &str = r#"<main>
  <h1>{{heading}}</h1>
  <p>{{intro}}</p>
</main>
"#;

const DEFAULT_NAV: &str = r#"<nav>
  <a href="index.html">Home</a>
</nav>
"#;

const DEFAULT_DATA: &str = r#"{
  "title": "My Site",
  "heading": "Welcome",
  "intro": "This page was composed from a layout, a template and a data file."
}
"#;

const DEFAULT_CSS: &str = r#"body {
  font-family: system-ui, sans-serif;
  max-width: 720px;
  margin: 2rem auto;
  padding: 0 1rem;
}

nav a {
  color: #3355cc;
  text-decoration: none;
}
"#;

const DEFAULT_JS: &str = r#"console.log('site loaded');
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn scaffolds_the_stock_tree() {
        let temp = tempdir().unwrap();
        let original = std::env::current_dir().unwrap();
        std::env::set_current_dir(temp.path()).unwrap();

        let result = run(false).await;

        std::env::set_current_dir(original).unwrap();
        result.unwrap();

        assert!(temp.path().join("site.toml").exists());
        assert!(temp
            .path()
            .join("src/templates/layouts/layout.html")
            .exists());
        assert!(temp.path().join("src/templates/pages/index.html").exists());
        assert!(temp.path().join("src/data/index.json").exists());
    }
}
