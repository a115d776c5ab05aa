//! `site.toml` parsing.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

use lamina_build::{BuildConfig, ComposeMode};
use lamina_compose::DataMode;

/// Configuration file structure. Every field has a default, so a missing
/// file behaves like the stock layout.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub paths: PathsSection,
    #[serde(default)]
    pub build: BuildSection,
    #[serde(default)]
    pub data: DataSection,
}

#[derive(Debug, Deserialize)]
pub struct PathsSection {
    #[serde(default = "default_templates")]
    pub templates: String,
    #[serde(default = "default_data")]
    pub data: String,
    #[serde(default = "default_styles")]
    pub styles: String,
    #[serde(default = "default_scripts")]
    pub scripts: String,
    #[serde(default = "default_fonts")]
    pub fonts: String,
    #[serde(default = "default_images")]
    pub images: String,
    /// Admin panel tree; only copied when set
    pub admin: Option<String>,
    #[serde(default = "default_output")]
    pub output: String,
}

#[derive(Debug, Deserialize)]
pub struct BuildSection {
    #[serde(default = "default_minify")]
    pub minify: bool,
    /// Composition strategy: "layout" or "include"
    #[serde(default = "default_mode")]
    pub mode: String,
}

#[derive(Debug, Deserialize)]
pub struct DataSection {
    /// "per-page" or "global"
    #[serde(default = "default_data_mode")]
    pub mode: String,
    /// Shared data file used in global mode
    #[serde(default = "default_global_file")]
    pub global_file: String,
}

fn default_templates() -> String {
    "src/templates".to_string()
}
fn default_data() -> String {
    "src/data".to_string()
}
fn default_styles() -> String {
    "src/styles".to_string()
}
fn default_scripts() -> String {
    "src/scripts".to_string()
}
fn default_fonts() -> String {
    "src/webfonts".to_string()
}
fn default_images() -> String {
    "images".to_string()
}
fn default_output() -> String {
    "dist".to_string()
}
fn default_minify() -> bool {
    true
}
fn default_mode() -> String {
    "layout".to_string()
}
fn default_data_mode() -> String {
    "per-page".to_string()
}
fn default_global_file() -> String {
    "src/data/site.json".to_string()
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            templates: default_templates(),
            data: default_data(),
            styles: default_styles(),
            scripts: default_scripts(),
            fonts: default_fonts(),
            images: default_images(),
            admin: None,
            output: default_output(),
        }
    }
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            minify: default_minify(),
            mode: default_mode(),
        }
    }
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            mode: default_data_mode(),
            global_file: default_global_file(),
        }
    }
}

/// Load configuration from site.toml if it exists.
/// Returns an error if the config file exists but is malformed.
pub fn load() -> Result<ConfigFile> {
    let path = PathBuf::from("site.toml");
    if path.exists() {
        let content = fs::read_to_string(&path).context("failed to read site.toml")?;
        let config: ConfigFile =
            toml::from_str(&content).context("failed to parse site.toml")?;
        tracing::info!("loaded site.toml");
        return Ok(config);
    }
    Ok(ConfigFile::default())
}

impl ConfigFile {
    /// Resolve the file values (plus CLI overrides) into a build config.
    pub fn into_build_config(
        self,
        output: Option<PathBuf>,
        minify: Option<bool>,
    ) -> Result<BuildConfig> {
        let mode = match self.build.mode.as_str() {
            "layout" => ComposeMode::Layout,
            "include" => ComposeMode::Include,
            other => anyhow::bail!(
                "unknown build.mode {other:?} (expected \"layout\" or \"include\")"
            ),
        };

        let data_mode = match self.data.mode.as_str() {
            "per-page" => DataMode::PerPage,
            "global" => DataMode::Global(PathBuf::from(&self.data.global_file)),
            other => anyhow::bail!(
                "unknown data.mode {other:?} (expected \"per-page\" or \"global\")"
            ),
        };

        let templates_dir = PathBuf::from(&self.paths.templates);

        Ok(BuildConfig {
            pages_dir: templates_dir.join("pages"),
            layout: Some(templates_dir.join("layouts/layout.html")),
            components_dir: templates_dir.join("components"),
            templates_dir,
            data_dir: PathBuf::from(&self.paths.data),
            data_mode,
            styles_dir: PathBuf::from(&self.paths.styles),
            scripts_dir: PathBuf::from(&self.paths.scripts),
            fonts_dir: PathBuf::from(&self.paths.fonts),
            images_dir: PathBuf::from(&self.paths.images),
            admin_dir: self.paths.admin.map(PathBuf::from),
            output_dir: output.unwrap_or_else(|| PathBuf::from(&self.paths.output)),
            minify: minify.unwrap_or(self.build.minify),
            mode,
            reload_snippet: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_falls_back_to_stock_layout() {
        let config: ConfigFile = toml::from_str("").unwrap();
        let build = config.into_build_config(None, None).unwrap();

        assert_eq!(build.pages_dir, PathBuf::from("src/templates/pages"));
        assert_eq!(build.output_dir, PathBuf::from("dist"));
        assert_eq!(build.mode, ComposeMode::Layout);
        assert!(build.minify);
        assert!(build.admin_dir.is_none());
    }

    #[test]
    fn file_values_and_cli_overrides_apply() {
        let config: ConfigFile = toml::from_str(
            r#"
[paths]
templates = "web/templates"
admin = "admin"
output = "public"

[build]
minify = true
mode = "include"

[data]
mode = "global"
global_file = "web/site.json"
"#,
        )
        .unwrap();

        let build = config
            .into_build_config(Some(PathBuf::from("out")), Some(false))
            .unwrap();

        assert_eq!(build.templates_dir, PathBuf::from("web/templates"));
        assert_eq!(build.admin_dir, Some(PathBuf::from("admin")));
        // CLI overrides win over file values
        assert_eq!(build.output_dir, PathBuf::from("out"));
        assert!(!build.minify);
        assert_eq!(build.mode, ComposeMode::Include);
        assert!(matches!(
            build.data_mode,
            lamina_compose::DataMode::Global(_)
        ));
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let config: ConfigFile = toml::from_str("[build]\nmode = \"sandwich\"\n").unwrap();

        assert!(config.into_build_config(None, None).is_err());
    }
}
