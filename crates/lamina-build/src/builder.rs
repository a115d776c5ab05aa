//! Site build pipeline.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use walkdir::WalkDir;

use lamina_compose::{compose, ComposeError, DataMode, IncludeEngine, Resolver};

use crate::assets::{copy_tree, CopyError, LocalStorage};
use crate::minify::{minify_css, minify_js};

/// Which composition strategy renders pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeMode {
    /// Inject page bodies into the shared layout, then substitute
    /// placeholders and component tags in one pass.
    Layout,
    /// Delegate to the template engine's own include syntax.
    Include,
}

/// One unit of the pipeline. The watcher re-runs stages individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Pages,
    Styles,
    Scripts,
    Fonts,
    Images,
    Admin,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Pages => "pages",
            Stage::Styles => "styles",
            Stage::Scripts => "scripts",
            Stage::Fonts => "fonts",
            Stage::Images => "images",
            Stage::Admin => "admin",
        }
    }
}

/// Receives a notification after each completed build stage.
///
/// Injected into the builder so the dev server can broadcast reloads; the
/// default sink does nothing.
pub trait ReloadSink: Send + Sync {
    fn notify(&self, stage: Stage);
}

/// Sink for builds with nobody listening.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReload;

impl ReloadSink for NullReload {
    fn notify(&self, _stage: Stage) {}
}

/// Configuration for building a site.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Root of the template tree (pages/, layouts/, components/)
    pub templates_dir: PathBuf,

    /// Page templates directory
    pub pages_dir: PathBuf,

    /// Shared layout file, used in layout mode
    pub layout: Option<PathBuf>,

    /// Component fragments directory
    pub components_dir: PathBuf,

    /// Page data directory
    pub data_dir: PathBuf,

    /// How data files map to pages
    pub data_mode: DataMode,

    /// Stylesheet tree, mirrored then minified in place
    pub styles_dir: PathBuf,

    /// Script sources, minified file by file
    pub scripts_dir: PathBuf,

    /// Webfont tree, mirrored verbatim
    pub fonts_dir: PathBuf,

    /// Image tree, mirrored verbatim
    pub images_dir: PathBuf,

    /// Admin panel tree, mirrored verbatim when configured
    pub admin_dir: Option<PathBuf>,

    /// Output root
    pub output_dir: PathBuf,

    /// Minify CSS/JS output
    pub minify: bool,

    /// Composition strategy
    pub mode: ComposeMode,

    /// Markup appended to every rendered page; dev builds use this to pull
    /// in the reload client script
    pub reload_snippet: Option<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::from("src/templates"),
            pages_dir: PathBuf::from("src/templates/pages"),
            layout: Some(PathBuf::from("src/templates/layouts/layout.html")),
            components_dir: PathBuf::from("src/templates/components"),
            data_dir: PathBuf::from("src/data"),
            data_mode: DataMode::PerPage,
            styles_dir: PathBuf::from("src/styles"),
            scripts_dir: PathBuf::from("src/scripts"),
            fonts_dir: PathBuf::from("src/webfonts"),
            images_dir: PathBuf::from("images"),
            admin_dir: None,
            output_dir: PathBuf::from("dist"),
            minify: true,
            mode: ComposeMode::Layout,
            reload_snippet: None,
        }
    }
}

/// Result of a full build pass.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of pages rendered
    pub pages: usize,

    /// Pages whose render was aborted
    pub failed: Vec<PageFailure>,

    /// Non-fatal conditions recorded across the pass
    pub warnings: usize,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// A page whose render was aborted, with the cause.
#[derive(Debug)]
pub struct PageFailure {
    pub page: String,
    pub message: String,
}

/// Errors that abort a build stage.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to write {path}: {message}")]
    Write { path: String, message: String },

    #[error(transparent)]
    Compose(#[from] ComposeError),

    #[error(transparent)]
    Copy(#[from] CopyError),
}

struct PagesReport {
    rendered: usize,
    warnings: usize,
    failed: Vec<PageFailure>,
}

/// Drives every stage of a build pass: render pages, process styles and
/// scripts, mirror the static asset trees.
pub struct SiteBuilder {
    config: BuildConfig,
    reload: Arc<dyn ReloadSink>,
}

impl SiteBuilder {
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            reload: Arc::new(NullReload),
        }
    }

    /// Replace the sink notified after each completed stage.
    pub fn with_reload(mut self, sink: Arc<dyn ReloadSink>) -> Self {
        self.reload = sink;
        self
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Run every stage and report the pass.
    ///
    /// A page failure (e.g. a malformed data file) is recorded in the
    /// result without stopping the remaining pages or stages; a failed
    /// asset stage aborts the pass.
    pub fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();

        fs::create_dir_all(&self.config.output_dir)
            .map_err(|e| write_error(&self.config.output_dir, e))?;

        let report = self.build_pages()?;
        self.build_styles()?;
        self.build_scripts()?;
        self.build_fonts()?;
        self.build_images()?;
        self.build_admin()?;

        Ok(BuildResult {
            pages: report.rendered,
            failed: report.failed,
            warnings: report.warnings,
            duration_ms: start.elapsed().as_millis() as u64,
            output_dir: self.config.output_dir.clone(),
        })
    }

    /// Run a single stage, as triggered by the file watcher.
    pub fn run_stage(&self, stage: Stage) -> Result<(), BuildError> {
        match stage {
            Stage::Pages => {
                self.build_pages()?;
            }
            Stage::Styles => self.build_styles()?,
            Stage::Scripts => self.build_scripts()?,
            Stage::Fonts => self.build_fonts()?,
            Stage::Images => self.build_images()?,
            Stage::Admin => self.build_admin()?,
        }
        Ok(())
    }

    fn resolver(&self) -> Resolver {
        Resolver::new(
            &self.config.pages_dir,
            &self.config.data_dir,
            self.config.data_mode.clone(),
            match self.config.mode {
                ComposeMode::Layout => self.config.layout.clone(),
                ComposeMode::Include => None,
            },
            &self.config.components_dir,
        )
    }

    fn build_pages(&self) -> Result<PagesReport, BuildError> {
        let resolver = self.resolver();

        let mut layout_warnings = Vec::new();
        let layout = resolver.layout(&mut layout_warnings);
        for warning in &layout_warnings {
            tracing::warn!("{warning}");
        }

        let engine = match self.config.mode {
            ComposeMode::Include => Some(IncludeEngine::new(&self.config.templates_dir)),
            ComposeMode::Layout => None,
        };

        let templates = self.discover_pages()?;

        let results: Vec<Result<usize, PageFailure>> = templates
            .par_iter()
            .map(|template| {
                let page = template
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("index")
                    .to_string();
                self.render_page(template, &resolver, layout.as_deref(), engine.as_ref())
                    .map_err(|e| PageFailure {
                        page,
                        message: e.to_string(),
                    })
            })
            .collect();

        let mut report = PagesReport {
            rendered: 0,
            warnings: layout_warnings.len(),
            failed: Vec::new(),
        };
        for result in results {
            match result {
                Ok(warnings) => {
                    report.rendered += 1;
                    report.warnings += warnings;
                }
                Err(failure) => {
                    tracing::error!("page {} failed: {}", failure.page, failure.message);
                    report.failed.push(failure);
                }
            }
        }

        tracing::debug!("rendered {} pages", report.rendered);
        self.reload.notify(Stage::Pages);
        Ok(report)
    }

    /// Render one page and write it under the output root. Returns the
    /// number of warnings recorded for the page.
    fn render_page(
        &self,
        template: &Path,
        resolver: &Resolver,
        layout: Option<&str>,
        engine: Option<&IncludeEngine>,
    ) -> Result<usize, BuildError> {
        let page = resolver.page(template)?;

        let (mut html, render_warnings) = match engine {
            None => {
                let rendered = compose(&page.body, layout, &page.data, resolver.components());
                (rendered.html, rendered.warnings)
            }
            Some(engine) => {
                let name = template_name(&self.config.templates_dir, template);
                (engine.render(&name, &page.data)?, Vec::new())
            }
        };

        if let Some(snippet) = &self.config.reload_snippet {
            inject_snippet(&mut html, snippet);
        }

        for warning in page.warnings.iter().chain(&render_warnings) {
            tracing::warn!("{warning}");
        }

        let out_path = self.config.output_dir.join(&page.rel_path);
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(|e| write_error(parent, e))?;
        }
        fs::write(&out_path, html).map_err(|e| write_error(&out_path, e))?;
        tracing::debug!("rendered {}", out_path.display());

        Ok(page.warnings.len() + render_warnings.len())
    }

    /// All `.html` templates under the pages directory, in a stable order.
    fn discover_pages(&self) -> Result<Vec<PathBuf>, BuildError> {
        if !self.config.pages_dir.exists() {
            return Err(BuildError::Read {
                path: self.config.pages_dir.display().to_string(),
                message: "pages directory not found".to_string(),
            });
        }

        let mut templates: Vec<PathBuf> = WalkDir::new(&self.config.pages_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path().is_file()
                    && e.path().extension().and_then(|x| x.to_str()) == Some("html")
            })
            .map(|e| e.into_path())
            .collect();
        templates.sort();

        Ok(templates)
    }

    /// Mirror the stylesheet tree, then minify the top-level sheets in
    /// place. A sheet the minifier rejects is kept unminified.
    fn build_styles(&self) -> Result<(), BuildError> {
        let out = self.config.output_dir.join("styles");
        let stats = copy_tree(&LocalStorage, &self.config.styles_dir, &out)?;
        tracing::debug!("copied {} style files", stats.files);

        if self.config.minify {
            for path in files_with_extension(&self.config.styles_dir, "css")? {
                let source = fs::read_to_string(&path).map_err(|e| read_error(&path, e))?;
                let css = match minify_css(&source) {
                    Ok(css) => css,
                    Err(e) => {
                        tracing::warn!("{e}; keeping {} unminified", path.display());
                        source
                    }
                };
                let target = out.join(path.file_name().unwrap_or_default());
                fs::write(&target, css).map_err(|e| write_error(&target, e))?;
            }
        }

        self.reload.notify(Stage::Styles);
        Ok(())
    }

    /// Minify (or copy verbatim) the top-level scripts into the output.
    fn build_scripts(&self) -> Result<(), BuildError> {
        let out = self.config.output_dir.join("scripts");
        fs::create_dir_all(&out).map_err(|e| write_error(&out, e))?;

        for path in files_with_extension(&self.config.scripts_dir, "js")? {
            let source = fs::read_to_string(&path).map_err(|e| read_error(&path, e))?;
            let js = if self.config.minify {
                match minify_js(&source) {
                    Ok(js) => js,
                    Err(e) => {
                        tracing::warn!("{e}; keeping {} unminified", path.display());
                        source
                    }
                }
            } else {
                source
            };
            let target = out.join(path.file_name().unwrap_or_default());
            fs::write(&target, js).map_err(|e| write_error(&target, e))?;
        }

        self.reload.notify(Stage::Scripts);
        Ok(())
    }

    fn build_fonts(&self) -> Result<(), BuildError> {
        let out = self.config.output_dir.join("webfonts");
        copy_tree(&LocalStorage, &self.config.fonts_dir, &out)?;
        self.reload.notify(Stage::Fonts);
        Ok(())
    }

    fn build_images(&self) -> Result<(), BuildError> {
        let out = self.config.output_dir.join("images");
        copy_tree(&LocalStorage, &self.config.images_dir, &out)?;
        self.reload.notify(Stage::Images);
        Ok(())
    }

    fn build_admin(&self) -> Result<(), BuildError> {
        let Some(admin_dir) = &self.config.admin_dir else {
            return Ok(());
        };
        let out = self.config.output_dir.join("admin");
        copy_tree(&LocalStorage, admin_dir, &out)?;
        self.reload.notify(Stage::Admin);
        Ok(())
    }
}

/// Top-level files in `dir` with the given extension, sorted.
fn files_with_extension(dir: &Path, ext: &str) -> Result<Vec<PathBuf>, BuildError> {
    let entries = fs::read_dir(dir).map_err(|e| read_error(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| read_error(dir, e))?;
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|x| x.to_str()) == Some(ext) {
            files.push(path);
        }
    }
    files.sort();

    Ok(files)
}

/// Template name for the include engine: path relative to the templates
/// root, with forward slashes.
fn template_name(root: &Path, template: &Path) -> String {
    let rel = template.strip_prefix(root).unwrap_or(template);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Append the snippet just before `</body>`, or at the end when the page
/// has no body tag.
fn inject_snippet(html: &mut String, snippet: &str) {
    match html.rfind("</body>") {
        Some(idx) => html.insert_str(idx, snippet),
        None => html.push_str(snippet),
    }
}

fn read_error(path: &Path, e: io::Error) -> BuildError {
    BuildError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

fn write_error(path: &Path, e: io::Error) -> BuildError {
    BuildError::Write {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}
