//! Page, data and fragment lookup.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// How page data files are located.
#[derive(Debug, Clone)]
pub enum DataMode {
    /// `<data_dir>/<page>.json`, one file per page.
    PerPage,
    /// One fixed file shared by every page.
    Global(PathBuf),
}

/// Values substituted into `{{ key }}` tokens: a flat string-to-string
/// mapping. Nested JSON values are not supported and fail the parse.
#[derive(Debug, Clone, Default)]
pub struct PageData {
    map: HashMap<String, String>,
}

impl PageData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub(crate) fn as_map(&self) -> &HashMap<String, String> {
        &self.map
    }
}

impl FromIterator<(String, String)> for PageData {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}

/// Errors that abort composing a single page.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("invalid JSON in data file {path}: {message}")]
    MalformedData { path: String, message: String },

    #[error("template error in {name}: {message}")]
    Template { name: String, message: String },
}

/// On-demand loader for named HTML fragments.
///
/// Fragments are read from disk on every lookup; nothing is cached across
/// pages.
#[derive(Debug, Clone)]
pub struct ComponentLibrary {
    dir: PathBuf,
}

impl ComponentLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Full text of `<dir>/<name>.html`, or `None` if it cannot be read.
    pub fn get(&self, name: &str) -> Option<String> {
        fs::read_to_string(self.dir.join(format!("{name}.html"))).ok()
    }
}

/// A page template plus its data mapping, ready for rendering.
#[derive(Debug)]
pub struct PageSource {
    /// File stem of the template, e.g. `index` for `index.html`.
    pub name: String,
    /// Path relative to the pages directory; mirrored into the output tree.
    pub rel_path: PathBuf,
    /// Raw template text.
    pub body: String,
    pub data: PageData,
    /// Non-fatal conditions hit while loading, e.g. a missing data file.
    pub warnings: Vec<String>,
}

/// Locates a page's template, its data file, the shared layout and the
/// component fragments.
pub struct Resolver {
    pages_dir: PathBuf,
    data_dir: PathBuf,
    data_mode: DataMode,
    layout_path: Option<PathBuf>,
    components: ComponentLibrary,
}

impl Resolver {
    pub fn new(
        pages_dir: impl Into<PathBuf>,
        data_dir: impl Into<PathBuf>,
        data_mode: DataMode,
        layout_path: Option<PathBuf>,
        components_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            pages_dir: pages_dir.into(),
            data_dir: data_dir.into(),
            data_mode,
            layout_path,
            components: ComponentLibrary::new(components_dir),
        }
    }

    /// Read a page template and load its data mapping.
    pub fn page(&self, template: &Path) -> Result<PageSource, ComposeError> {
        let body = fs::read_to_string(template).map_err(|e| ComposeError::Read {
            path: template.display().to_string(),
            message: e.to_string(),
        })?;

        let name = template
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("index")
            .to_string();

        let rel_path = template
            .strip_prefix(&self.pages_dir)
            .unwrap_or(template)
            .to_path_buf();

        let mut warnings = Vec::new();
        let data = self.data_for(&name, &mut warnings)?;

        Ok(PageSource {
            name,
            rel_path,
            body,
            data,
            warnings,
        })
    }

    /// Load the data mapping for a page name.
    ///
    /// A missing file yields an empty mapping and a warning; unparsable
    /// JSON is fatal for the page and names the offending file.
    pub fn data_for(
        &self,
        name: &str,
        warnings: &mut Vec<String>,
    ) -> Result<PageData, ComposeError> {
        let path = match &self.data_mode {
            DataMode::PerPage => self.data_dir.join(format!("{name}.json")),
            DataMode::Global(path) => path.clone(),
        };

        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warnings.push(format!(
                    "data file {} not found, rendering {name} with template values only",
                    path.display()
                ));
                return Ok(PageData::default());
            }
            Err(e) => {
                return Err(ComposeError::Read {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })
            }
        };

        let map: HashMap<String, String> =
            serde_json::from_str(&raw).map_err(|e| ComposeError::MalformedData {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Ok(PageData { map })
    }

    /// Read the shared layout, if one is configured and present.
    ///
    /// A configured layout that cannot be read degrades to rendering pages
    /// without a shell; the condition is recorded, never fatal.
    pub fn layout(&self, warnings: &mut Vec<String>) -> Option<String> {
        let path = self.layout_path.as_ref()?;
        match fs::read_to_string(path) {
            Ok(text) => Some(text),
            Err(e) => {
                warnings.push(format!(
                    "layout {} could not be read ({e}), pages render without a shell",
                    path.display()
                ));
                None
            }
        }
    }

    pub fn components(&self) -> &ComponentLibrary {
        &self.components
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn resolver_at(root: &Path) -> Resolver {
        Resolver::new(
            root.join("pages"),
            root.join("data"),
            DataMode::PerPage,
            Some(root.join("layout.html")),
            root.join("components"),
        )
    }

    #[test]
    fn missing_data_file_yields_empty_mapping_and_warning() {
        let temp = tempdir().unwrap();
        let resolver = resolver_at(temp.path());

        let mut warnings = Vec::new();
        let data = resolver.data_for("about", &mut warnings).unwrap();

        assert!(data.is_empty());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("about.json"));
    }

    #[test]
    fn per_page_data_loads_values() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("data")).unwrap();
        fs::write(
            temp.path().join("data/index.json"),
            r#"{"name": "World", "title": "Home"}"#,
        )
        .unwrap();

        let resolver = resolver_at(temp.path());
        let mut warnings = Vec::new();
        let data = resolver.data_for("index", &mut warnings).unwrap();

        assert_eq!(data.get("name"), Some("World"));
        assert_eq!(data.get("title"), Some("Home"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn malformed_json_is_fatal_and_names_the_file() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("data")).unwrap();
        fs::write(temp.path().join("data/broken.json"), "{ not json").unwrap();

        let resolver = resolver_at(temp.path());
        let mut warnings = Vec::new();
        let err = resolver.data_for("broken", &mut warnings).unwrap_err();

        assert!(matches!(err, ComposeError::MalformedData { .. }));
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn nested_values_are_rejected() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("data")).unwrap();
        fs::write(
            temp.path().join("data/index.json"),
            r#"{"meta": {"nested": true}}"#,
        )
        .unwrap();

        let resolver = resolver_at(temp.path());
        let mut warnings = Vec::new();
        let err = resolver.data_for("index", &mut warnings).unwrap_err();

        assert!(matches!(err, ComposeError::MalformedData { .. }));
    }

    #[test]
    fn global_mode_reads_the_fixed_file() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("site.json"), r#"{"title": "Shared"}"#).unwrap();

        let resolver = Resolver::new(
            temp.path().join("pages"),
            temp.path().join("data"),
            DataMode::Global(temp.path().join("site.json")),
            None,
            temp.path().join("components"),
        );

        let mut warnings = Vec::new();
        let data = resolver.data_for("anything", &mut warnings).unwrap();

        assert_eq!(data.get("title"), Some("Shared"));
    }

    #[test]
    fn page_reads_template_and_data() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("pages")).unwrap();
        fs::create_dir_all(temp.path().join("data")).unwrap();
        fs::write(temp.path().join("pages/index.html"), "<p>{{greeting}}</p>").unwrap();
        fs::write(temp.path().join("data/index.json"), r#"{"greeting": "hi"}"#).unwrap();

        let resolver = resolver_at(temp.path());
        let page = resolver.page(&temp.path().join("pages/index.html")).unwrap();

        assert_eq!(page.name, "index");
        assert_eq!(page.rel_path, Path::new("index.html"));
        assert_eq!(page.body, "<p>{{greeting}}</p>");
        assert_eq!(page.data.get("greeting"), Some("hi"));
    }

    #[test]
    fn missing_layout_degrades_with_warning() {
        let temp = tempdir().unwrap();
        let resolver = resolver_at(temp.path());

        let mut warnings = Vec::new();
        assert!(resolver.layout(&mut warnings).is_none());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn component_library_reads_fragments() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("nav.html"), "<nav></nav>").unwrap();

        let library = ComponentLibrary::new(temp.path());

        assert_eq!(library.get("nav").as_deref(), Some("<nav></nav>"));
        assert!(library.get("footer").is_none());
    }
}
