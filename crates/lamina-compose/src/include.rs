//! File-inclusion rendering via minijinja.
//!
//! Pages use the engine's own syntax at the same `{{ }}` delimiters:
//! `{{ key }}` for data values and `{% include "components/nav.html" %}`
//! for fragment inclusion. Template names resolve against the templates
//! root, so a page and the fragments it pulls in live in one tree.

use std::path::Path;

use minijinja::Environment;

use crate::resolver::{ComposeError, PageData};

/// Template engine for include-mode sites.
pub struct IncludeEngine {
    env: Environment<'static>,
}

impl IncludeEngine {
    /// Create an engine rooted at the templates directory.
    pub fn new(templates_root: &Path) -> Self {
        let mut env = Environment::new();
        env.set_loader(minijinja::path_loader(templates_root));
        Self { env }
    }

    /// Render a page template by its path relative to the root, with the
    /// data mapping as the context. Undefined keys render as empty.
    pub fn render(&self, name: &str, data: &PageData) -> Result<String, ComposeError> {
        let template = self
            .env
            .get_template(name)
            .map_err(|e| ComposeError::Template {
                name: name.to_string(),
                message: e.to_string(),
            })?;

        template
            .render(data.as_map())
            .map_err(|e| ComposeError::Template {
                name: name.to_string(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn page_data(pairs: &[(&str, &str)]) -> PageData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn renders_data_values() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("pages")).unwrap();
        fs::write(temp.path().join("pages/index.html"), "<p>Hi {{ name }}</p>").unwrap();

        let engine = IncludeEngine::new(temp.path());
        let html = engine
            .render("pages/index.html", &page_data(&[("name", "World")]))
            .unwrap();

        assert_eq!(html, "<p>Hi World</p>");
    }

    #[test]
    fn includes_fragments_from_the_same_tree() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("pages")).unwrap();
        fs::create_dir_all(temp.path().join("components")).unwrap();
        fs::write(
            temp.path().join("pages/index.html"),
            r#"{% include "components/nav.html" %}<main></main>"#,
        )
        .unwrap();
        fs::write(temp.path().join("components/nav.html"), "<nav></nav>").unwrap();

        let engine = IncludeEngine::new(temp.path());
        let html = engine.render("pages/index.html", &PageData::new()).unwrap();

        assert_eq!(html, "<nav></nav><main></main>");
    }

    #[test]
    fn undefined_keys_render_empty() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("pages")).unwrap();
        fs::write(temp.path().join("pages/index.html"), "<h1>{{ title }}</h1>").unwrap();

        let engine = IncludeEngine::new(temp.path());
        let html = engine.render("pages/index.html", &PageData::new()).unwrap();

        assert_eq!(html, "<h1></h1>");
    }

    #[test]
    fn unknown_template_is_an_error() {
        let temp = tempdir().unwrap();
        let engine = IncludeEngine::new(temp.path());

        let err = engine
            .render("pages/missing.html", &PageData::new())
            .unwrap_err();

        assert!(matches!(err, ComposeError::Template { .. }));
    }
}
