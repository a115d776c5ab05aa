//! Layout-injection rendering.
//!
//! One pass each, in a fixed order: layout injection, placeholder
//! substitution, component inclusion. Text introduced by a substitution is
//! never re-scanned, so placeholder syntax inside a data value or a
//! component fragment survives to the output.

use regex::{Captures, Regex};

use crate::resolver::{ComponentLibrary, PageData};
use crate::tokens::Placeholders;

/// Marker in the layout replaced by the page body.
pub const CONTENT_MARKER: &str = "{{content}}";

const COMPONENT_TAG: &str = r#"<component name="([^"]+)"></component>"#;

/// A fully composed page plus the warnings recorded on the way.
#[derive(Debug)]
pub struct Rendered {
    pub html: String,
    pub warnings: Vec<String>,
}

/// Compose a page body, optional layout and data mapping into final HTML.
pub fn compose(
    body: &str,
    layout: Option<&str>,
    data: &PageData,
    components: &ComponentLibrary,
) -> Rendered {
    let mut warnings = Vec::new();

    let shell = match layout {
        Some(layout) => layout.replacen(CONTENT_MARKER, body, 1),
        None => body.to_string(),
    };

    let substituted = substitute(&shell, data);
    let html = include_components(&substituted, components, &mut warnings);

    Rendered { html, warnings }
}

/// Replace every `{{ key }}` token with its data value, or the empty
/// string when the key is absent.
fn substitute(input: &str, data: &PageData) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last = 0;

    for span in Placeholders::new(input) {
        out.push_str(&input[last..span.start]);
        out.push_str(data.get(span.key).unwrap_or(""));
        last = span.end;
    }

    out.push_str(&input[last..]);
    out
}

/// Expand `<component name="X"></component>` tags from the library.
///
/// A missing fragment becomes an empty string and a recorded warning; the
/// render itself never fails.
fn include_components(
    input: &str,
    components: &ComponentLibrary,
    warnings: &mut Vec<String>,
) -> String {
    let tag = Regex::new(COMPONENT_TAG).expect("component tag pattern is valid");

    tag.replace_all(input, |caps: &Captures<'_>| {
        let name = &caps[1];
        match components.get(name) {
            Some(fragment) => fragment,
            None => {
                warnings.push(format!(
                    "component {name}.html not found, replaced with empty content"
                ));
                String::new()
            }
        }
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn data(pairs: &[(&str, &str)]) -> PageData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn empty_library() -> (tempfile::TempDir, ComponentLibrary) {
        let temp = tempdir().unwrap();
        let library = ComponentLibrary::new(temp.path());
        (temp, library)
    }

    #[test]
    fn injects_body_into_layout_and_substitutes() {
        let (_temp, library) = empty_library();

        let rendered = compose(
            "<p>Hi {{name}}</p>",
            Some("<html>{{content}}</html>"),
            &data(&[("name", "World")]),
            &library,
        );

        assert_eq!(rendered.html, "<html><p>Hi World</p></html>");
        assert!(rendered.warnings.is_empty());
    }

    #[test]
    fn missing_keys_become_empty_strings() {
        let (_temp, library) = empty_library();

        let rendered = compose(
            "<h1>{{title}}</h1><p>{{intro}}</p>",
            None,
            &PageData::new(),
            &library,
        );

        assert_eq!(rendered.html, "<h1></h1><p></p>");
    }

    #[test]
    fn keys_match_regardless_of_inner_whitespace() {
        let (_temp, library) = empty_library();
        let values = data(&[("k", "v")]);

        let tight = compose("{{k}}", None, &values, &library);
        let padded = compose("{{ k }}", None, &values, &library);

        assert_eq!(tight.html, "v");
        assert_eq!(padded.html, "v");
    }

    #[test]
    fn data_values_are_not_rescanned() {
        let (_temp, library) = empty_library();

        let rendered = compose(
            "{{outer}}",
            None,
            &data(&[("outer", "{{inner}}"), ("inner", "nope")]),
            &library,
        );

        assert_eq!(rendered.html, "{{inner}}");
    }

    #[test]
    fn component_tag_expands_to_fragment_text() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("nav.html"), "<nav>menu</nav>").unwrap();
        let library = ComponentLibrary::new(temp.path());

        let rendered = compose(
            r#"<body><component name="nav"></component></body>"#,
            None,
            &PageData::new(),
            &library,
        );

        assert_eq!(rendered.html, "<body><nav>menu</nav></body>");
    }

    #[test]
    fn missing_component_becomes_empty_with_warning() {
        let (_temp, library) = empty_library();

        let rendered = compose(
            r#"<body><component name="nav"></component></body>"#,
            None,
            &PageData::new(),
            &library,
        );

        assert_eq!(rendered.html, "<body></body>");
        assert_eq!(rendered.warnings.len(), 1);
        assert!(rendered.warnings[0].contains("nav.html"));
    }

    #[test]
    fn component_content_is_not_rescanned() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("card.html"), "<div>{{slot}}</div>").unwrap();
        let library = ComponentLibrary::new(temp.path());

        let rendered = compose(
            r#"<component name="card"></component>"#,
            None,
            &data(&[("slot", "filled")]),
            &library,
        );

        // Single pass: the fragment's own placeholder survives.
        assert_eq!(rendered.html, "<div>{{slot}}</div>");
    }

    #[test]
    fn without_layout_the_body_stands_alone() {
        let (_temp, library) = empty_library();

        let rendered = compose("<p>bare</p>", None, &PageData::new(), &library);

        assert_eq!(rendered.html, "<p>bare</p>");
    }

    #[test]
    fn only_the_first_content_marker_is_replaced() {
        let (_temp, library) = empty_library();

        let rendered = compose(
            "X",
            Some("{{content}}|{{content}}"),
            &PageData::new(),
            &library,
        );

        // The second marker falls through to placeholder substitution,
        // where no `content` key exists.
        assert_eq!(rendered.html, "X|");
    }
}
