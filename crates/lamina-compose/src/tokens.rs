//! Placeholder scanning for `{{ key }}` tokens.

/// A single `{{ key }}` occurrence in template text.
///
/// `start..end` covers the full token including the braces; `key` is the
/// trimmed text between them, borrowed from the scanned string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderSpan<'a> {
    pub start: usize,
    pub end: usize,
    pub key: &'a str,
}

/// Lazy iterator over placeholder tokens in a template string.
///
/// Matches are found left to right and never overlap. The iterator holds no
/// state beyond its scan position, so every call site starts a fresh scan.
pub struct Placeholders<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Placeholders<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }
}

impl<'a> Iterator for Placeholders<'a> {
    type Item = PlaceholderSpan<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let rest = &self.source[self.pos..];
            let open = self.pos + rest.find("{{")?;
            let close = open + 2 + self.source[open + 2..].find("}}")?;
            let inner = &self.source[open + 2..close];

            // A key cannot be empty or contain a stray closing brace.
            if inner.is_empty() || inner.contains('}') {
                self.pos = open + 2;
                continue;
            }

            self.pos = close + 2;
            return Some(PlaceholderSpan {
                start: open,
                end: close + 2,
                key: inner.trim(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(source: &str) -> Vec<&str> {
        Placeholders::new(source).map(|s| s.key).collect()
    }

    #[test]
    fn finds_tokens_left_to_right() {
        let spans: Vec<_> = Placeholders::new("a {{x}} b {{y}}").collect();

        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].key, "x");
        assert_eq!(&"a {{x}} b {{y}}"[spans[0].start..spans[0].end], "{{x}}");
        assert_eq!(spans[1].key, "y");
    }

    #[test]
    fn trims_whitespace_around_keys() {
        assert_eq!(keys("{{  title  }}"), vec!["title"]);
        assert_eq!(keys("{{title}}"), vec!["title"]);
    }

    #[test]
    fn unterminated_token_ends_the_scan() {
        assert_eq!(keys("before {{name"), Vec::<&str>::new());
    }

    #[test]
    fn adjacent_tokens_do_not_overlap() {
        assert_eq!(keys("{{a}}{{b}}"), vec!["a", "b"]);
    }

    #[test]
    fn empty_braces_are_not_a_token() {
        assert_eq!(keys("{{}}"), Vec::<&str>::new());
        // A whitespace-only key still scans; it just never matches data.
        assert_eq!(keys("{{ }}"), vec![""]);
    }

    #[test]
    fn stray_closing_brace_skips_the_candidate() {
        assert_eq!(keys("{{a}b}}"), Vec::<&str>::new());
    }
}
