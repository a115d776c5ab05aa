//! CSS and JavaScript minification.

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc_allocator::Allocator;
use oxc_codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc_mangler::MangleOptions;
use oxc_minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc_parser::Parser;
use oxc_span::SourceType;

/// Errors from the minifiers. The pipeline treats these as non-fatal and
/// falls back to the unminified source.
#[derive(Debug, thiserror::Error)]
pub enum MinifyError {
    #[error("CSS minify failed: {0}")]
    Css(String),

    #[error("JS minify failed: {0}")]
    Js(String),
}

/// Minify a stylesheet with lightningcss.
pub fn minify_css(source: &str) -> Result<String, MinifyError> {
    let stylesheet = StyleSheet::parse(source, ParserOptions::default())
        .map_err(|e| MinifyError::Css(e.to_string()))?;

    let out = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..Default::default()
        })
        .map_err(|e| MinifyError::Css(e.to_string()))?;

    Ok(out.code)
}

/// Minify a script with the oxc toolchain: parse, compress, mangle, then
/// re-emit without comments.
pub fn minify_js(source: &str) -> Result<String, MinifyError> {
    let allocator = Allocator::default();

    let parsed = Parser::new(&allocator, source, SourceType::default()).parse();
    if !parsed.errors.is_empty() {
        return Err(MinifyError::Js(format!(
            "parse error: {:?}",
            parsed.errors[0]
        )));
    }
    let mut program = parsed.program;

    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);

    let codegen_options = CodegenOptions {
        minify: true,
        comments: CommentOptions::disabled(),
        ..CodegenOptions::default()
    };
    let out = Codegen::new()
        .with_options(codegen_options)
        .with_scoping(ret.scoping)
        .build(&program);

    Ok(out.code)
}
