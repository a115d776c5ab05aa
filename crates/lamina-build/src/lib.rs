//! Build pipeline for lamina sites.
//!
//! Renders page templates into the output tree, minifies stylesheets and
//! scripts, and mirrors static asset trees.

pub mod assets;
pub mod builder;
pub mod minify;

pub use assets::{copy_tree, CopyError, CopyStats, Entry, EntryKind, LocalStorage, Storage};
pub use builder::{
    BuildConfig, BuildError, BuildResult, ComposeMode, NullReload, PageFailure, ReloadSink,
    SiteBuilder, Stage,
};
pub use minify::{minify_css, minify_js, MinifyError};
