//! Template composition for lamina sites.
//!
//! Loads page templates together with their JSON data, injects them into a
//! shared layout and expands placeholder tokens and component fragments.

pub mod include;
pub mod render;
pub mod resolver;
pub mod tokens;

pub use include::IncludeEngine;
pub use render::{compose, Rendered, CONTENT_MARKER};
pub use resolver::{
    ComponentLibrary, ComposeError, DataMode, PageData, PageSource, Resolver,
};
