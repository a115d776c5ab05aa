//! Development server with live reload for lamina sites.
//!
//! Serves the build output, watches the source trees and broadcasts a
//! reload message over a WebSocket whenever a build stage completes.

pub mod reload;
pub mod server;
pub mod watcher;

pub use reload::{reload_client_script, reload_snippet, ReloadHub, ReloadMessage};
pub use server::{DevServer, ServeConfig, ServerError};
pub use watcher::{FileWatcher, StageRouter, WatchEvent};
