//! File watching for watch-triggered rebuilds.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc as async_mpsc;

use lamina_build::{BuildConfig, Stage};

/// Events emitted by the file watcher.
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// File was created
    Created(PathBuf),

    /// File was deleted
    Deleted(PathBuf),

    /// File was modified
    Modified(PathBuf),
}

impl WatchEvent {
    pub fn path(&self) -> &Path {
        match self {
            WatchEvent::Created(p) | WatchEvent::Deleted(p) | WatchEvent::Modified(p) => p,
        }
    }
}

/// File watcher for detecting source changes.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Create a new file watcher for the given paths.
    ///
    /// Returns the watcher and a channel to receive events. Paths that do
    /// not exist yet are skipped rather than failing the watch.
    pub fn new(
        paths: &[PathBuf],
    ) -> Result<(Self, async_mpsc::Receiver<WatchEvent>), std::io::Error> {
        let (sync_tx, sync_rx) = mpsc::channel();
        let (async_tx, async_rx) = async_mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
            if let Ok(event) = res {
                let _ = sync_tx.send(event);
            }
        })
        .map_err(std::io::Error::other)?;

        for path in paths {
            if path.exists() {
                watcher
                    .watch(path, RecursiveMode::Recursive)
                    .map_err(std::io::Error::other)?;
            }
        }

        // Forward events onto the async channel, debouncing bursts.
        std::thread::spawn(move || {
            let mut last_event_time = std::time::Instant::now();
            let debounce_duration = Duration::from_millis(100);

            while let Ok(event) = sync_rx.recv() {
                let now = std::time::Instant::now();
                if now.duration_since(last_event_time) < debounce_duration {
                    continue;
                }
                last_event_time = now;

                for path in event.paths {
                    if let Some(e) = classify_event(path, &event.kind) {
                        let _ = async_tx.blocking_send(e);
                    }
                }
            }
        });

        Ok((Self { _watcher: watcher }, async_rx))
    }
}

/// Classify a notify event into a WatchEvent.
fn classify_event(path: PathBuf, kind: &notify::EventKind) -> Option<WatchEvent> {
    use notify::EventKind;

    match kind {
        EventKind::Create(_) => Some(WatchEvent::Created(path)),
        EventKind::Remove(_) => Some(WatchEvent::Deleted(path)),
        EventKind::Modify(_) => Some(WatchEvent::Modified(path)),
        _ => None,
    }
}

/// Maps changed paths to the build stage that must re-run.
///
/// Routes mirror the build inputs: template and data changes re-render
/// pages; each asset tree re-runs its own stage.
pub struct StageRouter {
    routes: Vec<(PathBuf, Stage)>,
}

impl StageRouter {
    pub fn new(config: &BuildConfig) -> Self {
        let mut routes = vec![
            (config.templates_dir.clone(), Stage::Pages),
            (config.data_dir.clone(), Stage::Pages),
            (config.styles_dir.clone(), Stage::Styles),
            (config.scripts_dir.clone(), Stage::Scripts),
            (config.fonts_dir.clone(), Stage::Fonts),
            (config.images_dir.clone(), Stage::Images),
        ];
        if let Some(admin) = &config.admin_dir {
            routes.push((admin.clone(), Stage::Admin));
        }

        // Watcher events carry canonical paths, so routes must too.
        for (dir, _) in &mut routes {
            if let Ok(canonical) = fs::canonicalize(&dir) {
                *dir = canonical;
            }
        }

        Self { routes }
    }

    /// The stage a changed path belongs to, if any.
    pub fn stage_for(&self, path: &Path) -> Option<Stage> {
        self.routes
            .iter()
            .find(|(dir, _)| path.starts_with(dir))
            .map(|(_, stage)| *stage)
    }

    /// Directories the watcher should observe.
    pub fn watch_paths(&self) -> Vec<PathBuf> {
        self.routes.iter().map(|(dir, _)| dir.clone()).collect()
    }
}
