//! Recursive asset-tree mirroring.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::Path;

/// What a directory entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    /// Symlink or other special file type; mirroring refuses these.
    Other,
}

/// One entry in a listed directory.
#[derive(Debug, Clone)]
pub struct Entry {
    pub name: OsString,
    pub kind: EntryKind,
}

/// Errors from mirroring an asset tree.
#[derive(Debug, thiserror::Error)]
pub enum CopyError {
    #[error("source directory not found: {0}")]
    MissingSource(String),

    #[error("unsupported entry type at {0} (symlink or special file)")]
    UnsupportedEntry(String),

    #[error("io error at {path}: {message}")]
    Io { path: String, message: String },
}

/// Minimal file-tree capability used by [`copy_tree`].
///
/// The build pipeline runs against [`LocalStorage`]; tests can supply an
/// in-memory implementation instead of touching the disk.
pub trait Storage {
    fn list(&self, dir: &Path) -> io::Result<Vec<Entry>>;
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;
    fn exists(&self, path: &Path) -> bool;
}

/// Counts of mirrored entries, for build reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    pub files: usize,
    pub dirs: usize,
}

/// Mirror every file and subdirectory of `src` into `dst`.
///
/// Destination directories are created on demand, existing files are
/// overwritten, and nested directories recurse into the matching
/// destination child. Every invocation copies the full tree, so running
/// it twice over an unchanged source leaves the destination identical.
pub fn copy_tree<S: Storage + ?Sized>(
    storage: &S,
    src: &Path,
    dst: &Path,
) -> Result<CopyStats, CopyError> {
    if !storage.exists(src) {
        return Err(CopyError::MissingSource(src.display().to_string()));
    }
    storage.create_dir_all(dst).map_err(|e| io_error(dst, e))?;

    let mut stats = CopyStats::default();
    for entry in storage.list(src).map_err(|e| io_error(src, e))? {
        let from = src.join(&entry.name);
        let to = dst.join(&entry.name);

        match entry.kind {
            EntryKind::File => {
                let bytes = storage.read(&from).map_err(|e| io_error(&from, e))?;
                storage.write(&to, &bytes).map_err(|e| io_error(&to, e))?;
                stats.files += 1;
            }
            EntryKind::Dir => {
                let nested = copy_tree(storage, &from, &to)?;
                stats.files += nested.files;
                stats.dirs += nested.dirs + 1;
            }
            EntryKind::Other => {
                return Err(CopyError::UnsupportedEntry(from.display().to_string()));
            }
        }
    }

    Ok(stats)
}

fn io_error(path: &Path, e: io::Error) -> CopyError {
    CopyError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

/// [`Storage`] over the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

impl Storage for LocalStorage {
    fn list(&self, dir: &Path) -> io::Result<Vec<Entry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            // file_type() does not follow symlinks, so links surface as Other.
            let file_type = entry.file_type()?;
            let kind = if file_type.is_file() {
                EntryKind::File
            } else if file_type.is_dir() {
                EntryKind::Dir
            } else {
                EntryKind::Other
            };
            entries.push(Entry {
                name: entry.file_name(),
                kind,
            });
        }
        Ok(entries)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        fs::write(path, bytes)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}
