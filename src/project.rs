//! Folder discovery: which image files a reviewed folder contains.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::OverviewError;

/// Extensions the overview accepts (compared case-insensitively).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tiff"];

/// Check if a filename (string) has a supported image extension.
/// Works with both full paths and just filenames.
pub fn is_image_filename(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Reference to an image file on disk. Immutable and cheap to clone.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct FileRef {
    path: Arc<Path>,
    name: Arc<str>,
}

impl FileRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path: PathBuf = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self {
            path: path.into(),
            name: name.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name without directories; the key used by the results store.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileRef({:?})", self.path)
    }
}

/// Source of image file lists.
pub trait FileSystemProvider {
    /// Image files directly inside `dir`, sorted by file name.
    fn list_image_files(&self, dir: &Path) -> Result<Vec<FileRef>, OverviewError>;
}

/// Non-recursive listing of a local folder.
///
/// Ordering is case-sensitive byte order of the file name, so `B.png`
/// sorts before `a.png`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeFileSystem;

impl FileSystemProvider for NativeFileSystem {
    fn list_image_files(&self, dir: &Path) -> Result<Vec<FileRef>, OverviewError> {
        if !dir.exists() {
            return Err(OverviewError::FolderNotFound {
                path: dir.to_path_buf(),
            });
        }
        if !dir.is_dir() {
            return Err(OverviewError::NotADirectory {
                path: dir.to_path_buf(),
            });
        }

        let mut files: Vec<FileRef> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .map(is_image_filename)
                        .unwrap_or(false)
            })
            .map(FileRef::new)
            .collect();

        files.sort_by(|a, b| a.name().cmp(b.name()));

        log::info!("Scanned folder {:?}: found {} images", dir, files.len());
        Ok(files)
    }
}
