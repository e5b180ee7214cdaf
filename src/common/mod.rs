//! Common utilities and types module.
// Shared value types and the input walk used by the container drivers.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::ArchiverError;
use crate::sanitize::arcname_for;

/// Compression level in `0..=9`. 0 is fastest, 9 is smallest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CompressionLevel(u8);

impl CompressionLevel {
    pub const MIN: CompressionLevel = CompressionLevel(0);
    pub const MAX: CompressionLevel = CompressionLevel(9);

    /// Clamps `level` into `0..=9`. Never fails.
    pub fn new(level: i64) -> Self {
        CompressionLevel(level.clamp(0, 9) as u8)
    }

    pub fn get(self) -> u32 {
        self.0 as u32
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        CompressionLevel(6)
    }
}

impl fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque password bytes. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(Vec<u8>);

impl Password {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The password as text, or `None` when it is not valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

impl From<&str> for Password {
    fn from(s: &str) -> Self {
        Password(s.as_bytes().to_vec())
    }
}

impl From<String> for Password {
    fn from(s: String) -> Self {
        Password(s.into_bytes())
    }
}

impl From<Vec<u8>> for Password {
    fn from(bytes: Vec<u8>) -> Self {
        Password(bytes)
    }
}

/// One file or directory to be written into a container archive.
#[derive(Debug, Clone)]
pub struct EntrySource {
    /// Absolute path on disk.
    pub source: PathBuf,
    /// `/`-separated path inside the archive.
    pub arcname: String,
    pub is_dir: bool,
    pub size: u64,
    /// Unix permission bits, if the platform has them.
    pub permissions: Option<u32>,
    pub modified: Option<SystemTime>,
}

impl EntrySource {
    fn from_metadata(source: PathBuf, arcname: String, metadata: &fs::Metadata) -> Self {
        let permissions = {
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                Some(metadata.permissions().mode())
            }
            #[cfg(not(unix))]
            {
                None
            }
        };
        EntrySource {
            source,
            arcname,
            is_dir: metadata.is_dir(),
            size: if metadata.is_dir() { 0 } else { metadata.len() },
            permissions,
            modified: metadata.modified().ok(),
        }
    }
}

/// Expands `inputs` into archive entries.
///
/// A file input becomes one entry named by its basename. A directory input is
/// walked in full and every entry is named relative to the directory's parent,
/// so the directory's own name is the top-level prefix. Symlinks inside a walk
/// are skipped, and so is `skip` (the archive being written).
pub fn collect_entries(inputs: &[PathBuf], skip: Option<&Path>) -> Result<Vec<EntrySource>, ArchiverError> {
    let skip = skip.and_then(|p| absolute_path(p).ok());
    let mut entries = Vec::new();

    for input in inputs {
        let input = fs::canonicalize(input).map_err(|e| ArchiverError::io("resolve input", input, e))?;
        let metadata = fs::metadata(&input).map_err(|e| ArchiverError::io("read metadata of", &input, e))?;

        if !metadata.is_dir() {
            let arcname = input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| ArchiverError::UnsafeEntryPath { name: input.display().to_string() })?;
            entries.push(EntrySource::from_metadata(input, arcname, &metadata));
            continue;
        }

        let base = input.parent().map(Path::to_path_buf).unwrap_or_else(|| input.clone());
        for entry in WalkDir::new(&input).follow_links(false).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(&input).to_path_buf();
                ArchiverError::io("walk directory", path, e.into())
            })?;
            let path = entry.path();

            if entry.path_is_symlink() {
                debug!("skipping symlink {}", path.display());
                continue;
            }
            if skip.as_deref() == Some(path) {
                debug!("skipping the archive being written: {}", path.display());
                continue;
            }
            if path == base {
                // Filesystem root given as input: it has no name of its own.
                continue;
            }

            let metadata = entry
                .metadata()
                .map_err(|e| ArchiverError::io("read metadata of", path, e.into()))?;
            let arcname = arcname_for(&base, path)?;
            entries.push(EntrySource::from_metadata(path.to_path_buf(), arcname, &metadata));
        }
    }

    Ok(entries)
}

/// Makes `path` absolute without requiring it to exist: the parent is
/// canonicalized and the file name appended.
pub fn absolute_path(path: &Path) -> std::io::Result<PathBuf> {
    if let Ok(canonical) = fs::canonicalize(path) {
        return Ok(canonical);
    }
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => fs::canonicalize(p)?,
        _ => std::env::current_dir()?,
    };
    Ok(match path.file_name() {
        Some(name) => parent.join(name),
        None => parent,
    })
}
