//! Arcname containment checks used on both the writing and the reading side.

use std::path::{Component, Path, PathBuf};

use crate::error::ArchiverError;

/// Builds the arcname for `path` relative to `base`, using `/` as separator.
///
/// Fails if `path` is not under `base` or if the relative part contains anything
/// other than plain name components.
pub fn arcname_for(base: &Path, path: &Path) -> Result<String, ArchiverError> {
    let relative = path.strip_prefix(base).map_err(|_| ArchiverError::StripPrefix {
        prefix: base.to_path_buf(),
        path: path.to_path_buf(),
    })?;

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            _ => {
                return Err(ArchiverError::UnsafeEntryPath { name: relative.display().to_string() });
            }
        }
    }
    if parts.is_empty() {
        return Err(ArchiverError::UnsafeEntryPath { name: relative.display().to_string() });
    }
    Ok(parts.join("/"))
}

/// Interprets an entry name read from an archive as a path relative to the
/// extraction root. Returns `None` when the name is absolute, empty, or climbs
/// out of the root at any point.
pub fn safe_relative_path(name: &str) -> Option<PathBuf> {
    // Archives written on Windows may use backslashes.
    let name = name.replace('\\', "/");
    if name.starts_with('/') {
        return None;
    }

    let mut out = PathBuf::new();
    for component in Path::new(&name).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if out.as_os_str().is_empty() {
        None
    } else {
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_input_keeps_its_own_name() {
        let base = Path::new("/data/foo");
        let name = arcname_for(base, Path::new("/data/foo/bar/baz.txt")).unwrap();
        assert_eq!(name, "bar/baz.txt");
    }

    #[test]
    fn paths_outside_base_are_rejected() {
        assert!(arcname_for(Path::new("/data/foo"), Path::new("/data/other.txt")).is_err());
        assert!(arcname_for(Path::new("/data/foo"), Path::new("/data/foo")).is_err());
    }

    #[test]
    fn reader_side_rejects_escapes() {
        assert_eq!(safe_relative_path("bar/baz.txt"), Some(PathBuf::from("bar/baz.txt")));
        assert_eq!(safe_relative_path("./bar/./baz.txt"), Some(PathBuf::from("bar/baz.txt")));
        assert_eq!(safe_relative_path("dir\\file.txt"), Some(PathBuf::from("dir/file.txt")));
        assert_eq!(safe_relative_path("../evil.txt"), None);
        assert_eq!(safe_relative_path("bar/../../evil.txt"), None);
        assert_eq!(safe_relative_path("/etc/passwd"), None);
        assert_eq!(safe_relative_path(""), None);
        assert_eq!(safe_relative_path("."), None);
    }
}
