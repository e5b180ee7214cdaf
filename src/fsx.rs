//! Filesystem helpers shared by the drivers.
//!
//! On Unix permission bits are restored after extraction; elsewhere that is a
//! no-op. Output files are created through [`PartialFile`], which deletes the
//! file again unless the writer explicitly keeps it, so a failed or panicking
//! write never leaves a half-written archive behind.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::ops::Deref;
use std::path::{Path, PathBuf};

use scopeguard::ScopeGuard;
use tracing::{debug, warn};

use crate::error::ArchiverError;

const PUMP_BUF_SIZE: usize = 64 * 1024;

#[cfg(unix)]
/// Set POSIX permission bits on Unix.
pub fn set_unix_permissions(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    // Archives may carry file-type bits in the mode; only permission bits apply.
    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))
}

#[cfg(not(unix))]
/// No-op off Unix: POSIX permission bits are not preserved.
pub fn set_unix_permissions(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

/// A freshly created output file that is removed on drop unless [`keep`](PartialFile::keep) is called.
pub struct PartialFile {
    path: ScopeGuard<PathBuf, fn(PathBuf)>,
}

impl PartialFile {
    /// Creates (or truncates) `path` and arms the cleanup.
    pub fn create(path: &Path) -> Result<(Self, File), ArchiverError> {
        let file = File::create(path).map_err(|e| ArchiverError::io("create output file", path, e))?;
        let guard = scopeguard::guard(path.to_path_buf(), discard as fn(PathBuf));
        Ok((PartialFile { path: guard }, file))
    }

    /// Disarms the cleanup; the file stays on disk.
    pub fn keep(self) -> PathBuf {
        ScopeGuard::into_inner(self.path)
    }
}

impl Deref for PartialFile {
    type Target = Path;

    fn deref(&self) -> &Path {
        &self.path
    }
}

fn discard(path: PathBuf) {
    match fs::remove_file(&path) {
        Ok(()) => debug!("removed partial output {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("could not remove partial output {}: {}", path.display(), e),
    }
}

/// Which side of a copy failed.
#[derive(Debug)]
pub enum PumpError {
    Read(io::Error),
    Write(io::Error),
}

/// Copies `reader` into `writer` and reports whether a failure came from the
/// reading or the writing side. Decoders report bad data as read errors, so
/// callers can tell a corrupt archive from a full disk.
pub fn pump<R, W>(reader: &mut R, writer: &mut W) -> Result<u64, PumpError>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut buf = vec![0u8; PUMP_BUF_SIZE];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(PumpError::Read(e)),
        };
        writer.write_all(&buf[..n]).map_err(PumpError::Write)?;
        total += n as u64;
    }
    Ok(total)
}
