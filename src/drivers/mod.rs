//! # Format Drivers
//!
//! One driver per archive family, all behind [`ArchiveDriver`]. The engine picks a
//! driver by matching on [`Format`](crate::format::Format), so the set is closed and
//! checked at compile time.
//!
//! - [`zip::ZipDriver`]: multi-entry container, per-entry deflate, optional ZipCrypto.
//! - [`sevenz::SevenZDriver`]: solid LZMA2 container, optional AES-256 over data and header.
//! - [`stream::StreamDriver`]: gzip, bzip2 and xz over exactly one file, no encryption.

use std::path::{Path, PathBuf};

use crate::common::{CompressionLevel, Password};
use crate::error::ArchiverError;

pub mod sevenz;
pub mod stream;
pub mod zip;

/// Summary of a pack call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackStats {
    /// Entries written (files and directories).
    pub entries: u64,
    /// Uncompressed bytes read from the inputs.
    pub bytes_in: u64,
}

/// What an unpack call restored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnpackStats {
    pub entries: u64,
    /// Paths written, for drivers that produce a single named output.
    pub written: Vec<PathBuf>,
}

/// A name as it appears inside an archive, for listings.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ListedEntry {
    pub name: String,
    /// Uncompressed size, when the format records it.
    pub size: Option<u64>,
    pub is_dir: bool,
}

pub trait ArchiveDriver {
    /// Writes `inputs` into a new archive at `output`. On any error nothing is
    /// left at `output`.
    fn pack(
        &self,
        inputs: &[PathBuf],
        output: &Path,
        level: CompressionLevel,
        password: Option<&Password>,
    ) -> Result<PackStats, ArchiverError>;

    /// Restores the contents of `input` under `output_dir`, which must exist.
    fn unpack(&self, input: &Path, output_dir: &Path, password: Option<&Password>) -> Result<UnpackStats, ArchiverError>;

    /// Lists the entries of `input` without extracting them.
    fn list(&self, input: &Path, password: Option<&Password>) -> Result<Vec<ListedEntry>, ArchiverError>;
}
