//! # Archive Engine
//!
//! The single entry point callers use. An [`Engine`] holds the default
//! compression level; every call is described by a request value, validated up
//! front and then dispatched to the driver for its [`Format`].
//!
//! Validation happens before any output file is created, so a request that fails
//! validation never leaves anything at the destination.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use tracing::{info, warn};

use crate::common::{absolute_path, CompressionLevel, Password};
use crate::drivers::sevenz::SevenZDriver;
use crate::drivers::stream::{single_input, StreamCodec, StreamDriver};
use crate::drivers::zip::ZipDriver;
use crate::drivers::{ArchiveDriver, ListedEntry};
use crate::error::ArchiverError;
use crate::format::Format;

static GZIP: StreamDriver = StreamDriver::new(StreamCodec::Gzip);
static BZIP2: StreamDriver = StreamDriver::new(StreamCodec::Bzip2);
static XZ: StreamDriver = StreamDriver::new(StreamCodec::Xz);

fn driver_for(format: Format) -> &'static dyn ArchiveDriver {
    match format {
        Format::Zip => &ZipDriver,
        Format::SevenZ => &SevenZDriver,
        Format::Gzip => &GZIP,
        Format::Bzip2 => &BZIP2,
        Format::Xz => &XZ,
    }
}

/// Default output name: `archive_YYYYMMDD_HHMMSS` in local time.
pub fn default_archive_name() -> String {
    format!("archive_{}", Local::now().format("%Y%m%d_%H%M%S"))
}

/// Fails when `output` names the same file as one of the inputs. Writing the
/// archive would truncate that input before it is read.
fn refuse_overwriting_inputs(inputs: &[PathBuf], output: &Path) -> Result<(), ArchiverError> {
    let Ok(output) = fs::canonicalize(output) else {
        // Nothing exists at the output path yet, so it cannot be an input.
        return Ok(());
    };
    for input in inputs {
        let input = fs::canonicalize(input).map_err(|e| ArchiverError::io("resolve input", input, e))?;
        if input == output {
            return Err(ArchiverError::OutputIsInput { path: input });
        }
    }
    Ok(())
}

/// Everything needed for one compress call.
#[derive(Debug, Clone)]
pub struct CompressRequest {
    pub inputs: Vec<PathBuf>,
    pub dest_dir: PathBuf,
    /// Format tag as typed by the user: `zip`, `7z`, `gz`, `bz2` or `xz`.
    pub format: String,
    /// Output base name without extension.
    pub name: Option<String>,
    pub password: Option<Password>,
    /// Overrides the engine's level for this call only.
    pub level: Option<i64>,
}

impl CompressRequest {
    pub fn new<I, P>(inputs: I, dest_dir: impl Into<PathBuf>, format: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        CompressRequest {
            inputs: inputs.into_iter().map(Into::into).collect(),
            dest_dir: dest_dir.into(),
            format: format.into(),
            name: None,
            password: None,
            level: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn password(mut self, password: impl Into<Password>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn level(mut self, level: i64) -> Self {
        self.level = Some(level);
        self
    }
}

/// Everything needed for one decompress call.
#[derive(Debug, Clone)]
pub struct DecompressRequest {
    pub archive: PathBuf,
    /// Defaults to the archive's own directory.
    pub dest_dir: Option<PathBuf>,
    pub password: Option<Password>,
}

impl DecompressRequest {
    pub fn new(archive: impl Into<PathBuf>) -> Self {
        DecompressRequest { archive: archive.into(), dest_dir: None, password: None }
    }

    pub fn dest_dir(mut self, dest_dir: impl Into<PathBuf>) -> Self {
        self.dest_dir = Some(dest_dir.into());
        self
    }

    pub fn password(mut self, password: impl Into<Password>) -> Self {
        self.password = Some(password.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompressOutcome {
    /// Absolute path of the archive written.
    pub path: PathBuf,
    pub format: Format,
    pub level: CompressionLevel,
    pub entries: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecompressOutcome {
    pub dest_dir: PathBuf,
    pub format: Format,
    pub entries: u64,
    /// The restored file for single-stream formats; empty for containers.
    pub written: Vec<PathBuf>,
}

/// Archive engine. Cheap to copy; holds only the default compression level.
#[derive(Debug, Clone, Copy, Default)]
pub struct Engine {
    level: CompressionLevel,
}

impl Engine {
    pub fn new(level: i64) -> Self {
        Engine { level: CompressionLevel::new(level) }
    }

    /// Sets the default level, clamped into `0..=9`. Never fails.
    pub fn set_level(&mut self, level: i64) -> CompressionLevel {
        self.level = CompressionLevel::new(level);
        if i64::from(self.level.get()) != level {
            warn!("compression level {} is out of range, using {}", level, self.level);
        }
        self.level
    }

    pub fn level(&self) -> CompressionLevel {
        self.level
    }

    /// Compresses the request's inputs into `dest_dir/<name>.<ext>` and returns
    /// the absolute path written along with a short report.
    pub fn compress(&self, request: &CompressRequest) -> Result<CompressOutcome, ArchiverError> {
        let format = Format::from_tag(&request.format)?;
        let level = request.level.map(CompressionLevel::new).unwrap_or(self.level);

        let name = match request.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => default_archive_name(),
        };
        let file_name = format!("{}.{}", name, format.extension());

        if request.inputs.is_empty() {
            return Err(ArchiverError::NoInputs);
        }
        if let Some(missing) = request.inputs.iter().find(|p| !p.exists()) {
            return Err(ArchiverError::InputNotFound { path: missing.clone() });
        }
        if format.is_single_stream() {
            single_input(format, &request.inputs)?;
        }

        // The destination must already exist; only decompress creates directories.
        if !request.dest_dir.exists() {
            return Err(ArchiverError::InputNotFound { path: request.dest_dir.clone() });
        }
        if !request.dest_dir.is_dir() {
            let source = std::io::Error::new(std::io::ErrorKind::Other, "not a directory");
            return Err(ArchiverError::io("write into", &request.dest_dir, source));
        }
        let dest_dir =
            absolute_path(&request.dest_dir).map_err(|e| ArchiverError::io("resolve", &request.dest_dir, e))?;
        let output = dest_dir.join(file_name);
        refuse_overwriting_inputs(&request.inputs, &output)?;

        info!("compressing {} input(s) to {} ({}, level {})", request.inputs.len(), output.display(), format.name(), level);
        let stats = driver_for(format).pack(&request.inputs, &output, level, request.password.as_ref())?;

        let bytes_out = fs::metadata(&output)
            .map_err(|e| ArchiverError::io("read metadata of", &output, e))?
            .len();
        Ok(CompressOutcome {
            path: output,
            format,
            level,
            entries: stats.entries,
            bytes_in: stats.bytes_in,
            bytes_out,
        })
    }

    /// Restores an archive. The format comes from the file extension alone.
    pub fn decompress(&self, request: &DecompressRequest) -> Result<DecompressOutcome, ArchiverError> {
        let archive = &request.archive;
        if !archive.is_file() {
            return Err(ArchiverError::InputNotFound { path: archive.clone() });
        }

        let dest_dir = match &request.dest_dir {
            Some(dir) => dir.clone(),
            None => match archive.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            },
        };
        let format = Format::from_archive_path(archive)?;
        fs::create_dir_all(&dest_dir).map_err(|e| ArchiverError::io("create directory", &dest_dir, e))?;

        info!("extracting {} into {} ({})", archive.display(), dest_dir.display(), format.name());
        // Each driver decides what a password means for its format.
        let stats = driver_for(format).unpack(archive, &dest_dir, request.password.as_ref())?;

        Ok(DecompressOutcome { dest_dir, format, entries: stats.entries, written: stats.written })
    }

    /// Lists the entries of an archive without extracting it.
    pub fn list(&self, archive: &Path, password: Option<&Password>) -> Result<Vec<ListedEntry>, ArchiverError> {
        if !archive.is_file() {
            return Err(ArchiverError::InputNotFound { path: archive.to_path_buf() });
        }
        let format = Format::from_archive_path(archive)?;
        driver_for(format).list(archive, password)
    }
}
