//! 7z solid-archive driver.
//!
//! All file data goes into one solid LZMA2 block whose preset is the engine's
//! compression level. With a password the block is AES-256 encrypted and so is
//! the archive header, which hides entry names as well. That is deliberately a
//! stronger guarantee than the zip driver's per-entry encryption.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use sevenz_rust2::encoder_options::{AesEncoderOptions, Lzma2Options};
use sevenz_rust2::{ArchiveEntry, ArchiveReader, ArchiveWriter, EncoderConfiguration, SourceReader};
use tracing::debug;

use super::{ArchiveDriver, ListedEntry, PackStats, UnpackStats};
use crate::common::{collect_entries, CompressionLevel, Password};
use crate::error::ArchiverError;
use crate::fsx::{pump, PartialFile, PumpError};
use crate::sanitize::safe_relative_path;

#[derive(Debug, Clone, Copy, Default)]
pub struct SevenZDriver;

/// 7z derives its AES key from the password as text.
fn seven_password(password: Option<&Password>) -> Result<sevenz_rust2::Password, ArchiverError> {
    match password {
        Some(pw) => match pw.as_str() {
            Some(text) => Ok(sevenz_rust2::Password::from(text)),
            None => Err(ArchiverError::PasswordNotUtf8 { format: "7z" }),
        },
        None => Ok(sevenz_rust2::Password::empty()),
    }
}

/// Input file that is opened on its first read and closed once drained, so a
/// solid block over many files holds at most one descriptor at a time.
struct LazyFile {
    path: PathBuf,
    file: Option<File>,
    done: bool,
}

impl LazyFile {
    fn new(path: PathBuf) -> Self {
        LazyFile { path, file: None, done: false }
    }
}

impl Read for LazyFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.done {
            return Ok(0);
        }
        let file = match &mut self.file {
            Some(file) => file,
            None => {
                let opened = File::open(&self.path)
                    .map_err(|e| io::Error::new(e.kind(), format!("open input '{}': {}", self.path.display(), e)))?;
                self.file.insert(opened)
            }
        };
        let n = file.read(buf)?;
        if n == 0 && !buf.is_empty() {
            self.file = None;
            self.done = true;
        }
        Ok(n)
    }
}

fn write_error(output: &Path, err: impl ToString) -> ArchiverError {
    ArchiverError::io("write archive", output, io::Error::new(io::ErrorKind::Other, err.to_string()))
}

fn open_reader(input: &Path, password: Option<&Password>) -> Result<ArchiveReader<File>, ArchiverError> {
    if !input.is_file() {
        return Err(ArchiverError::InputNotFound { path: input.to_path_buf() });
    }
    // The library cannot tell a wrong key from damaged data: both end up here.
    ArchiveReader::open(input, seven_password(password)?).map_err(|e| ArchiverError::corrupt(input, e))
}

impl ArchiveDriver for SevenZDriver {
    fn pack(
        &self,
        inputs: &[PathBuf],
        output: &Path,
        level: CompressionLevel,
        password: Option<&Password>,
    ) -> Result<PackStats, ArchiverError> {
        let key = seven_password(password)?;
        let entries = collect_entries(inputs, Some(output))?;

        let (partial, file) = PartialFile::create(output)?;
        let mut writer = ArchiveWriter::new(BufWriter::new(file)).map_err(|e| write_error(output, e))?;

        let lzma2: EncoderConfiguration = Lzma2Options::from_level(level.get()).into();
        match password {
            Some(_) => {
                writer.set_content_methods(vec![AesEncoderOptions::new(key).into(), lzma2]);
                writer.set_encrypt_header(true);
            }
            None => {
                writer.set_content_methods(vec![lzma2]);
            }
        }

        let mut stats = PackStats::default();
        let mut solid_entries = Vec::new();
        let mut solid_sources = Vec::new();
        for entry in &entries {
            let archive_entry = ArchiveEntry::from_path(&entry.source, entry.arcname.clone());
            if entry.is_dir {
                writer
                    .push_archive_entry::<File>(archive_entry, None)
                    .map_err(|e| write_error(output, e))?;
            } else {
                debug!("7z: adding {} ({} bytes)", entry.arcname, entry.size);
                solid_entries.push(archive_entry);
                solid_sources.push(SourceReader::new(LazyFile::new(entry.source.clone())));
                stats.bytes_in += entry.size;
            }
            stats.entries += 1;
        }
        if !solid_entries.is_empty() {
            writer
                .push_archive_entries(solid_entries, solid_sources)
                .map_err(|e| write_error(output, e))?;
        }

        let mut inner = writer.finish().map_err(|e| write_error(output, e))?;
        inner.flush().map_err(|e| ArchiverError::io("write archive", output, e))?;
        drop(inner);
        partial.keep();
        Ok(stats)
    }

    fn unpack(&self, input: &Path, output_dir: &Path, password: Option<&Password>) -> Result<UnpackStats, ArchiverError> {
        let mut reader = open_reader(input, password)?;

        // Every name is checked before the first byte is written.
        for entry in &reader.archive().files {
            if safe_relative_path(entry.name()).is_none() {
                return Err(ArchiverError::UnsafeEntryPath { name: entry.name().to_string() });
            }
        }

        let mut stats = UnpackStats::default();
        let mut failure: Option<ArchiverError> = None;
        let result = reader.for_each_entries(|entry, data| {
            let Some(relative) = safe_relative_path(entry.name()) else {
                failure = Some(ArchiverError::UnsafeEntryPath { name: entry.name().to_string() });
                return Ok(false);
            };
            let target = output_dir.join(&relative);
            match extract_entry(input, &target, entry.is_directory(), data) {
                Ok(()) => {
                    debug!("7z: extracted {}", relative.display());
                    stats.entries += 1;
                    Ok(true)
                }
                Err(e) => {
                    failure = Some(e);
                    Ok(false)
                }
            }
        });

        if let Some(err) = failure {
            return Err(err);
        }
        result.map_err(|e| ArchiverError::corrupt(input, e))?;
        Ok(stats)
    }

    fn list(&self, input: &Path, password: Option<&Password>) -> Result<Vec<ListedEntry>, ArchiverError> {
        let reader = open_reader(input, password)?;
        Ok(reader
            .archive()
            .files
            .iter()
            .map(|entry| ListedEntry {
                name: entry.name().to_string(),
                size: if entry.is_directory() { None } else { Some(entry.size()) },
                is_dir: entry.is_directory(),
            })
            .collect())
    }
}

fn extract_entry(archive: &Path, target: &Path, is_dir: bool, data: &mut dyn io::Read) -> Result<(), ArchiverError> {
    if is_dir {
        return fs::create_dir_all(target).map_err(|e| ArchiverError::io("create directory", target, e));
    }
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| ArchiverError::io("create directory", parent, e))?;
    }
    let (partial, mut out) = PartialFile::create(target)?;
    pump(data, &mut out).map_err(|e| match e {
        PumpError::Read(e) => ArchiverError::corrupt(archive, e),
        PumpError::Write(e) => ArchiverError::io("write", target, e),
    })?;
    drop(out);
    partial.keep();
    Ok(())
}
