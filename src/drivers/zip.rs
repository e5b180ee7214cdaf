//! Zip container driver.
//!
//! Every file is an independent deflate stream with its own local header carrying
//! the DOS timestamp and unix permission bits. A password turns on legacy
//! ZipCrypto for file entries: it keeps data away from casual readers but is
//! breakable and leaves names and sizes visible.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use ::zip::result::ZipError;
use ::zip::unstable::write::FileOptionsExt;
use ::zip::write::{FileOptions, SimpleFileOptions};
use ::zip::{CompressionMethod, ZipArchive, ZipWriter};
use chrono::{Datelike, Local, Timelike};
use tracing::{debug, warn};

use super::{ArchiveDriver, ListedEntry, PackStats, UnpackStats};
use crate::common::{collect_entries, CompressionLevel, EntrySource, Password};
use crate::error::ArchiverError;
use crate::fsx::{self, pump, PartialFile, PumpError};
use crate::sanitize::safe_relative_path;

#[derive(Debug, Clone, Copy, Default)]
pub struct ZipDriver;

/// Deflate has no meaningful level 0 in the zip writer; 0 and 1 both mean fastest.
fn deflate_level(level: CompressionLevel) -> i64 {
    level.get().max(1) as i64
}

/// Local wall-clock time in DOS format. Anything before 1980 becomes 1980-01-01.
fn dos_time(modified: Option<SystemTime>) -> ::zip::DateTime {
    modified
        .map(chrono::DateTime::<Local>::from)
        .and_then(|t| {
            ::zip::DateTime::from_date_and_time(
                u16::try_from(t.year()).ok()?,
                t.month() as u8,
                t.day() as u8,
                t.hour() as u8,
                t.minute() as u8,
                t.second().min(59) as u8,
            )
            .ok()
        })
        .unwrap_or_default()
}

/// Entries at or past the 32-bit size limit need zip64 extra fields.
fn needs_zip64(size: u64) -> bool {
    size >= u64::from(u32::MAX)
}

fn entry_options<'k>(base: FileOptions<'k, ()>, entry: &EntrySource) -> FileOptions<'k, ()> {
    let options = base.last_modified_time(dos_time(entry.modified));
    let options = if entry.is_dir { options } else { options.large_file(needs_zip64(entry.size)) };
    match entry.permissions {
        Some(mode) => options.unix_permissions(mode),
        None => options,
    }
}

fn write_error(output: &Path, err: ZipError) -> ArchiverError {
    match err {
        ZipError::Io(source) => ArchiverError::io("write archive", output, source),
        other => ArchiverError::io("write archive", output, io::Error::new(io::ErrorKind::Other, other)),
    }
}

fn read_error(archive: &Path, err: ZipError) -> ArchiverError {
    match err {
        ZipError::Io(source)
            if !matches!(source.kind(), io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof) =>
        {
            ArchiverError::io("read archive", archive, source)
        }
        ZipError::InvalidPassword => ArchiverError::corrupt(archive, "invalid password"),
        other => ArchiverError::corrupt(archive, other),
    }
}

fn open_archive(input: &Path) -> Result<ZipArchive<BufReader<File>>, ArchiverError> {
    let file = File::open(input).map_err(|e| ArchiverError::io("open archive", input, e))?;
    ZipArchive::new(BufReader::new(file)).map_err(|e| read_error(input, e))
}

impl ArchiveDriver for ZipDriver {
    fn pack(
        &self,
        inputs: &[PathBuf],
        output: &Path,
        level: CompressionLevel,
        password: Option<&Password>,
    ) -> Result<PackStats, ArchiverError> {
        let entries = collect_entries(inputs, Some(output))?;

        let (partial, file) = PartialFile::create(output)?;
        let mut writer = ZipWriter::new(BufWriter::new(file));

        let dir_base = SimpleFileOptions::default();
        let plain = dir_base
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(deflate_level(level)));
        let file_base = match password {
            Some(pw) => {
                warn!("zip entry encryption uses legacy ZipCrypto; it is weak and does not hide file names");
                plain.with_deprecated_encryption(pw.as_bytes())
            }
            None => plain,
        };

        let mut stats = PackStats::default();
        for entry in &entries {
            if entry.is_dir {
                writer
                    .add_directory(format!("{}/", entry.arcname), entry_options(dir_base.clone(), entry))
                    .map_err(|e| write_error(output, e))?;
                stats.entries += 1;
                continue;
            }

            debug!("zip: adding {} ({} bytes)", entry.arcname, entry.size);
            writer
                .start_file(entry.arcname.clone(), entry_options(file_base.clone(), entry))
                .map_err(|e| write_error(output, e))?;
            let mut source =
                File::open(&entry.source).map_err(|e| ArchiverError::io("open input", &entry.source, e))?;
            let copied = pump(&mut source, &mut writer).map_err(|e| match e {
                PumpError::Read(e) => ArchiverError::io("read input", &entry.source, e),
                PumpError::Write(e) => ArchiverError::io("write archive", output, e),
            })?;
            stats.entries += 1;
            stats.bytes_in += copied;
        }

        let mut inner = writer.finish().map_err(|e| write_error(output, e))?;
        inner.flush().map_err(|e| ArchiverError::io("write archive", output, e))?;
        drop(inner);
        partial.keep();
        Ok(stats)
    }

    fn unpack(&self, input: &Path, output_dir: &Path, password: Option<&Password>) -> Result<UnpackStats, ArchiverError> {
        let mut archive = open_archive(input)?;
        let mut stats = UnpackStats::default();
        // Directory modes are applied last so a read-only directory does not block its children.
        let mut dir_modes = Vec::new();

        for i in 0..archive.len() {
            let mut entry = match password {
                Some(pw) => archive.by_index_decrypt(i, pw.as_bytes()),
                None => archive.by_index(i),
            }
            .map_err(|e| read_error(input, e))?;

            let relative = safe_relative_path(entry.name())
                .ok_or_else(|| ArchiverError::UnsafeEntryPath { name: entry.name().to_string() })?;
            let target = output_dir.join(&relative);

            if entry.is_dir() {
                fs::create_dir_all(&target).map_err(|e| ArchiverError::io("create directory", &target, e))?;
                if let Some(mode) = entry.unix_mode() {
                    dir_modes.push((target, mode));
                }
                stats.entries += 1;
                continue;
            }

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| ArchiverError::io("create directory", parent, e))?;
            }
            let (partial, mut out) = PartialFile::create(&target)?;
            pump(&mut entry, &mut out).map_err(|e| match e {
                PumpError::Read(e) => ArchiverError::corrupt(input, e),
                PumpError::Write(e) => ArchiverError::io("write", &target, e),
            })?;
            drop(out);
            let target = partial.keep();
            if let Some(mode) = entry.unix_mode() {
                fsx::set_unix_permissions(&target, mode)
                    .map_err(|e| ArchiverError::io("set permissions on", &target, e))?;
            }
            debug!("zip: extracted {}", relative.display());
            stats.entries += 1;
        }

        for (dir, mode) in dir_modes.into_iter().rev() {
            fsx::set_unix_permissions(&dir, mode).map_err(|e| ArchiverError::io("set permissions on", &dir, e))?;
        }
        Ok(stats)
    }

    fn list(&self, input: &Path, _password: Option<&Password>) -> Result<Vec<ListedEntry>, ArchiverError> {
        let mut archive = open_archive(input)?;
        let mut listed = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            // Raw access skips decryption; names and sizes are stored in the clear.
            let entry = archive.by_index_raw(i).map_err(|e| read_error(input, e))?;
            listed.push(ListedEntry {
                name: entry.name().trim_end_matches('/').to_string(),
                size: if entry.is_dir() { None } else { Some(entry.size()) },
                is_dir: entry.is_dir(),
            });
        }
        Ok(listed)
    }
}
