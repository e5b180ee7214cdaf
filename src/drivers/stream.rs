//! Single-stream codec drivers: gzip, bzip2 and xz.
//!
//! Each wraps exactly one regular file in the codec's standard framing. None of
//! these formats has an encryption envelope, so a password is ignored.
//!
//! Restoring strips the codec extension from the archive name (`report.txt.gz`
//! becomes `report.txt`). An existing file with that name is overwritten without
//! asking.

use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use bzip2::read::MultiBzDecoder;
use bzip2::write::BzEncoder;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::GzBuilder;
use tracing::{debug, warn};
use xz2::read::XzDecoder;
use xz2::write::XzEncoder;

use super::{ArchiveDriver, ListedEntry, PackStats, UnpackStats};
use crate::common::{CompressionLevel, Password};
use crate::error::ArchiverError;
use crate::format::Format;
use crate::fsx::{pump, PartialFile, PumpError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamCodec {
    Gzip,
    Bzip2,
    Xz,
}

impl StreamCodec {
    pub fn format(self) -> Format {
        match self {
            StreamCodec::Gzip => Format::Gzip,
            StreamCodec::Bzip2 => Format::Bzip2,
            StreamCodec::Xz => Format::Xz,
        }
    }

    /// The codec's native level for an engine level. bzip2 block sizes start at 1.
    fn native_level(self, level: CompressionLevel) -> u32 {
        match self {
            StreamCodec::Bzip2 => level.get().max(1),
            StreamCodec::Gzip | StreamCodec::Xz => level.get(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StreamDriver {
    codec: StreamCodec,
}

impl StreamDriver {
    pub const fn new(codec: StreamCodec) -> Self {
        StreamDriver { codec }
    }

    pub fn codec(&self) -> StreamCodec {
        self.codec
    }
}

/// Checks the exactly-one-regular-file rule and returns that file.
pub fn single_input(format: Format, inputs: &[PathBuf]) -> Result<&Path, ArchiverError> {
    match inputs {
        [] => Err(ArchiverError::NoInputs),
        [only] if only.is_dir() => Err(ArchiverError::SingleFileOnly {
            format: format.name(),
            found: format!("directory '{}'", only.display()),
        }),
        [only] if !only.exists() => Err(ArchiverError::InputNotFound { path: only.clone() }),
        [only] => Ok(only.as_path()),
        many => Err(ArchiverError::SingleFileOnly {
            format: format.name(),
            found: format!("{} inputs", many.len()),
        }),
    }
}

/// Name of the file restored from `archive`: its basename minus the codec extension.
pub fn restored_name(archive: &Path) -> Result<OsString, ArchiverError> {
    archive
        .file_stem()
        .filter(|stem| !stem.is_empty())
        .map(|stem| stem.to_os_string())
        .ok_or_else(|| ArchiverError::UnsupportedFormat {
            given: archive.display().to_string(),
            valid: "a file name in front of the codec extension".to_string(),
        })
}

type Sink = BufWriter<File>;

fn finish_stream<E: Write>(
    mut encoder: E,
    finish: fn(E) -> io::Result<Sink>,
    reader: &mut dyn Read,
    source: &Path,
    output: &Path,
) -> Result<u64, ArchiverError> {
    let copied = pump(reader, &mut encoder).map_err(|e| match e {
        PumpError::Read(e) => ArchiverError::io("read input", source, e),
        PumpError::Write(e) => ArchiverError::io("write archive", output, e),
    })?;
    let mut sink = finish(encoder).map_err(|e| ArchiverError::io("write archive", output, e))?;
    sink.flush().map_err(|e| ArchiverError::io("write archive", output, e))?;
    Ok(copied)
}

impl ArchiveDriver for StreamDriver {
    fn pack(
        &self,
        inputs: &[PathBuf],
        output: &Path,
        level: CompressionLevel,
        password: Option<&Password>,
    ) -> Result<PackStats, ArchiverError> {
        let format = self.codec.format();
        let source = single_input(format, inputs)?;
        if password.is_some() {
            warn!("{} has no encryption; the password is ignored", format.name());
        }

        let input = File::open(source).map_err(|e| ArchiverError::io("open input", source, e))?;
        let metadata = input.metadata().map_err(|e| ArchiverError::io("read metadata of", source, e))?;
        let mut reader = BufReader::new(input);

        let (partial, file) = PartialFile::create(output)?;
        let sink = BufWriter::new(file);
        let native = self.codec.native_level(level);
        debug!("{}: {} -> {} (level {})", format.name(), source.display(), output.display(), native);

        let bytes_in = match self.codec {
            StreamCodec::Gzip => {
                let name = source.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
                let mtime = metadata
                    .modified()
                    .ok()
                    .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                    .and_then(|d| u32::try_from(d.as_secs()).ok())
                    .unwrap_or(0);
                let encoder = GzBuilder::new()
                    .filename(name)
                    .mtime(mtime)
                    .write(sink, flate2::Compression::new(native));
                finish_stream(encoder, GzEncoder::finish, &mut reader, source, output)?
            }
            StreamCodec::Bzip2 => {
                let encoder = BzEncoder::new(sink, bzip2::Compression::new(native));
                finish_stream(encoder, BzEncoder::finish, &mut reader, source, output)?
            }
            StreamCodec::Xz => {
                let encoder = XzEncoder::new(sink, native);
                finish_stream(encoder, XzEncoder::finish, &mut reader, source, output)?
            }
        };

        partial.keep();
        Ok(PackStats { entries: 1, bytes_in })
    }

    fn unpack(&self, input: &Path, output_dir: &Path, password: Option<&Password>) -> Result<UnpackStats, ArchiverError> {
        let format = self.codec.format();
        if password.is_some() {
            warn!("{} has no encryption; the password is ignored", format.name());
        }

        let target = output_dir.join(restored_name(input)?);
        if target.exists() {
            debug!("{}: overwriting existing {}", format.name(), target.display());
        }

        let file = File::open(input).map_err(|e| ArchiverError::io("open archive", input, e))?;
        let reader = BufReader::new(file);
        // Multi-member decoders accept concatenated streams, as the standard tools do.
        let mut decoder: Box<dyn Read> = match self.codec {
            StreamCodec::Gzip => Box::new(MultiGzDecoder::new(reader)),
            StreamCodec::Bzip2 => Box::new(MultiBzDecoder::new(reader)),
            StreamCodec::Xz => Box::new(XzDecoder::new_multi_decoder(reader)),
        };

        let (partial, out) = PartialFile::create(&target)?;
        let mut out = BufWriter::new(out);
        let written = pump(&mut decoder, &mut out).map_err(|e| match e {
            PumpError::Read(e) => ArchiverError::corrupt(input, format!("{} stream: {}", format.name(), e)),
            PumpError::Write(e) => ArchiverError::io("write", &target, e),
        })?;
        out.flush().map_err(|e| ArchiverError::io("write", &target, e))?;
        drop(out);
        let target = partial.keep();
        debug!("{}: restored {} ({} bytes)", format.name(), target.display(), written);

        Ok(UnpackStats { entries: 1, written: vec![target] })
    }

    fn list(&self, input: &Path, _password: Option<&Password>) -> Result<Vec<ListedEntry>, ArchiverError> {
        if !input.is_file() {
            return Err(ArchiverError::InputNotFound { path: input.to_path_buf() });
        }
        Ok(vec![ListedEntry {
            name: restored_name(input)?.to_string_lossy().into_owned(),
            size: None,
            is_dir: false,
        }])
    }
}
