//! # Archive Formats
//!
//! The closed set of formats the engine can produce and restore. Format choice at
//! compress time comes from a tag; at decompress time it comes from the archive's
//! file extension only, never from its content.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ArchiverError;

/// Serialized as its compress-time tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Format {
    /// Multi-entry zip container, deflate per entry.
    #[serde(rename = "zip")]
    Zip,
    /// Solid 7z container, one LZMA2 stream.
    #[serde(rename = "7z")]
    SevenZ,
    /// gzip single-stream codec.
    #[serde(rename = "gz")]
    Gzip,
    /// bzip2 single-stream codec.
    #[serde(rename = "bz2")]
    Bzip2,
    /// xz (LZMA2) single-stream codec.
    #[serde(rename = "xz")]
    Xz,
}

/// How far a password reaches for a given format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordScope {
    /// Legacy ZipCrypto on each entry's data. Names and metadata stay readable and
    /// the cipher is known to be weak.
    PerEntryWeak,
    /// AES-256 over data and header, entry names included.
    WholeArchive,
    /// No encryption envelope exists; a password is ignored.
    Unsupported,
}

impl Format {
    pub const ALL: [Format; 5] = [Format::Zip, Format::SevenZ, Format::Gzip, Format::Bzip2, Format::Xz];

    /// The tag accepted at compress time. Doubles as the file extension.
    pub fn tag(self) -> &'static str {
        match self {
            Format::Zip => "zip",
            Format::SevenZ => "7z",
            Format::Gzip => "gz",
            Format::Bzip2 => "bz2",
            Format::Xz => "xz",
        }
    }

    pub fn extension(self) -> &'static str {
        self.tag()
    }

    /// Human-readable codec name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Format::Zip => "zip",
            Format::SevenZ => "7z",
            Format::Gzip => "gzip",
            Format::Bzip2 => "bzip2",
            Format::Xz => "xz",
        }
    }

    pub fn is_single_stream(self) -> bool {
        matches!(self, Format::Gzip | Format::Bzip2 | Format::Xz)
    }

    pub fn password_scope(self) -> PasswordScope {
        match self {
            Format::Zip => PasswordScope::PerEntryWeak,
            Format::SevenZ => PasswordScope::WholeArchive,
            Format::Gzip | Format::Bzip2 | Format::Xz => PasswordScope::Unsupported,
        }
    }

    pub fn supports_password(self) -> bool {
        self.password_scope() != PasswordScope::Unsupported
    }

    pub fn valid_tags() -> String {
        Format::ALL.iter().map(|f| f.tag()).collect::<Vec<_>>().join(", ")
    }

    /// Looks up a format by its compress-time tag.
    pub fn from_tag(tag: &str) -> Result<Self, ArchiverError> {
        Format::ALL
            .into_iter()
            .find(|f| f.tag() == tag)
            .ok_or_else(|| ArchiverError::UnsupportedFormat {
                given: tag.to_string(),
                valid: Format::valid_tags(),
            })
    }

    /// Detects the format of an existing archive from its extension (case-insensitive).
    pub fn from_archive_path(path: &Path) -> Result<Self, ArchiverError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        Format::ALL
            .into_iter()
            .find(|f| f.extension() == ext)
            .ok_or_else(|| ArchiverError::UnsupportedFormat {
                given: if ext.is_empty() { path.display().to_string() } else { format!(".{}", ext) },
                valid: Format::ALL.iter().map(|f| format!(".{}", f.extension())).collect::<Vec<_>>().join(", "),
            })
    }
}

impl FromStr for Format {
    type Err = ArchiverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Format::from_tag(s)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
