use std::path::{Path, PathBuf};

use thiserror::Error;

/// Coarse classification of an [`ArchiverError`], stable across message changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnsupportedFormat,
    InputNotFound,
    SingleFileOnly,
    BadPasswordOrCorruptArchive,
    Io,
    InvalidRequest,
}

/// The primary error type for all operations in the `omnipack` crate.
///
/// Every message carries the failing path, format or codec so it can be shown
/// to a user verbatim.
#[derive(Debug, Error)]
pub enum ArchiverError {
    /// Unknown format tag at compress time, or unrecognized extension at decompress time.
    #[error("unsupported format '{given}' (valid formats: {valid})")]
    UnsupportedFormat { given: String, valid: String },

    /// A requested input, or the archive to extract, does not exist.
    #[error("input not found: '{}'", path.display())]
    InputNotFound { path: PathBuf },

    /// A single-stream codec was given anything other than exactly one regular file.
    #[error("{format} compresses exactly one file at a time, got {found}")]
    SingleFileOnly { format: &'static str, found: String },

    /// Decryption or an integrity check failed while reading an archive.
    #[error("wrong password or corrupt archive '{}': {reason}", path.display())]
    BadPasswordOrCorruptArchive { path: PathBuf, reason: String },

    /// An underlying filesystem operation failed.
    #[error("I/O error while trying to {op} '{}': {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The request named no inputs at all.
    #[error("nothing to compress: the input list is empty")]
    NoInputs,

    /// An archive entry name would land outside the extraction root.
    #[error("refusing unsafe entry path '{name}'")]
    UnsafeEntryPath { name: String },

    /// The archive would be written over one of its own inputs.
    #[error("refusing to overwrite input '{}' with the archive", path.display())]
    OutputIsInput { path: PathBuf },

    /// The format derives its key from text and the password is not valid UTF-8.
    #[error("{format} passwords must be valid UTF-8")]
    PasswordNotUtf8 { format: &'static str },

    /// An error occurred when trying to strip a prefix from a file path.
    #[error("could not strip prefix '{}' from path '{}'", prefix.display(), path.display())]
    StripPrefix { prefix: PathBuf, path: PathBuf },
}

impl ArchiverError {
    pub fn io(op: &'static str, path: impl AsRef<Path>, source: std::io::Error) -> Self {
        ArchiverError::Io { op, path: path.as_ref().to_path_buf(), source }
    }

    pub fn corrupt(path: impl AsRef<Path>, reason: impl ToString) -> Self {
        ArchiverError::BadPasswordOrCorruptArchive {
            path: path.as_ref().to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ArchiverError::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            ArchiverError::InputNotFound { .. } => ErrorKind::InputNotFound,
            ArchiverError::SingleFileOnly { .. } => ErrorKind::SingleFileOnly,
            ArchiverError::BadPasswordOrCorruptArchive { .. } | ArchiverError::UnsafeEntryPath { .. } => {
                ErrorKind::BadPasswordOrCorruptArchive
            }
            ArchiverError::Io { .. } | ArchiverError::StripPrefix { .. } => ErrorKind::Io,
            ArchiverError::NoInputs | ArchiverError::OutputIsInput { .. } | ArchiverError::PasswordNotUtf8 { .. } => {
                ErrorKind::InvalidRequest
            }
        }
    }

    /// No failure is transient at this layer; a caller may only retry with a fresh call
    /// (for example after asking the user for another password).
    pub fn is_retryable(&self) -> bool {
        false
    }
}

pub type Result<T, E = ArchiverError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_path_and_format() {
        let err = ArchiverError::InputNotFound { path: PathBuf::from("/tmp/missing.txt") };
        assert!(err.to_string().contains("/tmp/missing.txt"));

        let err = ArchiverError::SingleFileOnly { format: "gzip", found: "2 inputs".into() };
        assert_eq!(err.to_string(), "gzip compresses exactly one file at a time, got 2 inputs");

        let err = ArchiverError::UnsupportedFormat { given: "rar".into(), valid: "zip, 7z".into() };
        assert!(err.to_string().contains("rar"));
        assert!(err.to_string().contains("zip, 7z"));
    }

    #[test]
    fn io_errors_keep_their_source() {
        use std::error::Error as _;
        let err = ArchiverError::io(
            "create output file",
            "/ro/out.zip",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.source().is_some());
        assert!(err.to_string().contains("create output file"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn request_mistakes_are_invalid_requests() {
        let err = ArchiverError::OutputIsInput { path: PathBuf::from("/data/bundle.zip") };
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert!(err.to_string().contains("/data/bundle.zip"));

        let err = ArchiverError::PasswordNotUtf8 { format: "7z" };
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert_eq!(err.to_string(), "7z passwords must be valid UTF-8");
    }
}
