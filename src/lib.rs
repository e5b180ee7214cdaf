//! # omnipack Core Library
//!
//! This crate provides the archive engine behind the `omnipack` command-line tool.
//! One [`Engine`] creates and extracts five formats through a single
//! compress/decompress contract:
//!
//! - zip: multi-entry container, optional per-entry ZipCrypto.
//! - 7z: solid container, optional AES-256 that also hides entry names.
//! - gz, bz2, xz: single-stream codecs over exactly one file, no encryption.
//!
//! ## Key Modules
//!
//! - [`engine`]: request validation, output naming and dispatch.
//! - [`format`]: the closed set of formats and extension-based detection.
//! - [`drivers`]: one driver per format family.
//! - [`error`]: the crate-wide [`ArchiverError`].
//!
//! ## Examples
//!
//! ```no_run
//! use omnipack::{CompressRequest, DecompressRequest, Engine};
//!
//! let engine = Engine::new(9);
//! let outcome = engine
//!     .compress(&CompressRequest::new(["notes"], "/tmp", "7z").password("secret"))
//!     .unwrap();
//! engine
//!     .decompress(&DecompressRequest::new(&outcome.path).dest_dir("/tmp/restored").password("secret"))
//!     .unwrap();
//! ```

pub mod cli;
pub mod cli_runner;
pub mod common;
pub mod drivers;
pub mod engine;
pub mod error;
pub mod format;
pub mod sanitize;

// Cross-platform filesystem helpers
pub mod fsx;

pub use common::{CompressionLevel, Password};
pub use drivers::ListedEntry;
pub use engine::{CompressOutcome, CompressRequest, DecompressOutcome, DecompressRequest, Engine};
pub use error::{ArchiverError, ErrorKind};
pub use format::{Format, PasswordScope};
