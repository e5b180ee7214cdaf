use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::common::{CompressionLevel, Password};

/// Environment variable consulted when `--password` is not given.
pub const PASSWORD_ENV: &str = "OMNIPACK_PASSWORD";
/// Environment variable consulted when `--level` is not given.
pub const LEVEL_ENV: &str = "OMNIPACK_LEVEL";

#[derive(Parser, Debug)]
#[command(name = "omnipack", author, version, about = "Create and extract zip, 7z, gzip, bzip2 and xz archives", long_about = None)]
pub struct Args {
    /// Log every entry as it is packed or extracted.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Compress files and directories into a new archive.
    #[command(alias = "c")]
    Compress {
        /// One or more input files or directories. gz, bz2 and xz take exactly one file.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Existing directory the archive is written to.
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Archive format: zip, 7z, gz, bz2 or xz.
        #[arg(short, long, default_value = "zip")]
        format: String,

        /// Archive name without extension. Defaults to archive_YYYYMMDD_HHMMSS.
        #[arg(long)]
        name: Option<String>,

        /// Encrypt the archive (zip: ZipCrypto per entry, 7z: AES-256 incl. names). Ignored by gz, bz2 and xz.
        #[arg(long)]
        password: Option<String>,

        /// Prompt for the password on the terminal.
        #[arg(long, conflicts_with = "password")]
        ask_password: bool,

        /// Compression level 0-9. Out of range values are clamped. [default: 6]
        #[arg(short, long, allow_negative_numbers = true)]
        level: Option<i64>,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Extract an archive. The format is chosen from the file extension.
    #[command(alias = "x")]
    Decompress {
        /// The archive to extract.
        #[arg(required = true)]
        archive: PathBuf,

        /// Destination directory. Defaults to the archive's own directory.
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Password for encrypted zip or 7z archives.
        #[arg(long)]
        password: Option<String>,

        /// Prompt for the password on the terminal.
        #[arg(long, conflicts_with = "password")]
        ask_password: bool,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the contents of an archive without extracting it.
    #[command(alias = "l")]
    List {
        #[arg(required = true)]
        archive: PathBuf,

        /// Password for a 7z archive with an encrypted header.
        #[arg(long)]
        password: Option<String>,

        /// Print the listing as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the supported formats.
    Formats,
}

/// Gets the password from the command-line option, the `OMNIPACK_PASSWORD`
/// environment variable, or an interactive prompt.
///
/// Priority:
/// 1. `--password` command-line argument.
/// 2. `OMNIPACK_PASSWORD` environment variable.
/// 3. A terminal prompt, only if `ask` is set.
///
/// An empty password counts as none.
pub fn get_password(password_opt: Option<String>, ask: bool) -> Result<Option<Password>, std::io::Error> {
    let pass = match password_opt {
        Some(pass) => Some(pass),
        None => match std::env::var(PASSWORD_ENV) {
            Ok(pass) => Some(pass),
            Err(_) if ask => Some(rpassword::prompt_password("Password: ")?),
            Err(_) => None,
        },
    };
    Ok(pass.filter(|p| !p.is_empty()).map(Password::from))
}

/// Resolves the compression level from `--level`, then `OMNIPACK_LEVEL`, then the default.
pub fn resolve_level(level_opt: Option<i64>) -> Result<i64, String> {
    if let Some(level) = level_opt {
        return Ok(level);
    }
    match std::env::var(LEVEL_ENV) {
        Ok(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("{} must be an integer, got '{}'", LEVEL_ENV, raw)),
        Err(_) => Ok(i64::from(CompressionLevel::default().get())),
    }
}

/// Parses command-line arguments using `clap`.
pub fn run() -> Result<Args, clap::Error> {
    Args::try_parse()
}
