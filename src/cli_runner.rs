//! Runs a parsed command line against the [`Engine`] and prints the result,
//! either as a short human-readable report or as JSON.

use std::error::Error;

use crate::cli::{self, Args, Commands};
use crate::engine::{CompressRequest, DecompressRequest, Engine};
use crate::format::{Format, PasswordScope};

/// Public entry for running CLI logic on already parsed arguments.
pub fn run_cli_app(args: Args) -> Result<(), Box<dyn Error>> {
    match args.command {
        Commands::Compress { inputs, output_dir, format, name, password, ask_password, level, json } => {
            let mut engine = Engine::default();
            engine.set_level(cli::resolve_level(level)?);

            let mut request = CompressRequest::new(inputs, output_dir, format);
            request.name = name;
            request.password = cli::get_password(password, ask_password)?;

            let outcome = engine.compress(&request)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!(
                    "{} ({}, level {}, {} entries, {} -> {} bytes)",
                    outcome.path.display(),
                    outcome.format.name(),
                    outcome.level,
                    outcome.entries,
                    outcome.bytes_in,
                    outcome.bytes_out
                );
            }
        }
        Commands::Decompress { archive, output_dir, password, ask_password, json } => {
            let mut request = DecompressRequest::new(archive);
            request.dest_dir = output_dir;
            request.password = cli::get_password(password, ask_password)?;

            let outcome = Engine::default().decompress(&request)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!("extracted {} entries into {}", outcome.entries, outcome.dest_dir.display());
                for path in &outcome.written {
                    println!("  {}", path.display());
                }
            }
        }
        Commands::List { archive, password, json } => {
            let password = cli::get_password(password, false)?;
            let entries = Engine::default().list(&archive, password.as_ref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                for entry in &entries {
                    let size = entry.size.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string());
                    let suffix = if entry.is_dir { "/" } else { "" };
                    println!("{:>12}  {}{}", size, entry.name, suffix);
                }
            }
        }
        Commands::Formats => {
            for format in Format::ALL {
                let kind = if format.is_single_stream() { "single file" } else { "container" };
                let password = match format.password_scope() {
                    PasswordScope::PerEntryWeak => "per-entry ZipCrypto",
                    PasswordScope::WholeArchive => "AES-256, names hidden",
                    PasswordScope::Unsupported => "none",
                };
                println!("{:<4} .{:<4} {:<12} password: {}", format.tag(), format.extension(), kind, password);
            }
        }
    }

    Ok(())
}

