//! Main entry point for the omnipack CLI app

use omnipack::cli;
use omnipack::cli_runner::run_cli_app;
use tracing_subscriber::EnvFilter;

fn main() -> std::process::ExitCode {
    let args = match cli::run() {
        Ok(args) => args,
        Err(e) => {
            // clap prints help, version and usage errors itself.
            let _ = e.print();
            return if e.use_stderr() { std::process::ExitCode::FAILURE } else { std::process::ExitCode::SUCCESS };
        }
    };

    let default_directive = if args.verbose { "omnipack=debug" } else { "omnipack=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    if let Err(e) = run_cli_app(args) {
        eprintln!("Error: {}", e);
        return std::process::ExitCode::FAILURE;
    }
    std::process::ExitCode::SUCCESS
}
