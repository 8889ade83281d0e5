//! Scholar server entry point.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;

use scholar_auth::{AuthService, MemoryDirectory, UserRecord};
use scholar_config::ConfigLoader;
use scholar_server::Server;
use scholar_telemetry::init_logging;

/// Command-line arguments.
struct Args {
    /// Path to configuration file.
    config: Option<PathBuf>,
    /// Path to a JSON array of user accounts.
    users: Option<PathBuf>,
}

impl Args {
    fn parse() -> Self {
        let mut args = std::env::args().skip(1);
        let mut parsed = Self {
            config: None,
            users: None,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => parsed.config = args.next().map(PathBuf::from),
                "--users" | "-u" => parsed.users = args.next().map(PathBuf::from),
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("scholar-server {}", scholar_server::VERSION);
                    std::process::exit(0);
                }
                other => {
                    eprintln!("Unknown argument: {other}");
                    eprintln!("Use --help for usage information");
                    std::process::exit(1);
                }
            }
        }

        parsed
    }
}

fn print_help() {
    println!(
        r"Scholar server

USAGE:
    scholar-server [OPTIONS]

OPTIONS:
    -c, --config <PATH>    Path to configuration file (TOML or JSON)
    -u, --users <PATH>     Path to a JSON array of user accounts
    -h, --help             Print help information
    -v, --version          Print version information

ENVIRONMENT VARIABLES:
    SCHOLAR__SERVER__HTTP_ADDR       Listen address (default: 0.0.0.0:8080)
    SCHOLAR__SESSION__SECRET         Session signing secret, at least 64 bytes (required)
    SCHOLAR__COMPRESSION__ENABLED    Gzip responses (default: true)
    SCHOLAR__STATIC_FILES__ROOT      Static file directory (default: public)
    SCHOLAR__LOGGING__LEVEL          Log filter (default: info)

A .env file in the working directory is loaded first.
"
    );
}

fn load_users(path: &Path) -> anyhow::Result<MemoryDirectory> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read users from {}", path.display()))?;
    let users: Vec<UserRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse users in {}", path.display()))?;
    Ok(users
        .into_iter()
        .fold(MemoryDirectory::new(), MemoryDirectory::with_user))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut loader = ConfigLoader::new().with_dotenv();
    if let Some(path) = &args.config {
        loader = loader.with_file(path)?;
    }
    let config = loader
        .with_env_prefix("SCHOLAR")
        .load()
        .context("invalid configuration")?;

    init_logging(&config.logging.to_log_config()).context("failed to initialize logging")?;

    let directory = match &args.users {
        Some(path) => load_users(path)?,
        None => MemoryDirectory::new(),
    };
    if directory.is_empty() {
        tracing::warn!("no user accounts loaded, sign-in will always fail");
    }

    info!(
        version = scholar_server::VERSION,
        addr = %config.server.http_addr,
        users = directory.len(),
        "starting scholar server"
    );

    let server = Server::application(&config, AuthService::new(directory))?;
    server.run().await?;
    Ok(())
}
