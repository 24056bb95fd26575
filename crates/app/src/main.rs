use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use services::{AppServices, Clock, GameLoopService, HttpClassifier, RemoteResultRecorder};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod play;
mod server;

use config::Settings;
use play::DirectoryFrames;
use server::AppState;

#[derive(Debug, PartialEq, Eq)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidPort { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidPort { raw } => write!(f, "invalid --port value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  signplay serve    [--db <sqlite_url>] [--host <addr>] [--port <port>]");
    eprintln!("  signplay add-user --name <name> [--db <sqlite_url>]");
    eprintln!("  signplay play     --frames <dir> --token <token> [--db <sqlite_url>]");
    eprintln!("                    [--classifier <url>] [--server <url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://signplay.sqlite3  --port 5000  --classifier http://localhost:5001");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  SIGNPLAY__DATABASE__URL, SIGNPLAY__SERVER__PORT, SIGNPLAY__CLASSIFIER__BASE_URL, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Serve,
    AddUser,
    Play,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "serve" => Some(Self::Serve),
            "add-user" => Some(Self::AddUser),
            "play" => Some(Self::Play),
            _ => None,
        }
    }
}

/// Flags after the subcommand. Settings-backed flags become config overrides.
#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    overrides: Vec<(&'static str, String)>,
    name: Option<String>,
    frames: Option<PathBuf>,
    token: Option<String>,
    server: Option<String>,
}

impl Args {
    fn parse(cmd: Command, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self::default();

        while let Some(arg) = args.next() {
            match (cmd, arg.as_str()) {
                (_, "--db") => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed
                        .overrides
                        .push(("database.url", normalize_sqlite_url(value)));
                }
                (Command::Serve, "--host") => {
                    let value = require_value(args, "--host")?;
                    parsed.overrides.push(("server.host", value));
                }
                (Command::Serve, "--port") => {
                    let value = require_value(args, "--port")?;
                    value
                        .parse::<u16>()
                        .map_err(|_| ArgsError::InvalidPort { raw: value.clone() })?;
                    parsed.overrides.push(("server.port", value));
                }
                (Command::AddUser, "--name") => {
                    parsed.name = Some(require_value(args, "--name")?);
                }
                (Command::Play, "--frames") => {
                    parsed.frames = Some(PathBuf::from(require_value(args, "--frames")?));
                }
                (Command::Play, "--token") => {
                    parsed.token = Some(require_value(args, "--token")?);
                }
                (Command::Play, "--classifier") => {
                    let value = require_value(args, "--classifier")?;
                    parsed.overrides.push(("classifier.base_url", value));
                }
                (Command::Play, "--server") => {
                    parsed.server = Some(require_value(args, "--server")?);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        match cmd {
            Command::AddUser if parsed.name.is_none() => {
                Err(ArgsError::MissingFlag { flag: "--name" })
            }
            Command::Play if parsed.frames.is_none() => {
                Err(ArgsError::MissingFlag { flag: "--frames" })
            }
            Command::Play if parsed.token.is_none() => {
                Err(ArgsError::MissingFlag { flag: "--token" })
            }
            _ => Ok(parsed),
        }
    }
}

/// Split argv into a subcommand and its flags. `None` means help was asked for.
fn parse_command(argv: Vec<String>) -> Result<Option<(Command, Args)>, ArgsError> {
    let mut iter = argv.into_iter().peekable();
    let first = iter.peek().cloned();
    let cmd = match first.as_deref() {
        None => Command::Serve,
        Some("--help" | "-h") => return Ok(None),
        Some(first) if first.starts_with("--") => Command::Serve,
        Some(first) => {
            let cmd = Command::from_arg(first)
                .ok_or_else(|| ArgsError::UnknownCommand(first.to_owned()))?;
            iter.next();
            cmd
        }
    };

    if iter.peek().is_some_and(|a| a == "--help" || a == "-h") {
        return Ok(None);
    }
    Args::parse(cmd, &mut iter).map(|args| Some((cmd, args)))
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw.starts_with("sqlite::memory:") || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Make sure the database file and its directory exist before sqlx opens it.
fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url.starts_with("sqlite::memory:") || db_url.contains("mode=memory") {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn open_services(settings: &Settings) -> Result<AppServices, Box<dyn std::error::Error>> {
    let db_url = &settings.database.url;
    prepare_sqlite_file(db_url)?;
    Ok(AppServices::new_sqlite(db_url, Clock::system()).await?)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let Some((cmd, args)) = parse_command(argv).map_err(|e| {
        print_usage();
        e
    })?
    else {
        print_usage();
        return Ok(());
    };

    let settings = Settings::load(&args.overrides)?;
    init_tracing(&settings.logging.level);

    match cmd {
        Command::Serve => {
            let services = open_services(&settings).await?;
            let addr = settings.bind_addr();
            let listener = TcpListener::bind(&addr).await?;
            info!(%addr, db = %settings.database.url, "signplay server listening");
            let app = server::router(
                AppState::from(&services),
                server::cors_layer(&settings.server.cors_origins),
            );
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
            Ok(())
        }
        Command::AddUser => {
            let name = args.name.unwrap_or_default();
            let services = open_services(&settings).await?;
            let registration = services.users().register(&name).await?;
            println!(
                "created user {} ({})",
                registration.user.user_id(),
                registration.user.name()
            );
            println!("access token: {}", registration.token);
            Ok(())
        }
        Command::Play => {
            let dir = args.frames.unwrap_or_default();
            let token = args.token.unwrap_or_default();
            let frames = Arc::new(DirectoryFrames::open(&dir)?);
            if frames.is_empty() {
                warn!(dir = %dir.display(), "no images found; every capture will fail");
            }
            let classifier_config = settings.classifier_config();
            let timeout = classifier_config.timeout;
            let classifier = Arc::new(HttpClassifier::new(classifier_config)?);

            let game = if let Some(base_url) = args.server {
                let recorder = RemoteResultRecorder::new(base_url, token, timeout)?;
                GameLoopService::new(frames, classifier, Arc::new(recorder))
            } else {
                let services = open_services(&settings).await?;
                let identity = services.users().authenticate(&token).await?;
                info!(user = %identity.name, "playing against local database");
                services.local_game_loop(frames, classifier, identity)
            };

            play::run(&game).await?;
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
