use std::fmt;
use std::sync::Arc;

use lingua_core::model::GameSettings;
use lingua_core::topics::ContentDocument;
use services::{Clock, HttpDictionary, LinguaServices};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod play;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidNumber { flag: &'static str, raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
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

fn parse_number(flag: &'static str, raw: String) -> Result<u32, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

fn env_number(var: &'static str) -> Result<Option<u32>, ArgsError> {
    std::env::var(var)
        .ok()
        .map(|raw| parse_number(var, raw))
        .transpose()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Scores,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "scores" => Some(Self::Scores),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    content: Option<String>,
    player: Option<String>,
    limit: Option<u32>,
    total_sublevels: Option<u32>,
    max_attempts: Option<u32>,
    points: Option<u32>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("LINGUA_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://lingua.sqlite3".into(), normalize_sqlite_url);
        let mut content = std::env::var("LINGUA_CONTENT").ok();
        let mut player = None;
        let mut limit = None;
        let total_sublevels = env_number("LINGUA_TOTAL_SUBLEVELS")?;
        let max_attempts = env_number("LINGUA_MAX_ATTEMPTS")?;
        let points = env_number("LINGUA_POINTS")?;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--content" => content = Some(require_value(args, "--content")?),
                "--player" => player = Some(require_value(args, "--player")?),
                "--limit" => {
                    let value = require_value(args, "--limit")?;
                    limit = Some(parse_number("--limit", value)?);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            content,
            player,
            limit,
            total_sublevels,
            max_attempts,
            points,
        })
    }

    /// Document settings (or defaults) with environment overrides on top.
    fn settings(&self, doc: Option<&ContentDocument>) -> Result<GameSettings, Box<dyn std::error::Error>> {
        let base = doc.map_or_else(GameSettings::default, |doc| {
            doc.settings_or(GameSettings::default())
        });
        let settings = GameSettings::new(
            self.total_sublevels.unwrap_or(base.total_sublevels()),
            self.max_attempts.unwrap_or(base.max_attempts()),
            self.points.unwrap_or(base.points_per_correct()),
        )?
        .with_remainder(base.remainder())
        .with_blank_open_answer(base.blank_open_answer())
        .with_dictionary_timeout_ms(base.dictionary_timeout_ms())?;
        Ok(settings)
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  lingua [play]  [--db <sqlite_url>] [--content <file.json>] [--player <name>]");
    eprintln!("  lingua scores  [--db <sqlite_url>] [--limit <n>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:lingua.sqlite3");
    eprintln!("  built-in topics when no --content is given");
    eprintln!("  --limit 5");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LINGUA_DB_URL, LINGUA_CONTENT");
    eprintln!("  LINGUA_TOTAL_SUBLEVELS, LINGUA_MAX_ATTEMPTS, LINGUA_POINTS");
    eprintln!("  LINGUA_DICTIONARY_KEY, LINGUA_DICTIONARY_URL, LINGUA_DICTIONARY_HOST");
    eprintln!("  RUST_LOG (default: lingua=info,services=info)");
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
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
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
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

fn load_content(path: Option<&str>) -> Result<Option<ContentDocument>, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let raw = std::fs::read_to_string(path)?;
    let doc = ContentDocument::from_json(&raw)?;
    tracing::info!(path, levels = doc.levels.len(), "loaded content document");
    Ok(Some(doc))
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };
    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let parsed = Args::parse(&mut argv.into_iter()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let doc = load_content(parsed.content.as_deref())?;
    let settings = parsed.settings(doc.as_ref())?;

    prepare_sqlite_file(&parsed.db_url)?;
    let services =
        LinguaServices::new_sqlite(&parsed.db_url, Clock::system(), settings, doc).await?;

    match cmd {
        Command::Play => {
            let dictionary = HttpDictionary::from_env();
            let services = if dictionary.enabled() {
                services.with_dictionary(Arc::new(dictionary))
            } else {
                tracing::info!("no dictionary configured; word answers will not be accepted");
                services
            };
            play::play(&services, parsed.player).await
        }
        Command::Scores => play::print_leaderboard(&services, parsed.limit).await,
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lingua=info,services=info,storage=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
