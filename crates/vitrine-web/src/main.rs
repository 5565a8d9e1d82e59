//! Vitrine server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), layers `VITRINE_*`
//! environment variables and a `.env` file on top, opens the SQLite store,
//! runs first-boot seeding and serves the site over HTTP.
//!
//! # Password hash generation
//!
//! To print the argon2 PHC string for a password entered on stdin:
//!
//! ```
//! cargo run -p vitrine-web --bin vitrine -- --hash-password
//! ```

use std::path::PathBuf;

use anyhow::{Context as _, bail};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use vitrine_store_sqlite::SqliteStore;
use vitrine_web::{AppState, ServerConfig, auth};

#[derive(Parser)]
#[command(author, version, about = "Vitrine marketing site and editor")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Listen on this port, overriding the configuration.
  #[arg(short, long)]
  port: Option<u16>,

  /// Log at debug level regardless of environment.
  #[arg(long)]
  debug: bool,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
}

/// Where the SQLite database lives.
#[derive(Debug, PartialEq, Eq)]
enum Database {
  Memory,
  File(PathBuf),
}

/// `sqlite://cms.db` is relative, `sqlite:///srv/cms.db` absolute; a bare
/// path or `:memory:` is accepted too.
fn parse_database_url(url: &str) -> anyhow::Result<Database> {
  let path = match url.strip_prefix("sqlite://") {
    Some(rest) => rest,
    None if url.contains("://") => bail!("unsupported database url {url:?}; only sqlite is supported"),
    None => url,
  };
  match path {
    "" => bail!("database url {url:?} names no file"),
    ":memory:" => Ok(Database::Memory),
    path => Ok(Database::File(PathBuf::from(path))),
  }
}

fn load_config(cli: &Cli) -> anyhow::Result<ServerConfig> {
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config.clone()).required(false))
    .add_source(config::Environment::with_prefix("VITRINE"))
    // Platform conventions take precedence over the prefixed names.
    .set_override_option("port", std::env::var("PORT").ok())?
    .set_override_option("database_url", std::env::var("DATABASE_URL").ok())?
    .set_override_option("port", cli.port.map(i64::from))?
    .build()
    .context("failed to read configuration")?;

  settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();
  let cli = Cli::parse();
  let config = load_config(&cli)?;

  let default_level = if cli.debug || !config.is_production() {
    LevelFilter::DEBUG
  } else {
    LevelFilter::INFO
  };
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy(),
    )
    .init();

  // Helper mode: hash a password and exit.
  if cli.hash_password {
    let password = read_password()?;
    println!("{}", auth::hash_password(&password)?);
    return Ok(());
  }

  let store = match parse_database_url(&config.database_url)? {
    Database::Memory => {
      tracing::warn!("using an in-memory database; content is lost on exit");
      SqliteStore::open_in_memory()
        .await
        .context("failed to open in-memory store")?
    }
    Database::File(path) => SqliteStore::open(&path)
      .await
      .with_context(|| format!("failed to open store at {path:?}"))?,
  };

  vitrine_web::bootstrap(&store, &config)
    .await
    .context("first-boot setup failed")?;

  let address = format!("{}:{}", config.host, config.port);
  let state = AppState::new(store, config).context("failed to build application state")?;
  let app = vitrine_web::router(state);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read one line from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn database_urls() {
    assert_eq!(
      parse_database_url("sqlite://cms.db").unwrap(),
      Database::File(PathBuf::from("cms.db"))
    );
    assert_eq!(
      parse_database_url("sqlite:///srv/cms.db").unwrap(),
      Database::File(PathBuf::from("/srv/cms.db"))
    );
    assert_eq!(
      parse_database_url("data/site.db").unwrap(),
      Database::File(PathBuf::from("data/site.db"))
    );
    assert_eq!(parse_database_url("sqlite://:memory:").unwrap(), Database::Memory);
    assert_eq!(parse_database_url(":memory:").unwrap(), Database::Memory);
  }

  #[test]
  fn other_databases_are_rejected() {
    assert!(parse_database_url("postgresql://u:p@host/db").is_err());
    assert!(parse_database_url("sqlite://").is_err());
  }
}
