//! shareholders-admin — operator CLI for the shareholder registry.
//!
//! Reads `shareholders.toml` (or the path given with `--config`), opens the
//! SQLite store, runs one command and prints the result as JSON.
//!
//! # Issuing a reset token
//!
//! Email delivery is handled elsewhere; this prints the plaintext token once
//! and stores only its hash:
//!
//! ```text
//! shareholders-admin reset-token grace@example.com
//! ```

mod settings;

use std::path::PathBuf;

use anyhow::{Context as _, bail};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use shareholders_core::{
  news::NewBusinessNews,
  store::{NewsStore, OrderBook, ShareholderQuery, ShareholderStore},
};
use shareholders_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::settings::AdminConfig;

#[derive(Parser)]
#[command(author, version, about = "Shareholder registry administration")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "shareholders.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// List shareholders.
  List {
    /// Include deactivated accounts.
    #[arg(long)]
    include_inactive: bool,
    #[arg(long)]
    email:            Option<String>,
    /// Case-insensitive substring of the name.
    #[arg(long)]
    name:             Option<String>,
    #[arg(long)]
    limit:            Option<usize>,
    #[arg(long)]
    offset:           Option<usize>,
  },
  /// Show one active shareholder.
  Show { id: Uuid },
  /// Soft-delete an account.
  Deactivate { id: Uuid },
  /// Restore a soft-deleted account.
  Reactivate { id: Uuid },
  /// Set the shareholding balance.
  SetShareholding { id: Uuid, amount: f64 },
  /// Allow (or with `--revoke`, disallow) an account to log in.
  ActivateLogin {
    id:     Uuid,
    #[arg(long)]
    revoke: bool,
  },
  /// Issue a password reset token and print it.
  ResetToken { email: String },
  /// List the orders placed by a shareholder.
  Orders { id: Uuid },
  /// Manage business news.
  News {
    #[command(subcommand)]
    action: NewsCommand,
  },
}

#[derive(Subcommand)]
enum NewsCommand {
  /// List announcements, newest first.
  List,
  /// Publish an announcement.
  Publish {
    #[arg(long)]
    title:   Option<String>,
    #[arg(long)]
    summary: Option<String>,
    /// RFC 3339 timestamp; defaults to now.
    #[arg(long)]
    date:    Option<DateTime<Utc>>,
    #[arg(long)]
    image:   Option<String>,
  },
  /// Delete an announcement.
  Delete { id: Uuid },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let cfg = AdminConfig::load(&cli.config)?;

  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;
  tracing::debug!(path = ?cfg.store_path, "store opened");

  run(&store, cli.command).await
}

async fn run(store: &SqliteStore, command: Command) -> anyhow::Result<()> {
  match command {
    Command::List {
      include_inactive,
      email,
      name,
      limit,
      offset,
    } => {
      let query = ShareholderQuery {
        email,
        name_contains: name,
        limit,
        offset,
        ..Default::default()
      };
      let found = if include_inactive {
        store.find_including_inactive(&query).await?
      } else {
        store.find_active(&query).await?
      };
      print_json(&found)
    }

    Command::Show { id } => {
      let record = store
        .get(id)
        .await?
        .with_context(|| format!("no active shareholder {id}"))?;
      print_json(&record)
    }

    Command::Deactivate { id } => Ok(store.set_active(id, false).await?),
    Command::Reactivate { id } => Ok(store.set_active(id, true).await?),

    Command::SetShareholding { id, amount } => {
      if !amount.is_finite() {
        bail!("shareholding must be a finite number");
      }
      let mut record = store
        .get(id)
        .await?
        .with_context(|| format!("no active shareholder {id}"))?;
      record.shareholding = amount;
      print_json(&store.save(&record).await?)
    }

    Command::ActivateLogin { id, revoke } => {
      let mut record = store
        .get(id)
        .await?
        .with_context(|| format!("no active shareholder {id}"))?;
      record.is_login_activated = !revoke;
      print_json(&store.save(&record).await?)
    }

    Command::ResetToken { email } => {
      let mut record = store
        .find_by_email(&email)
        .await?
        .with_context(|| format!("no active shareholder with email {email}"))?;
      let token = record.generate_password_reset_token();
      store.store_reset_token(&record).await?;
      tracing::info!(
        shareholder_id = %record.shareholder_id,
        expires = ?record.password_reset_expires,
        "reset token issued"
      );
      println!("{token}");
      Ok(())
    }

    Command::Orders { id } => print_json(&store.orders_for(id).await?),

    Command::News { action } => run_news(store, action).await,
  }
}

async fn run_news(
  store: &SqliteStore,
  action: NewsCommand,
) -> anyhow::Result<()> {
  match action {
    NewsCommand::List => print_json(&store.list_news().await?),
    NewsCommand::Publish {
      title,
      summary,
      date,
      image,
    } => {
      let news = store
        .publish(NewBusinessNews {
          title,
          summary,
          date: Some(date.unwrap_or_else(Utc::now)),
          image,
        })
        .await?;
      print_json(&news)
    }
    NewsCommand::Delete { id } => Ok(store.delete_news(id).await?),
  }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
