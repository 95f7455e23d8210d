//! # Marginalia CLI (`marginalia`)
//!
//! Ingests web pages, PDFs, and pasted text into a local reading library and
//! manages highlights and notes on the stored documents.
//!
//! ## Usage
//!
//! ```bash
//! marginalia --config ./config/marginalia.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `marginalia init` | Create the SQLite database and run schema migrations |
//! | `marginalia ingest url <url>` | Fetch a page and extract its article |
//! | `marginalia ingest text <text>` | Clean up pasted text |
//! | `marginalia ingest pdf <path>` | Extract text from a PDF |
//! | `marginalia list --user <id>` | List a user's documents |
//! | `marginalia show <id> --user <id>` | Print a document with contents, highlights, and notes |
//! | `marginalia progress <id> --user <id> --percent <n>` | Record reading progress |
//! | `marginalia delete <id> --user <id>` | Delete a document and its annotations |
//! | `marginalia highlight <id> --user <id> --start <a> --end <b>` | Highlight a range |
//! | `marginalia note <id> --user <id> --content <text>` | Attach a note |
//! | `marginalia tags --user <id>` | List a user's tags |
//!
//! Ingestion without `--user` only prints the result; nothing is stored.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::EnvFilter;

use marginalia::commands::{self, IngestInput};
use marginalia::config;
use marginalia::migrate;
use marginalia::models::HighlightColor;

/// Marginalia: clean reading copies of web pages, PDFs, and text, with
/// anchored highlights and notes.
#[derive(Parser)]
#[command(name = "marginalia", version)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/marginalia.toml`. Ingestion without `--user`
    /// falls back to built-in defaults when the file is missing.
    #[arg(long, global = true, default_value = "./config/marginalia.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// Ingest a source and print the result as JSON.
    Ingest {
        #[command(subcommand)]
        source: IngestSource,

        /// Store the result in this user's library.
        #[arg(long, global = true)]
        user: Option<String>,
    },

    /// List documents in a user's library, most recently updated first.
    List {
        #[arg(long)]
        user: String,
    },

    /// Show a document with its table of contents, highlights, and notes.
    Show {
        id: String,
        #[arg(long)]
        user: String,
    },

    /// Record reading progress for a document.
    Progress {
        id: String,
        #[arg(long)]
        user: String,
        /// Percentage read, 0 to 100.
        #[arg(long)]
        percent: u8,
        /// Also mark the document as read.
        #[arg(long)]
        read: bool,
    },

    /// Delete a document together with its highlights, notes, and tag links.
    Delete {
        id: String,
        #[arg(long)]
        user: String,
    },

    /// Highlight the character range `[start, end)` of a document's text.
    Highlight {
        document: String,
        #[arg(long)]
        user: String,
        #[arg(long)]
        start: usize,
        #[arg(long)]
        end: usize,
        /// `yellow`, `red`, or `green`.
        #[arg(long, default_value = "yellow")]
        color: HighlightColor,
    },

    /// Attach a note to a document.
    Note {
        document: String,
        #[arg(long)]
        user: String,
        #[arg(long)]
        content: String,
        /// Character offset the note refers to. Defaults to the start.
        #[arg(long)]
        offset: Option<usize>,
    },

    /// List a user's tags.
    Tags {
        #[arg(long)]
        user: String,
    },
}

#[derive(Subcommand)]
enum IngestSource {
    /// Fetch an http(s) URL and extract its main article.
    Url { url: String },
    /// Normalize pasted text.
    Text { text: String },
    /// Extract text from a PDF file.
    Pdf { path: PathBuf },
}

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(err) = run().await {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Stateless ingestion works without a config file, but a config that
    // exists must still be valid.
    if let Commands::Ingest { user: None, .. } = &cli.command {
        let cfg = if cli.config.exists() {
            config::load_config(&cli.config)?
        } else {
            config::Config::minimal()
        };
        if let Commands::Ingest { source, .. } = cli.command {
            commands::run_ingest(&cfg, ingest_input(source), None).await?;
        }
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Ingest { source, user } => {
            commands::run_ingest(&cfg, ingest_input(source), user.as_deref()).await?;
        }
        Commands::List { user } => commands::run_list(&cfg, &user).await?,
        Commands::Show { id, user } => commands::run_show(&cfg, &user, &id).await?,
        Commands::Progress {
            id,
            user,
            percent,
            read,
        } => commands::run_progress(&cfg, &user, &id, percent, read).await?,
        Commands::Delete { id, user } => commands::run_delete(&cfg, &user, &id).await?,
        Commands::Highlight {
            document,
            user,
            start,
            end,
            color,
        } => commands::run_highlight(&cfg, &user, &document, start, end, color).await?,
        Commands::Note {
            document,
            user,
            content,
            offset,
        } => commands::run_note(&cfg, &user, &document, &content, offset).await?,
        Commands::Tags { user } => commands::run_tags(&cfg, &user).await?,
    }

    Ok(())
}

fn ingest_input(source: IngestSource) -> IngestInput {
    match source {
        IngestSource::Url { url } => IngestInput::Url(url),
        IngestSource::Text { text } => IngestInput::Text(text),
        IngestSource::Pdf { path } => IngestInput::Pdf(path),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
