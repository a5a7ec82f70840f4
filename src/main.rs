//! # Leeds Harvard CLI (`lhr`)
//!
//! The `lhr` binary formats references, maintains line-based bibliography
//! files, audits essays and starts the HTTP service.
//!
//! ## Usage
//!
//! ```bash
//! lhr --config ./config/lhr.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `lhr format <kind>` | Format one reference and print it |
//! | `lhr sort <bib>` | Sort a bibliography file |
//! | `lhr correct <bib>` | Replace known sources with gold-standard entries |
//! | `lhr export <bib> --output <docx>` | Export a bibliography as a Word document |
//! | `lhr audit <essay> --bib <bib>` | Check in-text citations against a bibliography |
//! | `lhr serve` | Start the HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! # Append a book to a bibliography file
//! lhr format book --author "Smith, J." --author "Doe, R." --year 2024 \
//!     --title "Example Title" --place London --publisher Pearson >> refs.txt
//!
//! # Sort the file in place
//! lhr sort refs.txt --write
//!
//! # Audit an essay and write a Word report
//! lhr audit essay.docx --bib refs.txt --report report.docx
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use leeds_harvard::commands;
use leeds_harvard::config;
use leeds_harvard::models::{CitationFields, SourceKind};
use leeds_harvard::server;

/// Leeds Harvard referencing assistant.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. A missing file falls back to the built-in defaults.
#[derive(Parser)]
#[command(
    name = "lhr",
    about = "Leeds Harvard reference formatter and citation auditor",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/lhr.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Format a single reference.
    ///
    /// Prints the entry in `*italic*` / `**bold**` markup, the same form
    /// used by bibliography files, so output can be appended directly.
    Format {
        /// Source kind: book, journal, website, chapter, report, thesis.
        kind: SourceKind,

        #[command(flatten)]
        fields: FieldArgs,

        /// Print plain text without emphasis markers.
        #[arg(long)]
        plain: bool,
    },

    /// Sort a bibliography file alphabetically.
    ///
    /// A leading "The", "A" or "An" is ignored when sorting.
    Sort {
        bib: PathBuf,

        /// Rewrite the file instead of printing to stdout.
        #[arg(long)]
        write: bool,
    },

    /// Replace known sources with gold-standard entries.
    Correct {
        bib: PathBuf,

        /// Rewrite the file instead of printing to stdout.
        #[arg(long)]
        write: bool,
    },

    /// Export a bibliography file as a Word document.
    Export {
        bib: PathBuf,

        /// Output `.docx` path.
        #[arg(long, short)]
        output: PathBuf,
    },

    /// Check an essay's in-text citations against a bibliography.
    ///
    /// Accepts `.docx`, `.pdf` and `.txt` essays.
    Audit {
        essay: PathBuf,

        /// Bibliography file, one entry per line.
        #[arg(long)]
        bib: PathBuf,

        /// Also write the report as a Word document.
        #[arg(long)]
        report: Option<PathBuf>,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP server.
    ///
    /// Binds to `[server].bind` from the config file.
    Serve,
}

/// Source detail flags shared by every kind. Unused flags are ignored.
#[derive(Args)]
struct FieldArgs {
    /// Author, repeatable, in "Surname, I." form.
    #[arg(long = "author")]
    authors: Vec<String>,
    #[arg(long, default_value = "")]
    year: String,
    #[arg(long, default_value = "")]
    title: String,
    #[arg(long, default_value = "")]
    publisher: String,
    #[arg(long, default_value = "")]
    place: String,
    #[arg(long, default_value = "")]
    edition: String,
    #[arg(long, default_value = "")]
    journal: String,
    #[arg(long, default_value = "")]
    volume: String,
    #[arg(long, default_value = "")]
    issue: String,
    #[arg(long, default_value = "")]
    pages: String,
    #[arg(long, default_value = "")]
    url: String,
    /// Defaults to today for websites.
    #[arg(long, default_value = "")]
    access_date: String,
    /// Editor, repeatable (chapters).
    #[arg(long = "editor")]
    editors: Vec<String>,
    #[arg(long, default_value = "")]
    book_title: String,
    #[arg(long, default_value = "")]
    organisation: String,
    #[arg(long, default_value = "")]
    degree: String,
    #[arg(long, default_value = "")]
    university: String,
}

impl FieldArgs {
    fn into_fields(self, kind: SourceKind) -> CitationFields {
        CitationFields {
            kind,
            authors: self.authors,
            year: self.year,
            title: self.title,
            publisher: self.publisher,
            place: self.place,
            edition: self.edition,
            journal: self.journal,
            volume: self.volume,
            issue: self.issue,
            pages: self.pages,
            url: self.url,
            access_date: self.access_date,
            editors: self.editors,
            book_title: self.book_title,
            organisation: self.organisation,
            degree: self.degree,
            university: self.university,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    // The log level comes from the config, so the subscriber starts after
    // loading and the fallback is reported once it is running.
    let config_found = cli.config.exists();
    let cfg = config::load_or_default(&cli.config)?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if !config_found {
        tracing::debug!(path = %cli.config.display(), "config file not found, using defaults");
    }

    match cli.command {
        Commands::Format {
            kind,
            fields,
            plain,
        } => {
            commands::run_format(fields.into_fields(kind), plain)?;
        }
        Commands::Sort { bib, write } => {
            commands::run_sort(&bib, write)?;
        }
        Commands::Correct { bib, write } => {
            commands::run_correct(&cfg, &bib, write)?;
        }
        Commands::Export { bib, output } => {
            commands::run_export(&cfg, &bib, &output)?;
        }
        Commands::Audit {
            essay,
            bib,
            report,
            json,
        } => {
            commands::run_audit(&cfg, &essay, &bib, report.as_deref(), json)?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
