//! dirsnap - save a directory tree to one JSON document and restore it later.
//!
//! Usage:
//!   dirsnap                          Interactive mode
//!   dirsnap save <SOURCE>            Save a directory to a document
//!   dirsnap restore <DESTINATION>    Restore a document into a directory
//!   dirsnap inspect [DOCUMENT]       Show what a document contains
//!   dirsnap --help                   Show help

mod logging;
mod terminal;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};
use tracing::debug;

use dirsnap_core::{BinaryPolicy, Entry, SnapshotConfig};
use dirsnap_ops::{
    Format, RestoreLayout, RestoreRequest, SaveRequest, Session, SessionOptions,
};

use crate::terminal::{TerminalOperator, sanitize_for_terminal};

#[derive(Parser)]
#[command(
    name = "dirsnap",
    version,
    about = "Save a directory tree to a JSON document and restore it later",
    long_about = "dirsnap captures every file and directory under a path, contents \
                  included, into a single JSON document.\n\n\
                  `node_modules` and `.git` are never captured. Run without a \
                  subcommand to be asked for each parameter."
)]
struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Save a directory to a document
    #[command(visible_alias = "s")]
    Save {
        /// Directory to save
        source: PathBuf,

        /// Document to write (defaults to <dirname>_<timestamp>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Free-text remark stored in the document
        #[arg(short, long, default_value = "")]
        remark: String,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,

        /// Write single-line JSON
        #[arg(long)]
        compact: bool,

        /// How to store files that are not valid UTF-8
        #[arg(long, default_value = "base64")]
        binary: BinaryArg,
    },

    /// Restore a document into a directory
    #[command(visible_alias = "r")]
    Restore {
        /// Directory to restore into
        destination: PathBuf,

        /// Document to read (defaults to the first .json file here)
        #[arg(short, long)]
        document: Option<PathBuf>,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,

        /// Create a directory named after the saved root inside DESTINATION
        #[arg(long)]
        nested: bool,
    },

    /// Show the summary and tree of a document without restoring it
    Inspect {
        /// Document to read (defaults to the first .json file here)
        document: Option<PathBuf>,

        /// Maximum depth of the printed tree
        #[arg(short, long, default_value = "2")]
        depth: u32,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum BinaryArg {
    Reject,
    Lossy,
    #[default]
    Base64,
}

impl From<BinaryArg> for BinaryPolicy {
    fn from(arg: BinaryArg) -> Self {
        match arg {
            BinaryArg::Reject => BinaryPolicy::Reject,
            BinaryArg::Lossy => BinaryPolicy::Lossy,
            BinaryArg::Base64 => BinaryPolicy::Base64,
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    logging::init_logger(cli.verbose);

    match cli.command {
        Some(Command::Save {
            source,
            output,
            remark,
            yes,
            compact,
            binary,
        }) => {
            run_save(source, output, remark, yes, compact, binary.into())?;
        }
        Some(Command::Restore {
            destination,
            document,
            yes,
            nested,
        }) => {
            run_restore(destination, document, yes, nested)?;
        }
        Some(Command::Inspect { document, depth }) => {
            run_inspect(document, depth)?;
        }
        None => {
            let mut session = Session::new(TerminalOperator::stdio(), SessionOptions::default());
            session.interactive().context("Interactive session failed")?;
        }
    }

    Ok(())
}

/// Save a directory to a document.
fn run_save(
    source: PathBuf,
    output: Option<PathBuf>,
    remark: String,
    yes: bool,
    compact: bool,
    binary: BinaryPolicy,
) -> Result<()> {
    let config = SnapshotConfig::builder()
        .root(source)
        .binary_policy(binary)
        .pretty(!compact)
        .build()
        .context("Invalid configuration")?;
    debug!(?config, "save configuration");

    let options = SessionOptions {
        assume_yes: yes,
        format: Format::from_pretty(config.pretty),
        ..Default::default()
    };
    let mut session = Session::with_config(TerminalOperator::stdio(), &config, options);
    session
        .save(SaveRequest {
            source: config.root.clone(),
            document: output,
            remark,
        })
        .context("Save failed")?;

    Ok(())
}

/// Restore a document into a directory.
fn run_restore(
    destination: PathBuf,
    document: Option<PathBuf>,
    yes: bool,
    nested: bool,
) -> Result<()> {
    let options = SessionOptions {
        assume_yes: yes,
        layout: if nested {
            RestoreLayout::Nested
        } else {
            RestoreLayout::Contents
        },
        ..Default::default()
    };
    let mut session = Session::new(TerminalOperator::stdio(), options);
    session
        .restore(RestoreRequest {
            document,
            destination: destination.clone(),
        })
        .with_context(|| format!("Restore into {} failed", destination.display()))?;

    Ok(())
}

/// Print a document's summary and the top of its tree.
fn run_inspect(document: Option<PathBuf>, max_depth: u32) -> Result<()> {
    let mut session = Session::new(TerminalOperator::stdio(), SessionOptions::default());
    let snapshot = session.inspect(document).context("Inspect failed")?;

    println!();
    println!("{}", "─".repeat(60));
    println!(
        " {} - {}",
        snapshot.source.display(),
        format_size(snapshot.root.content_bytes())
    );
    println!("{}", "─".repeat(60));
    print_entry(&snapshot.root, 0, max_depth);

    Ok(())
}

fn print_entry(entry: &Entry, depth: u32, max_depth: u32) {
    let indent = "  ".repeat(depth as usize);
    let marker = if entry.is_dir() { "▼ " } else { "  " };
    let suffix = if entry.is_dir() { "/" } else { "" };

    println!(
        "{}{}{:<40} {:>10}",
        indent,
        marker,
        truncate(&format!("{}{}", sanitize_for_terminal(&entry.name), suffix), 40),
        format_size(entry.content_bytes())
    );

    if entry.is_dir() && depth < max_depth {
        for child in entry.children() {
            print_entry(child, depth + 1, max_depth);
        }
    } else if entry.is_dir() && entry.child_count() > 0 {
        let indent = "  ".repeat((depth + 1) as usize);
        println!("{}  ... {} more entries", indent, entry.child_count());
    }
}

/// Format bytes as human-readable size.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Truncate a string to max length.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}
