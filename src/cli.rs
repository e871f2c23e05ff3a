use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::warn;

use crate::configurator::{CancellationToken, SelectionPolicy};
use crate::export::{self, ExportOptions};
use crate::logging;
use crate::properties::render_properties;

/// Root CLI for propex
#[derive(Parser)]
#[command(name = "propex")]
#[command(about = "Export project layouts as analysis properties")]
pub struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the configurators that apply to a project
    Detect {
        /// Project directory
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// Print the properties derived for a project
    Export {
        /// Project directory
        #[arg(default_value = ".")]
        path: PathBuf,
        /// Run every applicable configurator
        #[arg(long, conflicts_with = "first")]
        all: bool,
        /// Run only the first applicable configurator
        #[arg(long)]
        first: bool,
        /// Run exactly this configurator (rust, python, js)
        #[arg(long, conflicts_with_all = ["all", "first"])]
        only: Option<String>,
        /// Additional root that paths may resolve into (repeatable)
        #[arg(long = "root")]
        roots: Vec<PathBuf>,
        /// Print a JSON object instead of key=value lines
        #[arg(long)]
        json: bool,
    },
}

/// Dispatch after parse
pub fn run() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("warning: failed to initialise logging: {e}");
    }

    match cli.command {
        Commands::Detect { path } => {
            if let Err(e) = run_detect(&path) {
                eprintln!("error (detect): {e:#}");
                std::process::exit(1);
            }
        }
        Commands::Export {
            path,
            all,
            first,
            only,
            roots,
            json,
        } => {
            let policy = if first {
                Some(SelectionPolicy::First)
            } else if all {
                Some(SelectionPolicy::All)
            } else {
                None
            };
            let options = ExportOptions {
                policy,
                only,
                roots,
            };
            if let Err(e) = run_export(&path, &options, json) {
                if export::is_cancelled(&e) {
                    eprintln!("aborted (export): {e}");
                    std::process::exit(130);
                }
                eprintln!("error (export): {e:#}");
                std::process::exit(1);
            }
        }
    }
}

fn run_detect(path: &Path) -> Result<()> {
    let names = export::detect(path)?;
    if names.is_empty() {
        eprintln!("No configurator applies to {}.", path.display());
        return Ok(());
    }
    for name in names {
        println!("{name}");
    }
    Ok(())
}

fn run_export(path: &Path, options: &ExportOptions, json: bool) -> Result<()> {
    let outcome = export::export(path, options, &CancellationToken::new())?;
    if outcome.applied.is_empty() {
        warn!(
            project = outcome.project.name(),
            "no configurator applies, only project config properties are exported"
        );
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.properties)?);
    } else {
        print!("{}", render_properties(&outcome.properties));
    }
    Ok(())
}
