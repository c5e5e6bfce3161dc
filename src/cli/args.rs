//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

use crate::config::OutputFormat;

/// Import cascading spreadsheets as ranked option trees
#[derive(Parser, Debug)]
#[command(name = "optset")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug verbosity (repeat for more: -d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Config file layered over the global config
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import a sheet as a new option tree and print it
    Import {
        /// Context (mission) the tree belongs to
        #[arg(long, env = "OPTSET_CONTEXT")]
        context: Option<String>,

        /// Name of the option tree
        #[arg(short, long)]
        name: Option<String>,

        /// Sheet to import (.csv, .xlsx, .xlsm, .xlsb, .xls, .ods)
        #[arg(value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,

        /// Output format (default from config)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Load and clean a sheet without importing it
    Check {
        /// Sheet to check
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Show config paths
    Path,
}
