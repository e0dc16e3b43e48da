//! Command-line interface argument parsing.

use crate::data::Dimension;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

/// Emendas - parliamentary budget amendment payments by author
///
/// Loads the pre-processed amendments dataset (`;`-separated, Brazilian currency
/// format) and sums what was paid for an author along a fixed breakdown.
///
/// Examples:
///   emendas authors
///   emendas summary --author "BANCADA DO RIO DE JANEIRO"
///   emendas aggregate --dimension program > programa.csv
///   emendas --data outro.csv --treat-sign-as-negation table
///   emendas init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for emendas.toml in the current directory
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Dataset to load, overrides [source].path
    #[arg(short, long, global = true, value_name = "FILE", env = "EMENDAS_DATA")]
    pub data: Option<PathBuf>,

    /// Field separator of the dataset, overrides [source].delimiter
    #[arg(long, global = true, value_name = "CHAR")]
    pub delimiter: Option<char>,

    /// Read `-` in amounts as a negative sign instead of dropping it
    #[arg(long, global = true)]
    pub treat_sign_as_negation: bool,

    /// Enable verbose logging output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List every distinct amendment author
    Authors,

    /// Total paid for one author
    Summary {
        /// Defaults to [report].default_author
        #[arg(short, long)]
        author: Option<String>,
    },

    /// Paid amounts for one author grouped along a breakdown, as CSV
    Aggregate {
        /// Defaults to [report].default_author
        #[arg(short, long)]
        author: Option<String>,

        /// agency_and_action, beneficiary_state, function, subfunction or program
        #[arg(short = 'D', long)]
        dimension: Option<Dimension>,
    },

    /// Dump the whole normalized dataset, as CSV
    Table,

    /// Write a default emendas.toml in the current directory
    InitConfig,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn log_level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else if self.quiet {
            Level::WARN
        } else {
            Level::INFO
        }
    }
}
