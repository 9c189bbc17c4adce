//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum, ValueHint};

use crate::application::import::VocabularyFormat;

/// Outcome hierarchy manager: import standards vocabularies, inspect and
/// validate outcome trees, convert between formats
#[derive(Parser, Debug)]
#[command(name = "rsoutcome")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-d: info, -dd: debug, -ddd: trace)
    #[arg(short = 'd', long = "debug", action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Vocabulary format selector.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    /// Round-trip outcomeSet/outcome format
    Generic,
    /// Nested standard_document format
    Ab,
    /// Flat RDF format
    Asn,
}

impl From<FormatArg> for VocabularyFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Generic => VocabularyFormat::Generic,
            FormatArg::Ab => VocabularyFormat::Ab,
            FormatArg::Asn => VocabularyFormat::Asn,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import a vocabulary file and summarize the created set
    Import {
        /// Vocabulary format
        #[arg(short, long, value_enum, default_value = "generic")]
        format: FormatArg,
        /// Vocabulary file (.xml)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Convert a vocabulary file to the generic format
    Convert {
        /// Source vocabulary format
        #[arg(short, long, value_enum)]
        format: FormatArg,
        /// Vocabulary file (.xml)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Output file (default: stdout)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Show a vocabulary file as a tree
    Tree {
        /// Vocabulary format
        #[arg(short, long, value_enum, default_value = "generic")]
        format: FormatArg,
        /// Vocabulary file (.xml)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Check a vocabulary file: references, hierarchy, ordering
    Validate {
        /// Vocabulary format
        #[arg(short, long, value_enum, default_value = "generic")]
        format: FormatArg,
        /// Vocabulary file (.xml)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Show status
    Info,

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init,

    /// Show config paths
    Path,
}
