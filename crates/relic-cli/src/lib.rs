//! Command-line front end for the relic crates
//!
//! The `relic` binary parses its arguments into the command enums defined
//! here and hands them to the handlers in [`commands`].

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Subcommand, ValueEnum};

pub use crate::commands::{
    bif::handle as handle_bif, cab::handle as handle_cab, key::handle as handle_key,
    mve::handle as handle_mve,
};

/// Output format for listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Tables for humans
    Text,
    /// JSON output
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

/// Format of log lines written to stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

#[derive(Debug, Subcommand)]
pub enum BifCommands {
    /// List the file and tileset tables of an archive
    List {
        /// Archive file
        archive: PathBuf,
    },

    /// Extract one resource from an archive
    Get {
        /// Archive file
        archive: PathBuf,

        /// File index, or ignored when a tileset is given
        #[arg(short, long, default_value_t = 0)]
        index: u32,

        /// Tileset number
        #[arg(short, long, default_value_t = 0)]
        tileset: u32,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
pub enum KeyCommands {
    /// List the resources of an index, grouped by category
    List {
        /// Path to chitin.key
        key: PathBuf,

        /// Only list resources with this extension
        #[arg(short = 't', long = "type")]
        resource_type: Option<String>,
    },

    /// Export one resource through the index
    Export {
        /// Path to chitin.key
        key: PathBuf,

        /// Resource name
        name: String,

        /// Resource type extension (e.g. mve, dlg)
        resource_type: String,

        /// Output file, defaults to NAME.EXT in the current directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
pub enum CabCommands {
    /// List the files of a cabinet set
    List {
        /// Directory holding data1.hdr and the volumes
        dir: PathBuf,
    },

    /// List components and the groups they install
    Components {
        /// Directory holding data1.hdr and the volumes
        dir: PathBuf,
    },

    /// Extract one file by index
    Extract {
        /// Directory holding data1.hdr and the volumes
        dir: PathBuf,

        /// File index
        index: usize,

        /// Output file
        output: PathBuf,
    },

    /// Install every component into a target directory
    Install {
        /// Directory holding data1.hdr and the volumes
        dir: PathBuf,

        /// Install directory
        target: PathBuf,

        /// Print the plan without writing anything
        #[arg(short = 'n', long)]
        dry_run: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum MveCommands {
    /// Show movie dimensions, timing and frame count
    Info {
        /// Movie file
        file: PathBuf,
    },

    /// Play a movie and write every frame as PNG
    Frames {
        /// Movie file
        file: PathBuf,

        /// Output directory
        outdir: PathBuf,

        /// Keep the movie's own frame timing
        #[arg(long)]
        realtime: bool,
    },
}
