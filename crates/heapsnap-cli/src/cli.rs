use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// heapsnap - managed heap snapshot analysis
#[derive(Debug, Parser)]
#[command(name = "heapsnap", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared across all subcommands.
#[derive(Debug, Parser)]
pub struct GlobalOptions {
    /// Emit output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug-level logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Analyzer settings (TOML). Missing file means defaults.
    #[arg(short, long, global = true, default_value = "heapsnap.toml")]
    pub config: PathBuf,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Object and byte totals per type.
    Summary {
        /// Capture file (JSON).
        #[arg(value_name = "CAPTURE")]
        capture: PathBuf,

        /// Number of types to list.
        #[arg(short = 'n', long, default_value_t = 30)]
        top: usize,
    },

    /// Show one object with its incoming and outgoing references.
    Inspect {
        #[arg(value_name = "CAPTURE")]
        capture: PathBuf,

        /// Object address (hex, with or without 0x).
        #[arg(value_name = "ADDRESS")]
        address: String,
    },

    /// Shortest chain of references from an object to a GC root or static.
    Path {
        #[arg(value_name = "CAPTURE")]
        capture: PathBuf,

        #[arg(value_name = "ADDRESS")]
        address: String,
    },

    /// Compare two captures of the same process.
    Diff {
        /// Earlier capture.
        #[arg(value_name = "BEFORE")]
        before: PathBuf,

        /// Later capture.
        #[arg(value_name = "AFTER")]
        after: PathBuf,

        /// Only diff types from these assemblies.
        #[arg(long, value_name = "ASSEMBLY")]
        include: Vec<String>,

        /// Skip types from these assemblies (added to the config's list).
        #[arg(long, value_name = "ASSEMBLY")]
        exclude: Vec<String>,

        /// Write the full diff report as JSON to this file.
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Number of added/removed objects to list.
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },

    /// Dump raw captured bytes at an address.
    Hexdump {
        #[arg(value_name = "CAPTURE")]
        capture: PathBuf,

        #[arg(value_name = "ADDRESS")]
        address: String,

        /// Number of bytes to dump.
        #[arg(short, long, default_value_t = 256)]
        size: usize,

        /// Show the ASCII column.
        #[arg(short, long)]
        ascii: bool,
    },
}
