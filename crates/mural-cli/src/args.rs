//! Command-line argument definitions for the Mural CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. A subcommand selects what to do; the configuration file
//! and logging verbosity apply to every subcommand.

use clap::{Parser, Subcommand};

use mural::artifact::{ExportScale, RenderStyle};

/// Command-line arguments for the Mural diagram tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the share token for a diagram file
    Encode {
        /// Path to the diagram source
        input: String,

        /// Print a full share address built on this base instead of the bare token
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Print the diagram stored in a share token or share address
    Decode {
        /// A `v1.d.` token, a legacy token, or an address carrying one
        link: String,
    },

    /// Render a diagram once through the configured renderer
    Render {
        /// Path to the diagram source
        input: String,

        /// Output file; markup is printed to stdout when omitted
        #[arg(short, long)]
        output: Option<String>,

        /// Render style (vector, text-color, text-plain)
        #[arg(long)]
        style: Option<RenderStyle>,

        /// Export scale reported for raster exporters (1, 2, 8, 16)
        #[arg(long, default_value = "1")]
        scale: ExportScale,
    },

    /// Re-render a diagram every time its file changes
    Watch {
        /// Path to the diagram source
        input: String,

        /// Output file rewritten on every applied result
        #[arg(short, long)]
        output: Option<String>,

        /// Render style (vector, text-color, text-plain)
        #[arg(long)]
        style: Option<RenderStyle>,

        /// How often to check the input file, in milliseconds
        #[arg(long, default_value_t = 250)]
        poll_ms: u64,
    },
}
