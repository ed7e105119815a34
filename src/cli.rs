use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command line of the bridge
#[derive(Parser, Debug, PartialEq)]
#[command(name = "xmms2-mpris")]
#[command(about = "Expose a running XMMS2 daemon as an MPRIS2 media player")]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Read configuration from this file instead of the default location
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// What to do; the bridge starts when omitted
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Connect to XMMS2 and export the player
    Start,
}
