mod help_text;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Browse directory trees annotated with file statuses
#[derive(Parser, Debug)]
#[command(name = "fsdb", version, about, long_about = help_text::ROOT_LONG_ABOUT)]
pub struct Cli {
    /// Run as if started in DIR
    #[arg(short = 'C', value_name = "DIR", global = true)]
    pub directory: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug). Takes precedence over RUST_LOG.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Status policy to apply (TOML)
    #[arg(long, value_name = "FILE", global = true)]
    pub policy: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Directory inside the tree to list (default: the root)
    #[arg(value_name = "PATH")]
    pub path: Option<String>,

    /// Show hidden and ignored entries
    #[arg(short, long)]
    pub all: bool,

    /// Hide entries with a clean status
    #[arg(long)]
    pub hide_clean: bool,

    /// Descend into every listed subdirectory
    #[arg(short, long)]
    pub recursive: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the filesystem tree
    #[command(long_about = help_text::LS_LONG_ABOUT)]
    Ls {
        #[command(flatten)]
        list: ListArgs,
    },

    /// List the filesystem tree with statuses from a report
    #[command(long_about = help_text::STATUS_LONG_ABOUT)]
    Status {
        /// Status report to overlay ("-" reads stdin)
        #[arg(long, value_name = "FILE")]
        report: PathBuf,

        #[command(flatten)]
        list: ListArgs,
    },

    /// List only the paths named in a report
    #[command(long_about = help_text::CHANGES_LONG_ABOUT)]
    Changes {
        /// Status report to list ("-" reads stdin)
        #[arg(long, value_name = "FILE")]
        report: PathBuf,

        #[command(flatten)]
        list: ListArgs,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
