//! CLI argument parsing using clap.

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "treepack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Pack a file or directory tree into an archive
    Create(CreateArgs),
    /// Extract archive contents and restore metadata
    Extract(ExtractArgs),
    /// List archive contents without extraction
    List(ListArgs),
    /// Generate shell completions
    Completion {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Commands {
    /// Operation name used in JSON output.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Extract(_) => "extract",
            Self::List(_) => "list",
            Self::Completion { .. } => "completion",
        }
    }
}

#[derive(clap::Args)]
pub struct CreateArgs {
    /// File or directory to archive; the archive is written next to it
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Archive format (tar.gz or zip)
    #[arg(short, long, default_value = "tar.gz")]
    pub format: String,

    /// Compression level (1-9)
    #[arg(short = 'l', long, value_parser = clap::value_parser!(u8).range(1..=9))]
    pub compression_level: Option<u8>,

    /// Number of worker threads (default: available parallelism)
    #[arg(short = 't', long, value_parser = clap::value_parser!(u16).range(1..))]
    pub threads: Option<u16>,

    /// Directory entry names are made relative to (default: parent of ROOT)
    #[arg(long, value_name = "DIR")]
    pub archive_root: Option<PathBuf>,

    /// Write the archive in place instead of through a temporary file
    #[arg(long)]
    pub no_atomic: bool,
}

#[derive(clap::Args)]
pub struct ExtractArgs {
    /// Path to the archive file
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Output directory (default: current directory)
    #[arg(value_name = "TARGET")]
    pub target: Option<PathBuf>,

    /// Archive format (default: detected from the file name)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Number of worker threads (default: available parallelism)
    #[arg(short = 't', long, value_parser = clap::value_parser!(u16).range(1..))]
    pub threads: Option<u16>,

    /// Do not restore uid/gid recorded in the archive
    #[arg(long)]
    pub no_owner: bool,
}

#[derive(clap::Args)]
pub struct ListArgs {
    /// Path to the archive file
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Archive format (default: detected from the file name)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Show mode, owner, size and modification time
    #[arg(short, long)]
    pub long: bool,

    /// Show sizes in human-readable format
    #[arg(short = 'H', long)]
    pub human_readable: bool,
}
