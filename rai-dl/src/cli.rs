use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(
    name = "rai-dl",
    author,
    version,
    about = "Download RaiPlay episodes and series with ffmpeg",
    long_about = "Resolves RaiPlay episode or programme pages into stream descriptors and \
                  remuxes every stream into a local file. Run without a command for an \
                  interactive menu."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file (defaults to <config dir>/rai-dl/config.toml)
    #[arg(long, global = true, env = "RAI_DL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download a single episode
    Episode {
        /// Episode page url (https://www.raiplay.it/video/...html)
        url: String,

        /// Directory the file is written to
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Download every episode listed on a programme page
    Series {
        /// Programme page url (https://www.raiplay.it/programmi/<name>)
        url: String,

        /// Directory the files are written to
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Maximum number of concurrent downloads
        #[arg(short = 'j', long)]
        parallelism: Option<usize>,

        /// Skip episodes that cannot be resolved instead of aborting
        #[arg(long)]
        isolate_failures: bool,
    },

    /// Download an episode or a series, detected from the url
    Get {
        url: String,

        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        #[arg(short = 'j', long)]
        parallelism: Option<usize>,
    },

    /// Print the resolved descriptors as JSON without downloading
    Resolve {
        url: String,

        /// Treat the url as a programme page
        #[arg(long)]
        series: bool,

        /// Print compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Print the configuration file location instead
        #[arg(long)]
        path: bool,
    },

    /// Generate shell completion scripts
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}
