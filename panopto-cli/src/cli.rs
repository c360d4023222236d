use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use panopto_api::{BASIC_COLUMNS, Column, FULL_COLUMNS};

#[derive(Parser)]
#[command(
    name = "panopto-cli",
    version,
    about = "Export and watch Panopto folder recordings"
)]
pub struct Args {
    /// Server base URL, e.g. https://myschool.hosted.panopto.com
    #[arg(long, env = "PANOPTO_SERVER")]
    pub server: String,

    /// OAuth2 client ID
    #[arg(long, env = "PANOPTO_CLIENT_ID")]
    pub client_id: String,

    /// OAuth2 client secret
    #[arg(long, env = "PANOPTO_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: String,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Collect every recording in a folder and export them to CSV
    Export {
        /// Folder to enumerate
        #[arg(long)]
        folder_id: String,

        /// Output CSV path
        #[arg(short, long, default_value = "panopto_recordings.csv")]
        output: PathBuf,

        /// Listing page size
        #[arg(long, default_value_t = 100)]
        page_size: usize,

        /// Also fetch per-recording viewer details
        #[arg(long)]
        viewers: bool,

        /// Column projection for the CSV
        #[arg(long, value_enum, default_value_t = ColumnSetArg::Full)]
        columns: ColumnSetArg,
    },

    /// Poll a folder's children on an interval, printing each listing
    Watch {
        /// Folder to poll
        #[arg(long)]
        folder_id: String,

        /// Poll interval in seconds
        #[arg(long, default_value_t = 60)]
        interval: u64,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColumnSetArg {
    /// Name, ID, Duration, Folder, URL
    Basic,
    /// Name, ID, Duration, Created, Folder, Views, Status, URL
    Full,
}

impl ColumnSetArg {
    pub fn columns(self) -> &'static [Column] {
        match self {
            ColumnSetArg::Basic => BASIC_COLUMNS,
            ColumnSetArg::Full => FULL_COLUMNS,
        }
    }
}
