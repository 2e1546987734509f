use clap::{Parser, Subcommand, ValueEnum};
use linklet_core::ClickSource;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DATA_DIR_ENV: &str = "LINKLET_DATA_DIR";
pub const BASE_URL_ENV: &str = "LINKLET_BASE_URL";
pub const LOG_FORMAT_ENV: &str = "LINKLET_LOG_FORMAT";

pub const DEFAULT_DATA_DIR: &str = ".linklet";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    #[value(name = "text")]
    Text,
    #[value(name = "json")]
    Json,
}

impl Display for LogFormatArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormatArg::Text => write!(f, "text"),
            LogFormatArg::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceArg {
    #[value(name = "ui")]
    Ui,
    #[value(name = "external")]
    External,
}

impl From<SourceArg> for ClickSource {
    fn from(value: SourceArg) -> Self {
        match value {
            SourceArg::Ui => ClickSource::UiClick,
            SourceArg::External => ClickSource::External,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "linklet", about = "Shorten URLs and track clicks locally")]
pub struct CLI {
    /// Directory holding the stored collections.
    #[arg(long, env = DATA_DIR_ENV, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    #[arg(long, env = BASE_URL_ENV, default_value = linklet_shortener::DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormatArg::Text)]
    pub log_format: LogFormatArg,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Shorten a single URL.
    Shorten {
        url: String,
        /// Validity in minutes, 30 when omitted.
        #[arg(long)]
        validity: Option<String>,
        /// Custom short code.
        #[arg(long)]
        code: Option<String>,
    },
    /// Shorten every candidate in a JSON array file.
    Batch { file: PathBuf },
    /// Record a click on a short code.
    Click {
        code: String,
        #[arg(long, value_enum, default_value_t = SourceArg::External)]
        source: SourceArg,
        #[arg(long)]
        location: Option<String>,
    },
    /// List every shortened URL.
    List,
    /// Show click statistics for a short code.
    Stats { code: String },
}
