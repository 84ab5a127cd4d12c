use clap::{Parser, Subcommand, ValueEnum};
use memecoin_cache::DEFAULT_KEY_PREFIX;
use memecoin_core::MemeCoinId;
use memecoin_popularity::config::DEFAULT_WARM_UP_PAGE_SIZE;
use std::fmt::{Display, Formatter};

pub const MYSQL_DSN_ENV: &str = "MEMECOIN_MYSQL_DSN";
pub const REDIS_URL_ENV: &str = "MEMECOIN_REDIS_URL";
pub const KEY_PREFIX_ENV: &str = "MEMECOIN_KEY_PREFIX";
pub const LOG_FORMAT_ENV: &str = "MEMECOIN_LOG_FORMAT";
pub const WARM_UP_PAGE_SIZE_ENV: &str = "MEMECOIN_WARM_UP_PAGE_SIZE";

pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

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

#[derive(Debug, Parser)]
#[command(name = "memecoin-popularity")]
pub struct CLI {
    #[arg(long, env = MYSQL_DSN_ENV)]
    pub mysql_dsn: String,

    #[arg(long, env = REDIS_URL_ENV, default_value = DEFAULT_REDIS_URL)]
    pub redis_url: String,

    #[arg(long, env = KEY_PREFIX_ENV, default_value = DEFAULT_KEY_PREFIX)]
    pub key_prefix: String,

    #[arg(
        long,
        env = LOG_FORMAT_ENV,
        value_enum,
        default_value_t = LogFormatArg::Text
    )]
    pub log_format: LogFormatArg,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Seed the cache with every persisted counter and exit.
    WarmUp {
        #[arg(long, env = WARM_UP_PAGE_SIZE_ENV, default_value_t = DEFAULT_WARM_UP_PAGE_SIZE)]
        page_size: usize,
    },
    /// Write the cached counters of the given ids to the store and exit.
    Reconcile {
        #[arg(long = "id", required = true, num_args = 1..)]
        ids: Vec<MemeCoinId>,
    },
}
