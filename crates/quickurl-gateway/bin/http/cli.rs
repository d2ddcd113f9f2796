use clap::{Parser, ValueEnum};
use quickurl_telemetry::LogFormat;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;

pub const LISTEN_ADDR_ENV: &str = "QUICKURL_LISTEN_ADDR";
pub const PUBLIC_BASE_URL_ENV: &str = "QUICKURL_PUBLIC_BASE_URL";
pub const STORAGE_BACKEND_ENV: &str = "QUICKURL_STORAGE";
pub const SQLITE_URL_ENV: &str = "QUICKURL_SQLITE_URL";
pub const SWEEP_INTERVAL_ENV: &str = "QUICKURL_SWEEP_INTERVAL_SECS";
pub const DEFAULT_TTL_ENV: &str = "QUICKURL_DEFAULT_TTL_SECS";
pub const TOKEN_LENGTH_ENV: &str = "QUICKURL_TOKEN_LENGTH";
pub const GENERATOR_ENV: &str = "QUICKURL_GENERATOR";
pub const GENERATOR_PREFIX_ENV: &str = "QUICKURL_GENERATOR_PREFIX";
pub const LOG_FORMAT_ENV: &str = "QUICKURL_LOG_FORMAT";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_SQLITE_URL: &str = "sqlite://quickurl.db";
pub const DEFAULT_GENERATOR_PREFIX: &str = "qu";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "sqlite")]
    Sqlite,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// How generated tokens are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GeneratorArg {
    /// Random alphanumeric tokens of `--token-length` characters.
    #[value(name = "random")]
    Random,
    /// `--generator-prefix` followed by a base-62 counter.
    #[value(name = "seq")]
    Seq,
}

impl Display for GeneratorArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GeneratorArg::Random => write!(f, "random"),
            GeneratorArg::Seq => write!(f, "seq"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "quickurl-gateway", version)]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Base of the short URLs handed back to clients.
    #[arg(long, env = PUBLIC_BASE_URL_ENV, default_value = DEFAULT_PUBLIC_BASE_URL)]
    pub public_base_url: String,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::Sqlite
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = SQLITE_URL_ENV, default_value = DEFAULT_SQLITE_URL)]
    pub sqlite_url: String,

    #[arg(
        long,
        env = SWEEP_INTERVAL_ENV,
        default_value_t = 60,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub sweep_interval_secs: u64,

    #[arg(
        long,
        env = DEFAULT_TTL_ENV,
        default_value_t = 30 * 24 * 60 * 60,
        value_parser = clap::value_parser!(i64).range(1..)
    )]
    pub default_ttl_secs: i64,

    #[arg(
        long,
        env = TOKEN_LENGTH_ENV,
        default_value_t = 6,
        value_parser = clap::value_parser!(u8).range(1..=64)
    )]
    pub token_length: u8,

    #[arg(
        long,
        env = GENERATOR_ENV,
        value_enum,
        default_value_t = GeneratorArg::Random
    )]
    pub generator: GeneratorArg,

    /// Prefix of sequential tokens; only used with `--generator seq`.
    #[arg(
        long,
        env = GENERATOR_PREFIX_ENV,
        default_value = DEFAULT_GENERATOR_PREFIX
    )]
    pub generator_prefix: String,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = CLI::try_parse_from(["gateway"]).unwrap();

        assert_eq!(cli.listen_addr, DEFAULT_LISTEN_ADDR.parse().unwrap());
        assert_eq!(cli.storage, StorageBackendArg::Sqlite);
        assert_eq!(cli.sweep_interval_secs, 60);
        assert_eq!(cli.default_ttl_secs, 2_592_000);
        assert_eq!(cli.token_length, 6);
        assert_eq!(cli.generator, GeneratorArg::Random);
        assert_eq!(cli.generator_prefix, DEFAULT_GENERATOR_PREFIX);
        assert_eq!(cli.log_format, LogFormat::Text);
    }

    #[test]
    fn flags_override_defaults() {
        let cli = CLI::try_parse_from([
            "gateway",
            "--storage",
            "in-memory",
            "--token-length",
            "10",
            "--log-format",
            "json",
            "--generator",
            "seq",
            "--generator-prefix",
            "node-a",
        ])
        .unwrap();

        assert_eq!(cli.storage, StorageBackendArg::InMemory);
        assert_eq!(cli.token_length, 10);
        assert_eq!(cli.generator, GeneratorArg::Seq);
        assert_eq!(cli.generator_prefix, "node-a");
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(CLI::try_parse_from(["gateway", "--token-length", "0"]).is_err());
        assert!(CLI::try_parse_from(["gateway", "--sweep-interval-secs", "0"]).is_err());
        assert!(CLI::try_parse_from(["gateway", "--generator", "snowflake"]).is_err());
    }
}
