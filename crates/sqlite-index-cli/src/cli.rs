//! CLI argument parsing for sqlite-index.
//!
//! Flags override values from the config file and environment.

use clap::Parser;

use sqlite_index_source::schemes;

fn source_uri_help() -> String {
    format!(
        "A valid source URI. Valid schemes are: {}",
        schemes().join(", ")
    )
}

/// Index records into a SQLite database
#[derive(Parser, Debug)]
#[command(name = "sqlite-index")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/sqlite-index/config.toml)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    pub log_level: Option<String>,

    #[arg(long, help = source_uri_help())]
    pub source_uri: Option<String>,

    /// Database DSN or path (`:memory:`, `sqlite://mem`, `/path/to/index.db`)
    #[arg(long)]
    pub dsn: Option<String>,

    /// Enable performance pragmas at the expense of possible database corruption
    #[arg(long, value_name = "BOOL")]
    pub live_hard_die_fast: Option<bool>,

    /// Report timings during and after indexing
    #[arg(long)]
    pub timings: bool,

    /// Seconds between timing reports
    #[arg(long)]
    pub timings_interval_secs: Option<u64>,

    /// Enable the post-index hook
    #[arg(long)]
    pub post_index: bool,

    /// Concurrent record workers (0 = available parallelism)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Identifiers to index (directories, files or file lists, depending on the source)
    pub uris: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["sqlite-index", "/data"]);
        assert_eq!(cli.uris, vec!["/data"]);
        assert!(cli.source_uri.is_none());
        assert!(cli.live_hard_die_fast.is_none());
        assert!(!cli.timings);
        assert!(!cli.post_index);
    }

    #[test]
    fn test_cli_all_flags() {
        let cli = Cli::parse_from([
            "sqlite-index",
            "--config",
            "/etc/sqlite-index.toml",
            "--log-level",
            "debug",
            "--source-uri",
            "directory://",
            "--dsn",
            "/tmp/index.db",
            "--live-hard-die-fast",
            "false",
            "--timings",
            "--timings-interval-secs",
            "5",
            "--post-index",
            "--workers",
            "2",
            "/a",
            "/b",
        ]);

        assert_eq!(cli.config.as_deref(), Some("/etc/sqlite-index.toml"));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.source_uri.as_deref(), Some("directory://"));
        assert_eq!(cli.dsn.as_deref(), Some("/tmp/index.db"));
        assert_eq!(cli.live_hard_die_fast, Some(false));
        assert!(cli.timings);
        assert_eq!(cli.timings_interval_secs, Some(5));
        assert!(cli.post_index);
        assert_eq!(cli.workers, Some(2));
        assert_eq!(cli.uris, vec!["/a", "/b"]);
    }

    #[test]
    fn test_cli_rejects_bad_bool() {
        let result = Cli::try_parse_from(["sqlite-index", "--live-hard-die-fast", "maybe"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_help_lists_schemes() {
        assert!(source_uri_help().contains("filelist://"));
    }
}
