//! Settings resolution: CLI flag > environment variable > built-in default.
//!
//! Grid constants and date anchors are never configuration — they live as
//! compiled-in constants in `wms-common`/`ingestion` because changing them
//! silently would corrupt ingestion correctness.

use clap::Args;

/// Settings shared by every subcommand, resolved `clap`-first via `env`
/// attributes (matching the workspace's existing `clap(derive, env)`
/// convention), `.env`-loaded in development via `dotenvy`.
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Archive store root: a filesystem path, or `s3://bucket[/prefix]`.
    #[arg(short = 'd', long = "data", env = "CLIMATE_ARCHIVE_DATA")]
    pub data: String,

    /// HTTP request timeout, in seconds, for upstream fetches.
    #[arg(long, env = "CLIMATE_ARCHIVE_HTTP_TIMEOUT_SECS", default_value_t = 30)]
    pub http_timeout_secs: u64,

    /// Max retry attempts for a single upstream fetch.
    #[arg(long, env = "CLIMATE_ARCHIVE_HTTP_MAX_RETRIES", default_value_t = 3)]
    pub http_max_retries: u32,

    /// Minimum interval, in milliseconds, between forecast-fetcher requests.
    #[arg(long, env = "CLIMATE_ARCHIVE_FORECAST_MIN_INTERVAL_MS", default_value_t = 334)]
    pub forecast_min_interval_ms: u64,

    /// Log level (`trace`, `debug`, `info`, `warn`, `error`).
    #[arg(long, env = "CLIMATE_ARCHIVE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Scratch directory for downloaded files. Omit for a fresh temporary
    /// directory discarded on exit.
    #[arg(long, env = "CLIMATE_ARCHIVE_DOWNLOAD_DIR")]
    pub download_dir: Option<String>,
}
