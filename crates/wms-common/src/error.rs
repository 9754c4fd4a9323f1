//! Error types shared across the archive ingestion and query surfaces.

use thiserror::Error;

/// Result type alias using [`ClimateError`].
pub type ClimateResult<T> = Result<T, ClimateError>;

/// Primary error type for the climate archive.
#[derive(Debug, Error)]
pub enum ClimateError {
    // === Query validation errors (user-visible, HTTP 422 / non-zero exit) ===
    #[error("first date must be less than or equal to last")]
    InvalidDateRange,

    #[error("coordinates ({lat}, {lon}) are out of bounds for grid {grid}")]
    OutOfBoundsCoords { lat: f64, lon: f64, grid: String },

    #[error("date {date} is out of range [{first}; {last}]")]
    OutOfRangeDate {
        date: String,
        first: String,
        last: String,
    },

    #[error("analysis/forecast archive is not ready: no `updated` attribute")]
    ArchiveNotReady,

    // === Ingestion-fatal errors (logged, non-zero exit, not user-visible) ===
    #[error("unexpected shape or geo-referencing in {path}: {reason}")]
    GridMismatch { path: String, reason: String },

    #[error("upstream rate limit exceeded for {url}")]
    UpstreamRateLimited { url: String },

    #[error("failed to download {url}: {reason}")]
    UpstreamFailed { url: String, reason: String },

    #[error("object storage support ('s3://' roots) requires the `s3` feature")]
    StoreUnavailable,

    // === Ambient wrapping ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("chunked store error: {0}")]
    Store(String),

    #[error("GRIB2 decode error: {0}")]
    Grib2(String),

    #[error("NetCDF decode error: {0}")]
    NetCdf(String),

    #[error("HTTP client error: {0}")]
    Http(String),
}

impl ClimateError {
    /// HTTP status code for front-end error responses.
    pub fn http_status_code(&self) -> u16 {
        match self {
            ClimateError::InvalidDateRange
            | ClimateError::OutOfBoundsCoords { .. }
            | ClimateError::OutOfRangeDate { .. }
            | ClimateError::ArchiveNotReady => 422,
            _ => 500,
        }
    }

    /// Process exit code for CLI front-end use.
    pub fn exit_code(&self) -> i32 {
        match self {
            ClimateError::InvalidDateRange
            | ClimateError::OutOfBoundsCoords { .. }
            | ClimateError::OutOfRangeDate { .. }
            | ClimateError::ArchiveNotReady => 2,
            _ => 1,
        }
    }

    /// Whether this error is expected to be surfaced verbatim to an end user
    /// (as opposed to an internal/ingestion-fatal condition that should only
    /// be logged).
    pub fn is_user_visible(&self) -> bool {
        self.http_status_code() == 422
    }
}

impl From<serde_json::Error> for ClimateError {
    fn from(err: serde_json::Error) -> Self {
        ClimateError::Store(format!("JSON error: {err}"))
    }
}
