//! Scheduler / driver (§4.J): the three top-level archive operations, each
//! dispatching once on the resolved store backend.

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use ingestion::{
    ingest_forecast, ingest_projection, ingest_reanalysis, query_analysis_forecast,
    query_projection, Fetcher, QueryResult,
};
use wms_common::ClimateResult;

use crate::config::Settings;
use crate::store::{open_root_store, RootStore};

/// Which archive a query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Cfs2,
    Cmip6,
}

/// `ingest_analysis_forecast(root, [download_dir])`: the reanalysis ingester
/// completes in full before the forecast ingester starts, per §4.G's
/// precondition.
pub async fn ingest_analysis_forecast(settings: &Settings) -> ClimateResult<()> {
    let root = open_root_store(&settings.data)?;
    let download_dir = resolve_download_dir(settings)?;
    let forecast_fetcher =
        Fetcher::with_config(Some(Duration::from_millis(settings.forecast_min_interval_ms)), http_timeout(settings), settings.http_max_retries);
    let reanalysis_fetcher = Fetcher::with_config(None, http_timeout(settings), settings.http_max_retries);

    match root {
        RootStore::Fs(store) => {
            ingest_reanalysis(&store, &reanalysis_fetcher, Some(download_dir.as_path())).await?;
            ingest_forecast(&store, &forecast_fetcher, Some(download_dir.as_path())).await?;
        }
        RootStore::S3(store) => {
            ingest_reanalysis(&store, &reanalysis_fetcher, Some(download_dir.as_path())).await?;
            ingest_forecast(&store, &forecast_fetcher, Some(download_dir.as_path())).await?;
        }
    }

    Ok(())
}

/// `ingest_projection(root, [download_dir])`.
pub async fn run_ingest_projection(settings: &Settings) -> ClimateResult<()> {
    let root = open_root_store(&settings.data)?;
    let download_dir = resolve_download_dir(settings)?;
    let fetcher = Fetcher::with_config(None, http_timeout(settings), settings.http_max_retries);

    match root {
        RootStore::Fs(store) => ingest_projection(&store, &fetcher, Some(download_dir.as_path())).await,
        RootStore::S3(store) => ingest_projection(&store, &fetcher, Some(download_dir.as_path())).await,
    }
}

/// `query(kind, root, begin, end, coords, variables)`.
pub fn run_query(
    settings: &Settings,
    kind: QueryKind,
    begin: NaiveDate,
    end: NaiveDate,
    lat: f64,
    lon: f64,
    variables: &[&str],
) -> ClimateResult<QueryResult> {
    let root = open_root_store(&settings.data)?;

    match (root, kind) {
        (RootStore::Fs(store), QueryKind::Cfs2) => {
            query_analysis_forecast(&store, begin, end, lat, lon, variables)
        }
        (RootStore::S3(store), QueryKind::Cfs2) => {
            query_analysis_forecast(&store, begin, end, lat, lon, variables)
        }
        (RootStore::Fs(store), QueryKind::Cmip6) => {
            query_projection(&store, begin, end, lat, lon, variables)
        }
        (RootStore::S3(store), QueryKind::Cmip6) => {
            query_projection(&store, begin, end, lat, lon, variables)
        }
    }
}

fn http_timeout(settings: &Settings) -> Duration {
    Duration::from_secs(settings.http_timeout_secs)
}

/// Resolve the download scratch directory: the configured directory if one
/// was given (created if missing, contents persist as a download cache
/// across runs), or a process-scoped scratch directory under the system
/// temp root otherwise.
fn resolve_download_dir(settings: &Settings) -> ClimateResult<PathBuf> {
    let dir = match &settings.download_dir {
        Some(dir) => PathBuf::from(dir),
        None => std::env::temp_dir().join(format!("climate-archive-{}", std::process::id())),
    };
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
