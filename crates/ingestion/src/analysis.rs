//! ANALYSIS (reanalysis) ingester: day-by-day download of the CFS2 6-hourly
//! reanalysis archive, staged through a `_tmp` window before being promoted
//! into the live `reanalysis` array.
//!
//! Mirrors the original `download.py` reanalysis loop: a single producer
//! (the day-by-day download) hands completed days to one background
//! uploader, which decodes, reduces, and writes. The producer never touches
//! the store itself while the uploader is running for the current window.

use std::sync::mpsc;

use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use serde_json::Value;
use tracing::{error, info, warn};
use zarrs::storage::ReadableWritableStorageTraits;

use grid_processor::{ArraySpec, ChunkedStore};
use wms_common::{ClimateError, ClimateResult, REANALYSIS};

use crate::fetch::Fetcher;
use crate::readers::{band_from_messages, parse_grib2_messages};
use crate::variables::{cfs2_variable_names, Cfs2Band};

/// First date the reanalysis archive covers.
pub fn reanalysis_first_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2011, 4, 1).expect("constant date is valid")
}

/// Reanalysis data lags real time; the forecast ingester's `updated`
/// checkpoint minus this many days is the reanalysis end boundary.
pub const REANALYSIS_LAST_DATE_OFFSET_DAYS: i64 = 3;

/// 4-year window length, matching the chunked layout's dimension-0 chunk size.
const WINDOW_LEN: i64 = 1461;

const HHS: [&str; 4] = ["00", "06", "12", "18"];

const REANALYSIS_GROUP: &str = "/analysis_forecast/reanalysis";
const TMP_GROUP: &str = "/analysis_forecast/reanalysis/_tmp";
const ANALYSIS_FORECAST_GROUP: &str = "/analysis_forecast";

fn reanalysis_url(date: NaiveDate, hh: &str) -> String {
    format!(
        "https://www.ncei.noaa.gov/data/climate-forecast-system/access/operational-analysis/6-hourly-by-pressure/{y}/{ym}/{ymd}/cdas1.t{hh}z.pgrbh00.grib2",
        y = date.format("%Y"),
        ym = date.format("%Y%m"),
        ymd = date.format("%Y%m%d"),
        hh = hh,
    )
}

/// One day's worth of work handed from the producer to the uploader.
struct DayJob {
    day_in_window: usize,
    files: [bytes::Bytes; 4],
}

enum WorkItem {
    Day(DayJob),
    EndOfStream,
}

/// Run the reanalysis ingester against `store`, fetching with `fetcher`.
/// `download_dir`, if given, caches downloaded files on disk by path
/// existence — a rerun against the same directory skips files already
/// fetched.
///
/// `store` must already expose a fresh handle per call (it is cloned into
/// the background uploader thread); the caller owns the single-writer
/// contract described in the archive's concurrency model — no other
/// ingester may run against the same root concurrently.
pub async fn ingest_reanalysis<S>(
    store: &ChunkedStore<S>,
    fetcher: &Fetcher,
    download_dir: Option<&std::path::Path>,
) -> ClimateResult<()>
where
    S: ReadableWritableStorageTraits + Send + Sync + 'static,
{
    let (h, w) = REANALYSIS.size();

    store
        .require_group(ANALYSIS_FORECAST_GROUP)
        .map_err(store_err)?;
    store
        .require_group(REANALYSIS_GROUP)
        .map_err(store_err)?;
    store.require_group(TMP_GROUP).map_err(store_err)?;

    let af_attrs = store.group_attrs(ANALYSIS_FORECAST_GROUP).map_err(store_err)?;
    let updated = af_attrs
        .get("updated")
        .and_then(Value::as_str)
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());

    // The reanalysis ingester runs before the forecast ingester sets
    // `updated` for this cycle; on a fresh archive, or mid-cycle, fall back
    // to today as the implicit anchor.
    let anchor = updated.unwrap_or_else(|| Utc::now().date_naive());
    let end_date = anchor - ChronoDuration::days(REANALYSIS_LAST_DATE_OFFSET_DAYS);

    let reanalysis_attrs = store.group_attrs(REANALYSIS_GROUP).map_err(store_err)?;
    let last_committed = reanalysis_attrs
        .get("last")
        .and_then(Value::as_str)
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());

    let committed_start = match last_committed {
        Some(d) => d + ChronoDuration::days(1),
        None => reanalysis_first_date(),
    };

    let day0 = reanalysis_first_date();

    // `_tmp` survives a crash mid-window (it is only cleared once its window
    // is promoted), so its `last` checkpoint can be ahead of the committed
    // window start. Resume from `day0 + window_start_day + (k + 1)` in that
    // case, matching the crash-resume contract.
    let tmp_attrs = store.group_attrs(TMP_GROUP).map_err(store_err)?;
    let tmp_last_in_window = tmp_attrs.get("last").and_then(Value::as_u64);

    let start_date = match tmp_last_in_window {
        Some(k) => {
            let committed_day_index = (committed_start - day0).num_days();
            let window_start_day = committed_day_index.div_euclid(WINDOW_LEN) * WINDOW_LEN;
            let resumed = day0 + ChronoDuration::days(window_start_day + k as i64 + 1);
            resumed.max(committed_start)
        }
        None => committed_start,
    };

    if start_date >= end_date {
        info!(%start_date, %end_date, "reanalysis ingester has nothing new to fetch");
        return Ok(());
    }

    info!(%start_date, %end_date, "starting reanalysis ingest");

    let mut current_window: Option<i64> = None;
    let mut tx: Option<mpsc::SyncSender<WorkItem>> = None;
    let mut worker: Option<tokio::task::JoinHandle<ClimateResult<()>>> = None;
    let mut last_written_date = last_committed;

    let mut date = start_date;
    while date < end_date {
        let day_index = (date - day0).num_days();
        let window_index = day_index.div_euclid(WINDOW_LEN);

        if current_window != Some(window_index) {
            if let Some(prev_window) = current_window {
                close_window(&mut tx, &mut worker).await?;
                promote_window(store, prev_window, h, w)?;
            }
            let (new_tx, new_worker) = spawn_uploader(store.clone(), h, w);
            tx = Some(new_tx);
            worker = Some(new_worker);
            current_window = Some(window_index);
        }

        let mut files: Vec<bytes::Bytes> = Vec::with_capacity(4);
        let mut missing = false;
        let mut fatal: Option<ClimateError> = None;

        for hh in HHS {
            let url = reanalysis_url(date, hh);
            let cache_path = download_dir
                .map(|dir| dir.join(format!("reanalysis_{}_{hh}.grib2", date.format("%Y%m%d"))));

            if let Some(path) = cache_path.as_deref().filter(|p| p.exists()) {
                files.push(bytes::Bytes::from(std::fs::read(path)?));
                continue;
            }

            match fetcher.fetch(&url).await {
                crate::fetch::FetchOutcome::Ok(bytes) => {
                    if let Some(path) = &cache_path {
                        std::fs::write(path, &bytes)?;
                    }
                    files.push(bytes);
                }
                crate::fetch::FetchOutcome::NotFound => {
                    missing = true;
                    break;
                }
                crate::fetch::FetchOutcome::RateLimited => {
                    fatal = Some(ClimateError::UpstreamRateLimited { url });
                    break;
                }
                crate::fetch::FetchOutcome::Failed(reason) => {
                    fatal = Some(ClimateError::UpstreamFailed { url, reason });
                    break;
                }
            }
        }

        if let Some(e) = fatal {
            error!(%date, error = %e, "fatal fetch error, draining uploader and aborting");
            close_window(&mut tx, &mut worker).await?;
            return Err(e);
        }

        if missing {
            warn!(%date, "reanalysis file not yet published, skipping day");
            date += ChronoDuration::days(1);
            continue;
        }

        let window_start_day = window_index * WINDOW_LEN;
        let day_in_window = (day_index - window_start_day) as usize;
        let files: [bytes::Bytes; 4] = files.try_into().expect("exactly 4 HH files collected");

        tx.as_ref()
            .expect("uploader started for current window")
            .send(WorkItem::Day(DayJob { day_in_window, files }))
            .map_err(|_| ClimateError::Store("reanalysis uploader terminated early".to_string()))?;

        last_written_date = Some(date);
        date += ChronoDuration::days(1);
    }

    if let Some(window_index) = current_window {
        close_window(&mut tx, &mut worker).await?;
        promote_window(store, window_index, h, w)?;
    }

    if let Some(last_date) = last_written_date {
        store
            .set_group_attr(
                REANALYSIS_GROUP,
                "last",
                Some(Value::String(last_date.format("%Y-%m-%d").to_string())),
            )
            .map_err(store_err)?;
    }

    info!(?last_written_date, "reanalysis ingest complete");
    Ok(())
}

async fn close_window(
    tx: &mut Option<mpsc::SyncSender<WorkItem>>,
    worker: &mut Option<tokio::task::JoinHandle<ClimateResult<()>>>,
) -> ClimateResult<()> {
    if let Some(sender) = tx.take() {
        let _ = sender.send(WorkItem::EndOfStream);
    }
    if let Some(handle) = worker.take() {
        handle
            .await
            .map_err(|_| ClimateError::Store("reanalysis uploader task panicked".to_string()))??;
    }
    Ok(())
}

/// Spawns the uploader as a blocking task: it decodes GRIB2 and writes Zarr
/// slabs synchronously, so it runs on Tokio's blocking thread pool rather
/// than the async reactor, fed by a bounded channel the producer can send
/// on without risking the reactor itself.
fn spawn_uploader<S>(
    store: ChunkedStore<S>,
    h: usize,
    w: usize,
) -> (mpsc::SyncSender<WorkItem>, tokio::task::JoinHandle<ClimateResult<()>>)
where
    S: ReadableWritableStorageTraits + Send + Sync + 'static,
{
    let (tx, rx) = mpsc::sync_channel::<WorkItem>(4);
    let handle = tokio::task::spawn_blocking(move || uploader_loop(store, rx, h, w));
    (tx, handle)
}

fn uploader_loop<S>(
    store: ChunkedStore<S>,
    rx: mpsc::Receiver<WorkItem>,
    h: usize,
    w: usize,
) -> ClimateResult<()>
where
    S: ReadableWritableStorageTraits + Send + Sync + 'static,
{
    let var_names = cfs2_variable_names();

    for item in rx {
        let job = match item {
            WorkItem::Day(job) => job,
            WorkItem::EndOfStream => break,
        };

        let message_tables: Vec<Vec<grib2_parser::Grib2Message>> = job
            .files
            .iter()
            .map(|bytes| parse_grib2_messages(bytes))
            .collect::<ClimateResult<_>>()?;

        for name in &var_names {
            let band: &Cfs2Band = crate::variables::cfs2_band(name)
                .expect("name came from the catalog's own variable list");

            let mut tile = vec![f32::NAN; 4 * h * w];
            for (hh_index, messages) in message_tables.iter().enumerate() {
                let slice = band_from_messages(messages, band.reanalysis_band, &REANALYSIS)?;
                tile[hh_index * h * w..(hh_index + 1) * h * w].copy_from_slice(&slice);
            }

            let mut daily = vec![0.0f32; h * w];
            for pixel in 0..(h * w) {
                let samples = [
                    tile[pixel],
                    tile[h * w + pixel],
                    tile[2 * h * w + pixel],
                    tile[3 * h * w + pixel],
                ];
                daily[pixel] = band.daily_stat.reduce(&samples);
            }

            let tmp_path = format!("{TMP_GROUP}/{name}");
            let spec = ArraySpec {
                shape: vec![WINDOW_LEN as u64, h as u64, w as u64],
                chunk_shape: vec![1, h as u64, w as u64],
            };
            store.require_array(&tmp_path, &spec).map_err(store_err)?;
            store
                .write_slab(
                    &tmp_path,
                    &[job.day_in_window as u64, 0, 0],
                    &[1, h as u64, w as u64],
                    &daily,
                )
                .map_err(store_err)?;
        }

        store
            .set_group_attr(
                TMP_GROUP,
                "last",
                Some(Value::Number(job.day_in_window.into())),
            )
            .map_err(store_err)?;
    }

    Ok(())
}

/// Copy every variable's populated slice out of `_tmp` into the live array
/// for the window that just closed, then clear `_tmp`.
fn promote_window<S>(
    store: &ChunkedStore<S>,
    window_index: i64,
    h: usize,
    w: usize,
) -> ClimateResult<()>
where
    S: ReadableWritableStorageTraits + Send + Sync + 'static,
{
    let tmp_attrs = store.group_attrs(TMP_GROUP).map_err(store_err)?;
    let last_in_window = tmp_attrs.get("last").and_then(Value::as_u64);
    let Some(last_in_window) = last_in_window else {
        // Nothing was written into this window (every day was skipped).
        return Ok(());
    };
    let window_len_written = (last_in_window + 1) as u64;
    let window_start_day = (window_index * WINDOW_LEN) as u64;

    info!(window_index, window_len_written, "promoting reanalysis window");

    for name in cfs2_variable_names() {
        let tmp_path = format!("{TMP_GROUP}/{name}");
        let live_path = format!("{REANALYSIS_GROUP}/{name}");

        let data = store
            .read_slab(&tmp_path, &[0, 0, 0], &[window_len_written, h as u64, w as u64])
            .map_err(store_err)?;

        let target_dim0 = window_start_day + window_len_written;
        let spec = ArraySpec {
            shape: vec![target_dim0.max(1), h as u64, w as u64],
            chunk_shape: vec![WINDOW_LEN as u64, 100.min(h as u64), 100.min(w as u64)],
        };
        store.require_array(&live_path, &spec).map_err(store_err)?;
        if store.dim0_len(&live_path).map_err(store_err)? < target_dim0 {
            store.resize_dim0(&live_path, target_dim0).map_err(store_err)?;
        }

        store
            .write_slab(
                &live_path,
                &[window_start_day, 0, 0],
                &[window_len_written, h as u64, w as u64],
                &data,
            )
            .map_err(store_err)?;
    }

    store.clear(TMP_GROUP).map_err(store_err)?;
    store.require_group(TMP_GROUP).map_err(store_err)?;
    Ok(())
}

fn store_err(e: grid_processor::GridProcessorError) -> ClimateError {
    ClimateError::Store(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reanalysis_first_date_is_april_2011() {
        assert_eq!(reanalysis_first_date(), NaiveDate::from_ymd_opt(2011, 4, 1).unwrap());
    }

    #[test]
    fn reanalysis_url_matches_template() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        let url = reanalysis_url(date, "06");
        assert_eq!(
            url,
            "https://www.ncei.noaa.gov/data/climate-forecast-system/access/operational-analysis/6-hourly-by-pressure/2024/202403/20240307/cdas1.t06z.pgrbh00.grib2"
        );
    }
}
