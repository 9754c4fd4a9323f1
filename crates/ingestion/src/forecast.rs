//! FORECAST ingester: one full-horizon download-and-merge cycle per UTC day.
//!
//! Unlike the reanalysis ingester, this one has no incremental staging —
//! every cycle re-downloads the whole horizon and overwrites `forecast/<var>`
//! wholesale, guarded by an `updated` checkpoint that makes a same-day rerun
//! a no-op.

use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use reqwest::Url;
use serde_json::Value;
use tracing::{info, warn};
use zarrs::storage::ReadableWritableStorageTraits;

use grid_processor::{ArraySpec, ChunkedStore};
use wms_common::{ClimateError, ClimateResult, FLX, PGB};

use crate::analysis::REANALYSIS_LAST_DATE_OFFSET_DAYS;
use crate::fetch::Fetcher;
use crate::readers::{band_from_messages, parse_grib2_messages};
use crate::variables::{Cfs2Band, Cfs2Family, FLX_BANDS, PGB_BANDS};

/// Forecast horizon, in days, counted from `today − 1`.
pub const FORECAST_HORIZON_DAYS: i64 = 180;

/// Exact length of the stored forecast day axis: the offset days plus the
/// horizon itself, always the same length cycle to cycle since the two
/// shift together with `today`.
pub const FORECAST_NUM_DAYS: i64 = REANALYSIS_LAST_DATE_OFFSET_DAYS + FORECAST_HORIZON_DAYS;

const HHS: [&str; 4] = ["00", "06", "12", "18"];

const ANALYSIS_FORECAST_GROUP: &str = "/analysis_forecast";
const FORECAST_GROUP: &str = "/analysis_forecast/forecast";

fn nomads_url(family: Cfs2Family, bands: &[Cfs2Band], date: NaiveDate, hh: &str, today: NaiveDate) -> String {
    let base = format!("https://nomads.ncep.noaa.gov/cgi-bin/filter_cfs_{family}.pl");

    let mut params: Vec<(String, String)> = bands
        .iter()
        .map(|b| (format!("var_{}", b.name), "on".to_string()))
        .collect();
    params.push(("lev_surface".to_string(), "on".to_string()));
    params.push((
        "dir".to_string(),
        format!("/cfs.{}/00/6hrly_grib_01", today.format("%Y%m%d")),
    ));

    let file_prefix = match family {
        Cfs2Family::Flx => "flxf",
        Cfs2Family::Pgb => "pgbf",
    };
    params.push((
        "file".to_string(),
        format!(
            "{file_prefix}{}{hh}.01.{}00.grb2",
            date.format("%Y%m%d"),
            today.format("%Y%m%d"),
        ),
    ));

    Url::parse_with_params(&base, &params)
        .expect("base URL and query params are always valid")
        .to_string()
}

/// Run the forecast ingester once. `download_dir`, if given, caches
/// downloaded files on disk by path existence — a rerun against the same
/// directory skips files already fetched.
pub async fn ingest_forecast<S>(
    store: &ChunkedStore<S>,
    fetcher: &Fetcher,
    download_dir: Option<&std::path::Path>,
) -> ClimateResult<()>
where
    S: ReadableWritableStorageTraits + Send + Sync + 'static,
{
    store
        .require_group(ANALYSIS_FORECAST_GROUP)
        .map_err(store_err)?;
    store.require_group(FORECAST_GROUP).map_err(store_err)?;

    let today = Utc::now().date_naive();

    let af_attrs = store.group_attrs(ANALYSIS_FORECAST_GROUP).map_err(store_err)?;
    if let Some(updated) = af_attrs
        .get("updated")
        .and_then(Value::as_str)
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
    {
        if today - updated < ChronoDuration::days(1) {
            info!(%today, %updated, "forecast already ingested for this UTC day, skipping");
            return Ok(());
        }
    }

    let forecast_begin = today - ChronoDuration::days(REANALYSIS_LAST_DATE_OFFSET_DAYS);
    let forecast_end = (today - ChronoDuration::days(1)) + ChronoDuration::days(FORECAST_HORIZON_DAYS);
    let num_days = (forecast_end - forecast_begin).num_days() + 1;
    debug_assert_eq!(num_days, FORECAST_NUM_DAYS);

    info!(%forecast_begin, %forecast_end, num_days, "starting forecast ingest");

    for (family, grid, bands) in [
        (Cfs2Family::Flx, FLX, FLX_BANDS),
        (Cfs2Family::Pgb, PGB, PGB_BANDS),
    ] {
        ingest_family(
            store,
            fetcher,
            download_dir,
            family,
            &grid,
            bands,
            forecast_begin,
            num_days as usize,
            today,
        )
        .await?;
    }

    store
        .set_group_attr(
            ANALYSIS_FORECAST_GROUP,
            "updated",
            Some(Value::String(today.format("%Y-%m-%d").to_string())),
        )
        .map_err(store_err)?;

    info!(%today, "forecast ingest complete");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn ingest_family<S>(
    store: &ChunkedStore<S>,
    fetcher: &Fetcher,
    download_dir: Option<&std::path::Path>,
    family: Cfs2Family,
    grid: &wms_common::FixedGrid,
    bands: &[Cfs2Band],
    forecast_begin: NaiveDate,
    num_days: usize,
    today: NaiveDate,
) -> ClimateResult<()>
where
    S: ReadableWritableStorageTraits + Send + Sync + 'static,
{
    let (h, w) = grid.size();

    // One entry per day; each holds up to 4 decoded message tables, one per
    // HH, `None` where that file was missing or not yet fetched.
    let mut day_tiles: Vec<[Option<Vec<grib2_parser::Grib2Message>>; 4]> = Vec::with_capacity(num_days);

    let mut date = forecast_begin;
    for _ in 0..num_days {
        let mut hh_tables: [Option<Vec<grib2_parser::Grib2Message>>; 4] = Default::default();

        for (i, hh) in HHS.iter().enumerate() {
            let url = nomads_url(family, bands, date, hh, today);
            let cache_path = download_dir.map(|dir| {
                dir.join(format!("{family}_{}_{hh}.grb2", date.format("%Y%m%d")))
            });

            let bytes = if let Some(path) = cache_path.as_deref().filter(|p| p.exists()) {
                std::fs::read(path)?
            } else {
                match fetcher.fetch(&url).await {
                    crate::fetch::FetchOutcome::Ok(bytes) => {
                        if let Some(path) = &cache_path {
                            std::fs::write(path, &bytes)?;
                        }
                        bytes.to_vec()
                    }
                    crate::fetch::FetchOutcome::NotFound => {
                        warn!(%date, hh, %family, "forecast file missing, leaving slot NaN");
                        continue;
                    }
                    crate::fetch::FetchOutcome::RateLimited => {
                        return Err(ClimateError::UpstreamRateLimited { url });
                    }
                    crate::fetch::FetchOutcome::Failed(reason) => {
                        return Err(ClimateError::UpstreamFailed { url, reason });
                    }
                }
            };

            hh_tables[i] = Some(parse_grib2_messages(&bytes)?);
        }

        day_tiles.push(hh_tables);
        date += ChronoDuration::days(1);
    }

    for band in bands {
        let mut buffer = vec![f32::NAN; num_days * h * w];

        for (day_offset, hh_tables) in day_tiles.iter().enumerate() {
            let mut tile = vec![f32::NAN; 4 * h * w];
            let mut any_present = false;

            for (hh_index, messages) in hh_tables.iter().enumerate() {
                if let Some(messages) = messages {
                    let slice = band_from_messages(messages, band.forecast_band, grid)?;
                    tile[hh_index * h * w..(hh_index + 1) * h * w].copy_from_slice(&slice);
                    any_present = true;
                }
            }

            if !any_present {
                continue;
            }

            for pixel in 0..(h * w) {
                let samples = [
                    tile[pixel],
                    tile[h * w + pixel],
                    tile[2 * h * w + pixel],
                    tile[3 * h * w + pixel],
                ];
                buffer[day_offset * h * w + pixel] = band.daily_stat.reduce(&samples);
            }
        }

        let live_path = format!("{FORECAST_GROUP}/{}", band.name);
        let spec = ArraySpec {
            shape: vec![num_days as u64, h as u64, w as u64],
            chunk_shape: vec![num_days as u64, 100.min(h as u64), 100.min(w as u64)],
        };
        store.require_array(&live_path, &spec).map_err(store_err)?;
        store
            .write_slab(&live_path, &[0, 0, 0], &[num_days as u64, h as u64, w as u64], &buffer)
            .map_err(store_err)?;
    }

    Ok(())
}

fn store_err(e: grid_processor::GridProcessorError) -> ClimateError {
    ClimateError::Store(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forecast_num_days_is_183() {
        assert_eq!(FORECAST_NUM_DAYS, 183);
    }

    #[test]
    fn nomads_url_carries_file_and_dir_params() {
        let today = NaiveDate::from_ymd_opt(2025, 7, 10).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 7, 8).unwrap();
        let url = nomads_url(Cfs2Family::Flx, FLX_BANDS, date, "00", today);
        assert!(url.starts_with("https://nomads.ncep.noaa.gov/cgi-bin/filter_cfs_flx.pl?"));
        assert!(url.contains("file=flxf20250708"));
        assert!(url.contains("dir=%2Fcfs.20250710%2F00%2F6hrly_grib_01"));
    }
}
