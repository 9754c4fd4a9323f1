//! PROJECTION (CMIP6) ingester: per-variable, 4-year-block NetCDF download.
//!
//! Each variable progresses through `[PROJECTION_FIRST_YEAR, PROJECTION_LAST_YEAR]`
//! independently, one block at a time, freeing its decode buffer before the
//! next variable starts — the projection buffer alone is close to the
//! archive's single largest in-memory footprint at the 0.25° global grid.

use chrono::NaiveDate;
use serde_json::Value;
use tracing::info;
use zarrs::storage::ReadableWritableStorageTraits;

use grid_processor::{ArraySpec, ChunkedStore};
use wms_common::{ClimateError, ClimateResult, PROJECTION};

use crate::fetch::Fetcher;
use crate::readers::read_netcdf_variable;
use crate::variables::CMIP6_VARS;

pub const PROJECTION_FIRST_YEAR: i32 = 1950;
pub const PROJECTION_LAST_YEAR: i32 = 2100;
pub const PROJECTION_LAST_HISTORICAL_YEAR: i32 = 2014;

/// 4-year block length aligned on the chunked layout's dimension-0 chunk size.
const BLOCK_LEN_DAYS: i64 = 1461;

const PROJECTION_GROUP: &str = "/projection";

fn projection_first_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(PROJECTION_FIRST_YEAR, 1, 1).expect("constant date is valid")
}

fn projection_url(variable: &str, year: i32) -> String {
    let kind = if year <= PROJECTION_LAST_HISTORICAL_YEAR {
        "historical"
    } else {
        "ssp245"
    };
    format!(
        "https://nex-gddp-cmip6.s3-us-west-2.amazonaws.com/NEX-GDDP-CMIP6/ACCESS-CM2/{kind}/r1i1p1f1/{variable}/{variable}_day_ACCESS-CM2_{kind}_r1i1p1f1_gn_{year}.nc"
    )
}

/// The store abstraction only exposes group-level attributes (matching the
/// Zarr-group checkpoint idiom used elsewhere in the archive), so each
/// variable's `(first_year, last_year_written)` checkpoint is kept as a
/// distinctly-keyed entry on the shared `/projection` group rather than on
/// the variable's own array node.
fn years_attr_key(variable: &str) -> String {
    format!("{variable}_years")
}

/// Run the projection ingester across every CMIP6 variable, resuming each
/// one independently from its own `years` checkpoint. `download_dir`, if
/// given, caches downloaded files on disk by path existence — a rerun
/// against the same directory skips files already fetched.
pub async fn ingest_projection<S>(
    store: &ChunkedStore<S>,
    fetcher: &Fetcher,
    download_dir: Option<&std::path::Path>,
) -> ClimateResult<()>
where
    S: ReadableWritableStorageTraits + Send + Sync + 'static,
{
    store.require_group(PROJECTION_GROUP).map_err(store_err)?;
    let (h, w) = PROJECTION.size();

    for variable in CMIP6_VARS {
        let attrs = store.group_attrs(PROJECTION_GROUP).map_err(store_err)?;
        let last_year_written = attrs
            .get(&years_attr_key(variable.name))
            .and_then(Value::as_array)
            .and_then(|pair| pair.get(1))
            .and_then(Value::as_i64)
            .map(|y| y as i32);

        let mut next_year = last_year_written.map(|y| y + 1).unwrap_or(PROJECTION_FIRST_YEAR);
        let live_path = format!("{PROJECTION_GROUP}/{}", variable.name);

        while next_year <= PROJECTION_LAST_YEAR {
            let block_years: Vec<i32> = (next_year..=PROJECTION_LAST_YEAR).take(4).collect();
            info!(variable = variable.name, ?block_years, "fetching projection block");

            let mut buffer = vec![f32::NAN; (BLOCK_LEN_DAYS as usize) * h * w];
            let mut day_offset = 0usize;

            for &year in &block_years {
                let url = projection_url(variable.name, year);
                let cache_path = download_dir
                    .map(|dir| dir.join(format!("{}_{year}.nc", variable.name)));

                let values = if let Some(path) = cache_path.as_deref().filter(|p| p.exists()) {
                    read_netcdf_variable(&std::fs::read(path)?, variable.name, &PROJECTION)?
                } else {
                    match fetcher.fetch(&url).await {
                        crate::fetch::FetchOutcome::Ok(bytes) => {
                            if let Some(path) = &cache_path {
                                std::fs::write(path, &bytes)?;
                            }
                            read_netcdf_variable(&bytes, variable.name, &PROJECTION)?
                        }
                        crate::fetch::FetchOutcome::NotFound => {
                            return Err(ClimateError::UpstreamFailed {
                                url,
                                reason: "projection source file not found".to_string(),
                            });
                        }
                        crate::fetch::FetchOutcome::RateLimited => {
                            return Err(ClimateError::UpstreamRateLimited { url });
                        }
                        crate::fetch::FetchOutcome::Failed(reason) => {
                            return Err(ClimateError::UpstreamFailed { url, reason });
                        }
                    }
                };

                let days_in_year = values.len() / (h * w);
                if day_offset + days_in_year > BLOCK_LEN_DAYS as usize {
                    return Err(ClimateError::GridMismatch {
                        path: url,
                        reason: format!("year {year} overflows its 4-year block"),
                    });
                }
                buffer[day_offset * h * w..(day_offset + days_in_year) * h * w]
                    .copy_from_slice(&values);
                day_offset += days_in_year;
            }

            let block_start_day = (NaiveDate::from_ymd_opt(block_years[0], 1, 1)
                .expect("year in valid projection range")
                - projection_first_date())
            .num_days() as u64;
            let target_dim0 = block_start_day + BLOCK_LEN_DAYS as u64;

            let spec = ArraySpec {
                shape: vec![target_dim0, h as u64, w as u64],
                chunk_shape: vec![BLOCK_LEN_DAYS as u64, 100.min(h as u64), 100.min(w as u64)],
            };
            store.require_array(&live_path, &spec).map_err(store_err)?;
            if store.dim0_len(&live_path).map_err(store_err)? < target_dim0 {
                store.resize_dim0(&live_path, target_dim0).map_err(store_err)?;
            }
            store
                .write_slab(
                    &live_path,
                    &[block_start_day, 0, 0],
                    &[BLOCK_LEN_DAYS as u64, h as u64, w as u64],
                    &buffer,
                )
                .map_err(store_err)?;

            let last_year_in_block = *block_years.last().expect("at least one year per block");
            store
                .set_group_attr(
                    PROJECTION_GROUP,
                    &years_attr_key(variable.name),
                    Some(serde_json::json!([PROJECTION_FIRST_YEAR, last_year_in_block])),
                )
                .map_err(store_err)?;

            next_year = last_year_in_block + 1;
            // `buffer` (the block's only large allocation) drops here, before
            // the next block or variable starts — never accumulated.
        }

        info!(variable = variable.name, "projection variable fully ingested");
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
    fn historical_kind_switches_at_last_historical_year() {
        let hist = projection_url("tas", PROJECTION_LAST_HISTORICAL_YEAR);
        let ssp = projection_url("tas", PROJECTION_LAST_HISTORICAL_YEAR + 1);
        assert!(hist.contains("/historical/"));
        assert!(ssp.contains("/ssp245/"));
    }

    #[test]
    fn years_attr_key_is_per_variable() {
        assert_eq!(years_attr_key("tas"), "tas_years");
        assert_ne!(years_attr_key("tas"), years_attr_key("pr"));
    }
}
