//! Read-only query engine over the archive: ANALYSIS/FORECAST point
//! time-series (split at the reanalysis/forecast boundary) and PROJECTION
//! point time-series. No writes; safe to run concurrently with an ingester
//! given the store's slab-atomicity guarantee.

use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use serde_json::Value;
use zarrs::storage::ReadableWritableStorageTraits;

use grid_processor::ChunkedStore;
use wms_common::{ClimateError, ClimateResult, FLX, PGB, PROJECTION, REANALYSIS};

use crate::analysis::{reanalysis_first_date, REANALYSIS_LAST_DATE_OFFSET_DAYS};
use crate::projection_ingest::{PROJECTION_FIRST_YEAR, PROJECTION_LAST_YEAR};
use crate::variables::{cfs2_band, cmip6_variable, Cfs2Family};

const ANALYSIS_FORECAST_GROUP: &str = "/analysis_forecast";
const REANALYSIS_GROUP: &str = "/analysis_forecast/reanalysis";
const FORECAST_GROUP: &str = "/analysis_forecast/forecast";
const PROJECTION_GROUP: &str = "/projection";

/// A `(variables, days)` matrix with a parallel date axis.
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub dates: Vec<NaiveDate>,
    pub variables: Vec<String>,
    /// `values[v][d]`, NaN where data is absent or out of stored range.
    pub values: Vec<Vec<f32>>,
}

#[derive(Clone, Copy)]
enum Source {
    Reanalysis,
    Forecast,
}

/// Query CFS2 ANALYSIS/FORECAST data for a single point across `[begin, end]`.
pub fn query_analysis_forecast<S>(
    store: &ChunkedStore<S>,
    begin: NaiveDate,
    end: NaiveDate,
    lat: f64,
    lon: f64,
    variables: &[&str],
) -> ClimateResult<QueryResult>
where
    S: ReadableWritableStorageTraits + 'static,
{
    if begin > end {
        return Err(ClimateError::InvalidDateRange);
    }

    let af_attrs = store.group_attrs(ANALYSIS_FORECAST_GROUP).map_err(store_err)?;
    let updated = af_attrs
        .get("updated")
        .and_then(Value::as_str)
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .ok_or(ClimateError::ArchiveNotReady)?;

    let today = Utc::now().date_naive();
    let first_forecast_day = updated - ChronoDuration::days(REANALYSIS_LAST_DATE_OFFSET_DAYS);

    let mut dates = Vec::new();
    let mut values: Vec<Vec<f32>> = variables.iter().map(|_| Vec::new()).collect();

    if begin >= today {
        run_sub_query(
            store,
            Source::Forecast,
            first_forecast_day,
            begin,
            end,
            lat,
            lon,
            variables,
            &mut dates,
            &mut values,
        )?;
    } else if end <= today {
        run_sub_query(
            store,
            Source::Reanalysis,
            reanalysis_first_date(),
            begin,
            end,
            lat,
            lon,
            variables,
            &mut dates,
            &mut values,
        )?;
    } else {
        let mid = today.min(end);
        run_sub_query(
            store,
            Source::Reanalysis,
            reanalysis_first_date(),
            begin,
            mid,
            lat,
            lon,
            variables,
            &mut dates,
            &mut values,
        )?;
        let forecast_begin = mid + ChronoDuration::days(1);
        if forecast_begin <= end {
            run_sub_query(
                store,
                Source::Forecast,
                first_forecast_day,
                forecast_begin,
                end,
                lat,
                lon,
                variables,
                &mut dates,
                &mut values,
            )?;
        }
    }

    Ok(QueryResult {
        dates,
        variables: variables.iter().map(|s| s.to_string()).collect(),
        values,
    })
}

#[allow(clippy::too_many_arguments)]
fn run_sub_query<S>(
    store: &ChunkedStore<S>,
    source: Source,
    anchor: NaiveDate,
    sub_begin: NaiveDate,
    sub_end: NaiveDate,
    lat: f64,
    lon: f64,
    variables: &[&str],
    dates: &mut Vec<NaiveDate>,
    values: &mut [Vec<f32>],
) -> ClimateResult<()>
where
    S: ReadableWritableStorageTraits + 'static,
{
    if sub_begin > sub_end {
        return Ok(());
    }

    let count = (sub_end - sub_begin).num_days() as usize + 1;
    let begin_idx = (sub_begin - anchor).num_days();
    let group = match source {
        Source::Reanalysis => REANALYSIS_GROUP,
        Source::Forecast => FORECAST_GROUP,
    };

    for (col, name) in values.iter_mut().zip(variables.iter()) {
        let band = cfs2_band(name)
            .ok_or_else(|| ClimateError::Store(format!("unknown cfs2 variable: {name}")))?;
        let grid = match source {
            Source::Reanalysis => &REANALYSIS,
            Source::Forecast => match band.family {
                Cfs2Family::Flx => &FLX,
                Cfs2Family::Pgb => &PGB,
            },
        };
        let (row, column) = grid.coord_to_index(lat, lon)?;
        let path = format!("{group}/{}", band.name);
        col.extend(read_days(store, &path, begin_idx, count, row, column)?);
    }

    let mut d = sub_begin;
    while d <= sub_end {
        dates.push(d);
        d += ChronoDuration::days(1);
    }

    Ok(())
}

/// Query CMIP6 PROJECTION data for a single point across `[begin, end]`.
pub fn query_projection<S>(
    store: &ChunkedStore<S>,
    begin: NaiveDate,
    end: NaiveDate,
    lat: f64,
    lon: f64,
    variables: &[&str],
) -> ClimateResult<QueryResult>
where
    S: ReadableWritableStorageTraits + 'static,
{
    if begin > end {
        return Err(ClimateError::InvalidDateRange);
    }

    let anchor = NaiveDate::from_ymd_opt(PROJECTION_FIRST_YEAR, 1, 1).expect("valid constant date");
    let last_valid =
        NaiveDate::from_ymd_opt(PROJECTION_LAST_YEAR, 12, 31).expect("valid constant date");

    if begin < anchor || end > last_valid {
        let out_of_range = if begin < anchor { begin } else { end };
        return Err(ClimateError::OutOfRangeDate {
            date: out_of_range.format("%Y-%m-%d").to_string(),
            first: anchor.format("%Y-%m-%d").to_string(),
            last: last_valid.format("%Y-%m-%d").to_string(),
        });
    }

    let (row, column) = PROJECTION.coord_to_index(lat, lon)?;
    let count = (end - begin).num_days() as usize + 1;
    let begin_idx = (begin - anchor).num_days();

    let mut values = Vec::with_capacity(variables.len());
    for name in variables {
        if cmip6_variable(name).is_none() {
            return Err(ClimateError::Store(format!("unknown cmip6 variable: {name}")));
        }
        let path = format!("{PROJECTION_GROUP}/{name}");
        values.push(read_days(store, &path, begin_idx, count, row, column)?);
    }

    let mut dates = Vec::with_capacity(count);
    let mut d = begin;
    while d <= end {
        dates.push(d);
        d += ChronoDuration::days(1);
    }

    Ok(QueryResult {
        dates,
        variables: variables.iter().map(|s| s.to_string()).collect(),
        values,
    })
}

/// Read `count` consecutive days from `begin_idx` in a `(days, H, W)` array
/// at the given point, NaN-filling whatever falls before index 0, beyond the
/// array's current length, or when the array does not exist at all.
fn read_days<S>(
    store: &ChunkedStore<S>,
    path: &str,
    begin_idx: i64,
    count: usize,
    row: usize,
    col: usize,
) -> ClimateResult<Vec<f32>>
where
    S: ReadableWritableStorageTraits + 'static,
{
    let mut out = vec![f32::NAN; count];
    let dim0 = store.dim0_len(path).unwrap_or(0);
    if begin_idx < 0 || dim0 == 0 {
        return Ok(out);
    }
    let begin_idx = begin_idx as u64;
    if begin_idx >= dim0 {
        return Ok(out);
    }

    let available = (dim0 - begin_idx).min(count as u64) as usize;
    let slab = store
        .read_slab(path, &[begin_idx, row as u64, col as u64], &[available as u64, 1, 1])
        .map_err(store_err)?;
    out[..available].copy_from_slice(&slab);
    Ok(out)
}

fn store_err(e: grid_processor::GridProcessorError) -> ClimateError {
    ClimateError::Store(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_date_range_is_rejected() {
        let err = ClimateError::InvalidDateRange;
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn out_of_range_projection_date_carries_bounds() {
        let begin = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap();
        let anchor = NaiveDate::from_ymd_opt(PROJECTION_FIRST_YEAR, 1, 1).unwrap();
        assert!(begin < anchor);
    }
}
