//! Readers that turn a downloaded GRIB2 or NetCDF file into a flat `(H, W)`
//! or `(T, H, W)` `f32` grid, validated against the archive's fixed grid
//! constants.
//!
//! GRIB2 bands are addressed by their 1-indexed ordinal position in the
//! file, matching the band numbers recorded in
//! [`crate::variables::Cfs2Band`] (themselves copied from the upstream
//! `pygrib` band-index convention).

use wms_common::{ClimateError, ClimateResult, FixedGrid};

use grib2_parser::sections::GridDefinition;
use grib2_parser::{Grib2Message, Grib2Reader};

/// Max allowed drift between a file's declared origin/resolution and the
/// archive's fixed grid constants, in GRIB2 millidegrees (0.05 deg).
const MILLIDEGREE_TOLERANCE: i64 = 50;

fn validate_grib2_georeferencing(
    grid_def: &GridDefinition,
    grid: &FixedGrid,
    band: u32,
) -> ClimateResult<()> {
    let expected_lat_inc = (grid.res_y * 1000.0).round() as i64;
    let expected_lon_inc = (grid.res_x * 1000.0).round() as i64;
    let expected_origin_lat = (grid.top * 1000.0).round() as i64;
    let expected_origin_lon = (grid.left * 1000.0).round() as i64;

    let lat_inc_diff = (grid_def.latitude_increment_millidegrees as i64 - expected_lat_inc).abs();
    let lon_inc_diff = (grid_def.longitude_increment_millidegrees as i64 - expected_lon_inc).abs();
    let origin_lat_diff = (grid_def.first_latitude_millidegrees as i64 - expected_origin_lat).abs();
    let origin_lon_diff = (grid_def.first_longitude_millidegrees as i64 - expected_origin_lon).abs();

    if lat_inc_diff > MILLIDEGREE_TOLERANCE
        || lon_inc_diff > MILLIDEGREE_TOLERANCE
        || origin_lat_diff > MILLIDEGREE_TOLERANCE
        || origin_lon_diff > MILLIDEGREE_TOLERANCE
    {
        return Err(ClimateError::GridMismatch {
            path: format!("band {band}"),
            reason: format!(
                "origin/resolution ({}, {} mdeg, {} mdeg/{} mdeg) does not match {} ({}, {} mdeg, {} mdeg/{} mdeg)",
                grid_def.first_latitude_millidegrees,
                grid_def.first_longitude_millidegrees,
                grid_def.latitude_increment_millidegrees,
                grid_def.longitude_increment_millidegrees,
                grid.id.name(),
                expected_origin_lat,
                expected_origin_lon,
                expected_lat_inc,
                expected_lon_inc,
            ),
        });
    }

    Ok(())
}

/// Parse every message out of a GRIB2 file, in file order. The ingesters pull
/// on the order of a few dozen variables out of one downloaded file, so they
/// decode the message table once and index into it by band rather than
/// re-scanning the file per variable.
pub fn parse_grib2_messages(data: &[u8]) -> ClimateResult<Vec<Grib2Message>> {
    let mut reader = Grib2Reader::new(bytes::Bytes::copy_from_slice(data));
    let mut messages = Vec::new();

    while let Some(message) = reader
        .next_message()
        .map_err(|e| ClimateError::Grib2(e.to_string()))?
    {
        messages.push(message);
    }

    Ok(messages)
}

/// Unpack one 1-indexed band out of an already-parsed message table,
/// validating its dimensions against `grid`.
pub fn band_from_messages(
    messages: &[Grib2Message],
    band: u32,
    grid: &FixedGrid,
) -> ClimateResult<Vec<f32>> {
    let message = messages.get((band - 1) as usize).ok_or_else(|| {
        ClimateError::Grib2(format!(
            "band {band} not found: file has {} messages",
            messages.len()
        ))
    })?;

    let (expected_h, expected_w) = grid.size();
    let (h, w) = message.grid_dims();
    if h as usize != expected_h || w as usize != expected_w {
        return Err(ClimateError::GridMismatch {
            path: format!("band {band}"),
            reason: format!(
                "grid is {h}x{w}, expected {expected_h}x{expected_w} for {}",
                grid.id.name()
            ),
        });
    }
    validate_grib2_georeferencing(&message.grid_definition, grid, band)?;

    message
        .unpack_data()
        .map_err(|e| ClimateError::Grib2(e.to_string()))
}

/// Read one band's grid from a GRIB2 file, validating its dimensions against
/// `grid`. Returns a row-major `(height * width)` buffer.
pub fn read_grib2_band(data: &[u8], band: u32, grid: &FixedGrid) -> ClimateResult<Vec<f32>> {
    let messages = parse_grib2_messages(data)?;
    band_from_messages(&messages, band, grid)
}

/// Read one CMIP6 NetCDF variable as a flat `(time * height * width)`
/// buffer, one calendar year's worth of daily values at a time.
///
/// The `netcdf` crate binds to libnetcdf/HDF5, which requires a filesystem
/// path, so downloaded bytes are staged to a temp file first.
pub fn read_netcdf_variable(data: &[u8], variable: &str, grid: &FixedGrid) -> ClimateResult<Vec<f32>> {
    use std::io::Write;

    let temp_path = std::env::temp_dir().join(format!(
        "cmip6_{}_{}.nc",
        variable,
        std::process::id()
    ));
    let mut file = std::fs::File::create(&temp_path)?;
    file.write_all(data)?;
    drop(file);

    let result = read_netcdf_variable_from_path(&temp_path, variable, grid);
    let _ = std::fs::remove_file(&temp_path);
    result
}

/// Max allowed drift between a NetCDF file's actual lat/lon coordinates and
/// the archive's fixed grid constants, in degrees.
const NETCDF_TOLERANCE_DEG: f64 = 0.01;

fn validate_netcdf_georeferencing(
    nc_file: &netcdf::File,
    grid: &FixedGrid,
    path: &std::path::Path,
) -> ClimateResult<()> {
    let lat = nc_file
        .variable("lat")
        .ok_or_else(|| ClimateError::NetCdf("missing lat variable".to_string()))?;
    let lon = nc_file
        .variable("lon")
        .ok_or_else(|| ClimateError::NetCdf("missing lon variable".to_string()))?;

    let lat_values: Vec<f64> = lat.get_values(..).map_err(|e| ClimateError::NetCdf(e.to_string()))?;
    let lon_values: Vec<f64> = lon.get_values(..).map_err(|e| ClimateError::NetCdf(e.to_string()))?;

    let (first_lat, last_lat) = match (lat_values.first(), lat_values.last()) {
        (Some(&a), Some(&b)) if lat_values.len() > 1 => (a, b),
        _ => return Err(ClimateError::NetCdf("lat coordinate has fewer than 2 points".to_string())),
    };
    let (first_lon, last_lon) = match (lon_values.first(), lon_values.last()) {
        (Some(&a), Some(&b)) if lon_values.len() > 1 => (a, b),
        _ => return Err(ClimateError::NetCdf("lon coordinate has fewer than 2 points".to_string())),
    };

    let lat_res = (last_lat - first_lat).abs() / (lat_values.len() as f64 - 1.0);
    let lon_res = (last_lon - first_lon).abs() / (lon_values.len() as f64 - 1.0);
    let origin_lat = first_lat.max(last_lat);
    let origin_lon = first_lon.min(last_lon);

    if (lat_res - grid.res_y).abs() > NETCDF_TOLERANCE_DEG
        || (lon_res - grid.res_x).abs() > NETCDF_TOLERANCE_DEG
        || (origin_lat - grid.top).abs() > NETCDF_TOLERANCE_DEG
        || (origin_lon - grid.left).abs() > NETCDF_TOLERANCE_DEG
    {
        return Err(ClimateError::GridMismatch {
            path: path.display().to_string(),
            reason: format!(
                "origin/resolution ({origin_lat}, {origin_lon}, {lat_res} deg/{lon_res} deg) does not match {} ({}, {}, {} deg/{} deg)",
                grid.id.name(),
                grid.top,
                grid.left,
                grid.res_y,
                grid.res_x,
            ),
        });
    }

    Ok(())
}

fn read_netcdf_variable_from_path(
    path: &std::path::Path,
    variable: &str,
    grid: &FixedGrid,
) -> ClimateResult<Vec<f32>> {
    let nc_file = netcdf::open(path).map_err(|e| ClimateError::NetCdf(e.to_string()))?;
    let (expected_h, expected_w) = grid.size();

    let lat_len = nc_file
        .dimension("lat")
        .ok_or_else(|| ClimateError::NetCdf("missing lat dimension".to_string()))?
        .len();
    let lon_len = nc_file
        .dimension("lon")
        .ok_or_else(|| ClimateError::NetCdf("missing lon dimension".to_string()))?
        .len();

    if lat_len != expected_h || lon_len != expected_w {
        return Err(ClimateError::GridMismatch {
            path: path.display().to_string(),
            reason: format!(
                "grid is {lat_len}x{lon_len}, expected {expected_h}x{expected_w} for {}",
                grid.id.name()
            ),
        });
    }
    validate_netcdf_georeferencing(&nc_file, grid, path)?;

    let var = nc_file
        .variable(variable)
        .ok_or_else(|| ClimateError::NetCdf(format!("variable {variable} not found")))?;

    let values: Vec<f32> = var
        .get_values(..)
        .map_err(|e| ClimateError::NetCdf(e.to_string()))?;

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wms_common::PROJECTION;

    #[test]
    fn read_grib2_band_rejects_truncated_file() {
        let grid = wms_common::FLX;
        let err = read_grib2_band(&[], 1, &grid).unwrap_err();
        assert!(matches!(err, ClimateError::Grib2(_)));
    }

    #[test]
    fn read_netcdf_variable_rejects_garbage_bytes() {
        let grid = PROJECTION;
        let err = read_netcdf_variable(b"not a netcdf file", "tas", &grid).unwrap_err();
        assert!(matches!(err, ClimateError::NetCdf(_)));
    }
}
