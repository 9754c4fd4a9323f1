//! Fixed grid geometry for the climate archive.
//!
//! Four grids back the archive: the 0.5° reanalysis/forecast-PGB-resolution grid,
//! the CFS2 FLX forecast grid, the CFS2 PGB forecast grid, and the 0.25° CMIP6
//! projection grid. Each is a plain affine lat/lon grid; none requires reprojection.

use crate::error::{ClimateError, ClimateResult};

/// Identifies which of the four fixed grids a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridId {
    Reanalysis,
    Flx,
    Pgb,
    Projection,
}

impl GridId {
    pub fn name(&self) -> &'static str {
        match self {
            GridId::Reanalysis => "REANALYSIS",
            GridId::Flx => "FLX",
            GridId::Pgb => "PGB",
            GridId::Projection => "PROJECTION",
        }
    }
}

/// A fixed, affine lat/lon grid: resolution, bounding box, and longitude convention.
#[derive(Debug, Clone, Copy)]
pub struct FixedGrid {
    pub id: GridId,
    /// Degrees per row (latitude axis).
    pub res_y: f64,
    /// Degrees per column (longitude axis).
    pub res_x: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
    /// True when longitudes on this grid run [0, 360) rather than [-180, 180).
    pub lon360: bool,
}

impl FixedGrid {
    /// Grid dimensions as `(height, width)`.
    pub fn size(&self) -> (usize, usize) {
        let height = ((self.top - self.bottom) / self.res_y).ceil() as usize;
        let width = ((self.right - self.left) / self.res_x).ceil() as usize;
        (height, width)
    }

    /// Normalize a longitude to this grid's convention: on a [0, 360) grid,
    /// negative input longitudes are offset by +360 before any bounds check.
    pub fn normalize_lon(&self, lon: f64) -> f64 {
        if self.lon360 && lon < 0.0 {
            lon + 360.0
        } else {
            lon
        }
    }

    /// Translate a geographic coordinate into `(row, col)` indices.
    ///
    /// Fails with [`ClimateError::OutOfBoundsCoords`] when the point, after
    /// longitude normalization, lies outside this grid's bounding box.
    pub fn coord_to_index(&self, lat: f64, lon: f64) -> ClimateResult<(usize, usize)> {
        let lon = self.normalize_lon(lon);
        if lon < self.left || lon > self.right || lat < self.bottom || lat > self.top {
            return Err(ClimateError::OutOfBoundsCoords {
                lat,
                lon,
                grid: self.id.name().to_string(),
            });
        }

        let row = ((self.top - lat) / self.res_y).round() as i64;
        let col = ((lon - self.left) / self.res_x).round() as i64;
        Ok((row.max(0) as usize, col.max(0) as usize))
    }
}

pub const REANALYSIS: FixedGrid = FixedGrid {
    id: GridId::Reanalysis,
    res_y: 0.5,
    res_x: 0.5,
    left: -180.25,
    bottom: -90.25,
    right: 179.75,
    top: 90.25,
    lon360: false,
};

pub const FLX: FixedGrid = FixedGrid {
    id: GridId::Flx,
    res_y: 0.9473684210526315,
    res_x: 0.9374986945169713,
    left: -0.46874934725848566,
    bottom: -90.24931578947368,
    right: 359.5307493472585,
    top: 89.75068421052632,
    lon360: true,
};

pub const PGB: FixedGrid = FixedGrid {
    id: GridId::Pgb,
    res_y: 1.0,
    res_x: 1.0,
    left: -180.5,
    bottom: -90.5,
    right: 179.5,
    top: 90.5,
    lon360: false,
};

pub const PROJECTION: FixedGrid = FixedGrid {
    id: GridId::Projection,
    res_y: 0.25,
    res_x: 0.25,
    left: 0.125,
    bottom: -59.875,
    right: 359.875,
    top: 89.875,
    lon360: true,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_coord_to_index_edge() {
        assert_eq!(PROJECTION.coord_to_index(89.875, 0.125).unwrap(), (0, 0));
    }

    #[test]
    fn projection_coord_to_index_interior() {
        // S1 from the testable-properties scenarios: lat=10, lon=-10 -> +360 = 350
        let (row, col) = PROJECTION.coord_to_index(10.0, -10.0).unwrap();
        assert_eq!(row, 320);
        assert_eq!(col, 1400);
    }

    #[test]
    fn lon360_negative_equals_offset_positive() {
        let a = FLX.coord_to_index(10.0, -10.0).unwrap();
        let b = FLX.coord_to_index(10.0, 350.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn out_of_bounds_is_rejected() {
        let err = REANALYSIS.coord_to_index(91.0, 0.0).unwrap_err();
        assert!(matches!(err, ClimateError::OutOfBoundsCoords { .. }));
    }

    #[test]
    fn reanalysis_size_matches_known_grid() {
        let (h, w) = REANALYSIS.size();
        assert_eq!(h, 361);
        assert_eq!(w, 720);
    }
}
