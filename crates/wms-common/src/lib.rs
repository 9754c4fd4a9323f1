//! Common types shared across the climate archive: fixed grid geometry and
//! the unified error type.

pub mod climate_grid;
pub mod error;

pub use climate_grid::{FixedGrid, GridId, FLX, PGB, PROJECTION, REANALYSIS};
pub use error::{ClimateError, ClimateResult};
