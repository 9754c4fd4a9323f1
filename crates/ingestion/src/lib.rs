//! Climate archive ingestion library.
//!
//! Fetches upstream CFS2 reanalysis/forecast GRIB2 and CMIP6 projection
//! NetCDF sources, decodes them, and writes them into the archive's chunked
//! store (`grid_processor::ChunkedStore`). Also provides the read-only point
//! query engine used by the archive's CLI and HTTP front-ends.

pub mod analysis;
pub mod fetch;
pub mod forecast;
pub mod projection_ingest;
pub mod query;
pub mod readers;
pub mod variables;

pub use analysis::ingest_reanalysis;
pub use fetch::{FetchOutcome, Fetcher};
pub use forecast::ingest_forecast;
pub use projection_ingest::ingest_projection;
pub use query::{query_analysis_forecast, query_projection, QueryResult};
pub use readers::{band_from_messages, parse_grib2_messages, read_grib2_band, read_netcdf_variable};
pub use variables::{
    cfs2_band, cfs2_variable_names, cmip6_variable, Cfs2Band, Cfs2Family, Cmip6Variable, Reducer,
    CMIP6_VARS, FLX_BANDS, PGB_BANDS,
};
