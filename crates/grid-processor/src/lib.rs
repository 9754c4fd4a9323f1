//! Chunked array storage layer for the climate archive.
//!
//! [`ChunkedStore`] wraps a Zarr v3 storage backend — a local filesystem
//! directory or an S3-compatible bucket via [`minio_storage`] — with the
//! group/array operations the archive's ingesters and query engine need:
//! group attribute get/set, array creation with a fixed shape, dimension-0
//! resize, and partial slab reads/writes. It deliberately carries no chunk
//! cache, pyramid, or reprojection logic — this archive's point query never
//! needs the resampling a tile-serving layer would.

pub mod error;
pub mod minio_storage;
pub mod store;

pub use error::{GridProcessorError, Result};
pub use minio_storage::{create_minio_storage, MinioConfig, MinioStorage};
pub use store::{ArraySpec, ChunkedStore};

pub use zarrs::storage::ReadableWritableStorageTraits;
