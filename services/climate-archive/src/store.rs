//! Root store URI dispatch (§6.1): `s3://bucket[/prefix]` → object storage,
//! any other string → local filesystem path.
//!
//! The archive's ingesters and query engine are generic over
//! `S: ReadableWritableStorageTraits`; this enum picks the concrete backend
//! once per process invocation and the driver matches on it to call into
//! the generic functions with the right type parameter instantiated.

use std::sync::Arc;

use grid_processor::{create_minio_storage, ChunkedStore, MinioConfig, MinioStorage};
use wms_common::{ClimateError, ClimateResult};
use zarrs_filesystem::FilesystemStore;

/// The two store backends the archive supports.
pub enum RootStore {
    Fs(ChunkedStore<FilesystemStore>),
    S3(ChunkedStore<MinioStorage>),
}

/// Open `uri` as a store root. S3 credentials come entirely from the
/// standard AWS environment variable convention, never read directly by
/// this crate beyond the bucket name embedded in the URI itself.
///
/// Only `s3://bucket` (no sub-path) is supported; a `/prefix` suffix is
/// accepted but ignored, since the underlying storage adapter this
/// workspace already carries (`grid_processor::minio_storage`) addresses a
/// whole bucket per backend instance.
pub fn open_root_store(uri: &str) -> ClimateResult<RootStore> {
    if let Some(rest) = uri.strip_prefix("s3://") {
        let bucket = rest.split('/').next().unwrap_or(rest).to_string();
        let config = MinioConfig {
            endpoint: std::env::var("AWS_ENDPOINT_URL_S3").unwrap_or_default(),
            bucket,
            access_key_id: std::env::var("AWS_ACCESS_KEY_ID").unwrap_or_default(),
            secret_access_key: std::env::var("AWS_SECRET_ACCESS_KEY").unwrap_or_default(),
            region: std::env::var("AWS_REGION")
                .or_else(|_| std::env::var("AWS_DEFAULT_REGION"))
                .unwrap_or_else(|_| "us-east-1".to_string()),
            allow_http: config_allow_http(),
        };
        let storage: Arc<MinioStorage> = create_minio_storage(&config)
            .map_err(|e| ClimateError::Store(format!("failed to open S3 store: {e}")))?;
        Ok(RootStore::S3(ChunkedStore::from_arc(storage)))
    } else {
        let fs = FilesystemStore::new(uri)
            .map_err(|e| ClimateError::Store(format!("failed to open filesystem store at {uri}: {e}")))?;
        Ok(RootStore::Fs(ChunkedStore::new(fs)))
    }
}

fn config_allow_http() -> bool {
    std::env::var("AWS_ALLOW_HTTP")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}
