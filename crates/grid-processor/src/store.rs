//! Chunked multidimensional array store over Zarr v3.
//!
//! This is the archive's storage primitive: groups with string-keyed JSON
//! attributes, arrays with fixed dtype/shape/chunks/fill value, partial slab
//! reads and writes, and resize along dimension 0. It deliberately does not
//! know about chunk caching, bilinear interpolation, or multiscale pyramids —
//! those are tile-serving concerns that this archive's single-point query
//! engine does not need.

use std::sync::Arc;

use serde_json::{Map, Value};
use zarrs::array::{Array, ArrayBuilder, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs::group::{Group, GroupBuilder};
use zarrs::storage::ReadableWritableStorageTraits;

use crate::error::{GridProcessorError, Result};

/// One array's fixed shape description, supplied by the caller at
/// `require_array` time. The store does not infer this from data.
#[derive(Debug, Clone)]
pub struct ArraySpec {
    pub shape: Vec<u64>,
    pub chunk_shape: Vec<u64>,
}

/// A chunked array store rooted at a single storage backend.
///
/// `S` is the concrete backend: [`zarrs_filesystem::FilesystemStore`] for a
/// local directory root, or the object-store-backed equivalent for an
/// `s3://` root (feature-gated, see [`crate::config`]).
pub struct ChunkedStore<S: ReadableWritableStorageTraits + 'static> {
    storage: Arc<S>,
}

impl<S: ReadableWritableStorageTraits + 'static> Clone for ChunkedStore<S> {
    /// Cheap: clones the `Arc` handle to the shared backend, not the backend
    /// itself. Lets a reanalysis ingester hand a store handle to its
    /// background uploader thread.
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
        }
    }
}

impl<S: ReadableWritableStorageTraits + 'static> ChunkedStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage: Arc::new(storage),
        }
    }

    /// Build a store from an already-shared backend handle, e.g. the
    /// `Arc`-wrapped adapter [`crate::minio_storage::create_minio_storage`]
    /// returns.
    pub fn from_arc(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Open the group at `path`, creating it (with empty attributes) if
    /// absent. Mirrors `zarr.Group.require_group`.
    pub fn require_group(&self, path: &str) -> Result<()> {
        if Group::open(self.storage.clone(), path).is_ok() {
            return Ok(());
        }
        let group = GroupBuilder::new()
            .build(self.storage.clone(), path)
            .map_err(zarr_err)?;
        group.store_metadata().map_err(zarr_err)?;
        Ok(())
    }

    /// Read a group's full attribute document.
    pub fn group_attrs(&self, path: &str) -> Result<Map<String, Value>> {
        let group = Group::open(self.storage.clone(), path).map_err(zarr_err)?;
        Ok(group.attributes().clone())
    }

    /// Overwrite a group's full attribute document (attributes are a flat
    /// JSON object read/written wholesale, matching the Zarr v3 model).
    pub fn set_group_attrs(&self, path: &str, attrs: Map<String, Value>) -> Result<()> {
        let mut group = Group::open(self.storage.clone(), path).map_err(zarr_err)?;
        *group.attributes_mut() = attrs;
        group.store_metadata().map_err(zarr_err)?;
        Ok(())
    }

    /// Set (or clear, with `None`) a single attribute key without disturbing
    /// the rest of the document.
    pub fn set_group_attr(&self, path: &str, key: &str, value: Option<Value>) -> Result<()> {
        let mut attrs = self.group_attrs(path).unwrap_or_default();
        match value {
            Some(v) => {
                attrs.insert(key.to_string(), v);
            }
            None => {
                attrs.remove(key);
            }
        }
        self.set_group_attrs(path, attrs)
    }

    /// Open the array at `path`, creating it with the given fixed shape,
    /// chunk shape, NaN fill, and float32 dtype if absent. Mirrors
    /// `zarr.Group.require_dataset`.
    pub fn require_array(&self, path: &str, spec: &ArraySpec) -> Result<Array<S>> {
        match Array::open(self.storage.clone(), path) {
            Ok(array) => Ok(array),
            Err(_) => {
                let chunk_grid: zarrs::array::ChunkGrid = spec
                    .chunk_shape
                    .clone()
                    .try_into()
                    .map_err(|e| GridProcessorError::ConfigError(format!("{e:?}")))?;

                let mut binding = ArrayBuilder::new(
                    spec.shape.clone(),
                    DataType::Float32,
                    chunk_grid,
                    FillValue::from(f32::NAN),
                );
                let array = binding
                    .build(self.storage.clone(), path)
                    .map_err(zarr_err)?;
                array.store_metadata().map_err(zarr_err)?;
                Ok(array)
            }
        }
    }

    /// Current length of an existing array's dimension 0.
    pub fn dim0_len(&self, path: &str) -> Result<u64> {
        let array = Array::open(self.storage.clone(), path).map_err(zarr_err)?;
        Ok(array.shape().first().copied().unwrap_or(0))
    }

    /// Grow an existing array's declared shape (dimension 0 only, per the
    /// archive's append-only reanalysis/projection layout). Already-written
    /// chunks are untouched; this only updates the array's `zarr.json`.
    pub fn resize_dim0(&self, path: &str, new_dim0: u64) -> Result<()> {
        let mut array = Array::open(self.storage.clone(), path).map_err(zarr_err)?;
        let mut shape = array.shape().to_vec();
        shape[0] = new_dim0;
        array.set_shape(shape);
        array.store_metadata().map_err(zarr_err)?;
        Ok(())
    }

    /// Read a contiguous slab `[start, start+shape)` from an array as a flat
    /// row-major `f32` buffer.
    pub fn read_slab(&self, path: &str, start: &[u64], shape: &[u64]) -> Result<Vec<f32>> {
        let array = Array::open(self.storage.clone(), path).map_err(zarr_err)?;
        let subset = ArraySubset::new_with_start_shape(start.to_vec(), shape.to_vec())
            .map_err(zarr_err)?;
        array
            .retrieve_array_subset_elements::<f32>(&subset)
            .map_err(zarr_err)
    }

    /// Read a single scalar element (used by the query engine's point
    /// lookups: one `(day, row, col)` triple at a time).
    pub fn read_point(&self, path: &str, index: &[u64]) -> Result<f32> {
        let ones = vec![1u64; index.len()];
        let values = self.read_slab(path, index, &ones)?;
        Ok(values.first().copied().unwrap_or(f32::NAN))
    }

    /// Write a contiguous slab starting at `start`. `data` must be row-major
    /// and exactly match the slab's element count. Atomic at slab granularity
    /// with respect to the underlying store per spec §4.B.
    pub fn write_slab(&self, path: &str, start: &[u64], shape: &[u64], data: &[f32]) -> Result<()> {
        let array = Array::open(self.storage.clone(), path).map_err(zarr_err)?;
        let subset = ArraySubset::new_with_start_shape(start.to_vec(), shape.to_vec())
            .map_err(zarr_err)?;
        array
            .store_array_subset_elements(&subset, data)
            .map_err(zarr_err)
    }

    /// List the names of a group's immediate child arrays/groups.
    pub fn list_children(&self, path: &str) -> Result<Vec<String>> {
        let group = Group::open(self.storage.clone(), path).map_err(zarr_err)?;
        group
            .child_paths()
            .map_err(zarr_err)
            .map(|paths| paths.into_iter().map(|p| p.to_string()).collect())
    }

    /// Remove an entire subtree (used to clear `_tmp` once a reanalysis
    /// window has been promoted into the live array).
    pub fn clear(&self, path: &str) -> Result<()> {
        let prefix = zarrs::storage::StorePrefix::new(path).map_err(zarr_err)?;
        self.storage.erase_prefix(&prefix).map_err(zarr_err)
    }
}

fn zarr_err(e: impl std::fmt::Display) -> GridProcessorError {
    GridProcessorError::StorageError(e.to_string())
}
