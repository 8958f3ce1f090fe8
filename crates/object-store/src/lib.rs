//! Content-keyed blob storage
//!
//! This crate stores the bytes behind catalogued files on pluggable object
//! storage (S3/MinIO/local filesystem/memory). It knows nothing about owners
//! or folders; callers address blobs by the opaque content key they generated.
//!
//! # Example
//!
//! ```rust,no_run
//! use bytes::Bytes;
//! use stash_object_store::{BlobStore, ObjectStoreConfig};
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), stash_object_store::BlobStoreError> {
//! let config = ObjectStoreConfig::Local { path: PathBuf::from("/tmp/blobs") };
//! let store = BlobStore::new(&config).await?;
//! store.put("9f1c2d34-key", Bytes::from("hello")).await?;
//! # Ok(())
//! # }
//! ```

mod blob_store;
mod error;
mod storage;

pub use blob_store::BlobStore;
pub use error::{BlobStoreError, Result};
pub use storage::ObjectStoreConfig;
