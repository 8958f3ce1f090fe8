//! Shared setup for scenario tests
#![allow(dead_code)]

use std::time::Duration;

use ::common::crypto::{SigningKey, TokenService};
use ::common::stash::Stash;
use ::common::store::MemoryStorageProvider;
use object_store::BlobStore;

pub type TestStash = Stash<MemoryStorageProvider, BlobStore>;

pub const TOKEN_LIFETIME: Duration = Duration::from_secs(100 * 60 * 60);

/// A stash over in-memory storage with a freshly bootstrapped administrator
/// still holding the factory credential, plus a handle onto its blob store.
pub async fn setup_stash_with_blobs() -> (TestStash, BlobStore) {
    let tokens = TokenService::new(SigningKey::generate().unwrap(), TOKEN_LIFETIME);
    let blobs = BlobStore::in_memory();
    let stash = Stash::new(MemoryStorageProvider::new(), blobs.clone(), tokens);
    stash.bootstrap(true).await.unwrap();
    (stash, blobs)
}

pub async fn setup_stash() -> TestStash {
    setup_stash_with_blobs().await.0
}

/// Same as [`setup_stash`] with the administrator credential already
/// customized to `root` / `S3cret!`.
pub async fn setup_customized_stash() -> TestStash {
    setup_customized_stash_with_blobs().await.0
}

pub async fn setup_customized_stash_with_blobs() -> (TestStash, BlobStore) {
    let (stash, blobs) = setup_stash_with_blobs().await;
    stash
        .set_initial_admin_credential("root", "S3cret!")
        .await
        .unwrap();
    (stash, blobs)
}
