//! Persistence seam for the core components.
//!
//! Every component is generic over a [`StorageProvider`]. The daemon
//! implements it over SQLite; [`MemoryStorageProvider`] backs tests.

mod memory;
mod provider;

pub use memory::{MemoryStorageProvider, MemoryStorageProviderError};
pub use provider::{CredentialReplacement, FileInsert, StorageProvider};
