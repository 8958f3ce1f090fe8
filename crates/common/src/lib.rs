/**
 * Accounts, roles and the administrator
 *  bootstrap constants.
 */
pub mod account;
/**
 * Byte storage seam, implemented by the
 *  object store crate.
 */
pub mod blobs;
/**
 * Content key to display name mapping,
 *  scoped to the owning account.
 */
pub mod catalog;
/**
 * Credential checks and the one-time
 *  administrator credential transition.
 */
pub mod credentials;
/**
 * Password hashing and signed capability
 *  tokens.
 */
pub mod crypto;
pub mod error;
/**
 * Binds a claimed identity to a capability
 *  token and an existing account.
 */
pub mod gate;
/**
 * The composed operation surface.
 */
pub mod stash;
/**
 * Persistence seam and its in-memory
 *  implementation.
 */
pub mod store;
/**
 * Per-account folder hierarchy with a
 *  single root.
 */
pub mod tree;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::account::{Account, Role};
    pub use crate::blobs::BlobStorage;
    pub use crate::catalog::{FileRecord, NewFileRecord, ResolvedFile};
    pub use crate::crypto::{SigningKey, TokenService};
    pub use crate::error::StashError;
    pub use crate::stash::{AdminLogin, Stash, UserLogin};
    pub use crate::store::{CredentialReplacement, FileInsert, StorageProvider};
    pub use crate::tree::{Folder, FolderListing};
    pub use crate::version::build_info;
}
