mod account;
mod file;
mod folder;

pub use account::AccountRow;
pub use file::{FileRow, ResolvedFileRow};
pub use folder::FolderRow;
