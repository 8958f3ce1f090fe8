use sqlx::FromRow;

use common::catalog::{FileRecord, ResolvedFile};

use crate::database::types::DUuid;

/// Row shape of `files`
#[derive(Debug, Clone, FromRow)]
pub struct FileRow {
    pub id: i64,
    pub folder_id: DUuid,
    pub display_name: String,
    pub content_key: String,
}

impl From<FileRow> for FileRecord {
    fn from(row: FileRow) -> Self {
        FileRecord {
            id: row.id,
            folder_id: row.folder_id.into(),
            display_name: row.display_name,
            content_key: row.content_key,
        }
    }
}

/// A file joined with the account owning its folder
#[derive(Debug, Clone, FromRow)]
pub struct ResolvedFileRow {
    #[sqlx(flatten)]
    pub file: FileRow,
    pub owner_id: DUuid,
    pub owner_login_name: String,
}

impl From<ResolvedFileRow> for ResolvedFile {
    fn from(row: ResolvedFileRow) -> Self {
        ResolvedFile {
            record: row.file.into(),
            owner_account_id: row.owner_id.into(),
            owner_login_name: row.owner_login_name,
        }
    }
}
