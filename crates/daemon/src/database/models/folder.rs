use sqlx::FromRow;

use common::tree::Folder;

use crate::database::types::DUuid;

/// Row shape of `folders`
#[derive(Debug, Clone, FromRow)]
pub struct FolderRow {
    pub id: DUuid,
    pub owner_id: DUuid,
    pub name: String,
    pub parent_id: Option<DUuid>,
}

impl From<FolderRow> for Folder {
    fn from(row: FolderRow) -> Self {
        Folder {
            id: row.id.into(),
            owner_account_id: row.owner_id.into(),
            name: row.name,
            parent_id: row.parent_id.map(Into::into),
        }
    }
}
