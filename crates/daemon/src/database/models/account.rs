use sqlx::FromRow;

use common::account::Account;

use crate::database::types::{DBool, DRole, DUuid};

/// Row shape of `accounts`
#[derive(Debug, Clone, FromRow)]
pub struct AccountRow {
    pub id: DUuid,
    pub login_name: String,
    pub credential_hash: String,
    pub role: DRole,
    pub uses_default_credential: DBool,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            id: row.id.into(),
            login_name: row.login_name,
            credential_hash: row.credential_hash,
            role: row.role.into(),
            uses_default_credential: row.uses_default_credential.into(),
        }
    }
}
