use common::account::Role;
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::sqlite::{SqliteArgumentValue, SqliteValueRef};
use sqlx::{Decode, Encode, Sqlite};

use super::sqlite_column_type;

/// Role as stored in `accounts.role`
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct DRole(Role);

sqlite_column_type!(DRole => String);

impl From<DRole> for Role {
    fn from(val: DRole) -> Self {
        val.0
    }
}

impl From<Role> for DRole {
    fn from(role: Role) -> Self {
        Self(role)
    }
}

impl Decode<'_, Sqlite> for DRole {
    fn decode(value: SqliteValueRef<'_>) -> Result<Self, BoxDynError> {
        let s = <String as Decode<Sqlite>>::decode(value)?;
        Ok(Self(s.parse::<Role>()?))
    }
}

impl Encode<'_, Sqlite> for DRole {
    fn encode_by_ref(
        &self,
        args: &mut Vec<SqliteArgumentValue<'_>>,
    ) -> Result<IsNull, BoxDynError> {
        args.push(SqliteArgumentValue::Text(self.0.as_str().into()));
        Ok(IsNull::No)
    }
}
