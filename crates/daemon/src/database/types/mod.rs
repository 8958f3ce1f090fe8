/// Declare `$wrapper` as stored in the same SQLite column type as `$inner`.
macro_rules! sqlite_column_type {
    ($wrapper:ty => $inner:ty) => {
        impl sqlx::Type<sqlx::Sqlite> for $wrapper {
            fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
                <$inner as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
            }

            fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
                <$inner as sqlx::Type<sqlx::Sqlite>>::type_info()
            }
        }
    };
}

pub(crate) use sqlite_column_type;

mod dbool;
mod drole;
mod duuid;

pub use dbool::DBool;
pub use drole::DRole;
pub use duuid::DUuid;
