use async_trait::async_trait;
use uuid::Uuid;

use common::account::{Account, Role};
use common::catalog::{FileRecord, NewFileRecord, ResolvedFile};
use common::store::{CredentialReplacement, FileInsert, StorageProvider};
use common::tree::Folder;

use super::models::{AccountRow, FileRow, FolderRow, ResolvedFileRow};
use super::types::{DBool, DRole, DUuid};
use super::Database;

const ACCOUNT_COLUMNS: &str = "id, login_name, credential_hash, role, uses_default_credential";
const FOLDER_COLUMNS: &str = "id, owner_id, name, parent_id";

#[async_trait]
impl StorageProvider for Database {
    type Error = sqlx::Error;

    async fn ensure_administrator(&self, account: &Account) -> Result<bool, Self::Error> {
        // the partial unique index on role turns a second administrator into a conflict
        let result = sqlx::query(
            r#"
            INSERT INTO accounts (id, login_name, credential_hash, role, uses_default_credential)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(DUuid::from(account.id))
        .bind(&account.login_name)
        .bind(&account.credential_hash)
        .bind(DRole::from(Role::Administrator))
        .bind(DBool::from(account.uses_default_credential))
        .execute(&**self)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn account_by_login(
        &self,
        role: Role,
        login_name: &str,
    ) -> Result<Option<Account>, Self::Error> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {} FROM accounts WHERE role = ?1 AND login_name = ?2",
            ACCOUNT_COLUMNS
        ))
        .bind(DRole::from(role))
        .bind(login_name)
        .fetch_optional(&**self)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn account_by_id(&self, id: Uuid) -> Result<Option<Account>, Self::Error> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {} FROM accounts WHERE id = ?1",
            ACCOUNT_COLUMNS
        ))
        .bind(DUuid::from(id))
        .fetch_optional(&**self)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn replace_default_credential(
        &self,
        login_name: &str,
        credential_hash: &str,
    ) -> Result<CredentialReplacement, Self::Error> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET login_name = ?1, credential_hash = ?2, uses_default_credential = 0
            WHERE role = ?3 AND uses_default_credential = 1
            "#,
        )
        .bind(login_name)
        .bind(credential_hash)
        .bind(DRole::from(Role::Administrator))
        .execute(&**self)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(CredentialReplacement::Replaced);
        }

        let administrators: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts WHERE role = ?1")
            .bind(DRole::from(Role::Administrator))
            .fetch_one(&**self)
            .await?;

        Ok(match administrators {
            0 => CredentialReplacement::Missing,
            _ => CredentialReplacement::AlreadyCustomized,
        })
    }

    async fn insert_user(&self, account: &Account) -> Result<bool, Self::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO accounts (id, login_name, credential_hash, role, uses_default_credential)
            VALUES (?1, ?2, ?3, ?4, 0)
            ON CONFLICT (role, login_name) DO NOTHING
            "#,
        )
        .bind(DUuid::from(account.id))
        .bind(&account.login_name)
        .bind(&account.credential_hash)
        .bind(DRole::from(Role::User))
        .execute(&**self)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_user(&self, login_name: &str) -> Result<Option<Vec<String>>, Self::Error> {
        let mut tx = self.begin().await?;

        let account_id: Option<DUuid> =
            sqlx::query_scalar("SELECT id FROM accounts WHERE role = ?1 AND login_name = ?2")
                .bind(DRole::from(Role::User))
                .bind(login_name)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(account_id) = account_id else {
            return Ok(None);
        };

        let released: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT files.content_key
            FROM files
            JOIN folders ON folders.id = files.folder_id
            WHERE folders.owner_id = ?1
            "#,
        )
        .bind(account_id)
        .fetch_all(&mut *tx)
        .await?;

        // folders and files follow through ON DELETE CASCADE
        sqlx::query("DELETE FROM accounts WHERE id = ?1")
            .bind(account_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(released))
    }

    async fn list_users(&self) -> Result<Vec<String>, Self::Error> {
        sqlx::query_scalar("SELECT login_name FROM accounts WHERE role = ?1 ORDER BY login_name")
            .bind(DRole::from(Role::User))
            .fetch_all(&**self)
            .await
    }

    async fn ensure_root_folder(&self, candidate: &Folder) -> Result<Folder, Self::Error> {
        sqlx::query(
            r#"
            INSERT INTO folders (id, owner_id, name, parent_id)
            VALUES (?1, ?2, ?3, NULL)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(DUuid::from(candidate.id))
        .bind(DUuid::from(candidate.owner_account_id))
        .bind(&candidate.name)
        .execute(&**self)
        .await?;

        let root = sqlx::query_as::<_, FolderRow>(&format!(
            "SELECT {} FROM folders WHERE owner_id = ?1 AND parent_id IS NULL",
            FOLDER_COLUMNS
        ))
        .bind(DUuid::from(candidate.owner_account_id))
        .fetch_one(&**self)
        .await?;

        Ok(root.into())
    }

    async fn folder(&self, id: Uuid) -> Result<Option<Folder>, Self::Error> {
        let row = sqlx::query_as::<_, FolderRow>(&format!(
            "SELECT {} FROM folders WHERE id = ?1",
            FOLDER_COLUMNS
        ))
        .bind(DUuid::from(id))
        .fetch_optional(&**self)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn insert_folder(&self, folder: &Folder) -> Result<(), Self::Error> {
        sqlx::query("INSERT INTO folders (id, owner_id, name, parent_id) VALUES (?1, ?2, ?3, ?4)")
            .bind(DUuid::from(folder.id))
            .bind(DUuid::from(folder.owner_account_id))
            .bind(&folder.name)
            .bind(folder.parent_id.map(DUuid::from))
            .execute(&**self)
            .await?;
        Ok(())
    }

    async fn child_folders(&self, parent_id: Uuid) -> Result<Vec<Folder>, Self::Error> {
        let rows = sqlx::query_as::<_, FolderRow>(&format!(
            "SELECT {} FROM folders WHERE parent_id = ?1 ORDER BY name",
            FOLDER_COLUMNS
        ))
        .bind(DUuid::from(parent_id))
        .fetch_all(&**self)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert_file(
        &self,
        owner_account_id: Uuid,
        file: &NewFileRecord,
    ) -> Result<FileInsert, Self::Error> {
        // ownership check and insert in one statement
        let inserted = sqlx::query_as::<_, FileRow>(
            r#"
            INSERT INTO files (folder_id, display_name, content_key)
            SELECT ?1, ?2, ?3
            WHERE EXISTS (SELECT 1 FROM folders WHERE id = ?1 AND owner_id = ?4)
            ON CONFLICT (content_key) DO NOTHING
            RETURNING id, folder_id, display_name, content_key
            "#,
        )
        .bind(DUuid::from(file.folder_id))
        .bind(&file.display_name)
        .bind(&file.content_key)
        .bind(DUuid::from(owner_account_id))
        .fetch_optional(&**self)
        .await?;

        if let Some(row) = inserted {
            return Ok(FileInsert::Inserted(row.into()));
        }

        let taken: Option<i64> = sqlx::query_scalar("SELECT id FROM files WHERE content_key = ?1")
            .bind(&file.content_key)
            .fetch_optional(&**self)
            .await?;

        Ok(match taken {
            Some(_) => FileInsert::DuplicateContentKey,
            None => FileInsert::FolderNotOwned,
        })
    }

    async fn resolve_file(&self, content_key: &str) -> Result<Option<ResolvedFile>, Self::Error> {
        let row = sqlx::query_as::<_, ResolvedFileRow>(
            r#"
            SELECT
                files.id, files.folder_id, files.display_name, files.content_key,
                accounts.id AS owner_id, accounts.login_name AS owner_login_name
            FROM files
            JOIN folders ON folders.id = files.folder_id
            JOIN accounts ON accounts.id = folders.owner_id
            WHERE files.content_key = ?1
            "#,
        )
        .bind(content_key)
        .fetch_optional(&**self)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn files_in_folder(&self, folder_id: Uuid) -> Result<Vec<FileRecord>, Self::Error> {
        let rows = sqlx::query_as::<_, FileRow>(
            r#"
            SELECT id, folder_id, display_name, content_key
            FROM files
            WHERE folder_id = ?1
            ORDER BY id
            "#,
        )
        .bind(DUuid::from(folder_id))
        .fetch_all(&**self)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete_file(&self, content_key: &str) -> Result<Option<FileRecord>, Self::Error> {
        let row = sqlx::query_as::<_, FileRow>(
            r#"
            DELETE FROM files
            WHERE content_key = ?1
            RETURNING id, folder_id, display_name, content_key
            "#,
        )
        .bind(content_key)
        .fetch_optional(&**self)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn restore_file(&self, record: &FileRecord) -> Result<(), Self::Error> {
        sqlx::query(
            "INSERT INTO files (id, folder_id, display_name, content_key) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(record.id)
        .bind(DUuid::from(record.folder_id))
        .bind(&record.display_name)
        .bind(&record.content_key)
        .execute(&**self)
        .await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), Self::Error> {
        sqlx::query("SELECT 1").execute(&**self).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;

    async fn setup_test_db() -> Database {
        let db_url = Url::parse("sqlite::memory:").unwrap();
        Database::connect(&db_url).await.unwrap()
    }

    fn folder(owner: Uuid, name: &str, parent_id: Option<Uuid>) -> Folder {
        Folder {
            id: Uuid::new_v4(),
            owner_account_id: owner,
            name: name.to_string(),
            parent_id,
        }
    }

    async fn user_with_root(db: &Database, login_name: &str) -> (Account, Folder) {
        let account = Account::new(login_name, "hash".to_string(), Role::User);
        assert!(db.insert_user(&account).await.unwrap());
        let root = db
            .ensure_root_folder(&folder(account.id, "root", None))
            .await
            .unwrap();
        (account, root)
    }

    fn new_file(folder_id: Uuid, name: &str, key: &str) -> NewFileRecord {
        NewFileRecord {
            folder_id,
            display_name: name.to_string(),
            content_key: key.to_string(),
        }
    }

    #[tokio::test]
    async fn test_single_administrator() {
        let db = setup_test_db().await;
        let mut admin = Account::new("admin", "hash".to_string(), Role::Administrator);
        admin.uses_default_credential = true;

        assert!(db.ensure_administrator(&admin).await.unwrap());
        let second = Account::new("other", "hash".to_string(), Role::Administrator);
        assert!(!db.ensure_administrator(&second).await.unwrap());

        let stored = db
            .account_by_login(Role::Administrator, "admin")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, admin);
        assert!(db
            .account_by_login(Role::Administrator, "other")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_replace_default_credential_once() {
        let db = setup_test_db().await;
        assert_eq!(
            db.replace_default_credential("root", "new").await.unwrap(),
            CredentialReplacement::Missing
        );

        let mut admin = Account::new("admin", "old".to_string(), Role::Administrator);
        admin.uses_default_credential = true;
        db.ensure_administrator(&admin).await.unwrap();

        assert_eq!(
            db.replace_default_credential("root", "new").await.unwrap(),
            CredentialReplacement::Replaced
        );
        assert_eq!(
            db.replace_default_credential("again", "newer").await.unwrap(),
            CredentialReplacement::AlreadyCustomized
        );

        let stored = db.account_by_id(admin.id).await.unwrap().unwrap();
        assert_eq!(stored.login_name, "root");
        assert_eq!(stored.credential_hash, "new");
        assert!(!stored.uses_default_credential);
    }

    #[tokio::test]
    async fn test_user_and_administrator_namespaces_are_disjoint() {
        let db = setup_test_db().await;
        let admin = Account::new("alice", "h".to_string(), Role::Administrator);
        db.ensure_administrator(&admin).await.unwrap();

        let user = Account::new("alice", "h".to_string(), Role::User);
        assert!(db.insert_user(&user).await.unwrap());
        let duplicate = Account::new("alice", "h".to_string(), Role::User);
        assert!(!db.insert_user(&duplicate).await.unwrap());

        assert_eq!(db.list_users().await.unwrap(), vec!["alice".to_string()]);
        assert_eq!(
            db.account_by_login(Role::User, "alice")
                .await
                .unwrap()
                .unwrap()
                .id,
            user.id
        );
    }

    #[tokio::test]
    async fn test_root_folder_is_unique() {
        let db = setup_test_db().await;
        let (account, root) = user_with_root(&db, "alice").await;

        let again = db
            .ensure_root_folder(&folder(account.id, "root", None))
            .await
            .unwrap();
        assert_eq!(again, root);
        assert!(root.is_root());
    }

    #[tokio::test]
    async fn test_child_folders_sorted_by_name() {
        let db = setup_test_db().await;
        let (account, root) = user_with_root(&db, "alice").await;

        for name in ["b", "a", "c"] {
            db.insert_folder(&folder(account.id, name, Some(root.id)))
                .await
                .unwrap();
        }

        let names: Vec<String> = db
            .child_folders(root.id)
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_insert_file_checks_folder_owner() {
        let db = setup_test_db().await;
        let (alice, alice_root) = user_with_root(&db, "alice").await;
        let (_, bob_root) = user_with_root(&db, "bob").await;

        let inserted = db
            .insert_file(alice.id, &new_file(alice_root.id, "a.txt", "k1"))
            .await
            .unwrap();
        let FileInsert::Inserted(record) = inserted else {
            panic!("expected insert, got {:?}", inserted);
        };
        assert_eq!(record.content_key, "k1");

        assert_eq!(
            db.insert_file(alice.id, &new_file(bob_root.id, "b.txt", "k2"))
                .await
                .unwrap(),
            FileInsert::FolderNotOwned
        );
        assert_eq!(
            db.insert_file(alice.id, &new_file(Uuid::new_v4(), "c.txt", "k3"))
                .await
                .unwrap(),
            FileInsert::FolderNotOwned
        );
        assert_eq!(
            db.insert_file(alice.id, &new_file(alice_root.id, "d.txt", "k1"))
                .await
                .unwrap(),
            FileInsert::DuplicateContentKey
        );

        let resolved = db.resolve_file("k1").await.unwrap().unwrap();
        assert_eq!(resolved.record, record);
        assert_eq!(resolved.owner_account_id, alice.id);
        assert_eq!(resolved.owner_login_name, "alice");
        assert_eq!(db.files_in_folder(alice_root.id).await.unwrap(), vec![record]);
    }

    #[tokio::test]
    async fn test_delete_and_restore_file_keeps_id() {
        let db = setup_test_db().await;
        let (alice, root) = user_with_root(&db, "alice").await;
        let FileInsert::Inserted(record) = db
            .insert_file(alice.id, &new_file(root.id, "a.txt", "k1"))
            .await
            .unwrap()
        else {
            panic!("expected insert");
        };

        let removed = db.delete_file("k1").await.unwrap().unwrap();
        assert_eq!(removed, record);
        assert!(db.resolve_file("k1").await.unwrap().is_none());
        assert!(db.delete_file("k1").await.unwrap().is_none());

        db.restore_file(&removed).await.unwrap();
        assert_eq!(db.resolve_file("k1").await.unwrap().unwrap().record.id, record.id);
    }

    #[tokio::test]
    async fn test_delete_user_cascades() {
        let db = setup_test_db().await;
        let (alice, root) = user_with_root(&db, "alice").await;
        let child = folder(alice.id, "docs", Some(root.id));
        db.insert_folder(&child).await.unwrap();
        db.insert_file(alice.id, &new_file(root.id, "a.txt", "k1"))
            .await
            .unwrap();
        db.insert_file(alice.id, &new_file(child.id, "b.txt", "k2"))
            .await
            .unwrap();
        let (_, bob_root) = user_with_root(&db, "bob").await;

        let mut released = db.delete_user("alice").await.unwrap().unwrap();
        released.sort();
        assert_eq!(released, vec!["k1".to_string(), "k2".to_string()]);

        assert!(db.account_by_id(alice.id).await.unwrap().is_none());
        assert!(db.folder(root.id).await.unwrap().is_none());
        assert!(db.folder(child.id).await.unwrap().is_none());
        assert!(db.resolve_file("k2").await.unwrap().is_none());
        assert!(db.folder(bob_root.id).await.unwrap().is_some());

        assert!(db.delete_user("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ping() {
        let db = setup_test_db().await;
        db.ping().await.unwrap();
    }
}
