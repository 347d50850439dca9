use super::traits::UserStore;
use crate::types::{AppError, NewUser, Result, Role, User, UserChanges};
use async_trait::async_trait;
use chrono::Utc;
use libsql::{params::IntoParams, Builder, Connection, Database, Row};
use std::path::Path;

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";

/// libsql-backed user store.
///
/// A single connection is kept open for the lifetime of the client; for
/// `:memory:` databases every new connection would see an empty database.
pub struct TursoClient {
    _db: Database,
    conn: Connection,
}

impl TursoClient {
    /// Opens an ephemeral in-memory database.
    pub async fn new_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open in-memory database: {}", e)))?;

        Self::from_database(db).await
    }

    /// Opens (or creates) a SQLite file.
    pub async fn new_local(path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::Database(format!("Failed to create {}: {}", parent.display(), e))
                })?;
            }
        }

        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open {}: {}", path, e)))?;

        Self::from_database(db).await
    }

    /// Connects to a remote Turso database.
    pub async fn new_remote(url: String, auth_token: String) -> Result<Self> {
        let db = Builder::new_remote(url, auth_token)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Turso: {}", e)))?;

        Self::from_database(db).await
    }

    async fn from_database(db: Database) -> Result<Self> {
        let conn = db
            .connect()
            .map_err(|e| AppError::Database(format!("Failed to get connection: {}", e)))?;

        let client = Self { _db: db, conn };
        client.initialize_schema().await?;

        Ok(client)
    }

    async fn initialize_schema(&self) -> Result<()> {
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    email TEXT UNIQUE NOT NULL,
                    password_hash TEXT NOT NULL CHECK (length(password_hash) > 0),
                    role TEXT NOT NULL DEFAULT 'USER' CHECK (role IN ('USER', 'ADMIN')),
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL
                )",
                (),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to create users table: {}", e)))?;

        Ok(())
    }

    async fn query_one(&self, sql: &str, params: impl IntoParams) -> Result<Option<User>> {
        let mut rows = self
            .conn
            .query(sql, params)
            .await
            .map_err(|e| write_error("query user", e))?;

        match rows
            .next()
            .await
            .map_err(|e| write_error("read user", e))?
        {
            Some(row) => Ok(Some(row_to_user(&row)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl UserStore for TursoClient {
    async fn create_user(&self, user: &NewUser) -> Result<User> {
        let now = Utc::now().timestamp();
        let sql = format!(
            "INSERT INTO users (name, email, password_hash, role, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             RETURNING {}",
            USER_COLUMNS
        );

        self.query_one(
            &sql,
            (
                user.name.clone(),
                user.email.clone(),
                user.password_hash.clone(),
                user.role.as_str(),
                now,
            ),
        )
        .await?
        .ok_or_else(|| AppError::Database("Insert returned no row".to_string()))
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
        self.query_one(&sql, [id]).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS);
        self.query_one(&sql, [email]).await
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let sql = format!("SELECT {} FROM users ORDER BY id ASC", USER_COLUMNS);
        let mut rows = self
            .conn
            .query(&sql, ())
            .await
            .map_err(|e| AppError::Database(format!("Failed to query users: {}", e)))?;

        let mut users = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            users.push(row_to_user(&row)?);
        }

        Ok(users)
    }

    async fn update_user(&self, id: i64, changes: &UserChanges) -> Result<Option<User>> {
        let now = Utc::now().timestamp();
        let sql = format!(
            "UPDATE users
             SET name = ?1,
                 email = ?2,
                 password_hash = COALESCE(?3, password_hash),
                 role = COALESCE(?4, role),
                 updated_at = ?5
             WHERE id = ?6
             RETURNING {}",
            USER_COLUMNS
        );

        self.query_one(
            &sql,
            (
                changes.name.clone(),
                changes.email.clone(),
                changes.password_hash.clone(),
                changes.role.map(|r| r.as_str().to_string()),
                now,
                id,
            ),
        )
        .await
    }

    async fn delete_user(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM users WHERE id = ?1", [id])
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete user: {}", e)))?;

        Ok(affected > 0)
    }
}

fn row_to_user(row: &Row) -> Result<User> {
    let role: String = row.get(4).map_err(|e| AppError::Database(e.to_string()))?;

    Ok(User {
        id: row.get(0).map_err(|e| AppError::Database(e.to_string()))?,
        name: row.get(1).map_err(|e| AppError::Database(e.to_string()))?,
        email: row.get(2).map_err(|e| AppError::Database(e.to_string()))?,
        password_hash: row.get(3).map_err(|e| AppError::Database(e.to_string()))?,
        role: role
            .parse::<Role>()
            .map_err(|_| AppError::Database(format!("Stored role is invalid: {}", role)))?,
        created_at: row.get(5).map_err(|e| AppError::Database(e.to_string()))?,
        updated_at: row.get(6).map_err(|e| AppError::Database(e.to_string()))?,
    })
}

fn write_error(action: &str, e: libsql::Error) -> AppError {
    let message = e.to_string();
    if message.contains("UNIQUE constraint failed") {
        AppError::Conflict("Email already in use".to_string())
    } else {
        AppError::Database(format!("Failed to {}: {}", action, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Test".to_string(),
            email: email.to_string(),
            password_hash: "hashed".to_string(),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn test_create_and_fetch_user() {
        let store = TursoClient::new_memory().await.unwrap();

        let created = store.create_user(&new_user("a@example.com")).await.unwrap();
        assert!(created.id > 0);
        assert_eq!(created.role, Role::User);

        let by_id = store.get_user_by_id(created.id).await.unwrap();
        let by_email = store.get_user_by_email("a@example.com").await.unwrap();
        assert_eq!(by_id.as_ref(), Some(&created));
        assert_eq!(by_email, Some(created));
    }

    #[tokio::test]
    async fn test_ids_are_assigned_sequentially() {
        let store = TursoClient::new_memory().await.unwrap();

        let first = store.create_user(&new_user("one@example.com")).await.unwrap();
        let second = store.create_user(&new_user("two@example.com")).await.unwrap();

        assert!(second.id > first.id);
        let all = store.list_users().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, first.id);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let store = TursoClient::new_memory().await.unwrap();
        store.create_user(&new_user("dup@example.com")).await.unwrap();

        let result = store.create_user(&new_user("dup@example.com")).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_keeps_unsupplied_fields() {
        let store = TursoClient::new_memory().await.unwrap();
        let created = store.create_user(&new_user("old@example.com")).await.unwrap();

        let updated = store
            .update_user(
                created.id,
                &UserChanges {
                    name: "New".to_string(),
                    email: "new@example.com".to_string(),
                    password_hash: None,
                    role: None,
                },
            )
            .await
            .unwrap()
            .expect("user exists");

        assert_eq!(updated.name, "New");
        assert_eq!(updated.email, "new@example.com");
        assert_eq!(updated.password_hash, "hashed");
        assert_eq!(updated.role, Role::User);

        let promoted = store
            .update_user(
                created.id,
                &UserChanges {
                    name: "New".to_string(),
                    email: "new@example.com".to_string(),
                    password_hash: Some("rehashed".to_string()),
                    role: Some(Role::Admin),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(promoted.password_hash, "rehashed");
        assert_eq!(promoted.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_update_missing_user_returns_none() {
        let store = TursoClient::new_memory().await.unwrap();
        let result = store
            .update_user(
                99,
                &UserChanges {
                    name: "x".to_string(),
                    email: "x@example.com".to_string(),
                    password_hash: None,
                    role: None,
                },
            )
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_delete_user() {
        let store = TursoClient::new_memory().await.unwrap();
        let created = store.create_user(&new_user("gone@example.com")).await.unwrap();

        assert!(store.delete_user(created.id).await.unwrap());
        assert!(!store.delete_user(created.id).await.unwrap());
        assert!(store.get_user_by_id(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_local_file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("users.db");
        let path = path.to_str().unwrap();

        {
            let store = TursoClient::new_local(path).await.unwrap();
            store.create_user(&new_user("disk@example.com")).await.unwrap();
        }

        let reopened = TursoClient::new_local(path).await.unwrap();
        assert!(reopened
            .get_user_by_email("disk@example.com")
            .await
            .unwrap()
            .is_some());
    }
}
