// Credential persistence
//
// The core never issues raw queries outside this module; everything else
// consumes the `CredentialStore` interface.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::auth::error::AuthError;
use crate::auth::models::{NewUser, User};

/// Narrow persistence interface consumed by the credential service
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError>;
    async fn create(&self, new_user: NewUser) -> Result<User, AuthError>;
    async fn list(&self) -> Result<Vec<User>, AuthError>;
}

/// PostgreSQL-backed credential store
pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        sqlx::query_as::<_, User>(
            "SELECT id, name, email, address, password_hash, profile_picture, role, created_at, updated_at
             FROM users WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError> {
        sqlx::query_as::<_, User>(
            "SELECT id, name, email, address, password_hash, profile_picture, role, created_at, updated_at
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))
    }

    async fn create(&self, new_user: NewUser) -> Result<User, AuthError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, name, email, address, password_hash, role)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, name, email, address, password_hash, profile_picture, role, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.address)
        .bind(&new_user.password_hash)
        .bind(new_user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AuthError::EmailAlreadyExists;
                }
            }
            AuthError::DatabaseError(e.to_string())
        })
    }

    async fn list(&self) -> Result<Vec<User>, AuthError> {
        sqlx::query_as::<_, User>(
            "SELECT id, name, email, address, password_hash, profile_picture, role, created_at, updated_at
             FROM users ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))
    }
}

/// In-process credential store for tests and local development
///
/// Enforces the same case-insensitive email uniqueness as the database.
#[derive(Default)]
pub struct MemoryCredentialStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let users = self.users.lock().expect("credential store lock poisoned");
        Ok(users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError> {
        let users = self.users.lock().expect("credential store lock poisoned");
        Ok(users.get(&id).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, AuthError> {
        let mut users = self.users.lock().expect("credential store lock poisoned");
        if users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&new_user.email))
        {
            return Err(AuthError::EmailAlreadyExists);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            address: new_user.address,
            password_hash: new_user.password_hash,
            profile_picture: None,
            role: new_user.role.as_str().to_string(),
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn list(&self) -> Result<Vec<User>, AuthError> {
        let users = self.users.lock().expect("credential store lock poisoned");
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by_key(|u| u.created_at);
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::Role;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Alice".to_string(),
            email: email.to_string(),
            address: None,
            password_hash: "salt:key".to_string(),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn create_then_find() {
        let store = MemoryCredentialStore::new();
        let created = store.create(new_user("alice@x.com")).await.unwrap();

        let by_email = store.find_by_email("alice@x.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);

        let by_id = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "alice@x.com");
    }

    #[tokio::test]
    async fn email_lookup_is_case_insensitive() {
        let store = MemoryCredentialStore::new();
        store.create(new_user("Alice@X.com")).await.unwrap();
        assert!(store.find_by_email("alice@x.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = MemoryCredentialStore::new();
        store.create(new_user("alice@x.com")).await.unwrap();
        let result = store.create(new_user("ALICE@x.com")).await;
        assert!(matches!(result, Err(AuthError::EmailAlreadyExists)));
    }

    #[tokio::test]
    async fn unknown_lookups_return_none() {
        let store = MemoryCredentialStore::new();
        assert!(store.find_by_email("nobody@x.com").await.unwrap().is_none());
        assert!(store.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }
}
