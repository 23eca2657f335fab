use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use thiserror::Error;

use crate::users::repo_types::{NewUser, User, UserChanges};

const USER_COLUMNS: &str = "id, username, password, email, create_time";

/// Column protected by a unique constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
    Other(String),
}

impl UniqueField {
    pub fn from_constraint(name: &str) -> Self {
        match name {
            "users_username_key" => UniqueField::Username,
            "users_email_key" => UniqueField::Email,
            other => UniqueField::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{message}")]
    UniqueViolation { field: UniqueField, message: String },
    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                return StoreError::UniqueViolation {
                    field: UniqueField::from_constraint(db_err.constraint().unwrap_or_default()),
                    message: db_err.message().to_string(),
                };
            }
        }
        StoreError::Database(err)
    }
}

/// Storage seam for the users table. Every call is one statement on a pooled connection.
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;

    /// Row whose username or email equals `identity`; lowest id wins.
    async fn find_by_identity(&self, identity: &str) -> Result<Option<User>, StoreError>;

    async fn username_exists(&self, username: &str) -> Result<bool, StoreError>;

    async fn email_taken_by_other(&self, email: &str, id: i64) -> Result<bool, StoreError>;

    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;

    /// Returns the number of rows matched by `id`.
    async fn update(&self, id: i64, changes: &UserChanges) -> Result<u64, StoreError>;
}

#[derive(Clone)]
pub struct PgUserRepo {
    pool: PgPool,
}

impl PgUserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_identity(&self, identity: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE username = $1 OR email = $1 \
             ORDER BY id LIMIT 1"
        ))
        .bind(identity)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn email_taken_by_other(&self, email: &str, id: i64) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND id <> $2)",
        )
        .bind(email)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, password, email, create_time, isadmin) \
             VALUES ($1, $2, $3, $4, FALSE) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.email)
        .bind(user.create_time)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update(&self, id: i64, changes: &UserChanges) -> Result<u64, StoreError> {
        if changes.is_empty() {
            return Ok(0);
        }

        let mut builder = QueryBuilder::<Postgres>::new("UPDATE users SET ");
        let mut set = builder.separated(", ");
        if let Some(email) = &changes.email {
            set.push("email = ");
            set.push_bind_unseparated(email.clone());
        }
        builder.push(" WHERE id = ");
        builder.push_bind(id);

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
pub(crate) mod memory {
    //! In-memory `UserRepo` that enforces the same unique constraints as the table.

    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct MemoryUserRepo {
        rows: Mutex<Vec<User>>,
        failure: Option<String>,
    }

    impl MemoryUserRepo {
        /// Every call fails with a protocol error carrying `message`.
        pub fn failing(message: &str) -> Self {
            Self {
                rows: Mutex::default(),
                failure: Some(message.to_string()),
            }
        }

        pub fn stored_password(&self, username: &str) -> Option<String> {
            let rows = self.rows.lock().unwrap();
            rows.iter()
                .find(|u| u.username == username)
                .map(|u| u.password_hash.clone())
        }

        fn check(&self) -> Result<(), StoreError> {
            match &self.failure {
                Some(msg) => Err(StoreError::Database(sqlx::Error::Protocol(msg.clone()))),
                None => Ok(()),
            }
        }
    }

    fn violation(constraint: &str) -> StoreError {
        StoreError::UniqueViolation {
            field: UniqueField::from_constraint(constraint),
            message: format!("duplicate key value violates unique constraint \"{constraint}\""),
        }
    }

    #[async_trait]
    impl UserRepo for MemoryUserRepo {
        async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
            self.check()?;
            let rows = self.rows.lock().unwrap();
            Ok(rows.iter().find(|u| u.id == id).cloned())
        }

        async fn find_by_identity(&self, identity: &str) -> Result<Option<User>, StoreError> {
            self.check()?;
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .iter()
                .find(|u| u.username == identity || u.email == identity)
                .cloned())
        }

        async fn username_exists(&self, username: &str) -> Result<bool, StoreError> {
            self.check()?;
            let rows = self.rows.lock().unwrap();
            Ok(rows.iter().any(|u| u.username == username))
        }

        async fn email_taken_by_other(&self, email: &str, id: i64) -> Result<bool, StoreError> {
            self.check()?;
            let rows = self.rows.lock().unwrap();
            Ok(rows.iter().any(|u| u.email == email && u.id != id))
        }

        async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
            self.check()?;
            let mut rows = self.rows.lock().unwrap();
            if rows.iter().any(|u| u.username == user.username) {
                return Err(violation("users_username_key"));
            }
            if rows.iter().any(|u| u.email == user.email) {
                return Err(violation("users_email_key"));
            }
            let row = User {
                id: rows.len() as i64 + 1,
                username: user.username,
                password_hash: user.password_hash,
                email: user.email,
                create_time: user.create_time,
            };
            rows.push(row.clone());
            Ok(row)
        }

        async fn update(&self, id: i64, changes: &UserChanges) -> Result<u64, StoreError> {
            self.check()?;
            let mut rows = self.rows.lock().unwrap();
            if let Some(email) = &changes.email {
                if rows.iter().any(|u| u.email == *email && u.id != id) {
                    return Err(violation("users_email_key"));
                }
            }
            match rows.iter_mut().find(|u| u.id == id) {
                Some(row) => {
                    if let Some(email) = &changes.email {
                        row.email = email.clone();
                    }
                    Ok(1)
                }
                None => Ok(0),
            }
        }
    }

    /// Pre-checks always report "free", as when another request commits between the
    /// check and the write. Writes still hit the unique constraints.
    #[derive(Default)]
    pub struct RacingUserRepo {
        inner: MemoryUserRepo,
    }

    #[async_trait]
    impl UserRepo for RacingUserRepo {
        async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
            self.inner.find_by_id(id).await
        }

        async fn find_by_identity(&self, identity: &str) -> Result<Option<User>, StoreError> {
            self.inner.find_by_identity(identity).await
        }

        async fn username_exists(&self, _username: &str) -> Result<bool, StoreError> {
            Ok(false)
        }

        async fn email_taken_by_other(&self, _email: &str, _id: i64) -> Result<bool, StoreError> {
            Ok(false)
        }

        async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
            self.inner.insert(user).await
        }

        async fn update(&self, id: i64, changes: &UserChanges) -> Result<u64, StoreError> {
            self.inner.update(id, changes).await
        }
    }
}
