use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,                      // generated by storage
    pub username: String,
    #[sqlx(rename = "password")]
    pub password_hash: String,        // Argon2 hash, never leaves the service
    pub email: String,
    pub create_time: OffsetDateTime,  // set once on insert
}

/// Row to insert on registration.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub create_time: OffsetDateTime,
}

/// Columns an update may touch. `None` means leave as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub email: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
    }
}
