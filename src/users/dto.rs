use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Request body for registration. Fields are optional so absence maps to a validation error.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub identity: Option<String>,
    pub password: Option<String>,
}

/// Raw update body; unknown keys are kept so "no recognized field" can be told apart from `{}`.
pub type UpdateUserRequest = Map<String, Value>;

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct RegisteredUser {
    pub message: &'static str,
    pub username: String,
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct LoggedInUser {
    pub message: &'static str,
    pub username: String,
}
