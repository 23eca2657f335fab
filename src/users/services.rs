use serde_json::Value;
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};

use crate::error::ApiError;
use crate::users::{
    dto::{
        LoggedInUser, LoginRequest, PublicUser, RegisterRequest, RegisteredUser,
        UpdateUserRequest,
    },
    password::{hash_password, verify_password},
    repo::{StoreError, UserRepo},
    repo_types::{NewUser, UserChanges},
    validation::{is_valid_email, validate_registration},
};

pub async fn get_user(repo: &dyn UserRepo, id: i64) -> Result<PublicUser, ApiError> {
    let user = repo.find_by_id(id).await?.ok_or(ApiError::NotFound)?;
    Ok(PublicUser {
        id: user.id,
        username: user.username,
        email: user.email,
    })
}

pub async fn register(
    repo: &dyn UserRepo,
    req: RegisterRequest,
) -> Result<RegisteredUser, ApiError> {
    let reg = validate_registration(req).map_err(|e| {
        warn!(reason = %e, "registration rejected");
        e
    })?;

    let password_hash = hash_password(&reg.password).map_err(|e| {
        error!(error = %e, "hash_password failed");
        ApiError::Unexpected(e.to_string())
    })?;

    if repo.username_exists(&reg.username).await? {
        warn!(username = %reg.username, "username already registered");
        return Err(ApiError::UsernameTaken);
    }

    let user = repo
        .insert(NewUser {
            username: reg.username,
            password_hash,
            email: reg.email,
            create_time: OffsetDateTime::now_utc(),
        })
        .await
        .map_err(|e| {
            warn!(error = %e, "insert user failed");
            ApiError::from(e)
        })?;

    info!(
        user_id = user.id,
        username = %user.username,
        created_at = %user.create_time,
        "user registered"
    );
    Ok(RegisteredUser {
        message: "User registered successfully",
        username: user.username,
        id: user.id,
    })
}

pub async fn login(repo: &dyn UserRepo, req: LoginRequest) -> Result<LoggedInUser, ApiError> {
    let (identity, password) = match (req.identity, req.password) {
        (Some(i), Some(p)) => (i.trim().to_string(), p),
        _ => return Err(ApiError::InvalidInput),
    };

    let Some(user) = repo.find_by_identity(&identity).await? else {
        warn!("login for unknown identity");
        return Err(ApiError::InvalidCredentials);
    };

    let ok = verify_password(&password, &user.password_hash).map_err(|e| {
        error!(error = %e, user_id = user.id, "verify_password failed");
        ApiError::Unexpected(e.to_string())
    })?;
    if !ok {
        warn!(user_id = user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    info!(user_id = user.id, "user logged in");
    Ok(LoggedInUser {
        message: "Login successful",
        username: user.username,
    })
}

pub async fn update_user(
    repo: &dyn UserRepo,
    id: i64,
    body: Option<UpdateUserRequest>,
) -> Result<(), ApiError> {
    let body = match body {
        Some(b) if !b.is_empty() => b,
        _ => return Err(ApiError::InvalidInput),
    };

    let mut changes = UserChanges::default();

    match body.get("email") {
        None | Some(Value::Null) => {}
        Some(Value::String(email)) => {
            if !is_valid_email(email) {
                return Err(ApiError::InvalidEmail);
            }
            if repo.email_taken_by_other(email, id).await? {
                warn!(user_id = id, "email already in use");
                return Err(ApiError::EmailTaken);
            }
            changes.email = Some(email.clone());
        }
        Some(_) => return Err(ApiError::InvalidEmail),
    }

    if changes.is_empty() {
        return Err(ApiError::NoValidFields);
    }

    // A unique violation here is a lost race, reported as a plain integrity error.
    let matched = repo.update(id, &changes).await.map_err(|e| match e {
        StoreError::UniqueViolation { message, .. } => ApiError::Integrity(message),
        other => ApiError::from(other),
    })?;
    if matched == 0 {
        return Err(ApiError::NotFound);
    }

    debug!(user_id = id, ?changes, "user updated");
    Ok(())
}
