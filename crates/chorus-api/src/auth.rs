use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use chorus_db::{NewUser, ProfileUpdate};
use chorus_types::api::{
    Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, UpdateProfileRequest,
    UserResponse,
};

use crate::error::ApiError;
use crate::state::AppState;
use crate::{parse_id, parse_timestamp};

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.username.len() < 3 || req.username.len() > 32 {
        return Err(ApiError::validation("username must be 3-32 characters"));
    }
    if !req.email.contains('@') {
        return Err(ApiError::validation("email address is malformed"));
    }
    if req.password.len() < 8 {
        return Err(ApiError::validation("password must be at least 8 characters"));
    }

    if state.db.get_user_by_username(&req.username)?.is_some() {
        return Err(ApiError::conflict("username is already taken"));
    }

    let password_hash = hash_password(&req.password)?;
    let user_id = Uuid::new_v4();

    // Duplicate email still lands here as a constraint conflict.
    state
        .db
        .create_user(&NewUser {
            id: &user_id.to_string(),
            username: &req.username,
            email: &req.email,
            password_hash: &password_hash,
            first_name: req.first_name.as_deref(),
            last_name: req.last_name.as_deref(),
        })
        .map_err(|e| match e {
            chorus_db::DbError::Conflict => ApiError::conflict("username or email is already taken"),
            other => other.into(),
        })?;

    let token = create_token(&state.jwt_secret, user_id, &req.username)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { user_id, token }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Same error for unknown user and wrong password.
    let user = state
        .db
        .get_user_by_username(&req.username)?
        .ok_or(ApiError::Unauthorized)?;

    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("stored hash unreadable: {e}")))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized)?;

    let user_id = parse_id(&user.id);
    let token = create_token(&state.jwt_secret, user_id, &user.username)?;

    Ok(Json(LoginResponse {
        user_id,
        username: user.username,
        token,
    }))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .get_user_by_id(&claims.sub.to_string())?
        .ok_or_else(|| ApiError::not_found("user"))?;

    Ok(Json(user_to_response(user)))
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let password_hash = match req.password.as_deref() {
        Some(p) if p.len() < 8 => {
            return Err(ApiError::validation("password must be at least 8 characters"));
        }
        Some(p) => Some(hash_password(p)?),
        None => None,
    };

    state
        .db
        .update_user(
            &claims.sub.to_string(),
            &ProfileUpdate {
                first_name: req.first_name.as_deref(),
                last_name: req.last_name.as_deref(),
                bio: req.bio.as_deref(),
                location: req.location.as_deref(),
                avatar_url: req.avatar_url.as_deref(),
                password_hash: password_hash.as_deref(),
            },
        )
        .map_err(|e| match e {
            chorus_db::DbError::NotFound => ApiError::not_found("user"),
            other => other.into(),
        })?;

    let user = state
        .db
        .get_user_by_id(&claims.sub.to_string())?
        .ok_or_else(|| ApiError::not_found("user"))?;

    Ok(Json(user_to_response(user)))
}

pub async fn delete_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .db
        .delete_user(&claims.sub.to_string())
        .map_err(|e| match e {
            chorus_db::DbError::NotFound => ApiError::not_found("user"),
            other => other.into(),
        })?;

    Ok(Json(serde_json::json!({ "message": "account deleted" })))
}

pub fn create_token(secret: &str, user_id: Uuid, username: &str) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(e.into()))?;

    Ok(token)
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {e}")))?
        .to_string();
    Ok(hash)
}

pub(crate) fn user_to_response(user: chorus_db::models::UserRow) -> UserResponse {
    UserResponse {
        id: parse_id(&user.id),
        username: user.username,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
        bio: user.bio,
        location: user.location,
        avatar_url: user.avatar_url,
        created_at: parse_timestamp(&user.created_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppStateInner;
    use chorus_db::Database;

    fn test_state() -> AppState {
        AppStateInner::new(Database::open_in_memory().unwrap(), "test-secret".into())
    }

    fn register_req(username: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.into(),
            email: format!("{username}@example.com"),
            password: password.into(),
            first_name: None,
            last_name: None,
        }
    }

    #[tokio::test]
    async fn register_then_login_round_trips() {
        let state = test_state();
        register(State(state.clone()), Json(register_req("alice", "correct horse")))
            .await
            .expect("register should succeed");

        let login_ok = login(
            State(state.clone()),
            Json(LoginRequest {
                username: "alice".into(),
                password: "correct horse".into(),
            }),
        )
        .await;
        assert!(login_ok.is_ok());

        let login_bad = login(
            State(state),
            Json(LoginRequest {
                username: "alice".into(),
                password: "wrong password".into(),
            }),
        )
        .await;
        assert!(matches!(login_bad, Err(ApiError::Unauthorized)));
    }

    #[tokio::test]
    async fn short_password_is_rejected() {
        let state = test_state();
        let result = register(State(state), Json(register_req("alice", "short"))).await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let state = test_state();
        register(State(state.clone()), Json(register_req("alice", "correct horse")))
            .await
            .unwrap();

        let result = register(
            State(state),
            Json(RegisterRequest {
                email: "second@example.com".into(),
                ..register_req("alice", "correct horse")
            }),
        )
        .await;
        assert!(matches!(result, Err(ApiError::Conflict(_))));
    }
}
