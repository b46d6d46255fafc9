use crate::api::{error_response, ErrorResponse};
use crate::auth::{create_session_with_token, fixed_token_for, hash_password};
use crate::db::DbPool;
use crate::get_conn;
use crate::models::{NewUser, User};
use crate::schema::users;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

const MAX_USERNAME_CHARS: usize = 64;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SignupResponse {
    pub user_id: Uuid,
    pub token: String,
}

fn validate(req: &SignupRequest) -> Result<(), &'static str> {
    let username = req.username.trim();
    if username.is_empty() || req.password.is_empty() {
        return Err("Username and password are required");
    }
    if username.chars().count() > MAX_USERNAME_CHARS {
        return Err("Username is too long");
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "auth",
    request_body(content = SignupRequest, example = json!({"username": "user", "password": "password"})),
    responses(
        (status = 201, description = "User created successfully", body = SignupResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Username already exists", body = ErrorResponse)
    )
)]
pub async fn signup(
    State(pool): State<Arc<DbPool>>,
    Json(req): Json<SignupRequest>,
) -> impl IntoResponse {
    if let Err(message) = validate(&req) {
        return error_response(StatusCode::BAD_REQUEST, message);
    }

    let mut conn = get_conn!(pool);

    let password_hash = match hash_password(&req.password) {
        Ok(h) => h,
        Err(_) => {
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to hash password")
        }
    };

    let username = req.username.trim();
    let new_user = NewUser {
        username,
        password_hash: &password_hash,
    };

    let user: User = match diesel::insert_into(users::table)
        .values(&new_user)
        .returning(User::as_returning())
        .get_result(&mut conn)
    {
        Ok(u) => u,
        Err(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        )) => return error_response(StatusCode::CONFLICT, "Username already exists"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to create user");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create user");
        }
    };

    // Dev builds give test user "t" a fixed token so the session survives DB resets
    let fixed_token = fixed_token_for(username);
    let token = match create_session_with_token(&mut conn, user.id, fixed_token) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create session");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create session");
        }
    };

    tracing::info!(user_id = %user.id, "User signed up");
    (
        StatusCode::CREATED,
        Json(SignupResponse {
            user_id: user.id,
            token,
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(username: &str, password: &str) -> SignupRequest {
        SignupRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_validate_signup() {
        assert!(validate(&req("cook", "hunter2")).is_ok());
        assert!(validate(&req("   ", "hunter2")).is_err());
        assert!(validate(&req("cook", "")).is_err());
        assert!(validate(&req(&"a".repeat(65), "hunter2")).is_err());
    }
}
