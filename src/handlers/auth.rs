// src/handlers/auth.rs

use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::user::{CreateUserRequest, LoginRequest, User},
    services::account,
    utils::{
        jwt::{clear_session_cookie, session_cookie, sign_jwt},
        negotiate::{JsonOrForm, Negotiated},
    },
};

/// Issues a session for `user`: token in the body, same token in the cookie.
fn start_session(
    user: &User,
    config: &Config,
    negotiated: &Negotiated,
    status: StatusCode,
) -> Result<Response, AppError> {
    let token = sign_jwt(
        user.id,
        &user.username,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;
    let cookie = session_cookie(&token, config)?;

    let mut response = negotiated.respond_to(
        status,
        json!({
            "token": token,
            "type": "Bearer",
            "id": user.id,
            "username": user.username,
        }),
        "/",
    );
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    Ok(response)
}

/// Registers a new user and signs them in.
///
/// The profile is created alongside the user. Returns 201 Created.
pub async fn signup(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    negotiated: Negotiated,
    JsonOrForm(payload): JsonOrForm<CreateUserRequest>,
) -> Result<Response, AppError> {
    let payload = CreateUserRequest {
        username: payload.username.trim().to_string(),
        email: payload.email.trim().to_string(),
        ..payload
    };
    payload.validate()?;

    let user = account::create_user(&pool, &payload).await?;

    start_session(&user, &config, &negotiated, StatusCode::CREATED)
}

/// Authenticates a user and returns a session token.
pub async fn login(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    negotiated: Negotiated,
    JsonOrForm(payload): JsonOrForm<LoginRequest>,
) -> Result<Response, AppError> {
    payload.validate()?;

    let user = account::authenticate(&pool, payload.username.trim(), &payload.password)
        .await
        .inspect_err(|_| tracing::info!(username = %payload.username, "Failed login"))?;

    start_session(&user, &config, &negotiated, StatusCode::OK)
}

/// Ends the browser session. Tokens are stateless, so this clears the cookie.
pub async fn logout(negotiated: Negotiated) -> impl IntoResponse {
    let mut response = negotiated.respond_to(StatusCode::OK, json!({ "logged_out": true }), "/");
    response
        .headers_mut()
        .insert(header::SET_COOKIE, clear_session_cookie());
    response
}
