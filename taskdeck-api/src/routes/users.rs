//! Signup and login endpoints. No authentication required.

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};

use crate::constants::MSG_USER_CREATED;
use crate::error::{ApiError, ApiResult};
use crate::services::Credentials;
use crate::state::SharedUserService;

/// POST /signup - Register a user
#[utoipa::path(
    post,
    path = "/signup",
    tag = "Users",
    request_body = Credentials,
    responses(
        (status = 201, description = "User created", body = String),
        (status = 400, description = "Too short, duplicate or malformed", body = ApiError),
    ),
)]
pub async fn signup(
    State(users): State<SharedUserService>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<&'static str>)> {
    let Json(credentials) = payload?;
    users.signup(credentials).await?;
    Ok((StatusCode::CREATED, Json(MSG_USER_CREATED)))
}

/// POST /login - Exchange credentials for the user's API key
#[utoipa::path(
    post,
    path = "/login",
    tag = "Users",
    request_body = Credentials,
    responses(
        (status = 200, description = "API key", body = String),
        (status = 400, description = "Wrong password or username", body = ApiError),
    ),
)]
pub async fn login(
    State(users): State<SharedUserService>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> ApiResult<Json<String>> {
    let Json(credentials) = payload?;
    let api_key = users.login(credentials).await?;
    Ok(Json(api_key))
}
