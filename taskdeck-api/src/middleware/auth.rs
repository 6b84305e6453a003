//! Axum Middleware for Authentication
//!
//! Resolves the caller's API key to a user id once per request and injects
//! an [`AuthContext`] into the request extensions. Requests without a valid
//! key are answered with 401 before reaching a handler.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::{bearer_token, AuthContext};
use crate::error::ApiError;
use crate::state::SharedIdentityResolver;

// ============================================================================
// MIDDLEWARE FUNCTION
// ============================================================================

/// Axum middleware for authentication.
///
/// # Example
///
/// ```ignore
/// use axum::{Router, middleware};
/// use taskdeck_api::middleware::auth_middleware;
///
/// let app = Router::new()
///     .route("/tasks", axum::routing::get(|| async { "OK" }))
///     .layer(middleware::from_fn_with_state(state.identity.clone(), auth_middleware));
/// ```
pub async fn auth_middleware(
    State(identity): State<SharedIdentityResolver>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthMiddlewareError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = bearer_token(header).map_err(|e| AuthMiddlewareError(e.into()))?;
    let user_id = identity.resolve(token).await.map_err(|e| {
        tracing::debug!(error = %e, "Authentication failed");
        AuthMiddlewareError(e.into())
    })?;

    request.extensions_mut().insert(AuthContext::new(user_id));
    Ok(next.run(request).await)
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

/// Error wrapper for middleware that implements IntoResponse.
#[derive(Debug)]
pub struct AuthMiddlewareError(pub ApiError);

impl IntoResponse for AuthMiddlewareError {
    fn into_response(self) -> Response {
        self.0.into_response()
    }
}

// ============================================================================
// TYPED EXTRACTOR
// ============================================================================

/// Typed Axum extractor for the authenticated caller.
///
/// `auth_middleware` must run on the route; without it the extractor
/// rejects with 500.
#[derive(Debug, Clone)]
pub struct AuthExtractor(pub AuthContext);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthExtractor
where
    S: Send + Sync,
{
    type Rejection = AuthMiddlewareError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .copied()
            .map(AuthExtractor)
            .ok_or_else(|| {
                AuthMiddlewareError(ApiError::internal_error(
                    "AuthContext not found in request extensions. \
                     Ensure auth_middleware is applied to this route.",
                ))
            })
    }
}

impl std::ops::Deref for AuthExtractor {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
