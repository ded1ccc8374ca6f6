// src/utils/jwt.rs

use std::{
    convert::Infallible,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{Request, StatusCode, header, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::AppError};

/// JWT Claims structure.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - Stores the User ID (as string).
    pub sub: String,
    /// User's role (e.g., 'user', 'admin').
    pub role: String,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

impl Claims {
    /// Numeric user id, if `sub` holds one.
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

/// Signs a new JWT for the user.
///
/// Tokens are normally issued by the external auth service; this exists for
/// operators and tests.
pub fn sign_jwt(
    id: i64,
    role: &str,
    secret: &str,
    expiration_seconds: u64,
) -> Result<String, AppError> {
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs() as usize
        + expiration_seconds as usize;

    let claims = Claims {
        sub: id.to_string(),
        role: role.to_owned(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies and decodes a JWT string.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;

    Ok(token_data.claims)
}

enum Bearer<'a> {
    Missing,
    Malformed,
    Token(&'a str),
}

fn bearer(req: &Request<Body>) -> Bearer<'_> {
    let Some(value) = req.headers().get(header::AUTHORIZATION) else {
        return Bearer::Missing;
    };
    match value.to_str().ok().and_then(|v| v.strip_prefix("Bearer ")) {
        Some(token) => Bearer::Token(token),
        None => Bearer::Malformed,
    }
}

/// Axum Middleware: Authentication.
///
/// Requires a valid 'Authorization: Bearer <token>' header and injects the
/// `Claims` into the request extensions. Otherwise returns 401.
pub async fn auth_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = match bearer(&req) {
        Bearer::Token(token) => token,
        _ => return Err(StatusCode::UNAUTHORIZED),
    };

    let claims = verify_jwt(token, &config.jwt_secret).map_err(|_| StatusCode::UNAUTHORIZED)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Axum Middleware: Optional authentication.
///
/// Anonymous requests pass through untouched. A header that is present but
/// malformed or carries an invalid token is still rejected with 401.
pub async fn optional_auth_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let claims = match bearer(&req) {
        Bearer::Missing => None,
        Bearer::Malformed => return Err(StatusCode::UNAUTHORIZED),
        Bearer::Token(token) => {
            Some(verify_jwt(token, &config.jwt_secret).map_err(|_| StatusCode::UNAUTHORIZED)?)
        }
    };

    if let Some(claims) = claims {
        req.extensions_mut().insert(claims);
    }
    Ok(next.run(req).await)
}

/// The resolved caller, if any.
///
/// Reads the `Claims` left by one of the middlewares above; never rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub Option<i64>);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Caller(
            parts.extensions.get::<Claims>().and_then(Claims::user_id),
        ))
    }
}
