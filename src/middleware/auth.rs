// Session check for the file endpoints: HS256 bearer JWT

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{AuthConfig, AuthMode};
use crate::models::AppState;
use crate::types::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// Authenticated caller, inserted into request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
}

impl Session {
    pub fn anonymous() -> Self {
        Self {
            user_id: "anonymous".to_string(),
        }
    }
}

pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let session = match state.config.auth.mode {
        AuthMode::Disabled => Session::anonymous(),
        AuthMode::Jwt => {
            let header = req
                .headers()
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .ok_or_else(|| AppError::Unauthorized("missing Authorization header".into()))?;
            let token = header
                .strip_prefix("Bearer ")
                .ok_or_else(|| AppError::Unauthorized("expected a Bearer token".into()))?;
            verify_jwt(token, &state.config.auth)?
        }
    };

    debug!(user_id = %session.user_id, "Session accepted");
    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}

/// Verify signature and expiry of an HS256 token.
pub fn verify_jwt(token: &str, auth: &AuthConfig) -> AppResult<Session> {
    let data = decode::<Claims>(
        token.trim(),
        &DecodingKey::from_secret(auth.secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| AppError::Unauthorized(format!("invalid token: {}", e)))?;

    Ok(Session {
        user_id: data.claims.sub,
    })
}
