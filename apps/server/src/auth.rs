//! # Admin Sessions
//!
//! Signed session tokens (HS256) for the admin console.
//!
//! ## Request Flow
//! ```text
//! POST /admin/login {username, password}
//!      │  argon2 verify against users.password_hash
//!      ▼
//! Set-Cookie: kitab_session=<jwt>; HttpOnly; Path=/
//!
//! GET /api/books                       require_admin
//!      │  token from cookie, else "Authorization: Bearer <jwt>"
//!      ├── missing / bad signature / expired ──► 401 UNAUTHORIZED
//!      ▼
//! handler (AdminSession in request extensions)
//! ```

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use kitab_core::AdminUser;
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;
use tracing::debug;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::SharedState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "kitab_session";

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (admin user id)
    pub sub: String,

    pub username: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// The authenticated admin, available to handlers behind [`require_admin`].
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub user_id: i64,
    pub username: String,
}

/// JWT token manager.
pub struct JwtManager {
    secret: String,
    lifetime_secs: i64,
}

impl JwtManager {
    pub fn new(secret: String, lifetime_secs: i64) -> Self {
        JwtManager { secret, lifetime_secs }
    }

    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime_secs
    }

    /// Issues a session token for an admin.
    pub fn issue(&self, user: &AdminUser) -> ApiResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::internal(format!("Failed to generate token: {}", e)))
    }

    /// Validates signature and expiry.
    pub fn validate(&self, token: &str) -> ApiResult<Claims> {
        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| {
            debug!("Rejected session token: {}", e);
            ApiError::unauthorized()
        })?;

        Ok(token_data.claims)
    }

    /// Turns a valid token into the session it represents.
    pub fn session(&self, token: &str) -> ApiResult<AdminSession> {
        let claims = self.validate(token)?;
        let user_id = claims.sub.parse().map_err(|_| ApiError::unauthorized())?;
        Ok(AdminSession {
            user_id,
            username: claims.username,
        })
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ").map(str::trim).filter(|t| !t.is_empty())
}

/// Middleware guarding the admin API.
pub async fn require_admin(
    State(state): State<SharedState>,
    cookies: Cookies,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = cookies
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| {
            request
                .headers()
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(extract_bearer_token)
                .map(str::to_string)
        })
        .ok_or_else(ApiError::unauthorized)?;

    let session = state.jwt.session(&token)?;
    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

// =============================================================================
// Unit Tests
// =============================================================================
