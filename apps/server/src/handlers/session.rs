//! # Admin Session Handlers
//!
//! `POST /admin/login` accepts either an HTML form post or a JSON body.

use axum::extract::{FromRequest, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::{Form, Json};
use serde::{Deserialize, Serialize};
use tower_cookies::cookie::time::Duration;
use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies};
use tracing::{info, warn};

use super::MessageResponse;
use crate::auth::SESSION_COOKIE;
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::SharedState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    pub username: String,
    /// Same token as the cookie, for `Authorization: Bearer` clients
    pub token: String,
    pub expires_in: i64,
}

fn is_json(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.trim_start().starts_with("application/json"))
}

/// `POST /admin/login`
pub async fn login(
    State(state): State<SharedState>,
    cookies: Cookies,
    request: Request,
) -> ApiResult<Json<LoginResponse>> {
    let credentials = if is_json(&request) {
        let Json(credentials) = Json::<LoginRequest>::from_request(request, &()).await?;
        credentials
    } else {
        let Form(credentials) = Form::<LoginRequest>::from_request(request, &()).await?;
        credentials
    };

    let Some(user) = state
        .db
        .users()
        .authenticate(credentials.username.trim(), &credentials.password)
        .await?
    else {
        warn!(username = %credentials.username, "Failed admin login");
        return Err(ApiError::new(ErrorCode::Unauthorized, "Username atau password salah!"));
    };

    let token = state.jwt.issue(&user)?;
    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.is_production())
        .max_age(Duration::seconds(state.jwt.lifetime_secs()))
        .build();
    cookies.add(cookie);

    info!(user_id = user.id, username = %user.username, "Admin logged in");
    Ok(Json(LoginResponse {
        message: "Login berhasil".to_string(),
        username: user.username,
        token,
        expires_in: state.jwt.lifetime_secs(),
    }))
}

/// `POST /admin/logout`
pub async fn logout(cookies: Cookies) -> Json<MessageResponse> {
    cookies.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());
    Json(MessageResponse::new("Anda telah logout."))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
    use axum::http::{Request, StatusCode};
    use serde_json::json;

    use crate::testing::{expect_status, json, TestApp};

    fn login_request(content_type: &str, body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/admin/login")
            .header(CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_admin_api_requires_session() {
        let app = TestApp::new().await;
        let request = Request::builder().uri("/api/books").body(Body::empty()).unwrap();
        let body = expect_status(app.send(request).await, StatusCode::UNAUTHORIZED).await;
        assert_eq!(body["code"], "UNAUTHORIZED");

        let request = Request::builder()
            .uri("/api/books")
            .header(AUTHORIZATION, "Bearer not-a-token")
            .body(Body::empty())
            .unwrap();
        expect_status(app.send(request).await, StatusCode::UNAUTHORIZED).await;
    }

    #[tokio::test]
    async fn test_form_login_sets_cookie_that_unlocks_api() {
        let app = TestApp::new().await;
        let response = app
            .send(login_request(
                "application/x-www-form-urlencoded",
                "username=admin&password=rahasia".to_string(),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let set_cookie = response.headers()[SET_COOKIE].to_str().unwrap().to_string();
        assert!(set_cookie.starts_with("kitab_session="));
        assert!(set_cookie.contains("HttpOnly"));
        let pair = set_cookie.split(';').next().unwrap().to_string();

        let request = Request::builder()
            .uri("/api/books/all")
            .header(COOKIE, pair)
            .body(Body::empty())
            .unwrap();
        expect_status(app.send(request).await, StatusCode::OK).await;
    }

    #[tokio::test]
    async fn test_json_login_and_wrong_password() {
        let app = TestApp::new().await;
        let response = app
            .send(login_request(
                "application/json",
                json!({"username": "admin", "password": "rahasia"}).to_string(),
            ))
            .await;
        let body = json(response).await;
        assert_eq!(body["username"], "admin");
        assert!(!body["token"].as_str().unwrap().is_empty());

        let response = app
            .send(login_request(
                "application/json",
                json!({"username": "admin", "password": "salah"}).to_string(),
            ))
            .await;
        let body = expect_status(response, StatusCode::UNAUTHORIZED).await;
        assert_eq!(body["error"], "Username atau password salah!");
    }

    #[tokio::test]
    async fn test_logout_clears_cookie() {
        let app = TestApp::new().await;
        let request = Request::builder()
            .method("POST")
            .uri("/admin/logout")
            .header(COOKIE, format!("kitab_session={}", app.token))
            .body(Body::empty())
            .unwrap();
        let response = app.send(request).await;
        assert_eq!(response.status(), StatusCode::OK);
        let set_cookie = response.headers()[SET_COOKIE].to_str().unwrap();
        assert!(set_cookie.starts_with("kitab_session=;"));
        assert!(set_cookie.contains("Max-Age=0"));
    }
}
