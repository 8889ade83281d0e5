//! Sign-in handlers.
//!
//! `POST /login` checks credentials and issues the session cookie, `POST
//! /logout` clears it and `GET /me` echoes the claims the authentication
//! stage resolved. Login and logout run behind the public pipeline; `/me`
//! needs the standard one.

use bytes::Bytes;
use http::{header, HeaderValue, StatusCode};
use http_body_util::BodyExt;
use scholar_auth::AuthService;
use scholar_core::{RequestContext, ScholarError, ScholarResult, SessionError};
use scholar_middleware::{BoxFuture, Handler, Request, ResponseWriter};
use scholar_session::CookieSessionStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct LoginForm {
    #[serde(alias = "username")]
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct SignedOut {
    signed_out: bool,
}

fn write_json<T: Serialize>(
    writer: &mut dyn ResponseWriter,
    status: StatusCode,
    value: &T,
) -> ScholarResult<()> {
    let body = serde_json::to_vec(value)
        .map_err(|e| ScholarError::internal_with_source("failed to encode response", e))?;
    writer.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    writer.write_head(status);
    writer.write_all_body(&body)?;
    Ok(())
}

fn cookie_error(error: SessionError) -> ScholarError {
    ScholarError::internal_with_source("failed to build session cookie", error)
}

/// Email and password sign-in.
///
/// Expects a JSON body `{"email": "...", "password": "..."}`. On success
/// the response carries the session cookie and the user as JSON; otherwise
/// `401 Unauthorized`. The reason a sign-in failed is only logged.
#[derive(Debug, Clone)]
pub struct LoginHandler {
    auth: AuthService,
    store: Arc<CookieSessionStore>,
}

impl LoginHandler {
    /// Creates the handler.
    #[must_use]
    pub fn new(auth: AuthService, store: Arc<CookieSessionStore>) -> Self {
        Self { auth, store }
    }

    async fn login(&self, request: Request, writer: &mut dyn ResponseWriter) -> ScholarResult<()> {
        let body: Bytes = match request.into_body().collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        };

        let form: LoginForm = match serde_json::from_slice(&body) {
            Ok(form) => form,
            Err(e) => {
                tracing::debug!(error = %e, "malformed sign-in body");
                writer.write_error(StatusCode::BAD_REQUEST, "Bad Request")?;
                return Ok(());
            }
        };

        let Some(user) = self.auth.basic_auth(&form.email, &form.password).await? else {
            writer.write_error(StatusCode::UNAUTHORIZED, "Unauthorized")?;
            return Ok(());
        };

        let cookie = self
            .store
            .login(&user.session_data())
            .map_err(cookie_error)?;
        writer.headers_mut().append(header::SET_COOKIE, cookie);
        tracing::info!(user_id = user.id, "user signed in");
        write_json(writer, StatusCode::OK, &user)
    }
}

impl Handler for LoginHandler {
    fn call<'a>(
        &'a self,
        _ctx: RequestContext,
        request: Request,
        writer: &'a mut dyn ResponseWriter,
    ) -> BoxFuture<'a, ScholarResult<()>> {
        Box::pin(self.login(request, writer))
    }
}

/// Clears the session cookie.
#[derive(Debug, Clone)]
pub struct LogoutHandler {
    store: Arc<CookieSessionStore>,
}

impl LogoutHandler {
    /// Creates the handler.
    #[must_use]
    pub fn new(store: Arc<CookieSessionStore>) -> Self {
        Self { store }
    }

    fn logout(&self, writer: &mut dyn ResponseWriter) -> ScholarResult<()> {
        let cookie = self.store.logout().map_err(cookie_error)?;
        writer.headers_mut().append(header::SET_COOKIE, cookie);
        write_json(writer, StatusCode::OK, &SignedOut { signed_out: true })
    }
}

impl Handler for LogoutHandler {
    fn call<'a>(
        &'a self,
        _ctx: RequestContext,
        _request: Request,
        writer: &'a mut dyn ResponseWriter,
    ) -> BoxFuture<'a, ScholarResult<()>> {
        Box::pin(std::future::ready(self.logout(writer)))
    }
}

/// Returns the signed-in user's session claims.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionInfoHandler;

impl Handler for SessionInfoHandler {
    fn call<'a>(
        &'a self,
        ctx: RequestContext,
        _request: Request,
        writer: &'a mut dyn ResponseWriter,
    ) -> BoxFuture<'a, ScholarResult<()>> {
        Box::pin(async move {
            let session = ctx.require_session("session_info")?;
            write_json(writer, StatusCode::OK, session)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;
    use scholar_auth::{hash_password, MemoryDirectory, UserRecord, UserStatus};
    use scholar_core::SessionData;
    use scholar_middleware::BufferedResponse;

    const SECRET: &[u8; 64] = b"0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    fn store() -> Arc<CookieSessionStore> {
        Arc::new(CookieSessionStore::from_secret(SECRET).unwrap())
    }

    fn login_handler() -> LoginHandler {
        let directory = MemoryDirectory::new().with_user(UserRecord {
            id: 9,
            username: "mrs.frizzle".to_string(),
            email: "frizzle@school.test".to_string(),
            password_hash: hash_password("magic bus", 4).unwrap(),
            first_name: "Valerie".to_string(),
            last_name: "Frizzle".to_string(),
            status: UserStatus::Enabled,
            is_admin: false,
            is_teacher: true,
        });
        LoginHandler::new(AuthService::new(directory), store())
    }

    fn post(body: &str) -> Request {
        http::Request::builder()
            .method(http::Method::POST)
            .uri("/login")
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap()
    }

    async fn call(handler: &impl Handler, ctx: RequestContext, request: Request) -> BufferedResponse {
        let mut writer = BufferedResponse::new();
        handler.call(ctx, request, &mut writer).await.unwrap();
        writer
    }

    #[tokio::test]
    async fn test_login_sets_cookie() {
        let writer = call(
            &login_handler(),
            RequestContext::new(),
            post(r#"{"email":"frizzle@school.test","password":"magic bus"}"#),
        )
        .await;

        assert_eq!(writer.status(), Some(StatusCode::OK));
        assert!(writer.headers().contains_key(header::SET_COOKIE));
        let json: serde_json::Value = serde_json::from_slice(writer.body()).unwrap();
        assert_eq!(json["id"], 9);
        assert_eq!(json["is_teacher"], true);
        assert!(json.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_login_wrong_password_is_401() {
        let writer = call(
            &login_handler(),
            RequestContext::new(),
            post(r#"{"email":"frizzle@school.test","password":"school bus"}"#),
        )
        .await;

        assert_eq!(writer.status(), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(writer.body(), b"Unauthorized\n");
        assert!(!writer.headers().contains_key(header::SET_COOKIE));
    }

    #[tokio::test]
    async fn test_login_with_username() {
        let writer = call(
            &login_handler(),
            RequestContext::new(),
            post(r#"{"username":"Mrs.Frizzle","password":"magic bus"}"#),
        )
        .await;

        assert_eq!(writer.status(), Some(StatusCode::OK));
        assert!(writer.headers().contains_key(header::SET_COOKIE));
    }

    #[tokio::test]
    async fn test_login_malformed_body_is_400() {
        let writer = call(&login_handler(), RequestContext::new(), post("email=x")).await;
        assert_eq!(writer.status(), Some(StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn test_logout_clears_cookie() {
        let writer = call(&LogoutHandler::new(store()), RequestContext::new(), post("")).await;

        let cookie = writer.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("scholar_session="));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_session_info_echoes_claims() {
        let ctx = RequestContext::new().with_session(SessionData::new(3, "ada").admin());
        let writer = call(&SessionInfoHandler, ctx, post("")).await;

        let data: SessionData = serde_json::from_slice(writer.body()).unwrap();
        assert_eq!(data, SessionData::new(3, "ada").admin());
    }

    #[tokio::test]
    async fn test_session_info_without_session_is_wiring_fault() {
        let mut writer = BufferedResponse::new();
        let err = SessionInfoHandler
            .call(RequestContext::new(), post(""), &mut writer)
            .await
            .unwrap_err();
        assert!(err.is_wiring());
    }
}
