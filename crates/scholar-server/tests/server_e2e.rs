//! End-to-end tests for the server host: sign-in, the standard pipeline,
//! static files and a real TCP round trip.

use bytes::Bytes;
use flate2::read::GzDecoder;
use http::{header, Method, StatusCode};
use http_body_util::{BodyExt, Full};
use scholar_auth::{hash_password, AuthService, MemoryDirectory, UserRecord, UserStatus};
use scholar_config::{ScholarConfig, SessionConfig};
use scholar_core::SessionData;
use scholar_middleware::{Request, Response};
use scholar_server::{Server, ShutdownSignal};
use std::io::Read;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const SECRET: &str = "scholar-e2e-secret-scholar-e2e-secret-scholar-e2e-secret-0123456";

struct Site {
    _root: TempDir,
    config: ScholarConfig,
}

fn site() -> Site {
    let root = TempDir::new().unwrap();
    std::fs::write(root.path().join("hello.txt"), "hello from disk").unwrap();
    std::fs::write(root.path().join(".secret"), "nope").unwrap();

    let mut config = ScholarConfig {
        session: SessionConfig {
            secret: Some(SECRET.to_string()),
            ..SessionConfig::default()
        },
        ..ScholarConfig::default()
    };
    config.static_files.enabled = true;
    config.static_files.root = root.path().display().to_string();
    config.server.shutdown_timeout_secs = 1;

    Site {
        _root: root,
        config,
    }
}

fn auth() -> AuthService {
    AuthService::new(MemoryDirectory::new().with_user(UserRecord {
        id: 21,
        username: "Ms.Honey".to_string(),
        email: "honey@school.test".to_string(),
        password_hash: hash_password("trunchbull", 4).unwrap(),
        first_name: "Jennifer".to_string(),
        last_name: "Honey".to_string(),
        status: UserStatus::Enabled,
        is_admin: false,
        is_teacher: true,
    }))
}

fn server(site: &Site) -> Server {
    Server::application(&site.config, auth()).unwrap()
}

fn request(method: Method, path: &str, headers: &[(header::HeaderName, &str)], body: &str) -> Request {
    let mut builder = http::Request::builder().method(method).uri(path);
    for (name, value) in headers {
        builder = builder.header(name, *value);
    }
    builder.body(Full::new(Bytes::from(body.to_string()))).unwrap()
}

async fn body(response: Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

fn gunzip(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    GzDecoder::new(bytes).read_to_end(&mut out).unwrap();
    out
}

async fn sign_in(server: &Server) -> String {
    let response = server
        .handle(request(
            Method::POST,
            "/login",
            &[(header::CONTENT_TYPE, "application/json")],
            r#"{"email":"honey@school.test","password":"trunchbull"}"#,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

#[tokio::test]
async fn test_sign_in_then_session_info_is_gzipped() {
    let site = site();
    let server = server(&site);
    let cookie = sign_in(&server).await;

    let response = server
        .handle(request(
            Method::GET,
            "/me",
            &[
                (header::COOKIE, cookie.as_str()),
                (header::ACCEPT_ENCODING, "gzip, deflate"),
            ],
            "",
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_ENCODING], "gzip");
    let data: SessionData = serde_json::from_slice(&gunzip(&body(response).await)).unwrap();
    assert_eq!(data.user_id, 21);
    assert_eq!(data.username, "ms.honey");
    assert!(data.is_teacher);
}

#[tokio::test]
async fn test_session_info_without_cookie_is_401() {
    let site = site();
    let response = server(&site)
        .handle(request(Method::GET, "/me", &[], ""))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body(response).await, b"Unauthorized\n");
}

#[tokio::test]
async fn test_wrong_password_is_401_without_cookie() {
    let site = site();
    let response = server(&site)
        .handle(request(
            Method::POST,
            "/login",
            &[],
            r#"{"email":"honey@school.test","password":"matilda"}"#,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_logout_cookie_no_longer_authenticates() {
    let site = site();
    let server = server(&site);
    let _ = sign_in(&server).await;

    let response = server
        .handle(request(Method::POST, "/logout", &[], ""))
        .await;
    let cleared = response.headers()[header::SET_COOKIE].to_str().unwrap();
    let pair = cleared.split(';').next().unwrap().to_string();

    let response = server
        .handle(request(Method::GET, "/me", &[(header::COOKIE, pair.as_str())], ""))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_static_file_is_served_compressed() {
    let site = site();
    let response = server(&site)
        .handle(request(
            Method::GET,
            "/static/hello.txt",
            &[(header::ACCEPT_ENCODING, "gzip")],
            "",
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/plain; charset=utf-8"
    );
    assert_eq!(gunzip(&body(response).await), b"hello from disk");
}

#[tokio::test]
async fn test_static_head_with_gzip_has_no_body() {
    let site = site();
    let response = server(&site)
        .handle(request(
            Method::HEAD,
            "/static/hello.txt",
            &[(header::ACCEPT_ENCODING, "gzip")],
            "",
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::CONTENT_ENCODING).is_none());
    assert_eq!(response.headers()[header::VARY], "Accept-Encoding");
    assert!(body(response).await.is_empty());
}

#[tokio::test]
async fn test_static_directory_is_404() {
    let site = site();
    let response = server(&site)
        .handle(request(Method::GET, "/static/", &[], ""))
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body(response).await, b"404 page not found\n");
}

#[tokio::test]
async fn test_static_hidden_file_is_403() {
    let site = site();
    let response = server(&site)
        .handle(request(Method::GET, "/static/.secret", &[], ""))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_login_with_get_is_405() {
    let site = site();
    let response = server(&site)
        .handle(request(Method::GET, "/login", &[], ""))
        .await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[test]
fn test_unknown_path_is_404() {
    let site = site();
    let server = server(&site);
    let response = tokio_test::block_on(server.handle(request(Method::GET, "/nowhere", &[], "")));
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_tcp_round_trip_and_shutdown() {
    let site = site();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = ShutdownSignal::new();
    let running = tokio::spawn(server(&site).serve(listener, shutdown.clone()));

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /static/hello.txt HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let raw = String::from_utf8(raw).unwrap();

    assert!(raw.starts_with("HTTP/1.1 200 OK"), "unexpected response: {raw}");
    assert!(raw.ends_with("hello from disk"));

    shutdown.trigger();
    running.await.unwrap().unwrap();
}
