//! The cookie session store.

use std::fmt;
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use cookie::{Cookie, CookieJar, Key, SameSite};
use http::{header, HeaderMap, HeaderValue};
use scholar_config::{SessionConfig, MIN_SESSION_SECRET_LEN};
use scholar_core::{
    Session, SessionData, SessionError, SessionStore, SESSION_COOKIE_NAME, SESSION_DATA_KEY,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors building a store's signing key.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    /// No secret was configured.
    #[error("session secret is not configured")]
    MissingSecret,

    /// The secret is too short to derive a signing key from.
    #[error("session secret must be at least {MIN_SESSION_SECRET_LEN} bytes, got {len}")]
    SecretTooShort {
        /// Length of the rejected secret.
        len: usize,
    },
}

/// Cookie attributes for issued sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Cookie name.
    pub cookie_name: String,
    /// `Path` attribute.
    pub path: String,
    /// Lifetime, sent as `Max-Age` and enforced on resolve.
    pub max_age: Duration,
    /// `Secure` attribute.
    pub secure: bool,
    /// `HttpOnly` attribute.
    pub http_only: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            cookie_name: SESSION_COOKIE_NAME.to_string(),
            path: "/".to_string(),
            max_age: Duration::from_secs(86_400 * 30),
            secure: false,
            http_only: true,
        }
    }
}

impl From<&SessionConfig> for SessionOptions {
    fn from(config: &SessionConfig) -> Self {
        Self {
            cookie_name: config.cookie_name.clone(),
            path: config.path.clone(),
            max_age: Duration::from_secs(config.max_age_secs),
            secure: config.secure,
            http_only: config.http_only,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    values: serde_json::Map<String, serde_json::Value>,
    expires_at: i64,
}

/// Session store keeping all session state in an HMAC-signed cookie.
///
/// # Example
///
/// ```
/// use http::{header, HeaderMap};
/// use scholar_core::{SessionData, SessionStore, SESSION_COOKIE_NAME};
/// use scholar_session::CookieSessionStore;
///
/// let store = CookieSessionStore::from_secret(&[42u8; 64]).unwrap();
/// let set_cookie = store.login(&SessionData::new(1, "jdoe")).unwrap();
///
/// // Echo the cookie back the way a browser would.
/// let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
/// let mut headers = HeaderMap::new();
/// headers.insert(header::COOKIE, pair.parse().unwrap());
///
/// let session = store.resolve(&headers, SESSION_COOKIE_NAME).unwrap();
/// assert!(!session.is_new());
/// ```
pub struct CookieSessionStore {
    key: Key,
    options: SessionOptions,
}

impl fmt::Debug for CookieSessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieSessionStore")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl CookieSessionStore {
    /// Creates a store from a signing key and cookie options.
    #[must_use]
    pub fn new(key: Key, options: SessionOptions) -> Self {
        Self { key, options }
    }

    /// Creates a store with default options, deriving the key from `secret`.
    pub fn from_secret(secret: &[u8]) -> Result<Self, KeyError> {
        Ok(Self::new(derive_key(secret)?, SessionOptions::default()))
    }

    /// Creates a store from the `[session]` configuration section.
    pub fn from_config(config: &SessionConfig) -> Result<Self, KeyError> {
        let secret = config.secret.as_deref().ok_or(KeyError::MissingSecret)?;
        Ok(Self::new(
            derive_key(secret.as_bytes())?,
            SessionOptions::from(config),
        ))
    }

    /// Cookie options of this store.
    #[must_use]
    pub const fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Encodes and signs `session`, returning a `Set-Cookie` header value.
    pub fn issue(&self, session: &Session) -> Result<HeaderValue, SessionError> {
        let max_age = i64::try_from(self.options.max_age.as_secs()).unwrap_or(i64::MAX);
        let envelope = Envelope {
            values: session.values().clone(),
            expires_at: Utc::now().timestamp().saturating_add(max_age),
        };
        let json =
            serde_json::to_vec(&envelope).map_err(|e| SessionError::Encode(e.to_string()))?;

        let mut jar = CookieJar::new();
        jar.signed_mut(&self.key).add(
            self.cookie(session.name().to_string(), URL_SAFE_NO_PAD.encode(json))
                .max_age(cookie::time::Duration::seconds(max_age)),
        );
        let signed = jar
            .get(session.name())
            .ok_or_else(|| SessionError::Encode("signed cookie missing from jar".to_string()))?;

        to_header_value(signed)
    }

    /// Returns a `Set-Cookie` header value that deletes the cookie `name`.
    pub fn invalidate(&self, name: &str) -> Result<HeaderValue, SessionError> {
        let mut removal = self.cookie(name.to_string(), String::new()).build();
        removal.make_removal();
        to_header_value(&removal)
    }

    /// Issues a fresh session carrying `data` under the well-known key.
    pub fn login(&self, data: &SessionData) -> Result<HeaderValue, SessionError> {
        let mut session = Session::new(self.options.cookie_name.clone());
        session.insert(SESSION_DATA_KEY, data)?;
        tracing::debug!(user_id = data.user_id, "issuing session cookie");
        self.issue(&session)
    }

    /// Clears this store's session cookie.
    pub fn logout(&self) -> Result<HeaderValue, SessionError> {
        self.invalidate(&self.options.cookie_name)
    }

    fn cookie(&self, name: String, value: String) -> cookie::CookieBuilder<'static> {
        Cookie::build((name, value))
            .path(self.options.path.clone())
            .http_only(self.options.http_only)
            .secure(self.options.secure)
            .same_site(SameSite::Lax)
    }

    fn decode(value: &str) -> Result<Envelope, SessionError> {
        let json = URL_SAFE_NO_PAD
            .decode(value)
            .map_err(|e| SessionError::Malformed(e.to_string()))?;
        serde_json::from_slice(&json).map_err(|e| SessionError::Malformed(e.to_string()))
    }
}

impl SessionStore for CookieSessionStore {
    fn resolve(&self, headers: &HeaderMap, name: &str) -> Result<Session, SessionError> {
        let raw = find_cookie(headers, name).ok_or(SessionError::Missing)?;

        let mut jar = CookieJar::new();
        jar.add_original(Cookie::new(name.to_string(), raw));
        let verified = jar
            .signed(&self.key)
            .get(name)
            .ok_or(SessionError::InvalidSignature)?;

        let envelope = Self::decode(verified.value())?;
        if envelope.expires_at <= Utc::now().timestamp() {
            return Err(SessionError::Expired);
        }

        Ok(Session::from_values(name, envelope.values))
    }
}

fn derive_key(secret: &[u8]) -> Result<Key, KeyError> {
    if secret.len() < MIN_SESSION_SECRET_LEN {
        return Err(KeyError::SecretTooShort { len: secret.len() });
    }
    Key::try_from(secret).map_err(|_| KeyError::SecretTooShort { len: secret.len() })
}

/// Finds the value of cookie `name` across all `Cookie` headers.
fn find_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == name)
        .map(|c| c.value().to_string())
}

fn to_header_value(cookie: &Cookie<'_>) -> Result<HeaderValue, SessionError> {
    HeaderValue::from_str(&cookie.to_string()).map_err(|e| SessionError::Encode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: [u8; 64] = [7u8; 64];

    fn store() -> CookieSessionStore {
        CookieSessionStore::from_secret(&SECRET).unwrap()
    }

    /// Turns a `Set-Cookie` value into the request headers a browser would send.
    fn echo(set_cookie: &HeaderValue) -> HeaderMap {
        let parsed = Cookie::parse(set_cookie.to_str().unwrap().to_string()).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            format!("theme=dark; {}={}", parsed.name(), parsed.value())
                .parse()
                .unwrap(),
        );
        headers
    }

    #[test]
    fn test_login_then_resolve() {
        let store = store();
        let data = SessionData::new(12, "mr.b").teacher();

        let headers = echo(&store.login(&data).unwrap());
        let session = store.resolve(&headers, SESSION_COOKIE_NAME).unwrap();

        assert_eq!(session.typed_record::<SessionData>(SESSION_DATA_KEY), Some(data));
        assert_eq!(session.name(), SESSION_COOKIE_NAME);
    }

    #[test]
    fn test_issued_cookie_attributes() {
        let value = store().login(&SessionData::new(1, "a")).unwrap();
        let text = value.to_str().unwrap();
        assert!(text.starts_with("scholar_session="));
        assert!(text.contains("HttpOnly"));
        assert!(text.contains("SameSite=Lax"));
        assert!(text.contains("Path=/"));
        assert!(text.contains("Max-Age=2592000"));
        assert!(!text.contains("Secure"));
    }

    #[test]
    fn test_missing_cookie() {
        let mut headers = HeaderMap::new();
        assert!(matches!(
            store().resolve(&headers, SESSION_COOKIE_NAME),
            Err(SessionError::Missing)
        ));

        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark"));
        assert!(matches!(
            store().resolve(&headers, SESSION_COOKIE_NAME),
            Err(SessionError::Missing)
        ));
    }

    #[test]
    fn test_tampered_cookie_fails_signature() {
        let store = store();
        let set_cookie = store.login(&SessionData::new(1, "student")).unwrap();
        let parsed = Cookie::parse(set_cookie.to_str().unwrap().to_string()).unwrap();

        let forged = URL_SAFE_NO_PAD.encode(
            br#"{"values":{"data":{"user_id":1,"username":"student","is_admin":true}},"expires_at":99999999999}"#,
        );
        // Keep the original MAC, swap the payload.
        let mac = &parsed.value()[..44];
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            format!("{SESSION_COOKIE_NAME}={mac}{forged}").parse().unwrap(),
        );

        assert!(matches!(
            store.resolve(&headers, SESSION_COOKIE_NAME),
            Err(SessionError::InvalidSignature)
        ));
    }

    #[test]
    fn test_other_key_fails_signature() {
        let headers = echo(&store().login(&SessionData::new(1, "a")).unwrap());
        let other = CookieSessionStore::from_secret(&[8u8; 64]).unwrap();
        assert!(matches!(
            other.resolve(&headers, SESSION_COOKIE_NAME),
            Err(SessionError::InvalidSignature)
        ));
    }

    #[test]
    fn test_signed_garbage_is_malformed() {
        let store = store();
        let mut jar = CookieJar::new();
        jar.signed_mut(&store.key)
            .add(Cookie::new(SESSION_COOKIE_NAME, "not base64 json!"));
        let signed = jar.get(SESSION_COOKIE_NAME).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            format!("{}={}", signed.name(), signed.value()).parse().unwrap(),
        );

        assert!(matches!(
            store.resolve(&headers, SESSION_COOKIE_NAME),
            Err(SessionError::Malformed(_))
        ));
    }

    #[test]
    fn test_expired_session() {
        let store = CookieSessionStore::new(
            Key::from(&SECRET),
            SessionOptions {
                max_age: Duration::ZERO,
                ..Default::default()
            },
        );
        let headers = echo(&store.login(&SessionData::new(1, "a")).unwrap());
        assert!(matches!(
            store.resolve(&headers, SESSION_COOKIE_NAME),
            Err(SessionError::Expired)
        ));
    }

    #[test]
    fn test_logout_clears_cookie() {
        let value = store().logout().unwrap();
        let text = value.to_str().unwrap();
        assert!(text.starts_with("scholar_session=;"));
        assert!(text.contains("Max-Age=0"));
    }

    #[test]
    fn test_short_secret_rejected() {
        assert_eq!(
            CookieSessionStore::from_secret(&[1u8; 32]).unwrap_err(),
            KeyError::SecretTooShort { len: 32 }
        );
    }

    #[test]
    fn test_from_config() {
        let mut config = SessionConfig::default();
        assert_eq!(
            CookieSessionStore::from_config(&config).unwrap_err(),
            KeyError::MissingSecret
        );

        config.secret = Some("z".repeat(64));
        config.cookie_name = "sid".to_string();
        config.secure = true;
        let store = CookieSessionStore::from_config(&config).unwrap();
        assert_eq!(store.options().cookie_name, "sid");

        let text = store.logout().unwrap();
        assert!(text.to_str().unwrap().contains("Secure"));
    }

    #[test]
    fn test_debug_hides_key() {
        let debug = format!("{:?}", store());
        assert!(debug.contains("CookieSessionStore"));
        assert!(!debug.contains("key"));
    }
}
