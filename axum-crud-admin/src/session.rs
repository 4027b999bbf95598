//! Cookie-backed sessions
//!
//! The whole session lives client-side in one HttpOnly cookie holding an
//! HS256-signed token: the logged-in user id plus one-shot flash messages.
//! Handlers extract a [`Session`], mutate it, and return it as part of the
//! response; the cookie is only re-issued when something changed.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderValue},
    response::{IntoResponseParts, ResponseParts},
};
use chrono::{Duration, Utc};
use cookie::{Cookie, SameSite};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use thiserror::Error;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "crud_admin_session";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session token could not be signed: {0}")]
    Encode(#[from] jsonwebtoken::errors::Error),

    #[error("session cookie is not a valid header value")]
    Header(#[from] axum::http::header::InvalidHeaderValue),
}

/// Signed session claims
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct SessionClaims {
    /// Logged-in user id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sub: Option<i64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    flashes: Vec<String>,

    #[serde(default)]
    iat: i64,

    #[serde(default)]
    exp: i64,
}

/// Signing keys and cookie settings shared by every request
#[derive(Clone)]
pub struct SessionKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
    secure: bool,
}

impl SessionKeys {
    /// Create keys from a shared secret
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl: Duration::hours(24),
            secure: false,
        }
    }

    /// Lifetime of a session after its last change
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Only send the cookie over HTTPS
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    fn sign(&self, claims: &SessionClaims) -> Result<String, SessionError> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)?)
    }

    fn verify(&self, token: &str) -> Option<SessionClaims> {
        let validation = Validation::new(Algorithm::HS256);
        match decode::<SessionClaims>(token, &self.decoding_key, &validation) {
            Ok(token_data) => Some(token_data.claims),
            Err(error) => {
                tracing::debug!(%error, "discarding invalid session cookie");
                None
            }
        }
    }
}

/// Per-request session state
pub struct Session {
    claims: SessionClaims,
    keys: SessionKeys,
    changed: bool,
}

impl Session {
    fn new(keys: SessionKeys, claims: SessionClaims) -> Self {
        Self {
            claims,
            keys,
            changed: false,
        }
    }

    /// Id of the logged-in user
    pub fn user_id(&self) -> Option<i64> {
        self.claims.sub
    }

    pub fn log_in(&mut self, user_id: i64) {
        self.claims.sub = Some(user_id);
        self.changed = true;
    }

    pub fn log_out(&mut self) {
        self.claims.sub = None;
        self.changed = true;
    }

    /// Queue a message for the next rendered page
    pub fn add_flash(&mut self, message: impl Into<String>) {
        self.claims.flashes.push(message.into());
        self.changed = true;
    }

    /// Remove and return queued messages
    pub fn take_flashes(&mut self) -> Vec<String> {
        if self.claims.flashes.is_empty() {
            return Vec::new();
        }
        self.changed = true;
        std::mem::take(&mut self.claims.flashes)
    }

    fn set_cookie_header(&self) -> Result<HeaderValue, SessionError> {
        let now = Utc::now();
        let claims = SessionClaims {
            iat: now.timestamp(),
            exp: (now + self.keys.ttl).timestamp(),
            ..self.claims.clone()
        };
        let token = self.keys.sign(&claims)?;

        let cookie = Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .secure(self.keys.secure)
            .same_site(SameSite::Lax)
            .max_age(cookie::time::Duration::seconds(self.keys.ttl.num_seconds()))
            .build();
        Ok(HeaderValue::from_str(&cookie.to_string())?)
    }

    /// A `Cookie` header value for an already logged-in user
    #[cfg(test)]
    pub(crate) fn cookie_for_user(keys: &SessionKeys, user_id: i64) -> String {
        let mut session = Session::new(keys.clone(), SessionClaims::default());
        session.log_in(user_id);
        let header = session.set_cookie_header().expect("session cookie");
        let cookie = Cookie::parse(header.to_str().expect("ascii cookie")).expect("valid cookie");
        format!("{}={}", cookie.name(), cookie.value())
    }
}

/// Value of the named cookie, with optional surrounding quotes removed
fn find_cookie(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value_trimmed().to_string())
}

impl<S> FromRequestParts<S> for Session
where
    SessionKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = SessionKeys::from_ref(state);
        let claims = find_cookie(parts, SESSION_COOKIE)
            .and_then(|token| keys.verify(&token))
            .unwrap_or_default();
        Ok(Session::new(keys, claims))
    }
}

impl IntoResponseParts for Session {
    type Error = Infallible;

    fn into_response_parts(self, mut response: ResponseParts) -> Result<ResponseParts, Self::Error> {
        if self.changed {
            match self.set_cookie_header() {
                Ok(cookie) => {
                    response.headers_mut().append(header::SET_COOKIE, cookie);
                }
                Err(error) => tracing::error!(%error, "failed to issue session cookie"),
            }
        }
        Ok(response)
    }
}
