use std::collections::HashMap;
use std::sync::Mutex;

use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Cookie, CookieJar, Key, SameSite};
use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use chrono::{DateTime, Duration, Utc};
use futures::future::{ready, Ready};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "sid";
pub const SESSION_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub authenticated: bool,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Server-side session records keyed by an opaque token. The token travels
/// in a cookie signed with a key derived from the configured secret.
pub struct SessionStore {
    key: Key,
    secure: bool,
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new(secret: &str, secure: bool) -> Self {
        let master = Sha256::digest(secret.as_bytes());
        Self {
            key: Key::derive_from(&master),
            secure,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Starts an authenticated session and returns the signed cookie for it.
    pub fn login(&self) -> Result<Cookie<'static>, ApiError> {
        let now = Utc::now();
        let token = Uuid::new_v4().simple().to_string();
        let session = Session {
            authenticated: true,
            expires_at: now + Duration::seconds(SESSION_TTL_SECS),
        };

        {
            let mut sessions = self
                .sessions
                .lock()
                .map_err(|_| ApiError::Internal("No se pudo iniciar la sesión.".into()))?;
            sessions.retain(|_, s| s.is_live(now));
            sessions.insert(token.clone(), session);
        }

        let mut jar = CookieJar::new();
        jar.signed_mut(&self.key).add(
            Cookie::build(SESSION_COOKIE, token)
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .secure(self.secure)
                .max_age(CookieDuration::seconds(SESSION_TTL_SECS))
                .finish(),
        );
        jar.get(SESSION_COOKIE)
            .cloned()
            .ok_or_else(|| ApiError::Internal("No se pudo iniciar la sesión.".into()))
    }

    /// The live session behind the request cookie, if its signature checks out.
    pub fn lookup(&self, req: &HttpRequest) -> Option<Session> {
        let token = self.token(req)?;
        let mut sessions = self.sessions.lock().ok()?;
        let session = *sessions.get(&token)?;
        if session.is_live(Utc::now()) {
            Some(session)
        } else {
            sessions.remove(&token);
            None
        }
    }

    pub fn logout(&self, req: &HttpRequest) -> Result<(), ApiError> {
        if let Some(token) = self.token(req) {
            self.sessions
                .lock()
                .map_err(|_| ApiError::Internal("No se pudo cerrar la sesión.".into()))?
                .remove(&token);
        }
        Ok(())
    }

    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(SESSION_COOKIE, "").path("/").finish();
        cookie.make_removal();
        cookie
    }

    fn token(&self, req: &HttpRequest) -> Option<String> {
        let mut jar = CookieJar::new();
        jar.add_original(req.cookie(SESSION_COOKIE)?);
        let verified = jar.signed(&self.key).get(SESSION_COOKIE)?;
        Some(verified.value().to_string())
    }
}

/// The single admin account.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    username: String,
    password_hash: String,
}

impl AdminCredentials {
    pub fn new(username: impl Into<String>, password_hash: &str) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.trim().to_ascii_lowercase(),
        }
    }

    pub fn verify(&self, username: &str, password: &str) -> bool {
        username == self.username && sha256_hex(password) == self.password_hash
    }
}

pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Extractor for routes reserved to a logged-in admin. Anyone else is sent
/// to the login page.
#[derive(Debug, Clone, Copy)]
pub struct AdminSession;

impl FromRequest for AdminSession {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let authenticated = req
            .app_data::<web::Data<AppState>>()
            .and_then(|state| state.sessions.lookup(req))
            .map_or(false, |session| session.authenticated);
        ready(if authenticated {
            Ok(AdminSession)
        } else {
            Err(ApiError::LoginRequired)
        })
    }
}
