//! Session based authentication.
//!
//! The router does not store users or encrypt cookies itself. It talks to two collaborators:
//! a [`UserStore`] that finds users and a [`CookieCodec`] that turns a map of session values
//! into an opaque cookie token and back. [`Authenticator`] glues them together and caches the
//! resolved user in the [`RequestContext`].

use crate::RequestContext;
use crate::config::AuthenticationSettings;
use http::header::InvalidHeaderValue;
use http::{HeaderMap, HeaderValue, Response};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{debug, warn};

/// One year, the lifetime of a session cookie.
const SESSION_MAX_AGE: i64 = 60 * 60 * 24 * 365;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct User {
    id: String,
    username: String,
    #[serde(default)]
    email: String,
}

impl User {
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self { id: id.into(), username: username.into(), email: String::new() }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

/// The column a user is looked up by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserKey {
    Id,
    Username,
    Email,
}

/// Where users live.
#[cfg_attr(test, mockall::automock)]
pub trait UserStore: Send + Sync {
    fn get_user(&self, key: UserKey, value: &str) -> Option<User>;
}

/// Encodes session values into a cookie token and decodes them back.
#[cfg_attr(test, mockall::automock)]
pub trait CookieCodec: Send + Sync {
    fn encode(&self, name: &str, values: &HashMap<String, String>) -> Result<String, AuthError>;

    fn decode(&self, name: &str, token: &str) -> Result<HashMap<String, String>, AuthError>;
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("cookie encode error: {reason}")]
    Encode { reason: String },

    #[error("cookie decode error: {reason}")]
    Decode { reason: String },

    #[error("invalid header value: {source}")]
    InvalidHeader {
        #[from]
        source: InvalidHeaderValue,
    },
}

impl AuthError {
    pub fn encode<S: ToString>(reason: S) -> Self {
        Self::Encode { reason: reason.to_string() }
    }

    pub fn decode<S: ToString>(reason: S) -> Self {
        Self::Decode { reason: reason.to_string() }
    }
}

/// A [`UserStore`] kept in memory, handy for tests and small deployments.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user: User) {
        let mut users = self.users.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        users.retain(|existing| existing.id != user.id);
        users.push(user);
    }
}

impl UserStore for MemoryUserStore {
    fn get_user(&self, key: UserKey, value: &str) -> Option<User> {
        let users = self.users.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        users
            .iter()
            .find(|user| match key {
                UserKey::Id => user.id.eq_ignore_ascii_case(value),
                UserKey::Username => user.username.eq_ignore_ascii_case(value.trim()),
                UserKey::Email => user.email.eq_ignore_ascii_case(value.trim()),
            })
            .cloned()
    }
}

/// Resolves the user of a request from its session cookie.
pub struct Authenticator {
    settings: AuthenticationSettings,
    login_location: HeaderValue,
    store: Arc<dyn UserStore>,
    codec: Arc<dyn CookieCodec>,
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticator").field("settings", &self.settings).finish_non_exhaustive()
    }
}

impl Authenticator {
    pub fn new(
        settings: AuthenticationSettings,
        store: Arc<dyn UserStore>,
        codec: Arc<dyn CookieCodec>,
    ) -> Result<Self, AuthError> {
        let login_location = HeaderValue::try_from(settings.login_path.as_str())?;
        Ok(Self { settings, login_location, store, codec })
    }

    pub fn settings(&self) -> &AuthenticationSettings {
        &self.settings
    }

    /// Where unauthenticated requests are redirected to.
    pub fn login_location(&self) -> &HeaderValue {
        &self.login_location
    }

    /// The user of this request.
    ///
    /// The first call decodes the session cookie and asks the store; the outcome, found or not,
    /// is cached in the request context for the rest of the request.
    pub fn current_user(&self, req: &mut RequestContext<'_>) -> Option<User> {
        if !req.is_user_resolved() {
            let user = self.user_from_cookie(req.headers());
            req.set_current_user(user);
        }
        req.current_user().cloned()
    }

    fn user_from_cookie(&self, headers: &HeaderMap) -> Option<User> {
        let cookie_name = self.settings.cookie_name.as_str();
        let token = find_cookie(headers, cookie_name)?;

        let values = match self.codec.decode(cookie_name, token) {
            Ok(values) => values,
            Err(e) => {
                debug!(cause = %e, "ignore undecodable session cookie");
                return None;
            }
        };

        let id = values.get("id")?;
        self.store.get_user(UserKey::Id, id)
    }

    /// Writes the session cookie for `user` into `response`, or a cookie expiring the session
    /// when `user` is `None`.
    pub fn set_user<B>(&self, response: &mut Response<B>, user: Option<&User>) -> Result<(), AuthError> {
        let mut values = HashMap::new();
        let mut max_age = 0;
        if let Some(user) = user {
            values.insert("id".to_owned(), user.id.clone());
            values.insert("username".to_owned(), user.username.clone());
            max_age = SESSION_MAX_AGE;
        }

        let cookie_name = self.settings.cookie_name.as_str();
        let token = self.codec.encode(cookie_name, &values).inspect_err(|e| {
            warn!(cause = %e, "failed to encode session cookie");
        })?;

        let cookie = format!("{cookie_name}={token}; Path=/; Max-Age={max_age}; HttpOnly");
        response.headers_mut().append(http::header::SET_COOKIE, HeaderValue::try_from(cookie)?);
        Ok(())
    }
}

fn find_cookie<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers
        .get_all(http::header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find_map(|(key, value)| (key == name).then_some(value))
}
