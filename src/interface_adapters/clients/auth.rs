use crate::domain::errors::AuthError;
use crate::domain::ports::{AuthProvider, Clock};
use crate::domain::state::Credential;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

// Thin reqwest client for the authenticator endpoints. Owns the token pair for one session.

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub score: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub nickname: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access: String,
    refresh: String,
    user: User,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    detail: String,
}

#[derive(Debug, Deserialize)]
struct Claims {
    exp: u64,
}

#[derive(Debug)]
pub enum AuthClientError {
    Transport(reqwest::Error),
    Upstream {
        status: StatusCode,
        message: Option<String>,
    },
    Decode(reqwest::Error),
    NotAuthenticated,
}

impl fmt::Display for AuthClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthClientError::Transport(err) => write!(f, "auth transport error: {err}"),
            AuthClientError::Upstream { status, message } => {
                if let Some(message) = message {
                    write!(f, "auth upstream error {status}: {message}")
                } else {
                    write!(f, "auth upstream error {status}")
                }
            }
            AuthClientError::Decode(err) => write!(f, "auth response decode error: {err}"),
            AuthClientError::NotAuthenticated => write!(f, "no access token stored"),
        }
    }
}

impl std::error::Error for AuthClientError {}

/// Wall clock backed by `SystemTime`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_seconds(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Reads the `exp` claim of a JWT without verifying its signature.
pub fn token_expiry(token: &str) -> Option<u64> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    serde_json::from_slice::<Claims>(&bytes).ok().map(|c| c.exp)
}

/// Tokens that cannot be decoded count as expired.
pub fn is_token_expired(token: &str, now_epoch_seconds: u64) -> bool {
    match token_expiry(token) {
        Some(exp) => now_epoch_seconds >= exp,
        None => true,
    }
}

#[derive(Debug, Default)]
struct Tokens {
    access: Option<String>,
    refresh: Option<String>,
}

pub struct RestAuthClient {
    http: Client,
    base_url: String,
    tokens: RwLock<Tokens>,
    clock: Arc<dyn Clock>,
}

impl RestAuthClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            tokens: RwLock::new(Tokens::default()),
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Seeds the token pair, e.g. from configuration.
    pub fn with_tokens(self, access: Option<String>, refresh: Option<String>) -> Self {
        self.store(|tokens| {
            tokens.access = access;
            tokens.refresh = refresh;
        });
        self
    }

    pub fn access_token(&self) -> Option<Credential> {
        self.read(|tokens| tokens.access.clone().map(Credential::new))
    }

    pub fn has_refresh_token(&self) -> bool {
        self.read(|tokens| tokens.refresh.is_some())
    }

    /// Exchanges username and password for a token pair and keeps it.
    pub async fn login(&self, request: &LoginRequest) -> Result<User, AuthClientError> {
        let url = format!("{}/authenticator/token/", self.base_url);
        let res = self
            .http
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(AuthClientError::Transport)?;
        let res = upstream_ok(res).await?;
        let body = res
            .json::<LoginResponse>()
            .await
            .map_err(AuthClientError::Decode)?;

        self.store(|tokens| {
            tokens.access = Some(body.access);
            tokens.refresh = Some(body.refresh);
        });
        info!(user_id = body.user.id, username = %body.user.username, "logged in");
        Ok(body.user)
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<User, AuthClientError> {
        let url = format!("{}/authenticator/register/", self.base_url);
        let res = self
            .http
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(AuthClientError::Transport)?;
        let res = upstream_ok(res).await?;
        res.json::<User>().await.map_err(AuthClientError::Decode)
    }

    /// Profile of the logged-in user; its id is the local player id in battles.
    pub async fn user_info(&self) -> Result<User, AuthClientError> {
        let credential = self
            .access_token()
            .ok_or(AuthClientError::NotAuthenticated)?;
        let url = format!("{}/authenticator/me/", self.base_url);
        let res = self
            .http
            .get(url)
            .bearer_auth(credential.as_str())
            .send()
            .await
            .map_err(AuthClientError::Transport)?;
        let res = upstream_ok(res).await?;
        res.json::<User>().await.map_err(AuthClientError::Decode)
    }

    pub fn logout(&self) {
        self.store(|tokens| *tokens = Tokens::default());
        debug!("tokens cleared");
    }

    fn read<T>(&self, f: impl FnOnce(&Tokens) -> T) -> T {
        let tokens = self.tokens.read().unwrap_or_else(PoisonError::into_inner);
        f(&tokens)
    }

    fn store(&self, f: impl FnOnce(&mut Tokens)) {
        let mut tokens = self.tokens.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut tokens);
    }

    async fn request_refresh(&self, refresh: &str) -> Result<String, AuthError> {
        let url = format!("{}/authenticator/token/refresh/", self.base_url);
        let res = self
            .http
            .post(url)
            .json(&RefreshRequest { refresh })
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            return Err(AuthError::Rejected {
                status: status.as_u16(),
            });
        }

        res.json::<RefreshResponse>()
            .await
            .map(|body| body.access)
            .map_err(|e| AuthError::Decode(e.to_string()))
    }
}

// Keep upstream status/message so callers can tell rejections from outages.
async fn upstream_ok(res: reqwest::Response) -> Result<reqwest::Response, AuthClientError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let message = res
        .json::<ErrorResponse>()
        .await
        .ok()
        .map(|payload| payload.detail);
    Err(AuthClientError::Upstream { status, message })
}

#[async_trait]
impl AuthProvider for RestAuthClient {
    fn is_credential_expired(&self) -> bool {
        let now = self.clock.now_epoch_seconds();
        self.read(|tokens| {
            tokens
                .access
                .as_deref()
                .is_none_or(|token| is_token_expired(token, now))
        })
    }

    async fn refresh_credential(&self) -> Result<Credential, AuthError> {
        let Some(refresh) = self.read(|tokens| tokens.refresh.clone()) else {
            return Err(AuthError::MissingRefreshToken);
        };

        match self.request_refresh(&refresh).await {
            Ok(access) => {
                self.store(|tokens| tokens.access = Some(access.clone()));
                debug!("access token refreshed");
                Ok(Credential::new(access))
            }
            Err(e) => {
                // A failed refresh ends the login session.
                warn!(error = %e, "token refresh failed; clearing tokens");
                self.logout();
                Err(e)
            }
        }
    }

    fn current_credential(&self) -> Option<Credential> {
        self.access_token()
    }
}
