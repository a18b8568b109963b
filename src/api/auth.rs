//! Passwordless sign-in against the hosted auth service.
//!
//! The current session lives in a `watch` channel so the UI loop can react to
//! sign-in, refresh and sign-out without polling the service.

use chrono::Utc;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use super::{check, read_json, ApiError, SessionStore};
use crate::config::Config;
use crate::models::{Session, User};

/// Refresh the access token when it has less than this many seconds left.
const REFRESH_LEEWAY_SECS: i64 = 60;

/// Fallback lifetime when the service omits both `expires_at` and `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

const TOO_MANY_REQUESTS: &str = "Too many requests. Please wait a few minutes before trying again.";
const TOO_MANY_EMAILS: &str =
    "Too many emails sent. Please wait a few minutes before requesting another magic link.";
const INVALID_EMAIL: &str = "Please enter a valid email address.";
const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    token_type: Option<String>,
    expires_in: Option<i64>,
    expires_at: Option<i64>,
    user: User,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        Session {
            expires_at: expiry(self.expires_at, self.expires_in),
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            token_type: self.token_type.unwrap_or_else(|| "bearer".to_string()),
            user: self.user,
        }
    }
}

fn expiry(expires_at: Option<i64>, expires_in: Option<i64>) -> i64 {
    expires_at.unwrap_or_else(|| {
        Utc::now().timestamp() + expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS)
    })
}

pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    redirect_url: Option<String>,
    store: SessionStore,
    session_tx: watch::Sender<Option<Session>>,
}

impl AuthClient {
    /// Create the client, restoring any session saved by a previous run.
    pub fn new(config: &Config, http: reqwest::Client, store: SessionStore) -> Self {
        let saved = store.load();
        if let Some(session) = &saved {
            debug!(user_id = %session.user.id, "restored saved session");
        }
        let (session_tx, _) = watch::channel(saved);

        Self {
            http,
            base_url: format!("{}/auth/v1", config.supabase_url),
            anon_key: config.supabase_anon_key.clone(),
            redirect_url: config.redirect_url.clone(),
            store,
            session_tx,
        }
    }

    /// Subscribe to session changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.session_tx.subscribe()
    }

    pub fn session(&self) -> Option<Session> {
        self.session_tx.borrow().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.session_tx.borrow().as_ref().map(|s| s.user.clone())
    }

    pub fn is_signed_in(&self) -> bool {
        self.session_tx.borrow().is_some()
    }

    fn set_session(&self, session: Option<Session>) {
        let persisted = match &session {
            Some(session) => self.store.save(session),
            None => self.store.clear(),
        };
        if let Err(err) = persisted {
            warn!(error = %err, "failed to persist session");
        }
        self.session_tx.send_replace(session);
    }

    /// Ask the service to email a magic link (and one-time code) to `email`.
    #[instrument(skip_all)]
    pub async fn send_magic_link(&self, email: &str) -> Result<(), ApiError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ApiError::InvalidInput("Please add your email first.".to_string()));
        }

        let mut request = self
            .http
            .post(format!("{}/otp", self.base_url))
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "create_user": true }));
        if let Some(redirect) = &self.redirect_url {
            request = request.query(&[("redirect_to", redirect)]);
        }

        check(request.send().await?).await?;
        info!("magic link requested");
        Ok(())
    }

    /// Finish sign-in with whatever the user pasted from the email: either
    /// the one-time code or the full magic link.
    pub async fn complete_sign_in(&self, email: &str, input: &str) -> Result<Session, ApiError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ApiError::InvalidInput(
                "Paste the code or link from your email.".to_string(),
            ));
        }
        if looks_like_link(input) {
            self.sign_in_with_link(input).await
        } else {
            self.verify_code(email, input).await
        }
    }

    /// Exchange the emailed one-time code for a session.
    #[instrument(skip_all)]
    pub async fn verify_code(&self, email: &str, code: &str) -> Result<Session, ApiError> {
        let response = self
            .http
            .post(format!("{}/verify", self.base_url))
            .header("apikey", &self.anon_key)
            .json(&json!({ "type": "email", "email": email.trim(), "token": code.trim() }))
            .send()
            .await?;

        let session = read_json::<TokenResponse>(response).await?.into_session();
        info!(user_id = %session.user.id, "signed in with one-time code");
        self.set_session(Some(session.clone()));
        Ok(session)
    }

    /// Sign in from a magic link redirect URL carrying the tokens in its
    /// fragment (`#access_token=...&refresh_token=...`).
    #[instrument(skip_all)]
    pub async fn sign_in_with_link(&self, link: &str) -> Result<Session, ApiError> {
        let tokens = LinkTokens::parse(link)?;
        let user = self.fetch_user(&tokens.access_token).await?;

        let session = Session {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: tokens.token_type,
            expires_at: tokens.expires_at,
            user,
        };
        info!(user_id = %session.user.id, "signed in with magic link");
        self.set_session(Some(session.clone()));
        Ok(session)
    }

    async fn fetch_user(&self, access_token: &str) -> Result<User, ApiError> {
        let response = self
            .http
            .get(format!("{}/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;
        read_json(response).await
    }

    /// A valid access token, refreshing the session first when it is about
    /// to expire.
    pub async fn access_token(&self) -> Result<String, ApiError> {
        let session = self.session().ok_or(ApiError::NotAuthenticated)?;
        if !session.expires_within(REFRESH_LEEWAY_SECS) {
            return Ok(session.access_token);
        }
        Ok(self.refresh(&session).await?.access_token)
    }

    /// Trade the refresh token for a new session. A rejected refresh token
    /// signs the user out.
    #[instrument(skip_all, fields(user_id = %session.user.id))]
    async fn refresh(&self, session: &Session) -> Result<Session, ApiError> {
        let response = self
            .http
            .post(format!("{}/token", self.base_url))
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", &self.anon_key)
            .json(&json!({ "refresh_token": session.refresh_token }))
            .send()
            .await?;

        match read_json::<TokenResponse>(response).await {
            Ok(token) => {
                let refreshed = token.into_session();
                debug!("session refreshed");
                self.set_session(Some(refreshed.clone()));
                Ok(refreshed)
            }
            Err(err) if err.status().is_some_and(|s| s.is_client_error()) => {
                warn!(error = %err, "refresh token rejected, signing out");
                self.set_session(None);
                Err(ApiError::NotAuthenticated)
            }
            Err(err) => Err(err),
        }
    }

    /// Check a restored session against the service on startup.
    ///
    /// Network failures keep the session so the app still opens offline;
    /// an explicit rejection clears it.
    pub async fn resolve_session(&self) -> Option<User> {
        let token = match self.access_token().await {
            Ok(token) => token,
            Err(ApiError::NotAuthenticated) => return None,
            Err(err) => {
                warn!(error = %err, "could not refresh session");
                return self.user();
            }
        };

        match self.fetch_user(&token).await {
            Ok(user) => Some(user),
            Err(err) if err.is_unauthorized() || err.status() == Some(StatusCode::FORBIDDEN) => {
                warn!(error = %err, "saved session rejected");
                self.set_session(None);
                None
            }
            Err(err) => {
                warn!(error = %err, "could not verify session");
                self.user()
            }
        }
    }

    /// Sign out locally, and revoke the session remotely when possible.
    #[instrument(skip_all)]
    pub async fn sign_out(&self) -> Result<(), ApiError> {
        let Some(session) = self.session() else {
            return Ok(());
        };

        let result = self
            .http
            .post(format!("{}/logout", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await;

        self.set_session(None);

        match result {
            Ok(response) => match check(response).await {
                Ok(_) => {}
                Err(err) if err.is_unauthorized() => {}
                Err(err) => warn!(error = %err, "remote sign-out failed"),
            },
            Err(err) => warn!(error = %err, "remote sign-out failed"),
        }
        info!(user_id = %session.user.id, "signed out");
        Ok(())
    }

    /// Sign out if `err` shows the backend no longer accepts the session.
    /// Returns whether the session was ended.
    pub async fn end_session_if_rejected(&self, err: &ApiError) -> bool {
        if !err.is_unauthorized() {
            return false;
        }
        if let Err(sign_out_err) = self.sign_out().await {
            warn!(error = %sign_out_err, "sign-out after rejected token failed");
        }
        true
    }
}

fn looks_like_link(input: &str) -> bool {
    input.contains("://") || input.starts_with('#') || input.contains("access_token=")
}

struct LinkTokens {
    access_token: String,
    refresh_token: String,
    token_type: String,
    expires_at: i64,
}

impl LinkTokens {
    fn parse(link: &str) -> Result<Self, ApiError> {
        let params = link_params(link);
        let find = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        };

        if let Some(description) = find("error_description").or_else(|| find("error")) {
            return Err(ApiError::InvalidInput(description));
        }

        let (Some(access_token), Some(refresh_token)) = (find("access_token"), find("refresh_token"))
        else {
            return Err(ApiError::InvalidInput(
                "That link does not contain a sign-in token.".to_string(),
            ));
        };

        Ok(Self {
            access_token,
            refresh_token,
            token_type: find("token_type").unwrap_or_else(|| "bearer".to_string()),
            expires_at: expiry(
                find("expires_at").and_then(|v| v.parse().ok()),
                find("expires_in").and_then(|v| v.parse().ok()),
            ),
        })
    }
}

/// Key/value pairs from a link's fragment, falling back to its query string.
fn link_params(link: &str) -> Vec<(String, String)> {
    let encoded = match url::Url::parse(link) {
        Ok(url) => url
            .fragment()
            .filter(|f| !f.is_empty())
            .or_else(|| url.query())
            .unwrap_or_default()
            .to_string(),
        Err(_) => link.trim_start_matches('#').to_string(),
    };

    url::form_urlencoded::parse(encoded.as_bytes())
        .into_owned()
        .collect()
}

/// Friendly text for a failed sign-in attempt.
pub fn describe_sign_in_error(err: &ApiError) -> String {
    let message = err.to_string();

    if err.status() == Some(StatusCode::TOO_MANY_REQUESTS)
        || message.contains("429")
        || message.contains("Too Many Requests")
    {
        TOO_MANY_REQUESTS.to_string()
    } else if message.contains("Email rate limit exceeded") || message.contains("rate limit") {
        TOO_MANY_EMAILS.to_string()
    } else if message.contains("Invalid email")
        || (message.contains("email") && message.contains("invalid"))
    {
        INVALID_EMAIL.to_string()
    } else if !message.trim().is_empty() {
        message
    } else {
        GENERIC_FAILURE.to_string()
    }
}
