//! Clients for the hosted backend: the auth service and the data API.

mod auth;
mod error;
pub(crate) mod rest;
mod session_store;

pub use auth::{AuthClient, describe_sign_in_error};
pub use error::ApiError;
pub use rest::RestClient;
pub use session_store::SessionStore;

use reqwest::Response;
use serde::de::DeserializeOwned;

use crate::config::Config;

/// Build the HTTP client shared by the auth and data clients.
pub fn http_client(config: &Config) -> Result<reqwest::Client, ApiError> {
    let client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .user_agent(concat!("hourbase/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Turn a non-success response into an [`ApiError`].
pub(crate) async fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::from_body(status, &body))
}

pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let response = check(response).await?;
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
}
