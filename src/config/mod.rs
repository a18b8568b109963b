use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Connection settings for the hosted backend.
#[derive(Debug, Deserialize)]
struct BackendVars {
    supabase_url: String,
    supabase_anon_key: String,
}

/// Local client settings, read from `HOURBASE_*` variables.
#[derive(Debug, Default, Deserialize)]
struct LocalVars {
    session_path: Option<PathBuf>,
    log_dir: Option<PathBuf>,
    request_timeout_secs: Option<u64>,
    cache_ttl_secs: Option<u64>,
    redirect_url: Option<String>,
}

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the hosted project, without a trailing slash
    pub supabase_url: String,
    /// Public (anon) API key sent with every request
    pub supabase_anon_key: String,
    /// Where the session is persisted between runs
    pub session_path: PathBuf,
    /// Directory for the rolling log files
    pub log_dir: PathBuf,
    pub request_timeout: Duration,
    pub cache_ttl: Duration,
    /// Redirect target embedded into magic link emails
    pub redirect_url: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Reads `.env` (or `env_file` when given) first; variables already set
    /// in the environment win over the file.
    pub fn load(env_file: Option<&Path>) -> Result<Self> {
        match env_file {
            Some(path) => {
                dotenvy::from_path(path)
                    .with_context(|| format!("failed to read env file {}", path.display()))?;
            }
            None => {
                dotenvy::dotenv().ok();
            }
        }

        let backend = envy::from_env::<BackendVars>()
            .context("SUPABASE_URL and SUPABASE_ANON_KEY must be set")?;
        let local = envy::prefixed("HOURBASE_").from_env::<LocalVars>()?;

        Ok(Self::from_parts(backend, local))
    }

    fn from_parts(backend: BackendVars, local: LocalVars) -> Self {
        Self {
            supabase_url: backend.supabase_url.trim_end_matches('/').to_string(),
            supabase_anon_key: backend.supabase_anon_key,
            session_path: local.session_path.unwrap_or_else(default_session_path),
            log_dir: local.log_dir.unwrap_or_else(default_log_dir),
            request_timeout: Duration::from_secs(
                local.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            cache_ttl: Duration::from_secs(local.cache_ttl_secs.unwrap_or(DEFAULT_CACHE_TTL_SECS)),
            redirect_url: local.redirect_url.filter(|url| !url.trim().is_empty()),
        }
    }

    /// Config pointing at a local mock server, for tests
    #[cfg(test)]
    pub fn for_base_url(base_url: &str) -> Self {
        Self::from_parts(
            BackendVars {
                supabase_url: base_url.to_string(),
                supabase_anon_key: "test-anon-key".to_string(),
            },
            LocalVars {
                session_path: Some(std::env::temp_dir().join("hourbase-test-session.json")),
                log_dir: Some(std::env::temp_dir()),
                ..LocalVars::default()
            },
        )
    }
}

fn data_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("hourbase"))
}

/// `<data dir>/hourbase/session.json`, or the working directory when no data
/// dir is known.
fn default_session_path() -> PathBuf {
    data_dir()
        .map(|dir| dir.join("session.json"))
        .unwrap_or_else(|| PathBuf::from("hourbase-session.json"))
}

fn default_log_dir() -> PathBuf {
    data_dir()
        .map(|dir| dir.join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed_and_defaults_apply() {
        let config = Config::from_parts(
            BackendVars {
                supabase_url: "https://abc.supabase.co/".to_string(),
                supabase_anon_key: "key".to_string(),
            },
            LocalVars::default(),
        );

        assert_eq!(config.supabase_url, "https://abc.supabase.co");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert!(config.session_path.ends_with("session.json") || config.session_path.ends_with("hourbase-session.json"));
        assert!(config.redirect_url.is_none());
    }

    #[test]
    fn blank_redirect_url_is_ignored() {
        let config = Config::from_parts(
            BackendVars {
                supabase_url: "http://localhost:54321".to_string(),
                supabase_anon_key: "key".to_string(),
            },
            LocalVars {
                redirect_url: Some("   ".to_string()),
                request_timeout_secs: Some(5),
                ..LocalVars::default()
            },
        );

        assert!(config.redirect_url.is_none());
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }
}
