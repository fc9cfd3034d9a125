//! Remote user directory client
//!
//! HTTP client for the remote directory API (JSONPlaceholder-compatible):
//! `GET /users`, `GET /users/{id}`, `POST /users`, `PUT /users/{id}`,
//! `DELETE /users/{id}`.
//!
//! The engine treats every failure here the same way ("remote unavailable"),
//! so the error variants exist mainly for logging and tests.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::models::{NewUser, User};

/// Errors from the remote user directory
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Network-level failure (connect, timeout, TLS)
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("Server returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// Record does not exist on the remote
    #[error("User {id} not found on remote")]
    NotFound { id: u64 },
}

/// Result type for remote operations
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Operations offered by the remote user directory
///
/// Boxed behind `dyn` so the engine can be driven by a mock in tests.
#[async_trait]
pub trait RemoteDirectory: Send + Sync {
    /// Fetch all users
    async fn list(&self) -> RemoteResult<Vec<User>>;

    /// Fetch a single user by id
    async fn get(&self, id: u64) -> RemoteResult<User>;

    /// Create a user; the server assigns (or fakes) the id
    async fn create(&self, payload: &NewUser) -> RemoteResult<CreatedUser>;

    /// Replace a user record, returning the record as the server sees it
    async fn update(&self, id: u64, payload: &NewUser) -> RemoteResult<User>;

    /// Delete a user record
    async fn delete(&self, id: u64) -> RemoteResult<()>;
}

/// Create response: the server may omit the id entirely
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatedUser {
    #[serde(default)]
    pub id: Option<u64>,
}

/// reqwest-backed remote directory client
pub struct HttpRemote {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRemote {
    /// Build a client from configuration
    pub fn new(config: &Config) -> RemoteResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent("roster/0.3")
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn users_url(&self) -> String {
        format!("{}/users", self.base_url)
    }

    fn user_url(&self, id: u64) -> String {
        format!("{}/users/{}", self.base_url, id)
    }

    fn check_status(response: &reqwest::Response, id: Option<u64>) -> RemoteResult<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            if let Some(id) = id {
                return Err(RemoteError::NotFound { id });
            }
        }
        Err(RemoteError::Status {
            status: status.as_u16(),
            url: response.url().to_string(),
        })
    }
}

#[async_trait]
impl RemoteDirectory for HttpRemote {
    async fn list(&self) -> RemoteResult<Vec<User>> {
        let url = self.users_url();
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        Self::check_status(&response, None)?;

        Ok(response.json().await?)
    }

    async fn get(&self, id: u64) -> RemoteResult<User> {
        let url = self.user_url(id);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        Self::check_status(&response, Some(id))?;

        Ok(response.json().await?)
    }

    async fn create(&self, payload: &NewUser) -> RemoteResult<CreatedUser> {
        let url = self.users_url();
        debug!("POST {}", url);

        let response = self.client.post(&url).json(payload).send().await?;
        Self::check_status(&response, None)?;

        // JSONPlaceholder echoes a fake id; tolerate any shape without one
        Ok(response.json().await.unwrap_or_default())
    }

    async fn update(&self, id: u64, payload: &NewUser) -> RemoteResult<User> {
        let url = self.user_url(id);
        debug!("PUT {}", url);

        let response = self.client.put(&url).json(payload).send().await?;
        Self::check_status(&response, Some(id))?;

        // Fall back to the payload under the given id when the echo is unusable
        Ok(response
            .json()
            .await
            .unwrap_or_else(|_| User::from_payload(id, payload.clone())))
    }

    async fn delete(&self, id: u64) -> RemoteResult<()> {
        let url = self.user_url(id);
        debug!("DELETE {}", url);

        let response = self.client.delete(&url).send().await?;
        Self::check_status(&response, Some(id))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(base: &str) -> Config {
        Config {
            api_base_url: base.to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn test_url_building() {
        let remote = HttpRemote::new(&test_config("http://localhost:4000")).unwrap();
        assert_eq!(remote.users_url(), "http://localhost:4000/users");
        assert_eq!(remote.user_url(12), "http://localhost:4000/users/12");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let remote = HttpRemote::new(&test_config("http://localhost:4000/")).unwrap();
        assert_eq!(remote.users_url(), "http://localhost:4000/users");
    }

    #[test]
    fn test_created_user_without_id() {
        let created: CreatedUser = serde_json::from_str("{}").unwrap();
        assert!(created.id.is_none());

        let created: CreatedUser = serde_json::from_str(r#"{"id": 11}"#).unwrap();
        assert_eq!(created.id, Some(11));
    }

    #[test]
    fn test_error_display() {
        let err = RemoteError::NotFound { id: 99 };
        assert!(err.to_string().contains("99"));

        let err = RemoteError::Status {
            status: 500,
            url: "http://x/users".to_string(),
        };
        assert!(err.to_string().contains("500"));
    }
}
