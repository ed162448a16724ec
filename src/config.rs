use std::env;

use thiserror::Error;

use crate::rpc::ResultType;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: String,
    pub result_type: ResultType,
    pub user_agent: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JSONRPC_SERVER_URL is required and must not be empty")]
    MissingServerUrl,
    #[error("JSONRPC_SERVER_URL must be an absolute URL")]
    InvalidServerUrl,
    #[error("JSONRPC_RESULT_TYPE must be either object or array")]
    InvalidResultType,
    #[error("JSONRPC_TIMEOUT_SECS must be a positive integer")]
    InvalidTimeout,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let server_url = env::var("JSONRPC_SERVER_URL")
            .ok()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::MissingServerUrl)?;
        reqwest::Url::parse(&server_url).map_err(|_| ConfigError::InvalidServerUrl)?;

        let result_type = env::var("JSONRPC_RESULT_TYPE")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(|value| {
                value
                    .parse::<ResultType>()
                    .map_err(|_| ConfigError::InvalidResultType)
            })
            .transpose()?
            .unwrap_or_default();
        let user_agent = env::var("JSONRPC_USER_AGENT")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        let timeout_secs = env::var("JSONRPC_TIMEOUT_SECS")
            .ok()
            .map(|value| {
                value
                    .trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .ok_or(ConfigError::InvalidTimeout)
            })
            .transpose()?
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            server_url,
            result_type,
            user_agent,
            timeout_secs,
        })
    }
}
