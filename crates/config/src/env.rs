use std::env;
use storybot_common::error::{StorybotError, StorybotResult};

use crate::tracing_init::LogFormat;

/// Listener and logging settings shared by every storybot service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load configuration from environment variables.
    /// Loads `.env` file if present, then reads the listener vars.
    pub fn from_env() -> StorybotResult<Self> {
        // Best-effort .env load; ignore if missing
        let _ = dotenvy::dotenv();

        Ok(Self {
            host: get_var_or("HOST", "0.0.0.0"),
            port: get_var_or("PORT", "8060")
                .parse()
                .map_err(|e| StorybotError::Config(format!("invalid PORT: {e}")))?,
            log_level: get_var_or("LOG_LEVEL", "info"),
            log_format: get_var_or("LOG_FORMAT", "text").parse()?,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Read a variable that has no sensible default.
pub fn get_var(key: &str) -> StorybotResult<String> {
    env::var(key).map_err(|_| StorybotError::Config(format!("{key} is required but not set")))
}

pub fn get_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}
