//! Configuration module for environment variables and application settings

use anyhow::{Result, anyhow};
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    /// Secret used to sign and verify session tokens. Required: startup
    /// fails if `JWT_SECRET` is unset, there is no compiled-in fallback.
    pub jwt_secret: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Origins allowed by the CORS layer
    pub cors_allowed_origins: Vec<String>,

    /// Outbound email configuration; `None` disables delivery
    pub email: Option<EmailConfig>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Transactional email API endpoint
    pub api_url: String,
    pub api_key: String,
    pub from_address: String,
    /// Recipient for contact-form notifications
    pub contact_notify_to: String,
    /// Base URL embedded in verification links
    pub public_base_url: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow!("JWT_SECRET environment variable is required"))?,

            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()
                    .unwrap_or(3000),
            },

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3001".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),

            email: EmailConfig::from_env(),
        })
    }
}

impl EmailConfig {
    /// Email delivery is opt-in: without the API settings the mailer runs
    /// disabled and sends become logged no-ops.
    fn from_env() -> Option<Self> {
        let api_url = env::var("EMAIL_API_URL").ok()?;
        let api_key = env::var("EMAIL_API_KEY").ok()?;
        Some(Self {
            api_url,
            api_key,
            from_address: env::var("EMAIL_FROM").unwrap_or_else(|_| "no-reply@localhost".to_string()),
            contact_notify_to: env::var("CONTACT_NOTIFY_TO")
                .unwrap_or_else(|_| "contact@localhost".to_string()),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
        })
    }
}
