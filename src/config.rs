use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::env;

use crate::extraction::image::DEFAULT_OCR_LANGUAGES;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub extraction: ExtractionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Bearer JWT required on every file endpoint
    Jwt,
    /// No session check; local development only
    #[serde(rename = "none")]
    Disabled,
}

#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    pub mode: AuthMode,
    pub secret: String,
}

impl AuthConfig {
    /// Checked when serving; one-shot CLI runs never look at sessions.
    pub fn ensure_usable(&self) -> Result<()> {
        if self.mode == AuthMode::Jwt && self.secret.is_empty() {
            bail!("AUTH_SECRET must be set when AUTH_MODE=jwt");
        }
        Ok(())
    }
}

// Keeps the secret out of the startup log line
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("mode", &self.mode)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    pub tesseract_path: String,
    pub ocr_languages: String,
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub filter: String,
    pub log_dir: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mode = match env::var("AUTH_MODE")
            .unwrap_or_else(|_| "jwt".to_string())
            .to_lowercase()
            .as_str()
        {
            "jwt" => AuthMode::Jwt,
            "none" => AuthMode::Disabled,
            other => bail!("Unknown AUTH_MODE '{}' (expected 'jwt' or 'none')", other),
        };
        let secret = env::var("AUTH_SECRET").unwrap_or_default();

        Ok(Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()
                    .context("PORT must be a port number")?,
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                cors_allowed_origins: env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "*".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "120".to_string())
                    .parse()
                    .context("REQUEST_TIMEOUT_SECS must be a whole number of seconds")?,
            },
            auth: AuthConfig { mode, secret },
            extraction: ExtractionConfig {
                tesseract_path: env::var("TESSERACT_PATH")
                    .unwrap_or_else(|_| "tesseract".to_string()),
                ocr_languages: env::var("OCR_LANGUAGES")
                    .unwrap_or_else(|_| DEFAULT_OCR_LANGUAGES.to_string()),
                user_agent: env::var("FETCH_USER_AGENT")
                    .unwrap_or_else(|_| format!("file-insight/{}", env!("CARGO_PKG_VERSION"))),
            },
            logging: LoggingConfig {
                filter: env::var("RUST_LOG").unwrap_or_else(|_| {
                    "file_insight=debug,tower_http=debug,axum=info".to_string()
                }),
                log_dir: env::var("LOG_DIR").ok().filter(|dir| !dir.is_empty()),
            },
        })
    }

    /// Settings for tests and one-shot CLI runs: no auth, local defaults.
    pub fn local() -> Self {
        Self {
            server: ServerConfig {
                port: 3000,
                host: "127.0.0.1".to_string(),
                cors_allowed_origins: vec!["*".to_string()],
                request_timeout_secs: 120,
            },
            auth: AuthConfig {
                mode: AuthMode::Disabled,
                secret: String::new(),
            },
            extraction: ExtractionConfig {
                tesseract_path: "tesseract".to_string(),
                ocr_languages: DEFAULT_OCR_LANGUAGES.to_string(),
                user_agent: format!("file-insight/{}", env!("CARGO_PKG_VERSION")),
            },
            logging: LoggingConfig {
                filter: "file_insight=info".to_string(),
                log_dir: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_config_debug_hides_secret() {
        let auth = AuthConfig {
            mode: AuthMode::Jwt,
            secret: "super-secret".to_string(),
        };
        let shown = format!("{:?}", auth);
        assert!(!shown.contains("super-secret"));
        assert!(shown.contains("Jwt"));
    }

    #[test]
    fn test_jwt_mode_needs_secret() {
        let mut auth = AuthConfig {
            mode: AuthMode::Jwt,
            secret: String::new(),
        };
        assert!(auth.ensure_usable().is_err());

        auth.secret = "s3cret".to_string();
        assert!(auth.ensure_usable().is_ok());

        auth.mode = AuthMode::Disabled;
        auth.secret.clear();
        assert!(auth.ensure_usable().is_ok());
    }

    #[test]
    fn test_local_config_disables_auth() {
        let config = Config::local();
        assert_eq!(config.auth.mode, AuthMode::Disabled);
        assert_eq!(config.extraction.ocr_languages, "eng+vie");
    }
}
