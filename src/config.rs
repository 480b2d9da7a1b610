use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_GATEWAY_TIMEOUT_SECS, DEFAULT_SITE_CONTENT_LIMIT, ENV_MODEL, ENV_MODEL_API_KEY,
    ENV_SENDER_APP_CREDENTIAL, ENV_SENDER_EMAIL,
};
use crate::error::TriageError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Model gateway settings shared by triage and revision calls
    #[serde(default)]
    pub ai: AiConfig,
    /// Outbound mail for dispatching approved replies
    #[serde(default)]
    pub smtp: SmtpConfig,
    #[serde(default)]
    pub triage: TriageConfig,
    /// Website analyzer overrides
    #[serde(default)]
    pub site: SiteConfig,
}

/// Model gateway configuration (any OpenAI-compatible chat completions API)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// API key (required; usually supplied via MODEL_API_KEY)
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_ai_model")]
    pub model: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Per-request timeout; expiry is reported as a gateway error
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_ai_model(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl AiConfig {
    /// The API key, or a configuration error naming where to set it
    pub fn require_api_key(&self) -> Result<&str, TriageError> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                TriageError::Configuration(format!(
                    "model API key not found. Set {} or ai.api_key in {}",
                    ENV_MODEL_API_KEY,
                    Config::config_path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|_| "config.toml".to_string())
                ))
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default = "default_smtp_server")]
    pub server: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub sender_email: Option<String>,
    #[serde(default)]
    pub sender_app_credential: Option<String>,
    #[serde(default)]
    pub sender_name: Option<String>,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            server: default_smtp_server(),
            port: default_smtp_port(),
            sender_email: None,
            sender_app_credential: None,
            sender_name: None,
        }
    }
}

/// Sender identity, present only when both credential values are configured
#[derive(Debug, Clone)]
pub struct SenderCredentials {
    pub email: String,
    pub app_credential: String,
    pub name: Option<String>,
}

impl SmtpConfig {
    pub fn sender_credentials(&self) -> Option<SenderCredentials> {
        let email = self.sender_email.as_deref().map(str::trim)?;
        let credential = self.sender_app_credential.as_deref().map(str::trim)?;
        if email.is_empty() || credential.is_empty() {
            return None;
        }
        Some(SenderCredentials {
            email: email.to_string(),
            app_credential: credential.to_string(),
            name: self.sender_name.clone(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageConfig {
    /// Reject batches whose priority does not follow the classification mapping
    #[serde(default)]
    pub strict_priority: bool,
    #[serde(default = "default_subject_prefix")]
    pub reply_subject_prefix: String,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            strict_priority: false,
            reply_subject_prefix: default_subject_prefix(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_site_model")]
    pub model: String,
    #[serde(default = "default_site_temperature")]
    pub temperature: f32,
    /// Characters of page text passed to the model
    #[serde(default = "default_content_limit")]
    pub content_limit: usize,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            model: default_site_model(),
            temperature: default_site_temperature(),
            content_limit: default_content_limit(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_ai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_timeout_secs() -> u64 {
    DEFAULT_GATEWAY_TIMEOUT_SECS
}

fn default_smtp_server() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_subject_prefix() -> String {
    "Re: ".to_string()
}

fn default_site_model() -> String {
    "gpt-4o".to_string()
}

fn default_site_temperature() -> f32 {
    0.7
}

fn default_content_limit() -> usize {
    DEFAULT_SITE_CONTENT_LIMIT
}

impl Config {
    pub fn config_dir() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("mailtriage");
        Ok(dir)
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load the config file (if any), then apply environment overrides.
    /// A missing file is not an error: every setting has a default or an
    /// environment variable.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        let mut config = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str::<Config>(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            tracing::debug!("No config file at {}, using defaults", path.display());
            Config::default()
        };

        config.apply_env(|key| env::var(key).ok());
        Ok(config)
    }

    /// Overlay values from the environment. Blank values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(ENV_MODEL_API_KEY) {
            self.ai.api_key = Some(key);
        }
        if let Some(model) = get(ENV_MODEL) {
            self.ai.model = model;
        }
        if let Some(email) = get(ENV_SENDER_EMAIL) {
            self.smtp.sender_email = Some(email);
        }
        if let Some(credential) = get(ENV_SENDER_APP_CREDENTIAL) {
            self.smtp.sender_app_credential = Some(credential);
        }
    }
}
