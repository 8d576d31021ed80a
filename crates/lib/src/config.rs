//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.charla/config.json`) and environment.
//! Provider credentials resolve env-first (OPENAI_*, TWILIO_*) so the file can stay
//! free of secrets. Missing credentials are not an error: each provider degrades its
//! own code path.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Relay server settings (bind, port, CORS allow-list).
    #[serde(default)]
    pub server: ServerConfig,

    /// Completion provider settings (key, model, base URL).
    #[serde(default)]
    pub ai: AiConfig,

    /// Alert provider settings (WhatsApp via Twilio).
    #[serde(default)]
    pub alerts: AlertsConfig,
}

/// Relay server bind, port, and CORS settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Listening port (default 4000).
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_server_bind")]
    pub bind: String,

    /// Origins allowed by CORS (exact match). Empty list allows any origin.
    /// Overridden by ALLOWED_ORIGINS env (comma-separated) when set.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_server_port() -> u16 {
    4000
}

fn default_server_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
            bind: default_server_bind(),
            allowed_origins: Vec::new(),
        }
    }
}

/// Completion provider config. Without an API key, replies fall back to a canned string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiConfig {
    /// API key for the completion provider. Overridden by OPENAI_API_KEY env when set.
    pub api_key: Option<String>,
    /// Model name (default "gpt-4o-mini"). Overridden by OPENAI_MODEL env when set.
    pub model: Option<String>,
    /// Base URL of the completions API (default https://api.openai.com/v1). Useful
    /// for OpenAI-compatible servers and for tests.
    pub base_url: Option<String>,
}

/// Alert provider config (Twilio WhatsApp). All four credential fields are required
/// for alerts to be sent; otherwise dispatch reports sent:false.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertsConfig {
    /// Twilio account SID. Overridden by TWILIO_ACCOUNT_SID env when set.
    pub account_sid: Option<String>,
    /// Twilio auth token. Overridden by TWILIO_AUTH_TOKEN env when set.
    pub auth_token: Option<String>,
    /// Fixed sender, e.g. "whatsapp:+14155238886". Overridden by TWILIO_WHATSAPP_FROM.
    pub whatsapp_from: Option<String>,
    /// Fixed recipient, e.g. "whatsapp:+5215512345678". Overridden by TWILIO_WHATSAPP_TO.
    pub whatsapp_to: Option<String>,
    /// Base URL of the messaging API (default https://api.twilio.com). Useful for tests.
    pub base_url: Option<String>,
}

/// Complete credential set for the WhatsApp channel.
#[derive(Debug, Clone)]
pub struct WhatsAppCredentials {
    pub account_sid: String,
    pub auth_token: String,
    pub from: String,
    pub to: String,
}

fn env_or(var: &str, file_value: Option<&String>) -> Option<String> {
    std::env::var(var)
        .ok()
        .and_then(|s| {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        })
        .or_else(|| {
            file_value
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

/// Resolve the completion API key: env OPENAI_API_KEY overrides config.
pub fn resolve_ai_key(config: &Config) -> Option<String> {
    env_or("OPENAI_API_KEY", config.ai.api_key.as_ref())
}

/// Resolve the completion model name: env OPENAI_MODEL, then config, then the default.
pub fn resolve_ai_model(config: &Config) -> String {
    env_or("OPENAI_MODEL", config.ai.model.as_ref())
        .unwrap_or_else(|| crate::llm::DEFAULT_MODEL.to_string())
}

/// Resolve the WhatsApp credential set: env TWILIO_* overrides config per field.
/// Returns None when any field is missing — alerts are then skipped, not an error.
pub fn resolve_whatsapp_credentials(config: &Config) -> Option<WhatsAppCredentials> {
    let account_sid = env_or("TWILIO_ACCOUNT_SID", config.alerts.account_sid.as_ref())?;
    let auth_token = env_or("TWILIO_AUTH_TOKEN", config.alerts.auth_token.as_ref())?;
    let from = env_or("TWILIO_WHATSAPP_FROM", config.alerts.whatsapp_from.as_ref())?;
    let to = env_or("TWILIO_WHATSAPP_TO", config.alerts.whatsapp_to.as_ref())?;
    Some(WhatsAppCredentials {
        account_sid,
        auth_token,
        from,
        to,
    })
}

/// Split a comma-separated origin list, trimming entries and dropping empties.
pub fn parse_allowed_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect()
}

/// Resolve the CORS allow-list: env ALLOWED_ORIGINS (comma-separated) overrides config.
pub fn resolve_allowed_origins(config: &Config) -> Vec<String> {
    match std::env::var("ALLOWED_ORIGINS") {
        Ok(raw) if !raw.trim().is_empty() => parse_allowed_origins(&raw),
        _ => config.server.allowed_origins.clone(),
    }
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("CHARLA_CONFIG_PATH").map(PathBuf::from).unwrap_or_else(|_| {
        dirs::home_dir()
            .map(|h| h.join(".charla").join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    })
}

/// Load config from the default path (or CHARLA_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_server_port_and_bind() {
        let s = ServerConfig::default();
        assert_eq!(s.port, 4000);
        assert_eq!(s.bind, "127.0.0.1");
        assert!(s.allowed_origins.is_empty());
    }

    #[test]
    fn parse_allowed_origins_trims_and_drops_empties() {
        assert_eq!(
            parse_allowed_origins("https://a.com, https://b.com ,,"),
            vec!["https://a.com".to_string(), "https://b.com".to_string()]
        );
        assert!(parse_allowed_origins("").is_empty());
    }

    #[test]
    fn whatsapp_credentials_require_all_fields() {
        let mut config = Config::default();
        config.alerts.account_sid = Some("AC123".to_string());
        config.alerts.auth_token = Some("token".to_string());
        config.alerts.whatsapp_from = Some("whatsapp:+14155238886".to_string());
        assert!(resolve_whatsapp_credentials(&config).is_none());

        config.alerts.whatsapp_to = Some("whatsapp:+5215512345678".to_string());
        let creds = resolve_whatsapp_credentials(&config).expect("complete credentials");
        assert_eq!(creds.account_sid, "AC123");
        assert_eq!(creds.to, "whatsapp:+5215512345678");
    }

    #[test]
    fn whatsapp_credentials_ignore_blank_fields() {
        let mut config = Config::default();
        config.alerts.account_sid = Some("AC123".to_string());
        config.alerts.auth_token = Some("   ".to_string());
        config.alerts.whatsapp_from = Some("whatsapp:+14155238886".to_string());
        config.alerts.whatsapp_to = Some("whatsapp:+5215512345678".to_string());
        assert!(resolve_whatsapp_credentials(&config).is_none());
    }

    #[test]
    fn config_parses_camel_case_keys() {
        let config: Config = serde_json::from_str(
            r#"{
                "server": {"port": 5000, "allowedOrigins": ["https://itai.mx"]},
                "alerts": {"accountSid": "AC1", "whatsappFrom": "whatsapp:+1"}
            }"#,
        )
        .expect("parse config");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.allowed_origins, vec!["https://itai.mx"]);
        assert_eq!(config.alerts.account_sid.as_deref(), Some("AC1"));
        assert_eq!(config.alerts.whatsapp_from.as_deref(), Some("whatsapp:+1"));
    }
}
