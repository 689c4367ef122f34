use std::str::FromStr;

use anyhow::{bail, Context, Result};

/// Which hosted model provider extraction requests are sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Gemini,
}

impl ProviderKind {
    /// Environment variable holding this provider's API key.
    pub fn api_key_var(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Gemini => "GEMINI_API_KEY",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            other => bail!("Unknown LLM_PROVIDER '{other}' (expected 'openai' or 'gemini')"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Startup fails if the selected provider's API key is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub provider: ProviderKind,
    pub api_key: String,
    /// Overrides the provider's public endpoint (proxies, local mocks).
    pub api_base_url: Option<String>,
    pub request_timeout_secs: u64,
    pub temperature: f32,
    /// Total attempts per completion call. 1 means no retries.
    pub max_attempts: u32,
    pub max_upload_bytes: usize,
    pub host: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider: ProviderKind = lookup("LLM_PROVIDER")
            .unwrap_or_else(|| "openai".to_string())
            .parse()?;

        let api_key = lookup(provider.api_key_var())
            .filter(|k| !k.trim().is_empty())
            .with_context(|| {
                format!(
                    "Required environment variable '{}' is not set",
                    provider.api_key_var()
                )
            })?;

        Ok(Config {
            provider,
            api_key,
            api_base_url: lookup("LLM_API_BASE_URL").filter(|u| !u.trim().is_empty()),
            request_timeout_secs: parse_or(&lookup, "LLM_TIMEOUT_SECS", 180)?,
            temperature: parse_or(&lookup, "LLM_TEMPERATURE", 0.3)?,
            max_attempts: parse_or::<u32, _>(&lookup, "LLM_MAX_ATTEMPTS", 1)?.max(1),
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", 20 * 1024 * 1024)?,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 8000)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Convenience for tests: config from a literal key/value list.
    #[cfg(test)]
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Result<Self> {
        let map: std::collections::HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self::from_lookup(|key| map.get(key).cloned())
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_with_openai_key() {
        let config = Config::from_pairs(&[("OPENAI_API_KEY", "sk-test")]).unwrap();
        assert_eq!(config.provider, ProviderKind::OpenAi);
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.request_timeout_secs, 180);
        assert_eq!(config.max_attempts, 1);
        assert_eq!(config.port, 8000);
        assert_eq!(config.host, "0.0.0.0");
        assert!(config.api_base_url.is_none());
    }

    #[test]
    fn test_gemini_requires_gemini_key() {
        let err = Config::from_pairs(&[("LLM_PROVIDER", "gemini"), ("OPENAI_API_KEY", "sk")])
            .unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));

        let config =
            Config::from_pairs(&[("LLM_PROVIDER", "Gemini"), ("GEMINI_API_KEY", "g-key")]).unwrap();
        assert_eq!(config.provider, ProviderKind::Gemini);
        assert_eq!(config.api_key, "g-key");
    }

    #[test]
    fn test_missing_key_is_an_error() {
        assert!(Config::from_pairs(&[]).is_err());
        assert!(Config::from_pairs(&[("OPENAI_API_KEY", "  ")]).is_err());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let err = Config::from_pairs(&[("LLM_PROVIDER", "llama"), ("OPENAI_API_KEY", "sk")])
            .unwrap_err();
        assert!(err.to_string().contains("llama"));
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        assert!(Config::from_pairs(&[("OPENAI_API_KEY", "sk"), ("PORT", "eighty")]).is_err());
        assert!(
            Config::from_pairs(&[("OPENAI_API_KEY", "sk"), ("LLM_TIMEOUT_SECS", "-1")]).is_err()
        );
    }

    #[test]
    fn test_zero_attempts_clamped_to_one() {
        let config =
            Config::from_pairs(&[("OPENAI_API_KEY", "sk"), ("LLM_MAX_ATTEMPTS", "0")]).unwrap();
        assert_eq!(config.max_attempts, 1);
    }
}
