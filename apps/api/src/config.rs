use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::publishing::oauth::OAuthCredentials;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_ANALYSIS_MODEL: &str = "gpt-5-nano-2025-08-07";
const DEFAULT_XAI_BASE_URL: &str = "https://api.x.ai/v1";
const DEFAULT_GENERATION_MODEL: &str = "grok-4-0709";

/// One OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

/// Application configuration loaded from environment variables.
///
/// Only `DATABASE_URL` is required to boot. A missing capability key leaves
/// the matching field `None`; the job that needs it then fails with a
/// configuration error instead of the whole process refusing to start.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub analysis: Option<LlmConfig>,
    pub generation: Option<LlmConfig>,
    pub x_credentials: Option<OAuthCredentials>,
    /// K: summaries fed to the wisdom publisher.
    pub summary_window: u32,
    /// F: fresh entries quoted by the wisdom publisher.
    pub fresh_entries: u32,
    pub step_timeout: Duration,
    pub include_wisdoms: bool,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env = Env(&lookup);

        let summary_window = env.parse_or("SUMMARY_WINDOW", 5u32)?;
        let fresh_entries = env.parse_or("FRESH_ENTRIES", 3u32)?;
        if summary_window == 0 {
            bail!("SUMMARY_WINDOW must be at least 1");
        }
        if fresh_entries == 0 {
            bail!("FRESH_ENTRIES must be at least 1");
        }

        let step_timeout_secs = env.parse_or("STEP_TIMEOUT_SECS", 60u64)?;
        if step_timeout_secs == 0 {
            bail!("STEP_TIMEOUT_SECS must be at least 1");
        }

        Ok(Config {
            database_url: env.require("DATABASE_URL")?,
            analysis: env.optional("OPENAI_API_KEY").map(|api_key| LlmConfig {
                api_key,
                base_url: env.or("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
                model: env.or("ANALYSIS_MODEL", DEFAULT_ANALYSIS_MODEL),
            }),
            generation: env.optional("XAI_API_KEY").map(|api_key| LlmConfig {
                api_key,
                base_url: env.or("XAI_BASE_URL", DEFAULT_XAI_BASE_URL),
                model: env.or("GENERATION_MODEL", DEFAULT_GENERATION_MODEL),
            }),
            x_credentials: x_credentials(&env)?,
            summary_window,
            fresh_entries,
            step_timeout: Duration::from_secs(step_timeout_secs),
            include_wisdoms: parse_bool("INCLUDE_WISDOMS", env.optional("INCLUDE_WISDOMS"), true)?,
            port: env
                .or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env.or("RUST_LOG", "info"),
        })
    }
}

/// All four X credentials, or none. A partial set is almost always a typo.
fn x_credentials(env: &Env<'_>) -> Result<Option<OAuthCredentials>> {
    const KEYS: [&str; 4] = [
        "X_API_KEY",
        "X_API_SECRET",
        "X_ACCESS_TOKEN",
        "X_ACCESS_SECRET",
    ];
    let values: Vec<Option<String>> = KEYS.iter().map(|k| env.optional(k)).collect();

    match values.as_slice() {
        [Some(consumer_key), Some(consumer_secret), Some(access_token), Some(access_secret)] => {
            Ok(Some(OAuthCredentials {
                consumer_key: consumer_key.clone(),
                consumer_secret: consumer_secret.clone(),
                access_token: access_token.clone(),
                access_secret: access_secret.clone(),
            }))
        }
        _ if values.iter().all(Option::is_none) => Ok(None),
        _ => {
            let missing: Vec<&str> = KEYS
                .iter()
                .zip(&values)
                .filter(|(_, v)| v.is_none())
                .map(|(k, _)| *k)
                .collect();
            bail!(
                "X credentials are partially configured; missing {}",
                missing.join(", ")
            )
        }
    }
}

fn parse_bool(key: &str, raw: Option<String>, default: bool) -> Result<bool> {
    match raw.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => bail!("{key} must be a boolean, got '{other}'"),
    }
}

struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    /// Unset and blank are the same thing.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn require(&self, key: &str) -> Result<String> {
        self.optional(key)
            .with_context(|| format!("Required environment variable '{key}' is not set"))
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn parse_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: std::str::FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match self.optional(key) {
            Some(raw) => raw
                .parse::<T>()
                .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
            None => Ok(default),
        }
    }
}
