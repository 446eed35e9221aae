//! # config — environment-driven configuration
//!
//! The AI strategy is opt-in: without `AI_API_KEY` spyglass runs on the
//! pattern scanner alone.

use std::time::Duration;

use anyhow::{bail, Context};

/// Supported AI providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiProvider {
    Claude,
    OpenAi,
}

impl std::fmt::Display for AiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AiProvider::Claude => write!(f, "Claude 3.5 Sonnet"),
            AiProvider::OpenAi => write!(f, "GPT-4o"),
        }
    }
}

/// Credentials for the optional AI extraction strategy.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub provider: AiProvider,
    pub api_key:  String,
}

/// Everything spyglass needs at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// `None` → pattern-only extraction.
    pub ai:             Option<AiConfig>,
    /// Base URL of the semaphore server.
    pub relay_url:      String,
    /// How often the session-stats reporter logs.
    pub stats_interval: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let ai = match std::env::var("AI_API_KEY") {
            Ok(api_key) if !api_key.trim().is_empty() => {
                let provider_str = std::env::var("AI_PROVIDER")
                    .unwrap_or_else(|_| "claude".to_string())
                    .to_lowercase();
                let provider = match provider_str.as_str() {
                    "claude" => AiProvider::Claude,
                    "openai" => AiProvider::OpenAi,
                    other => bail!("Unknown AI_PROVIDER: '{other}'. Use 'claude' or 'openai'"),
                };
                Some(AiConfig { provider, api_key })
            }
            _ => None,
        };

        let stats_secs: u64 = std::env::var("STATS_INTERVAL_SECS")
            .unwrap_or_else(|_| "300".to_string())
            .parse()
            .context("STATS_INTERVAL_SECS must be a number")?;

        Ok(Self {
            ai,
            relay_url:      std::env::var("RELAY_URL")
                .unwrap_or_else(|_| "http://localhost:8888".to_string()),
            stats_interval: Duration::from_secs(stats_secs),
        })
    }
}
