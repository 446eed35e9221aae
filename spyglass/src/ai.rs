//! # ai — AI-assisted extraction strategy
//!
//! Calls Claude or OpenAI (per `AI_PROVIDER`) with the extraction prompt
//! and parses the JSON reply into a [`ParsedOrder`].
//!
//! Transport and parse failures are swallowed: the strategy logs a warning
//! and declines, letting the pattern scanner take the message. An AI outage
//! must never cost a signal the scanner could have caught.

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{AiConfig, AiProvider};
use crate::extract::ExtractStrategy;
use crate::order::{ParsedOrder, Side};
use crate::prompt;

pub struct AiExtractor {
    client: reqwest::Client,
    config: AiConfig,
}

impl AiExtractor {
    pub fn new(client: reqwest::Client, config: AiConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl ExtractStrategy for AiExtractor {
    fn name(&self) -> &'static str {
        "ai"
    }

    async fn try_extract(&self, text: &str) -> Option<ParsedOrder> {
        let prompt = prompt::build_prompt(text);

        let reply = match call_ai(&self.client, &self.config, &prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "AI call failed — falling through to the next strategy");
                return None;
            }
        };

        match parse_ai_reply(&reply, text) {
            Ok(order) => order,
            Err(e) => {
                warn!(error = %e, "AI reply unusable — falling through to the next strategy");
                None
            }
        }
    }
}

// ─── Reply parsing ────────────────────────────────────────────────────────────

/// Parse the AI's JSON reply. `Ok(None)` means the AI judged the message
/// not to be a new signal.
fn parse_ai_reply(reply: &str, raw_text: &str) -> anyhow::Result<Option<ParsedOrder>> {
    let cleaned = strip_markdown(reply);
    let value: Value = serde_json::from_str(&cleaned)
        .with_context(|| format!("AI returned invalid JSON: {cleaned}"))?;

    if !flag(&value, "is_valid_signal") {
        debug!("AI classified message as not-a-signal");
        return Ok(None);
    }

    let pair = value
        .get("pair")
        .and_then(Value::as_str)
        .context("AI reply missing 'pair'")?
        .to_uppercase();

    let side = match value.get("action").and_then(Value::as_str) {
        Some(s) if s.eq_ignore_ascii_case("buy") => Side::Buy,
        Some(s) if s.eq_ignore_ascii_case("sell") => Side::Sell,
        other => anyhow::bail!("AI reply has unusable 'action': {other:?}"),
    };

    let entry_price = price(&value, "entry_price").context("AI reply missing 'entry_price'")?;
    let stop_loss = price(&value, "stop_loss").context("AI reply missing 'stop_loss'")?;
    let tp1 = price(&value, "tp1").context("AI reply missing 'tp1'")?;

    Ok(Some(ParsedOrder {
        pair,
        side,
        entry_price,
        stop_loss,
        tp1,
        tp2: price(&value, "tp2"),
        tp3: price(&value, "tp3"),
        raw_text: raw_text.to_string(),
    }))
}

/// Numeric field, tolerating the number arriving as a JSON string.
fn price(value: &Value, key: &str) -> Option<f64> {
    match value.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn flag(value: &Value, key: &str) -> bool {
    match value.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Strip the markdown code fences the AI may wrap its JSON in.
fn strip_markdown(text: &str) -> String {
    let text = text.trim();
    if let Some(inner) = text.strip_prefix("```json") {
        inner.trim_end_matches("```").trim().to_string()
    } else if let Some(inner) = text.strip_prefix("```") {
        inner.trim_end_matches("```").trim().to_string()
    } else {
        text.to_string()
    }
}

// ─── Providers ────────────────────────────────────────────────────────────────

async fn call_ai(
    client: &reqwest::Client,
    config: &AiConfig,
    prompt: &str,
) -> anyhow::Result<String> {
    match config.provider {
        AiProvider::Claude => call_claude(client, config, prompt).await,
        AiProvider::OpenAi => call_openai(client, config, prompt).await,
    }
}

#[derive(Serialize)]
struct ClaudeRequest<'a> {
    model:      &'a str,
    max_tokens: u32,
    messages:   Vec<ClaudeMessage<'a>>,
}

#[derive(Serialize)]
struct ClaudeMessage<'a> {
    role:    &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContent>,
}

#[derive(Deserialize)]
struct ClaudeContent {
    text: String,
}

async fn call_claude(
    client: &reqwest::Client,
    config: &AiConfig,
    prompt: &str,
) -> anyhow::Result<String> {
    let body = ClaudeRequest {
        model:      "claude-3-5-sonnet-20241022",
        max_tokens: 512,
        messages:   vec![ClaudeMessage { role: "user", content: prompt }],
    };

    debug!("Calling Claude API...");

    let resp = client
        .post("https://api.anthropic.com/v1/messages")
        .header("x-api-key", &config.api_key)
        .header("anthropic-version", "2023-06-01")
        .header("content-type", "application/json")
        .json(&body)
        .timeout(std::time::Duration::from_secs(30))
        .send()
        .await
        .context("Claude API request failed")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        anyhow::bail!("Claude API error {status}: {text}");
    }

    let data: ClaudeResponse = resp.json().await.context("Claude response parse error")?;

    data.content
        .into_iter()
        .next()
        .map(|c| c.text)
        .context("Claude returned empty content")
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model:    &'a str,
    messages: Vec<OpenAiMessage<'a>>,
}

#[derive(Serialize)]
struct OpenAiMessage<'a> {
    role:    &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMsg,
}

#[derive(Deserialize)]
struct OpenAiChoiceMsg {
    content: Option<String>,
}

async fn call_openai(
    client: &reqwest::Client,
    config: &AiConfig,
    prompt: &str,
) -> anyhow::Result<String> {
    let body = OpenAiRequest {
        model:    "gpt-4o",
        messages: vec![
            OpenAiMessage {
                role:    "system",
                content: "You are a precise trading-signal parser. Always respond with valid JSON only.",
            },
            OpenAiMessage { role: "user", content: prompt },
        ],
    };

    debug!("Calling OpenAI API...");

    let resp = client
        .post("https://api.openai.com/v1/chat/completions")
        .bearer_auth(&config.api_key)
        .json(&body)
        .timeout(std::time::Duration::from_secs(30))
        .send()
        .await
        .context("OpenAI API request failed")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        anyhow::bail!("OpenAI API error {status}: {text}");
    }

    let data: OpenAiResponse = resp.json().await.context("OpenAI response parse error")?;

    data.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .context("OpenAI returned empty content")
}

// ─── Tests ────────────────────────────────────────────────────────────────────
