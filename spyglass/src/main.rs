//! Spyglass entry point — config, logging, the sequential message loop.

use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use spyglass::ai::AiExtractor;
use spyglass::config::Config;
use spyglass::extract::{ExtractStrategy, Extraction, Extractor, NoiseReason};
use spyglass::message::InboundMessage;
use spyglass::metrics::{AtomicMetrics, MetricsSink};
use spyglass::patterns::PatternExtractor;
use spyglass::poster::{self, SignalPayload};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("spyglass=debug".parse()?)
                .add_directive("reqwest=warn".parse()?),
        )
        .init();

    info!(r#"

  ╔═══════════════════════════════════════════╗
  ║   SPYGLASS — Channel Listener Agent       ║
  ║   Extract · Validate · Deliver            ║
  ╚═══════════════════════════════════════════╝"#);

    let config = Config::from_env().context("Failed to load config")?;
    let client = reqwest::Client::new();

    let mut strategies: Vec<Box<dyn ExtractStrategy>> = Vec::new();
    if let Some(ai) = config.ai.clone() {
        info!(provider = %ai.provider, "AI extraction enabled");
        strategies.push(Box::new(AiExtractor::new(client.clone(), ai)));
    } else {
        info!("No AI_API_KEY — running on the pattern scanner alone");
    }
    strategies.push(Box::new(PatternExtractor));
    let extractor = Extractor::new(strategies);

    let metrics = Arc::new(AtomicMetrics::default());

    info!(
        relay    = %config.relay_url,
        interval = ?config.stats_interval,
        "🚀 Spyglass started — reading NDJSON from stdin"
    );

    // ── Session-stats reporter ────────────────────────────────────────────────
    let reporter = {
        let metrics = metrics.clone();
        let period = config.stats_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await; // the first tick fires immediately
            loop {
                ticker.tick().await;
                let snap = metrics.snapshot();
                info!(
                    messages  = snap.messages_seen,
                    signals   = snap.signals_found,
                    delivered = snap.signals_delivered,
                    failed    = snap.deliveries_failed,
                    "📊 Session stats"
                );
            }
        })
    };

    // ── Message loop ──────────────────────────────────────────────────────────
    // One message at a time; the select only races while *waiting* for a
    // line, so an in-flight message always finishes before shutdown.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<InboundMessage>(trimmed) {
                        Ok(msg) => {
                            process_message(&extractor, &client, &config, metrics.as_ref(), msg)
                                .await;
                        }
                        Err(e) => warn!(error = %e, "Malformed bridge line — skipping"),
                    }
                }
                Ok(None) => {
                    info!("Bridge closed stdin — shutting down");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "stdin read failed — shutting down");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Received interrupt signal — shutting down");
                break;
            }
        }
    }

    reporter.abort();
    let snap = metrics.snapshot();
    info!(
        messages  = snap.messages_seen,
        signals   = snap.signals_found,
        delivered = snap.signals_delivered,
        failed    = snap.deliveries_failed,
        "Spyglass stopped"
    );
    Ok(())
}

/// Handle one message end to end: classify, then deliver if it carried a
/// valid signal.
async fn process_message(
    extractor: &Extractor,
    client: &reqwest::Client,
    config: &Config,
    metrics: &dyn MetricsSink,
    msg: InboundMessage,
) {
    metrics.message_seen();

    if msg.text.trim().is_empty() {
        debug!(message_id = msg.message_id, "empty message — skipping");
        return;
    }

    match extractor.classify(&msg).await {
        Extraction::Order(order) => {
            metrics.signal_found();
            let payload = SignalPayload::from_order(order, &msg);
            match poster::post_signal(client, config, &payload).await {
                Ok(outcome) => {
                    metrics.signal_delivered();
                    info!(
                        message_id = msg.message_id,
                        symbol     = %payload.symbol,
                        ?outcome,
                        "✅ Signal delivered"
                    );
                }
                Err(e) => {
                    metrics.delivery_failed();
                    error!(message_id = msg.message_id, error = %e, "❌ Signal delivery failed");
                }
            }
        }
        Extraction::Noise(NoiseReason::InvalidPrices { strategy }) => {
            // Already warned inside the chain; keep the counter honest.
            debug!(message_id = msg.message_id, strategy, "message dropped on price validation");
        }
        Extraction::Noise(reason) => {
            debug!(message_id = msg.message_id, ?reason, "not a signal");
        }
    }
}
