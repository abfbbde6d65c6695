use std::time::{Duration, Instant};

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::ViewError;

pub const SUMMARY_COOLDOWN: Duration = Duration::from_secs(30);

/// Minimum spacing between summarizer calls. The clock starts on every
/// attempt, successful or not.
#[derive(Debug)]
pub struct SummaryGate {
    min_interval: Duration,
    last_attempt: Option<Instant>,
}

impl Default for SummaryGate {
    fn default() -> Self {
        Self::new(SUMMARY_COOLDOWN)
    }
}

impl SummaryGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_attempt: None,
        }
    }

    /// Records an attempt at `now`, or reports how many whole seconds remain.
    pub fn try_begin(&mut self, now: Instant) -> Result<(), ViewError> {
        if let Some(last) = self.last_attempt {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.min_interval {
                let remaining = self.min_interval - elapsed;
                // Round up so "wait 0 seconds" is never shown.
                let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
                return Err(ViewError::CoolingDown(secs));
            }
        }
        self.last_attempt = Some(now);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct SummaryRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(alias = "Summary")]
    summary: String,
}

/// Text-in/text-out call to an external summarizer, throttled per session.
pub struct SummaryClient {
    http: Client,
    endpoint: Url,
    gate: Mutex<SummaryGate>,
}

impl SummaryClient {
    pub fn new(endpoint: Url) -> Self {
        Self {
            http: Client::new(),
            endpoint,
            gate: Mutex::new(SummaryGate::default()),
        }
    }

    pub async fn summarize(&self, text: &str) -> Result<String, ViewError> {
        self.gate.lock().await.try_begin(Instant::now())?;

        debug!(chars = text.chars().count(), "Requesting summary");
        let resp = self
            .http
            .post(self.endpoint.clone())
            .json(&SummaryRequest { text })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            warn!("Summarizer returned {}: {}", status, message);
            return Err(ViewError::Server {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.json::<SummaryResponse>().await?.summary)
    }
}
