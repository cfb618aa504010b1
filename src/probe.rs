//! Outbound status probes and latency classification.

use std::time::{Duration, Instant};

use reqwest::{StatusCode, header::CACHE_CONTROL};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Up,
    Down,
    Slow,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Slow => "slow",
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown status {0:?}")]
pub struct UnknownStatus(String);

impl TryFrom<String> for Status {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "slow" => Ok(Self::Slow),
            _ => Err(UnknownStatus(value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub status: Status,
    pub response_time_ms: i32,
}

impl ProbeOutcome {
    /// The outcome of a probe that never got a response.
    pub fn unreachable() -> Self {
        Self {
            status: Status::Down,
            response_time_ms: 0,
        }
    }
}

pub fn classify(status: StatusCode, elapsed: Duration, slow_threshold: Duration) -> ProbeOutcome {
    let response_time_ms = i32::try_from(elapsed.as_millis()).unwrap_or(i32::MAX);

    let status = if !status.is_success() {
        Status::Down
    } else if elapsed >= slow_threshold {
        Status::Slow
    } else {
        Status::Up
    };

    ProbeOutcome {
        status,
        response_time_ms,
    }
}

/// Issues probes through a single shared HTTP client.
#[derive(Debug, Clone)]
pub struct Prober {
    client: reqwest::Client,
    slow_threshold: Duration,
}

impl Prober {
    pub fn new(timeout: Duration, slow_threshold: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, slow_threshold))
    }

    pub fn with_client(client: reqwest::Client, slow_threshold: Duration) -> Self {
        Self {
            client,
            slow_threshold,
        }
    }

    /// Probe `url` with a `HEAD` request. Every failure is reported as a
    /// `down` outcome.
    pub async fn probe(&self, url: &str) -> ProbeOutcome {
        let start = Instant::now();
        let response = self
            .client
            .head(url)
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await;

        match response {
            Ok(response) => classify(response.status(), start.elapsed(), self.slow_threshold),
            Err(e) => {
                debug!(url, error = %e, "probe failed");
                ProbeOutcome::unreachable()
            }
        }
    }
}
