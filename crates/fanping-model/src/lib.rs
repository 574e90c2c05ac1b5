//! Shared data structures for fanping.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_PACKET_COUNT: u32 = 100;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

/// Parameters shared by every probe worker in one run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    pub packet_count: u32,
    pub timeout: Duration,
    pub interval: Duration,
    /// Whether raw-socket mode is required.
    pub privileged: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            packet_count: DEFAULT_PACKET_COUNT,
            timeout: DEFAULT_TIMEOUT,
            interval: DEFAULT_INTERVAL,
            privileged: true,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.packet_count == 0 {
            return Err(ConfigError::ZeroPacketCount);
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no targets provided")]
    NoTargets,
    #[error("packet count must be greater than zero")]
    ZeroPacketCount,
    #[error("timeout must be greater than zero")]
    ZeroTimeout,
    #[error("interval must be greater than zero")]
    ZeroInterval,
}

/// Aggregate statistics of one echo session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProbeStats {
    pub target: String,
    pub packets_sent: u32,
    pub packets_received: u32,
    pub packet_loss_percent: f64,
    pub min_rtt: Duration,
    pub avg_rtt: Duration,
    pub max_rtt: Duration,
    pub stddev_rtt: Duration,
}

impl ProbeStats {
    /// Stats with no RTT samples; loss is derived from the counts.
    pub fn from_counts(target: impl Into<String>, sent: u32, received: u32) -> Self {
        Self {
            target: target.into(),
            packets_sent: sent,
            packets_received: received,
            packet_loss_percent: loss_percent(sent, received),
            min_rtt: Duration::ZERO,
            avg_rtt: Duration::ZERO,
            max_rtt: Duration::ZERO,
            stddev_rtt: Duration::ZERO,
        }
    }
}

/// Percentage of `sent` packets that got no reply, clamped to 0..=100.
pub fn loss_percent(sent: u32, received: u32) -> f64 {
    if sent == 0 {
        return 100.0;
    }
    let lost = sent.saturating_sub(received) as f64;
    (lost * 100.0 / sent as f64).clamp(0.0, 100.0)
}

/// Terminal result of one probe worker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeOutcome {
    Stats(ProbeStats),
    Failure { target: String, message: String },
}

impl ProbeOutcome {
    pub fn failure(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failure {
            target: target.into(),
            message: message.into(),
        }
    }

    pub fn target(&self) -> &str {
        match self {
            Self::Stats(stats) => &stats.target,
            Self::Failure { target, .. } => target,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    pub fn stats(&self) -> Option<&ProbeStats> {
        match self {
            Self::Stats(stats) => Some(stats),
            Self::Failure { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Running,
    Completed,
    Aborted,
}

/// Everything the reporter needs once a run has ended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunReport {
    pub targets: Vec<String>,
    pub outcomes: Vec<ProbeOutcome>,
    pub state: RunState,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn is_partial(&self) -> bool {
        self.state == RunState::Aborted
    }

    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }
}
