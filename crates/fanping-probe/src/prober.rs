use crate::parser::parse_ping_summary_with_target;
use anyhow::{anyhow, Context, Result};
use fanping_model::{ProbeStats, SessionConfig};
use std::process::Command;
use std::time::Duration;
use tracing::debug;

/// Shortest interval the system `ping` accepts without raw-socket privileges.
pub const UNPRIVILEGED_MIN_INTERVAL: Duration = Duration::from_millis(200);

/// A bounded ICMP echo session against one address.
///
/// Implementations must be safe to call from many worker threads at once and
/// must return within `config.timeout` or fail.
pub trait Prober: Send + Sync {
    fn probe(&self, target: &str, config: &SessionConfig) -> Result<ProbeStats>;
}

/// Session deadline flag: iputils uses `-w`, the BSD/macOS `ping` uses `-t`.
pub const DEADLINE_FLAG: &str = if cfg!(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd"
)) {
    "-t"
} else {
    "-w"
};

/// Runs the host's `ping` binary and parses its summary block.
///
/// Linux iputils and BSD/macOS `ping` share `-n -c -i`; only the deadline
/// flag differs (see [`DEADLINE_FLAG`]).
#[derive(Debug, Clone)]
pub struct SystemPingProber {
    program: String,
}

impl Default for SystemPingProber {
    fn default() -> Self {
        Self {
            program: "ping".to_string(),
        }
    }
}

impl SystemPingProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn command_args(target: &str, config: &SessionConfig) -> Vec<String> {
        let interval = if config.privileged {
            config.interval
        } else {
            config.interval.max(UNPRIVILEGED_MIN_INTERVAL)
        };

        vec![
            "-n".to_string(),
            "-c".to_string(),
            config.packet_count.to_string(),
            "-i".to_string(),
            format!("{:.3}", interval.as_secs_f64()),
            DEADLINE_FLAG.to_string(),
            deadline_secs(config.timeout).to_string(),
            target.to_string(),
        ]
    }
}

impl Prober for SystemPingProber {
    fn probe(&self, target: &str, config: &SessionConfig) -> Result<ProbeStats> {
        let output = Command::new(&self.program)
            .args(Self::command_args(target, config))
            .output()
            .with_context(|| format!("failed to spawn {} for {target}", self.program))?;

        let stdout = String::from_utf8_lossy(&output.stdout);

        // ping exits non-zero when replies are missing but still prints a
        // summary; partial statistics beat a bare failure.
        match parse_ping_summary_with_target(&stdout, target) {
            Ok(summary) => {
                if !output.status.success() {
                    debug!(
                        addr = %target,
                        status = %output.status,
                        received = summary.received,
                        "ping finished with missing replies"
                    );
                }
                let mut stats = summary.into_stats();
                stats.target = target.to_string();
                Ok(stats)
            }
            Err(err) if output.status.success() => {
                Err(err.context(format!("unreadable ping output for {target}")))
            }
            Err(_) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let detail = if stderr.trim().is_empty() {
                    stdout.trim().to_string()
                } else {
                    stderr.trim().to_string()
                };
                Err(anyhow!(
                    "ping failed for {target} (status: {}): {}",
                    output.status,
                    detail
                ))
            }
        }
    }
}

fn deadline_secs(timeout: Duration) -> u64 {
    let millis = timeout.as_millis() as u64;
    ((millis + 999) / 1000).max(1)
}
