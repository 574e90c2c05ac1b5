use crate::collector::Publisher;
use crate::prober::Prober;
use fanping_model::{ProbeOutcome, SessionConfig};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Runs one echo session and folds any error into a `Failure` outcome.
pub fn run_probe<P>(prober: &P, target: &str, config: &SessionConfig) -> ProbeOutcome
where
    P: Prober + ?Sized,
{
    if let Err(reason) = check_target(target) {
        return ProbeOutcome::failure(target, reason);
    }

    match prober.probe(target, config) {
        Ok(mut stats) => {
            stats.target = target.to_string();
            ProbeOutcome::Stats(stats)
        }
        Err(err) => {
            let message = format!("{err:#}");
            if message.trim().is_empty() {
                ProbeOutcome::failure(target, "probe failed")
            } else {
                ProbeOutcome::failure(target, message)
            }
        }
    }
}

fn check_target(target: &str) -> Result<(), String> {
    if target.trim().is_empty() {
        return Err("empty target address".to_string());
    }
    if target.chars().any(char::is_whitespace) {
        return Err(format!("malformed target address: {target:?}"));
    }
    Ok(())
}

/// Starts a worker thread that probes `publisher`'s target and publishes the
/// outcome once.
///
/// If the thread cannot be started the publisher is dropped with the closure
/// and reports a failure for the target on its own.
pub fn spawn_worker<P>(
    prober: Arc<P>,
    config: Arc<SessionConfig>,
    publisher: Publisher,
) -> io::Result<JoinHandle<()>>
where
    P: Prober + ?Sized + 'static,
{
    thread::Builder::new()
        .name("probe-worker".to_string())
        .spawn(move || {
            let target = publisher.target().to_string();
            debug!(addr = %target, "probe started");

            let outcome = run_probe(prober.as_ref(), &target, &config);
            match &outcome {
                ProbeOutcome::Stats(stats) => debug!(
                    addr = %target,
                    sent = stats.packets_sent,
                    received = stats.packets_received,
                    "probe finished"
                ),
                ProbeOutcome::Failure { message, .. } => {
                    warn!(addr = %target, "probe failed: {message}")
                }
            }

            if let Err(err) = publisher.publish(outcome) {
                warn!(addr = %target, "outcome rejected: {err}");
            }
        })
}
