use crate::cancel::CancellationToken;
use crate::collector::ResultCollector;
use crate::prober::{Prober, SystemPingProber};
use crate::worker::spawn_worker;
use anyhow::Result;
use fanping_model::{ConfigError, RunReport, RunState, SessionConfig};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub fn run_probes(
    targets: &[String],
    config: &SessionConfig,
    cancel: &CancellationToken,
) -> Result<RunReport> {
    run_probes_with_prober(targets, config, cancel, Arc::new(SystemPingProber::new()))
}

/// Probes every target concurrently and blocks until all of them reported or
/// `cancel` fired.
///
/// Configuration problems are returned as [`ConfigError`] before any worker
/// starts. Probe failures never fail the run; they show up as `Failure`
/// outcomes in the report.
pub fn run_probes_with_prober<P>(
    targets: &[String],
    config: &SessionConfig,
    cancel: &CancellationToken,
    prober: Arc<P>,
) -> Result<RunReport>
where
    P: Prober + ?Sized + 'static,
{
    if targets.is_empty() {
        return Err(ConfigError::NoTargets.into());
    }
    config.validate()?;

    let config = Arc::new(config.clone());
    let mut collector = ResultCollector::new(targets.len());
    let mut handles = Vec::with_capacity(targets.len());

    for target in targets {
        if cancel.is_cancelled() {
            debug!(spawned = handles.len(), "cancelled while spawning workers");
            break;
        }
        let publisher = collector.publisher(target)?;
        match spawn_worker(Arc::clone(&prober), Arc::clone(&config), publisher) {
            Ok(handle) => handles.push(handle),
            Err(err) => warn!(addr = %target, "failed to start probe worker: {err}"),
        }
    }

    let started = Instant::now();
    let mut drain = collector.drain(cancel);
    let mut outcomes = Vec::with_capacity(targets.len());
    for outcome in drain.by_ref() {
        debug!(
            addr = %outcome.target(),
            collected = outcomes.len() + 1,
            expected = targets.len(),
            "outcome collected"
        );
        outcomes.push(outcome);
    }
    let elapsed = started.elapsed();
    let state = drain.state();

    match state {
        RunState::Completed => {
            for handle in handles {
                if handle.join().is_err() {
                    warn!("probe worker panicked");
                }
            }
        }
        _ => info!(
            collected = outcomes.len(),
            expected = targets.len(),
            "run aborted, leaving outstanding workers behind"
        ),
    }

    Ok(RunReport {
        targets: targets.to_vec(),
        outcomes,
        state,
        elapsed,
    })
}
