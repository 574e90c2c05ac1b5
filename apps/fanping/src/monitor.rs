use anyhow::{Context, Result};
use fanping_probe::CancellationToken;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub const INTERRUPT_EXIT_CODE: i32 = 130;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    /// First interrupt while probes run: stop waiting and report what arrived.
    Drain,
    /// Interrupt while already draining, or after the run finished.
    ExitNow,
}

/// Tracks whether an interrupt can still be handled by draining, or whether
/// nothing is left to drain and the process must exit.
#[derive(Debug, Clone)]
pub struct InterruptMonitor {
    token: CancellationToken,
    finished: Arc<AtomicBool>,
}

impl InterruptMonitor {
    pub fn new(token: &CancellationToken) -> Self {
        Self {
            token: token.clone(),
            finished: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Called once the drain has closed; later interrupts exit directly.
    pub fn mark_finished(&self) {
        self.finished.store(true, Ordering::SeqCst);
    }

    pub fn on_interrupt(&self) -> InterruptAction {
        if self.finished.load(Ordering::SeqCst) {
            self.token.cancel();
            return InterruptAction::ExitNow;
        }
        if self.token.cancel() {
            InterruptAction::Drain
        } else {
            InterruptAction::ExitNow
        }
    }

    /// Wires Ctrl-C to this monitor.
    pub fn arm(&self) -> Result<()> {
        let monitor = self.clone();
        ctrlc::set_handler(move || match monitor.on_interrupt() {
            InterruptAction::Drain => {
                eprintln!("\nInterrupt signal received, exiting...");
            }
            InterruptAction::ExitNow => {
                eprintln!("\nInterrupt signal received, exiting immediately");
                std::process::exit(INTERRUPT_EXIT_CODE);
            }
        })
        .context("failed to install Ctrl-C handler")?;

        info!("interrupt monitor armed");
        Ok(())
    }
}
