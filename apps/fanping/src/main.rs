mod monitor;
mod report;
mod targets;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use fanping_model::{
    ConfigError, SessionConfig, DEFAULT_INTERVAL, DEFAULT_PACKET_COUNT, DEFAULT_TIMEOUT,
};
use fanping_probe::{run_probes, CancellationToken};
use monitor::{InterruptMonitor, INTERRUPT_EXIT_CODE};
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "fanping",
    version,
    about = "Ping a set of hosts concurrently and summarise round-trip statistics. Only probe hosts you are allowed to test."
)]
struct Cli {
    /// Hosts or IP addresses to probe.
    #[arg(value_name = "TARGET")]
    positional: Vec<String>,

    /// File with one target per line.
    #[arg(long)]
    targets: Option<PathBuf>,

    #[arg(long = "target")]
    target_list: Vec<String>,

    #[arg(long, default_value_t = DEFAULT_PACKET_COUNT)]
    count: u32,

    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_millis() as u64)]
    timeout_ms: u64,

    #[arg(long, default_value_t = DEFAULT_INTERVAL.as_millis() as u64)]
    interval_ms: u64,

    /// Do not require raw-socket mode.
    #[arg(long)]
    unprivileged: bool,

    /// Wait for Enter before exiting.
    #[arg(long)]
    pause: bool,

    #[arg(long, short)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            if err.downcast_ref::<ConfigError>().is_some() {
                2
            } else {
                1
            }
        }
    };
    std::process::exit(code);
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(ansi_enabled(&io::stderr()))
        .init();
}

/// Colour codes only when the log stream is an interactive terminal.
fn ansi_enabled(stream: &impl IsTerminal) -> bool {
    stream.is_terminal()
}

fn run(cli: Cli) -> Result<i32> {
    let mut extra = cli.positional;
    extra.extend(cli.target_list);
    let targets = targets::collect_targets(cli.targets.as_deref(), extra)?;

    let config = SessionConfig {
        packet_count: cli.count,
        timeout: Duration::from_millis(cli.timeout_ms),
        interval: Duration::from_millis(cli.interval_ms),
        privileged: !cli.unprivileged,
    };
    debug!(targets = targets.len(), ?config, "starting run");

    let token = CancellationToken::new();
    let interrupts = InterruptMonitor::new(&token);
    interrupts.arm()?;

    let started_at = Utc::now();
    let report = run_probes(&targets, &config, &token);
    interrupts.mark_finished();
    let report = report?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    report::write_report(&mut out, &report, started_at).context("failed to write report")?;
    out.flush().context("failed to flush report")?;
    drop(out);

    if report.is_partial() || token.is_cancelled() {
        return Ok(INTERRUPT_EXIT_CODE);
    }

    if cli.pause {
        wait_for_enter()?;
    }
    Ok(0)
}

fn wait_for_enter() -> Result<()> {
    println!("\nPress Enter to exit...");
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn redirected_logs_have_no_colour() {
        let file = File::open(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml")).unwrap();
        assert!(!ansi_enabled(&file));
    }
}
