//! Concurrent ICMP probing: workers, fan-in collection and cancellation.

pub mod cancel;
pub mod collector;
pub mod parser;
pub mod prober;
pub mod run;
pub mod worker;

pub use cancel::{CancellationToken, HookId};
pub use collector::{CollectorError, Drain, Publisher, ResultCollector, UNREPORTED_MESSAGE};
pub use parser::{parse_ping_summary, parse_ping_summary_with_target, PingSummary, RttSummary};
pub use prober::{Prober, SystemPingProber, DEADLINE_FLAG, UNPRIVILEGED_MIN_INTERVAL};
pub use run::{run_probes, run_probes_with_prober};
pub use worker::{run_probe, spawn_worker};
