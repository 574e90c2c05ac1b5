use chrono::{DateTime, SecondsFormat, Utc};
use fanping_model::{ProbeOutcome, RunReport};
use std::io::{self, Write};
use std::time::Duration;

pub fn write_report<W: Write>(
    out: &mut W,
    report: &RunReport,
    started_at: DateTime<Utc>,
) -> io::Result<()> {
    writeln!(
        out,
        "fanping run started {} ({} targets)",
        started_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        report.targets.len()
    )?;

    if report.is_partial() {
        writeln!(
            out,
            "interrupted: {} of {} targets reported, results are partial",
            report.outcomes.len(),
            report.targets.len()
        )?;
    }

    for outcome in &report.outcomes {
        write_outcome(out, outcome)?;
    }

    if report.is_partial() {
        writeln!(
            out,
            "\nElapsed before interrupt: {}",
            format_duration(report.elapsed)
        )
    } else {
        writeln!(
            out,
            "\nTotal time for all pings: {}",
            format_duration(report.elapsed)
        )
    }
}

fn write_outcome<W: Write>(out: &mut W, outcome: &ProbeOutcome) -> io::Result<()> {
    match outcome {
        ProbeOutcome::Stats(stats) => {
            writeln!(out, "\n--- Ping statistics for {} ---", stats.target)?;
            writeln!(
                out,
                "{} packets transmitted, {} packets received, {:.2}% packet loss",
                stats.packets_sent, stats.packets_received, stats.packet_loss_percent
            )?;
            writeln!(
                out,
                "round-trip min/avg/max/stddev = {}/{}/{}/{}",
                format_duration(stats.min_rtt),
                format_duration(stats.avg_rtt),
                format_duration(stats.max_rtt),
                format_duration(stats.stddev_rtt)
            )
        }
        ProbeOutcome::Failure { target, message } => {
            writeln!(out, "\n--- Ping failed for {target} ---")?;
            writeln!(out, "error: {message}")
        }
    }
}

pub fn format_duration(duration: Duration) -> String {
    if duration.is_zero() {
        "0s".to_string()
    } else if duration >= Duration::from_secs(1) {
        format!("{:.3}s", duration.as_secs_f64())
    } else if duration >= Duration::from_millis(1) {
        format!("{:.3}ms", duration.as_secs_f64() * 1000.0)
    } else {
        format!("{}µs", duration.as_micros())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use fanping_model::{ProbeStats, RunState};

    fn started() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 1, 12, 34, 56).unwrap()
    }

    fn render(report: &RunReport) -> String {
        let mut buf = Vec::new();
        write_report(&mut buf, report, started()).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn complete_report_lists_every_outcome() {
        let mut stats = ProbeStats::from_counts("b.test", 100, 80);
        stats.min_rtt = Duration::from_micros(10_123);
        stats.avg_rtt = Duration::from_micros(11_456);
        stats.max_rtt = Duration::from_micros(12_789);
        stats.stddev_rtt = Duration::from_micros(900);

        let report = RunReport {
            targets: vec!["b.test".to_string(), "bad.invalid".to_string()],
            outcomes: vec![
                ProbeOutcome::Stats(stats),
                ProbeOutcome::failure("bad.invalid", "unknown host"),
            ],
            state: RunState::Completed,
            elapsed: Duration::from_millis(15_250),
        };

        let text = render(&report);
        assert!(text.starts_with("fanping run started 2026-02-01T12:34:56Z (2 targets)\n"));
        assert!(text.contains("--- Ping statistics for b.test ---"));
        assert!(text.contains("100 packets transmitted, 80 packets received, 20.00% packet loss"));
        assert!(text.contains("round-trip min/avg/max/stddev = 10.123ms/11.456ms/12.789ms/900µs"));
        assert!(text.contains("--- Ping failed for bad.invalid ---\nerror: unknown host"));
        assert!(text.ends_with("Total time for all pings: 15.250s\n"));
        assert!(!text.contains("interrupted"));
    }

    #[test]
    fn partial_report_is_labelled() {
        let report = RunReport {
            targets: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            outcomes: vec![ProbeOutcome::Stats(ProbeStats::from_counts("a", 5, 5))],
            state: RunState::Aborted,
            elapsed: Duration::from_millis(420),
        };

        let text = render(&report);
        assert!(text.contains("interrupted: 1 of 3 targets reported, results are partial"));
        assert!(text.ends_with("Elapsed before interrupt: 420.000ms\n"));
        assert!(!text.contains("Total time"));
    }

    #[test]
    fn durations_pick_a_readable_unit() {
        assert_eq!(format_duration(Duration::ZERO), "0s");
        assert_eq!(format_duration(Duration::from_micros(250)), "250µs");
        assert_eq!(format_duration(Duration::from_micros(1_500)), "1.500ms");
        assert_eq!(format_duration(Duration::from_secs(2)), "2.000s");
    }
}
