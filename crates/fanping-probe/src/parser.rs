use anyhow::{anyhow, Result};
use fanping_model::{loss_percent, ProbeStats};
use std::time::Duration;

/// Counts and RTT figures read from a `ping` summary block.
#[derive(Debug, Clone, PartialEq)]
pub struct PingSummary {
    pub target: String,
    pub transmitted: u32,
    pub received: u32,
    pub loss_percent: f64,
    pub rtt: Option<RttSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RttSummary {
    pub min: Duration,
    pub avg: Duration,
    pub max: Duration,
    pub stddev: Duration,
}

impl PingSummary {
    pub fn into_stats(self) -> ProbeStats {
        let rtt = self.rtt.unwrap_or(RttSummary {
            min: Duration::ZERO,
            avg: Duration::ZERO,
            max: Duration::ZERO,
            stddev: Duration::ZERO,
        });

        ProbeStats {
            target: self.target,
            packets_sent: self.transmitted,
            packets_received: self.received,
            packet_loss_percent: self.loss_percent,
            min_rtt: rtt.min,
            avg_rtt: rtt.avg,
            max_rtt: rtt.max,
            stddev_rtt: rtt.stddev,
        }
    }
}

pub fn parse_ping_summary(text: &str) -> Result<PingSummary> {
    parse_ping_summary_inner(text, None)
}

pub fn parse_ping_summary_with_target(text: &str, fallback_target: &str) -> Result<PingSummary> {
    parse_ping_summary_inner(text, Some(fallback_target))
}

fn parse_ping_summary_inner(text: &str, fallback_target: Option<&str>) -> Result<PingSummary> {
    let mut target: Option<String> = None;
    let mut counts: Option<(u32, u32, Option<f64>)> = None;
    let mut rtt: Option<RttSummary> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with("---") && line.contains("ping statistics") {
            if target.is_none() {
                target = parse_statistics_header(line);
            }
            continue;
        }

        if line.contains("packets transmitted") {
            counts = Some(parse_counts_line(line)?);
            continue;
        }

        let lower = line.to_ascii_lowercase();
        if lower.starts_with("rtt ") || lower.starts_with("round-trip") {
            rtt = Some(parse_rtt_line(line)?);
        }
    }

    let (transmitted, received, reported_loss) =
        counts.ok_or_else(|| anyhow!("missing packet counts in ping output"))?;

    let target = match target {
        Some(value) => value,
        None => fallback_target
            .filter(|value| !value.trim().is_empty())
            .map(|value| value.to_string())
            .ok_or_else(|| anyhow!("missing target in ping output"))?,
    };

    Ok(PingSummary {
        target,
        transmitted,
        received,
        loss_percent: reported_loss.unwrap_or_else(|| loss_percent(transmitted, received)),
        rtt,
    })
}

fn parse_statistics_header(line: &str) -> Option<String> {
    let inner = line.trim_matches('-').trim();
    let name = inner.strip_suffix("ping statistics")?.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

// "4 packets transmitted, 3 received, +1 errors, 25% packet loss, time 3004ms"
// "4 packets transmitted, 4 packets received, 0.0% packet loss"
fn parse_counts_line(line: &str) -> Result<(u32, u32, Option<f64>)> {
    let mut transmitted: Option<u32> = None;
    let mut received: Option<u32> = None;
    let mut loss: Option<f64> = None;

    for part in line.split(',') {
        let part = part.trim();
        if part.ends_with("transmitted") {
            transmitted = Some(leading_number(part)?);
        } else if part.ends_with("received") {
            received = Some(leading_number(part)?);
        } else if let Some(value) = part.strip_suffix("packet loss") {
            let value = value.trim().trim_end_matches('%');
            loss = Some(
                value
                    .parse::<f64>()
                    .map_err(|_| anyhow!("invalid packet loss token: {value}"))?,
            );
        }
    }

    let transmitted = transmitted.ok_or_else(|| anyhow!("missing transmitted count: {line}"))?;
    let received = received.ok_or_else(|| anyhow!("missing received count: {line}"))?;
    Ok((transmitted, received, loss))
}

fn leading_number(part: &str) -> Result<u32> {
    let token = part
        .split_whitespace()
        .next()
        .ok_or_else(|| anyhow!("empty count field"))?;
    token
        .parse()
        .map_err(|_| anyhow!("invalid count token: {token}"))
}

// "rtt min/avg/max/mdev = 10.1/11.2/12.3/0.8 ms"
fn parse_rtt_line(line: &str) -> Result<RttSummary> {
    let (_, values) = line
        .split_once('=')
        .ok_or_else(|| anyhow!("malformed rtt line: {line}"))?;
    // iputils may append ", pipe N"
    let values = values.split(',').next().unwrap_or_default();
    let values = values.trim().trim_end_matches("ms").trim();

    let parsed: Vec<Duration> = values
        .split('/')
        .map(|tok| {
            tok.trim()
                .parse::<f64>()
                .map(millis_to_duration)
                .map_err(|_| anyhow!("invalid rtt token: {tok}"))
        })
        .collect::<Result<_>>()?;

    match parsed.as_slice() {
        [min, avg, max, stddev] => Ok(RttSummary {
            min: *min,
            avg: *avg,
            max: *max,
            stddev: *stddev,
        }),
        // busybox omits the deviation
        [min, avg, max] => Ok(RttSummary {
            min: *min,
            avg: *avg,
            max: *max,
            stddev: Duration::ZERO,
        }),
        _ => Err(anyhow!("unexpected number of rtt values: {}", parsed.len())),
    }
}

fn millis_to_duration(ms: f64) -> Duration {
    Duration::from_micros((ms * 1000.0).round().max(0.0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_names_target() {
        let line = "--- 1.1.1.1 ping statistics ---";
        assert_eq!(parse_statistics_header(line), Some("1.1.1.1".to_string()));
    }

    #[test]
    fn counts_with_errors_field() {
        let line = "4 packets transmitted, 0 received, +4 errors, 100% packet loss, time 3050ms";
        assert_eq!(parse_counts_line(line).unwrap(), (4, 0, Some(100.0)));
    }

    #[test]
    fn rtt_values_are_microsecond_rounded() {
        let rtt = parse_rtt_line("rtt min/avg/max/mdev = 10.123/11.456/12.789/0.900 ms").unwrap();
        assert_eq!(rtt.min, Duration::from_micros(10_123));
        assert_eq!(rtt.stddev, Duration::from_micros(900));
    }

    #[test]
    fn rtt_line_without_deviation() {
        let rtt = parse_rtt_line("round-trip min/avg/max = 1.0/2.0/3.0 ms").unwrap();
        assert_eq!(rtt.max, Duration::from_millis(3));
        assert_eq!(rtt.stddev, Duration::ZERO);
        assert!(parse_rtt_line("rtt min/avg = 1.0/2.0 ms").is_err());
    }

    #[test]
    fn missing_counts_is_an_error() {
        let text = "ping: bad.invalid: Name or service not known";
        assert!(parse_ping_summary_with_target(text, "bad.invalid").is_err());
    }

    #[test]
    fn loss_is_derived_when_not_reported() {
        let text = "--- x ping statistics ---\n5 packets transmitted, 4 received";
        let summary = parse_ping_summary(text).unwrap();
        assert_eq!(summary.loss_percent, 20.0);
        assert!(summary.rtt.is_none());
    }
}
