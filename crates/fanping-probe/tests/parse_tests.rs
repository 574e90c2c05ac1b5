use fanping_probe::{parse_ping_summary, parse_ping_summary_with_target};
use std::time::Duration;

#[test]
fn parse_linux_full_reply() {
    let text = include_str!("fixtures/ping_linux_1.txt");
    let summary = parse_ping_summary(text).unwrap();

    assert_eq!(summary.target, "1.1.1.1");
    assert_eq!(summary.transmitted, 4);
    assert_eq!(summary.received, 4);
    assert_eq!(summary.loss_percent, 0.0);

    let rtt = summary.rtt.unwrap();
    assert_eq!(rtt.min, Duration::from_micros(10_123));
    assert_eq!(rtt.avg, Duration::from_micros(11_456));
    assert_eq!(rtt.max, Duration::from_micros(12_789));
    assert_eq!(rtt.stddev, Duration::from_micros(900));
}

#[test]
fn parse_linux_partial_loss_with_errors() {
    let text = include_str!("fixtures/ping_linux_partial_1.txt");
    let stats = parse_ping_summary(text).unwrap().into_stats();

    assert_eq!(stats.target, "203.0.113.7");
    assert_eq!(stats.packets_sent, 5);
    assert_eq!(stats.packets_received, 3);
    assert_eq!(stats.packet_loss_percent, 40.0);
    assert_eq!(stats.max_rtt, Duration::from_millis(42));
}

#[test]
fn parse_linux_total_loss_has_no_rtt() {
    let text = include_str!("fixtures/ping_linux_timeout_1.txt");
    let stats = parse_ping_summary(text).unwrap().into_stats();

    assert_eq!(stats.packets_sent, 15);
    assert_eq!(stats.packets_received, 0);
    assert_eq!(stats.packet_loss_percent, 100.0);
    assert_eq!(stats.avg_rtt, Duration::ZERO);
}

#[test]
fn parse_macos_round_trip() {
    let text = include_str!("fixtures/ping_macos_1.txt");
    let summary = parse_ping_summary(text).unwrap();

    assert_eq!(summary.target, "9.9.9.9");
    assert_eq!(summary.received, 3);
    assert_eq!(summary.loss_percent, 25.0);
    assert_eq!(summary.rtt.unwrap().stddev, Duration::from_micros(243));
}

#[test]
fn fallback_target_without_header() {
    let text = "3 packets transmitted, 3 received, 0% packet loss";
    let summary = parse_ping_summary_with_target(text, "a.test").unwrap();
    assert_eq!(summary.target, "a.test");

    assert!(parse_ping_summary(text).is_err());
}
