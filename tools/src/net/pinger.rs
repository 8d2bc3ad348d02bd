//! ICMP echo via the system `ping` utility

use anyhow::{Context, Result};
use std::net::IpAddr;
use std::process::Command;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ProbeConfig;

/// Summary of a finished ping run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PingStats {
    pub transmitted: u32,
    pub received: u32,
    pub packet_loss_percent: f64,
    /// Zero when no reply came back
    pub avg_rtt: Duration,
}

impl PingStats {
    /// Stats for a run that produced no usable summary.
    pub fn silent(count: u32) -> Self {
        Self {
            transmitted: count,
            received: 0,
            packet_loss_percent: 100.0,
            avg_rtt: Duration::ZERO,
        }
    }
}

/// Sends a fixed number of echo requests to an address and blocks until
/// they complete or the deadline passes.
///
/// An `Err` means the pinger could not be started at all. A run with no
/// replies is still `Ok`, with a zero average RTT.
pub trait Pinger: Send + Sync {
    fn ping(&self, addr: IpAddr) -> Result<PingStats>;
}

/// Runs the platform `ping` binary
#[derive(Debug, Clone)]
pub struct CommandPinger {
    binary: String,
    count: u32,
    timeout: Duration,
}

impl CommandPinger {
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            binary: config.ping_binary.clone(),
            count: config.count.max(1),
            timeout: Duration::from_secs(config.timeout_secs.max(1)),
        }
    }

    fn args(&self, addr: IpAddr) -> Vec<String> {
        let mut args = vec![
            "-n".to_string(),
            "-c".to_string(),
            self.count.to_string(),
        ];
        if cfg!(target_os = "macos") {
            // -t: overall timeout in seconds on BSD ping
            args.push("-t".to_string());
        } else {
            // -w: deadline in seconds on iputils/busybox ping
            args.push("-w".to_string());
        }
        args.push(self.timeout.as_secs().to_string());
        args.push(addr.to_string());
        args
    }

    fn program(&self, addr: IpAddr) -> &str {
        if cfg!(target_os = "macos") && addr.is_ipv6() && self.binary == "ping" {
            "ping6"
        } else {
            &self.binary
        }
    }
}

impl Pinger for CommandPinger {
    fn ping(&self, addr: IpAddr) -> Result<PingStats> {
        let program = self.program(addr);
        let output = Command::new(program)
            .args(self.args(addr))
            .output()
            .with_context(|| format!("Failed to execute {program}"))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!("{program} exited with {}", output.status);

        match parse_ping_output(&stdout) {
            Some(stats) => Ok(stats),
            None => {
                warn!(
                    "{program} produced no statistics for {addr}: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                Ok(PingStats::silent(self.count))
            }
        }
    }
}

/// Parse the summary of iputils, busybox, or BSD ping.
///
/// Returns `None` when the packet summary line is missing.
pub fn parse_ping_output(output: &str) -> Option<PingStats> {
    let summary = output.lines().find(|l| l.contains("packets transmitted"))?;

    let mut transmitted = 0;
    let mut received = 0;
    let mut packet_loss_percent = None;

    // "3 packets transmitted, 3 received, 0% packet loss, time 2003ms"
    // "3 packets transmitted, 3 packets received, 0.0% packet loss"
    for part in summary.split(',').map(str::trim) {
        if part.contains("transmitted") {
            transmitted = leading_number(part).unwrap_or(0);
        } else if part.contains("received") {
            received = leading_number(part).unwrap_or(0);
        } else if let Some(loss) = part.strip_suffix("% packet loss") {
            packet_loss_percent = loss.trim().parse::<f64>().ok();
        }
    }

    let packet_loss_percent = packet_loss_percent.unwrap_or_else(|| {
        if transmitted == 0 {
            100.0
        } else {
            f64::from(transmitted.saturating_sub(received)) / f64::from(transmitted) * 100.0
        }
    });

    let avg_rtt = if received == 0 {
        Duration::ZERO
    } else {
        parse_avg_rtt_ms(output).map(ms_to_duration).unwrap_or(Duration::ZERO)
    };

    Some(PingStats {
        transmitted,
        received,
        packet_loss_percent,
        avg_rtt,
    })
}

fn leading_number(part: &str) -> Option<u32> {
    part.split_whitespace().next()?.parse().ok()
}

fn parse_avg_rtt_ms(output: &str) -> Option<f64> {
    // "rtt min/avg/max/mdev = 1.234/2.345/3.456/0.567 ms"
    // "round-trip min/avg/max/stddev = 1.234/2.345/3.456/0.567 ms"
    let line = output.lines().find(|l| l.contains("min/avg/max"))?;
    let values = line.split('=').nth(1)?.trim();
    values.split('/').nth(1)?.trim().parse::<f64>().ok()
}

fn ms_to_duration(ms: f64) -> Duration {
    Duration::from_nanos((ms * 1_000_000.0).round().max(0.0) as u64)
}
