//! net.ip_latency — resolve a domain and measure ICMP latency to it

use serde::Deserialize;
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

use super::pinger::Pinger;
use super::resolver::Resolver;

/// The only text callers see when a probe fails, whatever the cause.
pub const FALLBACK_MESSAGE: &str = "cannot get the domain name right now, please try again later";

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("domain is empty")]
    EmptyDomain,
    #[error("invalid domain {0:?}")]
    InvalidDomain(String),
    #[error("could not resolve {domain}: {reason}")]
    ResolutionFailed { domain: String, reason: String },
    #[error("could not start pinger for {address}: {reason}")]
    ProbeSetupFailed { address: IpAddr, reason: String },
}

/// Arguments of a net.ip_latency call
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbeRequest {
    #[serde(default)]
    pub domain: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Unreachable,
    NoIcmpSupport,
    Success,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    pub domain: String,
    pub resolved_address: Option<IpAddr>,
    pub average_rtt: Option<Duration>,
    pub packet_loss_percent: Option<f64>,
    pub classification: Classification,
}

impl ProbeOutcome {
    pub fn unreachable(domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            resolved_address: None,
            average_rtt: None,
            packet_loss_percent: None,
            classification: Classification::Unreachable,
        }
    }

    /// The sentence handed back to the LLM.
    pub fn message(&self) -> String {
        match (self.classification, self.resolved_address, self.average_rtt) {
            (Classification::Success, Some(ip), Some(rtt)) => format!(
                "domain {} has ip {ip} with average latency {}, make sure answer with the IP address and Latency",
                self.domain,
                format_rtt(rtt)
            ),
            (Classification::NoIcmpSupport, Some(ip), _) => format!(
                "domain {} has ip {ip}, but it does not support ICMP protocol or network is unavailable now, so I can not get the latency data",
                self.domain
            ),
            _ => FALLBACK_MESSAGE.to_string(),
        }
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Render an RTT the way people write it: `12ms`, `12.345ms`, `1.2s`.
pub fn format_rtt(rtt: Duration) -> String {
    format!("{rtt:?}")
}

/// Render packet loss as a plain percentage, e.g. `33.33%`.
pub fn format_packet_loss(percent: f64) -> String {
    format!("{percent:.2}%")
}

/// Resolves a domain, pings its first address, and classifies the result.
///
/// Holds no per-request state; every call starts from scratch.
pub struct DomainLatencyProbe<R, P> {
    resolver: R,
    pinger: P,
}

impl<R: Resolver, P: Pinger> DomainLatencyProbe<R, P> {
    pub fn new(resolver: R, pinger: P) -> Self {
        Self { resolver, pinger }
    }

    pub fn measure(&self, domain: &str) -> Result<ProbeOutcome, ProbeError> {
        let domain = domain.trim();
        if domain.is_empty() {
            return Err(ProbeError::EmptyDomain);
        }
        // Would be read as an option by the resolver and ping utilities
        if domain.starts_with('-') {
            return Err(ProbeError::InvalidDomain(domain.to_string()));
        }

        let addresses =
            self.resolver
                .resolve(domain)
                .map_err(|e| ProbeError::ResolutionFailed {
                    domain: domain.to_string(),
                    reason: format!("{e:#}"),
                })?;

        for ip in &addresses {
            info!(domain, %ip, "resolved address");
        }

        let address = *addresses
            .first()
            .ok_or_else(|| ProbeError::ResolutionFailed {
                domain: domain.to_string(),
                reason: "no addresses returned".to_string(),
            })?;

        let stats = self
            .pinger
            .ping(address)
            .map_err(|e| ProbeError::ProbeSetupFailed {
                address,
                reason: format!("{e:#}"),
            })?;

        info!(
            domain,
            ip = %address,
            latency = ?stats.avg_rtt,
            packet_loss = %format_packet_loss(stats.packet_loss_percent),
            "measured latency"
        );

        let classification = if stats.avg_rtt.is_zero() {
            Classification::NoIcmpSupport
        } else {
            Classification::Success
        };

        Ok(ProbeOutcome {
            domain: domain.to_string(),
            resolved_address: Some(address),
            average_rtt: Some(stats.avg_rtt),
            packet_loss_percent: Some(stats.packet_loss_percent),
            classification,
        })
    }

    pub fn probe(&self, domain: &str) -> Result<String, ProbeError> {
        self.measure(domain).map(|outcome| outcome.message())
    }

    /// Caller-facing entry point: never fails, errors are logged and
    /// collapsed into [`FALLBACK_MESSAGE`].
    pub fn respond(&self, domain: &str) -> String {
        let outcome = match self.measure(domain) {
            Ok(outcome) => outcome,
            Err(ProbeError::EmptyDomain) => {
                warn!("domain is empty");
                ProbeOutcome::unreachable(domain)
            }
            Err(e) => {
                error!(domain, error = %e, "probe failed");
                ProbeOutcome::unreachable(domain)
            }
        };
        outcome.message()
    }

    /// Tool handler: decode the call arguments and respond.
    pub fn execute(&self, input: &[u8]) -> String {
        match serde_json::from_slice::<ProbeRequest>(input) {
            Ok(request) => self.respond(&request.domain),
            Err(e) => {
                error!(error = %e, "unmarshal arguments");
                FALLBACK_MESSAGE.to_string()
            }
        }
    }
}
