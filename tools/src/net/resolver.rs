//! Domain name resolution

use anyhow::{bail, Result};
use std::net::{IpAddr, ToSocketAddrs};
use std::process::Command;
use tracing::debug;

/// Resolves a host name to its addresses, in resolver order.
pub trait Resolver: Send + Sync {
    fn resolve(&self, host: &str) -> Result<Vec<IpAddr>>;
}

/// System resolver (getaddrinfo), falling back to the `host` utility.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemResolver;

impl Resolver for SystemResolver {
    fn resolve(&self, host: &str) -> Result<Vec<IpAddr>> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(vec![ip]);
        }

        // ToSocketAddrs requires a port, so we append :0
        let lookup_host = format!("{host}:0");

        let addresses: Vec<IpAddr> = match lookup_host.to_socket_addrs() {
            Ok(addrs) => addrs.map(|addr| addr.ip()).collect(),
            Err(e) => {
                debug!("getaddrinfo failed for {host}: {e}, trying `host`");
                match resolve_with_host_command(host) {
                    Some(addrs) => addrs,
                    None => bail!("DNS resolution failed for {host}: {e}"),
                }
            }
        };

        Ok(dedup_preserving_order(addresses))
    }
}

/// to_socket_addrs returns one entry per socket type, so the same address
/// usually shows up more than once.
fn dedup_preserving_order(addresses: Vec<IpAddr>) -> Vec<IpAddr> {
    let mut unique: Vec<IpAddr> = Vec::with_capacity(addresses.len());
    for addr in addresses {
        if !unique.contains(&addr) {
            unique.push(addr);
        }
    }
    unique
}

fn resolve_with_host_command(hostname: &str) -> Option<Vec<IpAddr>> {
    let output = Command::new("host").args(["--", hostname]).output().ok()?;

    if !output.status.success() {
        return None;
    }

    let addresses = parse_host_output(&String::from_utf8_lossy(&output.stdout));
    if addresses.is_empty() {
        None
    } else {
        Some(addresses)
    }
}

fn parse_host_output(stdout: &str) -> Vec<IpAddr> {
    stdout
        .lines()
        // "hostname has address 1.2.3.4" / "hostname has IPv6 address ::1"
        .filter(|line| line.contains("has address") || line.contains("has IPv6 address"))
        .filter_map(|line| line.split_whitespace().last())
        .filter_map(|addr| addr.parse().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ip_literal_resolves_to_itself() {
        let addrs = SystemResolver.resolve("93.184.216.34").unwrap();
        assert_eq!(addrs, vec!["93.184.216.34".parse::<IpAddr>().unwrap()]);

        let addrs = SystemResolver.resolve("::1").unwrap();
        assert_eq!(addrs, vec!["::1".parse::<IpAddr>().unwrap()]);
    }

    #[test]
    fn test_localhost_resolves() {
        let addrs = SystemResolver.resolve("localhost").unwrap();
        assert!(!addrs.is_empty());
        assert!(addrs.iter().all(|a| a.is_loopback()));
    }

    #[test]
    fn test_dedup_preserves_first_seen_order() {
        let a: IpAddr = "10.0.0.2".parse().unwrap();
        let b: IpAddr = "10.0.0.1".parse().unwrap();
        assert_eq!(dedup_preserving_order(vec![a, b, a, b, a]), vec![a, b]);
    }

    #[test]
    fn test_parse_host_output() {
        let out = "example.com has address 93.184.216.34\n\
                   example.com has IPv6 address 2606:2800:220:1:248:1893:25c8:1946\n\
                   example.com mail is handled by 0 .\n";
        let addrs = parse_host_output(out);
        assert_eq!(addrs.len(), 2);
        assert_eq!(addrs[0], "93.184.216.34".parse::<IpAddr>().unwrap());
        assert!(addrs[1].is_ipv6());
    }

    #[test]
    fn test_parse_host_output_ignores_garbage() {
        assert!(parse_host_output("Host nope.invalid not found: 3(NXDOMAIN)\n").is_empty());
    }
}
