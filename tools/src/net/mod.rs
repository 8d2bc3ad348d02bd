//! Network tools — domain IP and ICMP latency.
//!
//! `latency` holds the probe logic; `resolver` and `pinger` wrap the system
//! DNS resolver and `ping` utility it delegates to.

pub mod latency;
pub mod pinger;
pub mod resolver;

use serde_json::json;

use crate::config::SfnConfig;
use crate::executor::Executor;
use crate::registry::{make_tool, Registry};
use latency::{DomainLatencyProbe, FALLBACK_MESSAGE};
use pinger::CommandPinger;
use resolver::SystemResolver;

/// Data tag net.ip_latency subscribes to
pub const IP_LATENCY_TAG: u32 = 0x64;

/// Register every network tool with the registry and its handler with the executor.
pub fn register_tools(reg: &mut Registry, exec: &mut Executor, config: &SfnConfig) {
    let mut tool = make_tool(
        "net.ip_latency",
        "net",
        "if user asks ip or network latency of a domain, you should return the result of the \
         giving domain. try your best to dissect user expressions to infer the right domain names",
        json!({
            "type": "object",
            "properties": {
                "domain": {
                    "type": "string",
                    "description": "Domain of the website",
                    "examples": ["example.com"]
                }
            },
            "required": ["domain"]
        }),
        vec![IP_LATENCY_TAG],
        config.tools.timeout_ms,
    );
    tool.fallback_result = FALLBACK_MESSAGE.to_string();
    reg.register_tool(tool);

    let probe = DomainLatencyProbe::new(SystemResolver, CommandPinger::new(&config.probe));
    exec.register_handler(IP_LATENCY_TAG, move |input| Ok(probe.execute(input)));
}
