//! LLM function-calling tools
//!
//! Two tools the tool-invocation runtime dispatches to by data tag:
//! - `net.ip_latency` (tag 0x64): resolve a domain and report its IP and ICMP latency
//! - `clock.utc_now` (tag 0x60): report the current UTC time

pub mod clock;
pub mod config;
pub mod executor;
pub mod net;
pub mod registry;
pub mod schema;
pub mod service;

use tracing::info;

use config::SfnConfig;
use executor::Executor;
use registry::Registry;

/// Register all built-in tools and their handlers
pub fn register_builtin_tools(reg: &mut Registry, exec: &mut Executor, config: &SfnConfig) {
    // Network tools
    net::register_tools(reg, exec, config);
    // Clock tools
    clock::register_tools(reg, exec);

    info!("Registered {} built-in tools", reg.tool_count());
}

/// Build a service with every built-in tool registered
pub fn build_service(config: &SfnConfig) -> service::ToolService {
    let mut reg = Registry::new();
    let mut exec = Executor::new();
    register_builtin_tools(&mut reg, &mut exec, config);
    service::ToolService::new(reg, exec)
}
