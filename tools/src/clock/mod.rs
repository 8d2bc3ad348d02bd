//! Clock tools

pub mod utc_now;

use serde_json::json;

use crate::executor::Executor;
use crate::registry::{make_tool, Registry};

/// Data tag clock.utc_now subscribes to
pub const UTC_NOW_TAG: u32 = 0x60;

/// Register every clock tool with the registry and its handler with the executor.
pub fn register_tools(reg: &mut Registry, exec: &mut Executor) {
    reg.register_tool(make_tool(
        "clock.utc_now",
        "clock",
        "Get current date and time in realtime, returned as UTC time string",
        json!({ "type": "object", "properties": {} }),
        vec![UTC_NOW_TAG],
        5000,
    ));

    exec.register_handler(UTC_NOW_TAG, utc_now::execute);
}
