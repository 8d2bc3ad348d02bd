//! Tool Registry — stores and retrieves tool definitions

use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

/// Everything the runtime needs to advertise a tool to the LLM and route
/// tagged calls to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub namespace: String,
    pub version: String,
    pub description: String,
    /// JSON schema for the call arguments.
    pub input_schema: serde_json::Value,
    /// Data tags this tool subscribes to.
    pub data_tags: Vec<u32>,
    pub timeout_ms: u64,
    /// Result text sent to the LLM when the call cannot be served.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub fallback_result: String,
}

/// In-memory tool registry
#[derive(Default)]
pub struct Registry {
    tools: HashMap<String, ToolDefinition>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool definition
    pub fn register_tool(&mut self, tool: ToolDefinition) {
        info!(
            "Registered tool: {} (ns: {}, tags: {:?})",
            tool.name, tool.namespace, tool.data_tags
        );
        self.tools.insert(tool.name.clone(), tool);
    }

    /// Get a tool by name
    pub fn get_tool(&self, name: &str) -> Option<ToolDefinition> {
        self.tools.get(name).cloned()
    }

    /// Find the tool subscribed to a data tag
    pub fn tool_for_tag(&self, tag: u32) -> Option<ToolDefinition> {
        self.tools
            .values()
            .find(|t| t.data_tags.contains(&tag))
            .cloned()
    }

    /// List tools sorted by name, optionally filtered by namespace
    pub fn list_tools(&self, namespace: &str) -> Vec<ToolDefinition> {
        let mut tools: Vec<ToolDefinition> = if namespace.is_empty() {
            self.tools.values().cloned().collect()
        } else {
            self.tools
                .values()
                .filter(|t| t.namespace == namespace)
                .cloned()
                .collect()
        };
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    /// Deregister a tool
    pub fn deregister_tool(&mut self, name: &str) {
        self.tools.remove(name);
    }

    /// Get total tool count
    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }
}

/// Helper to create a ToolDefinition
pub fn make_tool(
    name: &str,
    namespace: &str,
    description: &str,
    input_schema: serde_json::Value,
    data_tags: Vec<u32>,
    timeout_ms: u64,
) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        namespace: namespace.to_string(),
        version: "1.0.0".to_string(),
        description: description.to_string(),
        input_schema,
        data_tags,
        timeout_ms,
        fallback_result: String::new(),
    }
}
