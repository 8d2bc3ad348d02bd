//! Tool execution pipeline
//!
//! Pipeline: resolve tag → validate arguments → execute (blocking pool, bounded by timeout)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

use crate::registry::Registry;
use crate::schema;

/// A tool handler: raw argument bytes in, result text for the LLM out
pub type ToolHandler = Arc<dyn Fn(&[u8]) -> Result<String> + Send + Sync>;

/// A function call delivered by the runtime on a data tag
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCall {
    #[serde(default)]
    pub call_id: Option<String>,
    pub tag: u32,
    /// Either a JSON object or a string holding one
    #[serde(default)]
    pub arguments: serde_json::Value,
}

impl ToolCall {
    fn argument_bytes(&self) -> Vec<u8> {
        match &self.arguments {
            serde_json::Value::Null => Vec::new(),
            serde_json::Value::String(s) => s.clone().into_bytes(),
            other => other.to_string().into_bytes(),
        }
    }
}

/// Outcome of one call, sent back to the runtime
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteResponse {
    pub execution_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    pub tag: u32,
    pub tool_name: String,
    pub success: bool,
    /// Text for the LLM
    pub result: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error: String,
    pub duration_ms: u64,
}

/// Routes tagged calls to handlers
#[derive(Default)]
pub struct Executor {
    /// Map of data tag → handler function
    handlers: HashMap<u32, ToolHandler>,
}

impl Executor {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Subscribe a handler to a data tag. A later registration for the same
    /// tag replaces the earlier one.
    pub fn register_handler<F>(&mut self, tag: u32, handler: F)
    where
        F: Fn(&[u8]) -> Result<String> + Send + Sync + 'static,
    {
        if self.handlers.insert(tag, Arc::new(handler)).is_some() {
            warn!("Handler for tag {tag:#x} replaced");
        }
    }

    pub fn has_handler(&self, tag: u32) -> bool {
        self.handlers.contains_key(&tag)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Execute a call through the pipeline. Failures are reported in the
    /// response, never as an `Err`.
    pub async fn execute(&self, registry: &Registry, call: ToolCall) -> ExecuteResponse {
        let execution_id = Uuid::new_v4().to_string();
        let start = Instant::now();

        let mut response = ExecuteResponse {
            execution_id,
            call_id: call.call_id.clone(),
            tag: call.tag,
            tool_name: String::new(),
            success: false,
            result: String::new(),
            error: String::new(),
            duration_ms: 0,
        };

        // 1. Resolve: tag must have both a definition and a handler
        let (tool_def, handler) = match (
            registry.tool_for_tag(call.tag),
            self.handlers.get(&call.tag),
        ) {
            (Some(def), Some(handler)) => (def, Arc::clone(handler)),
            _ => {
                warn!("No handler registered for tag {:#x}", call.tag);
                response.error = format!("No handler registered for tag {:#x}", call.tag);
                return response;
            }
        };
        response.tool_name = tool_def.name.clone();

        // 2. Validate arguments against the input schema
        let input = call.argument_bytes();
        if let Err(e) = schema::validate_input(&input, &tool_def.input_schema) {
            warn!("Rejected call: tool={} error={e}", tool_def.name);
            response.result = tool_def.fallback_result;
            response.error = e.to_string();
            response.duration_ms = start.elapsed().as_millis() as u64;
            return response;
        }

        info!(
            "Executing: tool={} tag={:#x} execution_id={}",
            tool_def.name, call.tag, response.execution_id
        );

        // 3. Execute on the blocking pool, bounded by the tool timeout
        let timeout = Duration::from_millis(tool_def.timeout_ms);
        let task = tokio::task::spawn_blocking(move || handler(&input));

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(Ok(result))) => {
                response.success = true;
                response.result = result;
            }
            Ok(Ok(Err(e))) => {
                warn!("Tool {} failed: {e:#}", tool_def.name);
                response.result = tool_def.fallback_result;
                response.error = format!("{e:#}");
            }
            Ok(Err(join_err)) => {
                warn!("Tool {} panicked: {join_err}", tool_def.name);
                response.result = tool_def.fallback_result;
                response.error = format!("Tool task failed: {join_err}");
            }
            Err(_) => {
                warn!("Tool {} timed out after {}ms", tool_def.name, tool_def.timeout_ms);
                response.result = tool_def.fallback_result;
                response.error = format!("Timed out after {}ms", tool_def.timeout_ms);
            }
        }

        response.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Finished: tool={} success={} duration_ms={}",
            response.tool_name, response.success, response.duration_ms
        );
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::make_tool;
    use serde_json::json;

    fn setup() -> (Registry, Executor) {
        let mut reg = Registry::new();
        let mut tool = make_tool(
            "test.echo",
            "test",
            "Echo the name argument",
            json!({
                "type": "object",
                "properties": { "name": { "type": "string" } },
                "required": ["name"]
            }),
            vec![0x10],
            1000,
        );
        tool.fallback_result = "try again later".to_string();
        reg.register_tool(tool);

        let mut exec = Executor::new();
        exec.register_handler(0x10, |input| {
            let v: serde_json::Value = serde_json::from_slice(input)?;
            Ok(format!("hello {}", v["name"].as_str().unwrap_or_default()))
        });
        (reg, exec)
    }

    fn call(tag: u32, arguments: serde_json::Value) -> ToolCall {
        ToolCall {
            call_id: Some("c-1".to_string()),
            tag,
            arguments,
        }
    }

    #[tokio::test]
    async fn test_execute_success() {
        let (reg, exec) = setup();
        let resp = exec.execute(&reg, call(0x10, json!({"name": "sfn"}))).await;

        assert!(resp.success);
        assert_eq!(resp.result, "hello sfn");
        assert_eq!(resp.tool_name, "test.echo");
        assert_eq!(resp.call_id.as_deref(), Some("c-1"));
        assert!(resp.error.is_empty());
        assert!(Uuid::parse_str(&resp.execution_id).is_ok());
    }

    #[tokio::test]
    async fn test_string_arguments_are_decoded() {
        let (reg, exec) = setup();
        let resp = exec
            .execute(&reg, call(0x10, json!(r#"{"name":"str"}"#)))
            .await;
        assert!(resp.success);
        assert_eq!(resp.result, "hello str");
    }

    #[tokio::test]
    async fn test_unknown_tag() {
        let (reg, exec) = setup();
        let resp = exec.execute(&reg, call(0x99, json!({}))).await;

        assert!(!resp.success);
        assert!(resp.tool_name.is_empty());
        assert_eq!(resp.error, "No handler registered for tag 0x99");
    }

    #[tokio::test]
    async fn test_definition_without_handler() {
        let (mut reg, exec) = setup();
        reg.register_tool(make_tool("test.orphan", "test", "", json!({}), vec![0x11], 1000));

        let resp = exec.execute(&reg, call(0x11, json!({}))).await;
        assert!(!resp.success);
        assert!(resp.error.contains("0x11"));
    }

    #[tokio::test]
    async fn test_invalid_arguments_return_fallback() {
        let (reg, exec) = setup();
        let resp = exec.execute(&reg, call(0x10, json!({"name": 5}))).await;

        assert!(!resp.success);
        assert_eq!(resp.result, "try again later");
        assert!(resp.error.starts_with("Input validation failed"));
    }

    #[tokio::test]
    async fn test_handler_error_returns_fallback() {
        let (reg, mut exec) = setup();
        exec.register_handler(0x10, |_| anyhow::bail!("boom"));

        let resp = exec.execute(&reg, call(0x10, json!({"name": "x"}))).await;
        assert!(!resp.success);
        assert_eq!(resp.result, "try again later");
        assert_eq!(resp.error, "boom");
    }

    #[tokio::test]
    async fn test_timeout_returns_fallback() {
        let (mut reg, mut exec) = setup();
        reg.register_tool(make_tool("test.slow", "test", "", json!({}), vec![0x12], 50));
        exec.register_handler(0x12, |_| {
            std::thread::sleep(Duration::from_millis(500));
            Ok("late".to_string())
        });

        let resp = exec.execute(&reg, call(0x12, json!({}))).await;
        assert!(!resp.success);
        assert_eq!(resp.error, "Timed out after 50ms");
        assert!(resp.result.is_empty());
    }

    #[tokio::test]
    async fn test_handler_replaced_on_reregister() {
        let (reg, mut exec) = setup();
        exec.register_handler(0x10, |_| Ok("second".to_string()));
        assert_eq!(exec.handler_count(), 1);

        let resp = exec.execute(&reg, call(0x10, json!({"name": "x"}))).await;
        assert_eq!(resp.result, "second");
    }

    #[tokio::test]
    async fn test_execution_ids_are_unique() {
        let (reg, exec) = setup();
        let a = exec.execute(&reg, call(0x10, json!({"name": "a"}))).await;
        let b = exec.execute(&reg, call(0x10, json!({"name": "a"}))).await;
        assert_ne!(a.execution_id, b.execution_id);
        assert_eq!(a.result, b.result);
    }

    #[test]
    fn test_argument_bytes() {
        assert!(call(1, serde_json::Value::Null).argument_bytes().is_empty());
        assert_eq!(call(1, json!("{}")).argument_bytes(), b"{}");
        assert_eq!(call(1, json!({"a": 1})).argument_bytes(), br#"{"a":1}"#);
    }
}
