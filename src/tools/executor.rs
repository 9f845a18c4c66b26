//! 工具执行器
//!
//! 持有 ToolRegistry；invoke(messages) 读取最后一条 assistant 消息上的 tool_calls，
//! 按名查找并执行，每个调用产出一条 ToolMessage。每次执行输出结构化审计日志（JSON）。

use std::fmt;
use std::time::Instant;

use crate::core::AgentError;
use crate::memory::{Message, Role};
use crate::tools::{ToolRegistry, ToolSpec};

/// 单个工具调用的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolMessage {
    pub tool_call_id: String,
    pub name: String,
    pub content: String,
}

/// invoke 的结果：按调用顺序排列的 ToolMessage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub messages: Vec<ToolMessage>,
}

impl fmt::Display for ToolOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let contents: Vec<&str> = self.messages.iter().map(|m| m.content.as_str()).collect();
        f.write_str(&contents.join("\n"))
    }
}

pub struct ToolExecutor {
    registry: ToolRegistry,
}

impl ToolExecutor {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    /// 执行最后一条消息上的全部 tool_calls；该消息必须是带 tool_calls 的 assistant 消息
    pub async fn invoke(&self, messages: &[Message]) -> Result<ToolOutput, AgentError> {
        let last = messages
            .last()
            .filter(|m| m.role == Role::Assistant && !m.tool_calls.is_empty())
            .ok_or(AgentError::NoToolCalls)?;

        let mut output = ToolOutput::default();
        for call in &last.tool_calls {
            let content = self.execute(&call.name, call.args.clone()).await?;
            output.messages.push(ToolMessage {
                tool_call_id: call.id.clone(),
                name: call.name.clone(),
                content,
            });
        }
        Ok(output)
    }

    /// 执行指定工具；输出 JSON 审计日志
    pub async fn execute(&self, tool_name: &str, args: serde_json::Value) -> Result<String, AgentError> {
        let start = Instant::now();
        let args_preview = args_preview(&args);
        let result = self.registry.execute(tool_name, args).await;

        let (ok, outcome) = match &result {
            Ok(_) => (true, "ok"),
            Err(AgentError::UnknownTool(_)) => (false, "unknown_tool"),
            Err(_) => (false, "error"),
        };
        let duration_ms = start.elapsed().as_millis() as u64;
        let audit = serde_json::json!({
            "event": "tool_audit",
            "tool": tool_name,
            "ok": ok,
            "outcome": outcome,
            "duration_ms": duration_ms,
            "args_preview": args_preview,
        });
        tracing::info!(audit = %audit.to_string(), "tool");

        result
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.registry.specs()
    }
}

fn args_preview(args: &serde_json::Value) -> String {
    let s = args.to_string();
    if s.chars().count() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s
    }
}
