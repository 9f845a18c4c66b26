//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容 / 智谱 GLM / Mock）实现 LlmClient：
//! complete（纯文本回复，用于润色）、complete_with_tools（带工具定义，用于 Agent 规划）。

use async_trait::async_trait;
use thiserror::Error;

use crate::memory::Message;
use crate::tools::ToolSpec;

#[derive(Error, Debug)]
pub enum LlmError {
    /// 请求构造失败（参数非法等）
    #[error("request build failed: {0}")]
    Request(String),
    /// 端点返回错误或网络失败
    #[error("API error: {0}")]
    Api(String),
    #[error("empty response")]
    EmptyResponse,
}

/// LLM 返回的一次工具调用；arguments 为原始 JSON 字符串
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

/// 带工具定义的补全结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LlmReply {
    pub content: String,
    pub tool_calls: Vec<LlmToolCall>,
}

impl LlmReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool_call(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            content: String::new(),
            tool_calls: vec![LlmToolCall {
                id: format!("call_{}", uuid::Uuid::new_v4().simple()),
                name: name.into(),
                arguments: arguments.into(),
            }],
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 非流式完成，返回首条回复文本
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError>;

    /// 附带工具定义的完成；模型可返回若干 tool_calls
    async fn complete_with_tools(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<LlmReply, LlmError>;
}
