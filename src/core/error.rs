//! Agent 错误类型
//!
//! 一次图遍历中的任何失败都不重试，直接终止遍历并原样返回给调用方。
//! 唯一的例外是搜索接口的非 200 状态码：它在工具边界被转成普通字符串结果（见 tools::search）。

use thiserror::Error;

use crate::llm::LlmError;
use crate::workflow::WorkflowError;

/// 遍历过程中可能出现的错误（网络、参数、工具、响应结构、配置、图结构）
#[derive(Error, Debug)]
pub enum AgentError {
    /// 调用搜索接口或 LLM 端点时的 HTTP 错误 / 超时
    #[error("Transport failure: {0}")]
    Transport(String),

    /// 工具调用缺少必需参数（如 "query"）
    #[error("Missing argument: {0}")]
    MissingArgument(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// 搜索响应 JSON 结构与预期不符（下标越界、非对象节点、非 JSON 响应体）
    #[error("Malformed search response: {0}")]
    MalformedSearchResponse(String),

    /// 工具节点收到的消息列表中，最后一条 assistant 消息没有 tool_calls
    #[error("No tool calls in the last assistant message")]
    NoToolCalls,

    /// LLM 请求构造失败或回复为空；LLM 端点本身的网络错误归入 Transport
    #[error("LLM error: {0}")]
    Llm(LlmError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),
}

impl From<LlmError> for AgentError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Api(msg) => AgentError::Transport(msg),
            other => AgentError::Llm(other),
        }
    }
}
