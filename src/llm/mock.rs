//! Mock LLM 客户端（用于测试，无需 API）
//!
//! 按顺序弹出预设回复；预设用完后回显最后一条 User 消息（工具模式下作为最终答复），
//! 便于本地跑通 agent -> action -> beautify 流程。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{LlmClient, LlmError, LlmReply};
use crate::memory::{Message, Role};
use crate::tools::ToolSpec;

/// Mock 客户端：预设回复队列 + 请求记录
#[derive(Debug, Default)]
pub struct MockLlmClient {
    tool_replies: Mutex<VecDeque<Result<LlmReply, String>>>,
    text_replies: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条 complete_with_tools 的回复
    pub fn with_tool_reply(self, reply: LlmReply) -> Self {
        lock(&self.tool_replies).push_back(Ok(reply));
        self
    }

    /// 追加一次 complete_with_tools 失败（模拟端点不可达）
    pub fn with_tool_failure(self, message: impl Into<String>) -> Self {
        lock(&self.tool_replies).push_back(Err(message.into()));
        self
    }

    /// 追加一条 complete 的回复
    pub fn with_text_reply(self, reply: impl Into<String>) -> Self {
        lock(&self.text_replies).push_back(Ok(reply.into()));
        self
    }

    /// 追加一次 complete 失败
    pub fn with_text_failure(self, message: impl Into<String>) -> Self {
        lock(&self.text_replies).push_back(Err(message.into()));
        self
    }

    /// 迄今收到的所有请求（按调用顺序）
    pub fn requests(&self) -> Vec<Vec<Message>> {
        lock(&self.requests).clone()
    }

    fn record(&self, messages: &[Message]) {
        lock(&self.requests).push(messages.to_vec());
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn last_user(messages: &[Message]) -> String {
    messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.clone())
        .unwrap_or_else(|| "(no input)".to_string())
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        self.record(messages);
        let next = lock(&self.text_replies).pop_front();
        match next {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(LlmError::Api(message)),
            None => Ok(format!("Echo from Mock: {}", last_user(messages))),
        }
    }

    async fn complete_with_tools(
        &self,
        messages: &[Message],
        _tools: &[ToolSpec],
    ) -> Result<LlmReply, LlmError> {
        self.record(messages);
        let next = lock(&self.tool_replies).pop_front();
        match next {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(LlmError::Api(message)),
            None => Ok(LlmReply::text(last_user(messages))),
        }
    }
}
