//! Beautifier：第二次 LLM 调用，对最终答复做文笔润色

use std::sync::Arc;

use crate::core::AgentError;
use crate::llm::LlmClient;
use crate::memory::Message;

/// 美化完成后写入 Finished.log 的说明
pub const BEAUTIFY_LOG: &str = "文本美化完成";

pub struct Beautifier {
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
    /// 用户消息模板，`{text}` 替换为待润色文本
    user_template: String,
}

impl Beautifier {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        system_prompt: impl Into<String>,
        user_template: impl Into<String>,
    ) -> Self {
        Self {
            llm,
            system_prompt: system_prompt.into(),
            user_template: user_template.into(),
        }
    }

    pub fn render(&self, text: &str) -> String {
        self.user_template.replace("{text}", text)
    }

    pub async fn beautify(&self, text: &str) -> Result<String, AgentError> {
        let messages = vec![
            Message::system(self.system_prompt.clone()),
            Message::user(self.render(text)),
        ];
        let polished = self.llm.complete(&messages).await?;
        tracing::info!(
            input_chars = text.chars().count(),
            output_chars = polished.chars().count(),
            "beautify done"
        );
        Ok(polished)
    }
}
