//! 智谱 GLM 客户端（OpenAI 兼容格式）
//!
//! - Base URL: https://open.bigmodel.cn/api/paas/v4
//! - 模型: glm-4-flash（默认）、glm-4-plus 等

use crate::config::LlmSection;
use crate::llm::OpenAiClient;

pub const ZHIPU_BASE_URL: &str = "https://open.bigmodel.cn/api/paas/v4";
pub const GLM_4_FLASH: &str = "glm-4-flash";

/// 读取 API Key：配置优先，其次环境变量 `ZHIPUAI_API_KEY`
pub fn zhipu_api_key(configured: Option<&str>) -> String {
    configured
        .filter(|k| !k.is_empty())
        .map(String::from)
        .or_else(|| std::env::var("ZHIPUAI_API_KEY").ok())
        .unwrap_or_default()
}

/// 按 [llm] 段创建 GLM 客户端
pub fn create_zhipu_client(llm: &LlmSection) -> OpenAiClient {
    let api_key = zhipu_api_key(llm.api_key.as_deref());
    let base_url = llm.base_url.as_deref().unwrap_or(ZHIPU_BASE_URL);
    OpenAiClient::new(Some(base_url), &llm.model, Some(api_key.as_str()))
        .with_temperature(llm.temperature)
}
