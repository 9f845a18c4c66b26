//! LLM 层：客户端抽象与实现（OpenAI 兼容 / 智谱 GLM / Mock）

pub mod mock;
pub mod openai;
pub mod traits;
pub mod zhipu;

pub use mock::MockLlmClient;
pub use openai::OpenAiClient;
pub use traits::{LlmClient, LlmError, LlmReply, LlmToolCall};
pub use zhipu::{create_zhipu_client, zhipu_api_key, GLM_4_FLASH, ZHIPU_BASE_URL};
