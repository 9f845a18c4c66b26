//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `SEARCHFLOW__*` 覆盖（双下划线表示嵌套，如 `SEARCHFLOW__LLM__MODEL=glm-4-plus`）。

use std::path::PathBuf;

use serde::Deserialize;

use crate::core::AgentError;
use crate::llm::{GLM_4_FLASH, ZHIPU_BASE_URL};
use crate::react::{ACTION_NODE, AGENT_NODE, BEAUTIFY_NODE};
use crate::tools::search::{DEFAULT_SEARCH_ENDPOINT, DEFAULT_SEARCH_ENGINE, DEFAULT_SEARCH_TIMEOUT_SECS};
use crate::workflow::{EdgeSpec, WorkflowSpec, END};

/// 可注册的工具名
pub const KNOWN_TOOLS: &[&str] = &["web_search"];

/// 未提供 app.input 且命令行无参数时使用的问题
pub const DEFAULT_INPUT: &str = "2025年1月15日杭州什么天气?";

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub tools: ToolsSection,
    pub prompts: PromptsSection,
    pub workflow: WorkflowSpec,
}

/// [app] 段
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppSection {
    /// 默认问题
    pub input: Option<String>,
}

/// [llm] 段：模型、温度、端点；api_key 未配置时读 ZHIPUAI_API_KEY
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub model: String,
    pub temperature: f32,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            model: GLM_4_FLASH.to_string(),
            temperature: 0.8,
            base_url: Some(ZHIPU_BASE_URL.to_string()),
            api_key: None,
        }
    }
}

/// [tools] 段：启用的工具 + [tools.search]
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolsSection {
    pub enabled: Vec<String>,
    pub search: SearchSection,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            enabled: KNOWN_TOOLS.iter().map(|t| t.to_string()).collect(),
            search: SearchSection::default(),
        }
    }
}

/// [tools.search] 段：联网搜索端点；api_key 未配置时沿用 LLM 的 key
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    pub endpoint: String,
    pub tool: String,
    pub timeout_secs: u64,
    pub api_key: Option<String>,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            tool: DEFAULT_SEARCH_ENGINE.to_string(),
            timeout_secs: DEFAULT_SEARCH_TIMEOUT_SECS,
            api_key: None,
        }
    }
}

/// [prompts] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PromptsSection {
    pub agent_system: String,
    pub beautify_system: String,
    /// `{text}` 替换为待润色文本
    pub beautify_user: String,
}

impl Default for PromptsSection {
    fn default() -> Self {
        Self {
            agent_system: "你是一个有用的助手。当你无法回答问题时，请调用工具来获取信息。".to_string(),
            beautify_system: "你是一个文笔优化助手，负责对文本进行润色和美化，使其更加流畅和优雅。"
                .to_string(),
            beautify_user: "请对以下文本进行文笔优化：\n{text}".to_string(),
        }
    }
}

impl AppConfig {
    /// 遍历前的配置校验：温度范围、工具名、工作流节点与边
    pub fn validate(&self) -> Result<(), AgentError> {
        if !(0.0..=1.0).contains(&self.llm.temperature) {
            return Err(AgentError::Config(format!(
                "llm.temperature must be within [0, 1], got {}",
                self.llm.temperature
            )));
        }
        if let Some(tool) = self
            .tools
            .enabled
            .iter()
            .find(|t| !KNOWN_TOOLS.contains(&t.as_str()))
        {
            return Err(AgentError::Config(format!("unknown tool in tools.enabled: {tool}")));
        }

        let workflow = &self.workflow;
        if workflow.order.is_empty() {
            return Err(AgentError::Config("workflow.order is empty".to_string()));
        }
        let known_nodes = [AGENT_NODE, ACTION_NODE, BEAUTIFY_NODE];
        if let Some(node) = workflow
            .order
            .iter()
            .find(|n| !known_nodes.contains(&n.as_str()))
        {
            return Err(AgentError::Config(format!("unknown node in workflow.order: {node}")));
        }
        for (from, edge) in &workflow.edges {
            if !workflow.order.contains(from) {
                return Err(AgentError::Config(format!(
                    "workflow edge from {from} which is not in workflow.order"
                )));
            }
            let targets: Vec<&String> = match edge {
                EdgeSpec::Fixed(to) => vec![to],
                EdgeSpec::Conditional(table) => table.values().collect(),
            };
            if let Some(to) = targets
                .into_iter()
                .find(|to| to.as_str() != END && !workflow.order.contains(to))
            {
                return Err(AgentError::Config(format!(
                    "workflow edge {from} -> {to} targets a node outside workflow.order"
                )));
            }
        }
        Ok(())
    }

    /// 默认问题：[app].input，否则内置问题
    pub fn default_input(&self) -> String {
        self.app
            .input
            .clone()
            .unwrap_or_else(|| DEFAULT_INPUT.to_string())
    }
}

/// 从 config 目录加载配置，环境变量 SEARCHFLOW__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    load_config_from(&DEFAULT_CONFIG_NAMES, config_path)
}

/// 默认配置文件的查找顺序（相对当前目录，不含 .toml 后缀）
pub const DEFAULT_CONFIG_NAMES: [&str; 3] = ["config/default", "../config/default", "default"];

/// 同 load_config，但由调用方指定默认配置文件的查找列表
pub fn load_config_from(
    default_names: &[&str],
    config_path: Option<PathBuf>,
) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    for &name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("SEARCHFLOW")
            .separator("__")
            .try_parsing(true),
    );

    builder.build()?.try_deserialize()
}
