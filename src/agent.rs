//! Headless Agent 运行时
//!
//! 从 AppConfig 构建全部组件（LLM、工具注册表、三个步骤节点、路由），按 [workflow] 组装状态图，
//! run 对单个问题跑一次完整遍历并返回最终状态。

use std::sync::Arc;

use crate::config::AppConfig;
use crate::core::{AgentError, AgentState};
use crate::llm::{create_zhipu_client, zhipu_api_key, LlmClient};
use crate::react::{
    agent_router, ActionNode, AgentNode, Beautifier, BeautifyNode, ToolsAgent, AGENT_NODE,
};
use crate::tools::{ToolExecutor, ToolRegistry, WebSearchTool};
use crate::workflow::{CompiledGraph, WorkflowBuilder};

/// 按 [llm] 段创建 GLM 客户端
pub fn create_llm(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    Arc::new(create_zhipu_client(&cfg.llm))
}

/// 按 tools.enabled 注册工具；未知工具名报 Config 错误
pub fn create_registry(cfg: &AppConfig) -> Result<ToolRegistry, AgentError> {
    let mut registry = ToolRegistry::new();
    for name in &cfg.tools.enabled {
        match name.as_str() {
            "web_search" => {
                let search = &cfg.tools.search;
                let api_key = zhipu_api_key(
                    search
                        .api_key
                        .as_deref()
                        .filter(|k| !k.is_empty())
                        .or(cfg.llm.api_key.as_deref()),
                );
                registry.register(
                    WebSearchTool::new(search.endpoint.clone(), api_key, search.timeout_secs)
                        .with_search_engine(search.tool.clone()),
                );
            }
            other => return Err(AgentError::Config(format!("unknown tool: {other}"))),
        }
    }
    Ok(registry)
}

/// 校验配置并组装工作流；LLM 由调用方注入（测试中为 MockLlmClient）
pub fn create_workflow(
    cfg: &AppConfig,
    llm: Arc<dyn LlmClient>,
) -> Result<CompiledGraph<AgentState>, AgentError> {
    cfg.validate()?;

    let executor = Arc::new(ToolExecutor::new(create_registry(cfg)?));
    let agent = ToolsAgent::new(llm.clone(), cfg.prompts.agent_system.clone(), executor.specs());
    let beautifier = Beautifier::new(
        llm,
        cfg.prompts.beautify_system.clone(),
        cfg.prompts.beautify_user.clone(),
    );

    let graph = WorkflowBuilder::new(cfg.workflow.clone())
        .node(Arc::new(AgentNode::new(agent)))
        .node(Arc::new(ActionNode::new(executor)))
        .node(Arc::new(BeautifyNode::new(beautifier)))
        .router(AGENT_NODE, agent_router())
        .build()?;

    tracing::info!(
        entry = %graph.entry_point(),
        nodes = ?graph.node_ids(),
        recursion_limit = graph.recursion_limit(),
        "workflow compiled"
    );
    Ok(graph)
}

/// 以空对话历史运行一次遍历
pub async fn run(
    graph: &CompiledGraph<AgentState>,
    input: impl Into<String>,
) -> Result<AgentState, AgentError> {
    let state = graph.invoke(AgentState::new(input)).await?;
    tracing::info!(steps = state.steps.len(), "traversal finished");
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;

    #[test]
    fn test_create_registry_default() {
        let registry = create_registry(&AppConfig::default()).unwrap();
        assert_eq!(registry.tool_names(), vec!["web_search"]);
    }

    #[test]
    fn test_create_registry_empty() {
        let mut cfg = AppConfig::default();
        cfg.tools.enabled.clear();
        assert!(create_registry(&cfg).unwrap().is_empty());
    }

    #[test]
    fn test_create_workflow_rejects_unknown_tool() {
        let mut cfg = AppConfig::default();
        cfg.tools.enabled = vec!["bogus_tool".to_string()];
        let err = create_workflow(&cfg, Arc::new(MockLlmClient::new())).err();
        assert!(matches!(err, Some(AgentError::Config(_))));
    }

    #[test]
    fn test_create_workflow_default_shape() {
        let graph = create_workflow(&AppConfig::default(), Arc::new(MockLlmClient::new())).unwrap();
        assert_eq!(graph.entry_point(), "agent");
        assert_eq!(graph.node_ids(), vec!["action", "agent", "beautify"]);
        assert_eq!(graph.recursion_limit(), 25);
    }

    #[tokio::test]
    async fn test_run_with_echo_mock() {
        // 预设为空时 mock 直接回显输入作为最终答复，再由 beautify 回显润色提示
        let graph = create_workflow(&AppConfig::default(), Arc::new(MockLlmClient::new())).unwrap();
        let state = run(&graph, "你好").await.unwrap();
        assert!(state.steps.is_empty());
        let output = state.final_output().unwrap();
        assert!(output.starts_with("Echo from Mock: "));
        assert!(output.contains("你好"));
    }
}
