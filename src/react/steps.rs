//! 三个步骤节点：agent（规划）、action（执行工具）、beautify（润色）
//!
//! 每个节点按值接收 AgentState，返回更新后的状态；失败直接向上传播，终止整次遍历。

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::{AgentDecision, AgentError, AgentState, AgentStep};
use crate::memory::{Message, ToolInvocation};
use crate::react::beautify::{Beautifier, BEAUTIFY_LOG};
use crate::react::planner::ToolsAgent;
use crate::tools::ToolExecutor;
use crate::workflow::Node;

pub const AGENT_NODE: &str = "agent";
pub const ACTION_NODE: &str = "action";
pub const BEAUTIFY_NODE: &str = "beautify";

/// 非工具调用决策进入 action 节点时的观察结果
pub const UNKNOWN_ACTION: &str = "Unknown action";

/// run-agent：调用 ToolsAgent 并写入新的决策
pub struct AgentNode {
    agent: ToolsAgent,
}

impl AgentNode {
    pub fn new(agent: ToolsAgent) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl Node<AgentState> for AgentNode {
    fn id(&self) -> &str {
        AGENT_NODE
    }

    async fn run(&self, mut state: AgentState) -> Result<AgentState, AgentError> {
        tracing::info!(node = AGENT_NODE, steps = state.steps.len(), "run agent");
        let outcome = self
            .agent
            .plan(&state.input, &state.chat_history, &state.steps)
            .await?;
        let decision = outcome.into_decision();
        tracing::info!(decision = %decision, "agent decision");
        state.decision = Some(decision);
        Ok(state)
    }
}

/// run-tool：把 ToolCall 决策转成一次工具调用，追加 (决策, 观察结果)
pub struct ActionNode {
    executor: Arc<ToolExecutor>,
}

impl ActionNode {
    pub fn new(executor: Arc<ToolExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl Node<AgentState> for ActionNode {
    fn id(&self) -> &str {
        ACTION_NODE
    }

    async fn run(&self, mut state: AgentState) -> Result<AgentState, AgentError> {
        tracing::info!(node = ACTION_NODE, "run tool");
        let Some(decision) = state.decision.clone() else {
            return Err(AgentError::Config(
                "action node reached before the agent produced a decision".to_string(),
            ));
        };

        let observation = match &decision {
            AgentDecision::ToolCall { name, arguments } => {
                let query = arguments
                    .get("query")
                    .ok_or_else(|| AgentError::MissingArgument("query".to_string()))?;
                let tool_call_id = uuid::Uuid::new_v4().to_string();
                tracing::info!(tool = %name, query = %query, tool_call_id = %tool_call_id, "tool call");

                let exchange = vec![
                    Message::user(query.clone()),
                    Message::assistant_tool_calls(vec![ToolInvocation {
                        id: tool_call_id,
                        name: name.clone(),
                        args: serde_json::json!({ "query": query }),
                    }]),
                ];
                self.executor.invoke(&exchange).await?.to_string()
            }
            other => {
                tracing::warn!(decision = %other, "decision is not a tool call");
                UNKNOWN_ACTION.to_string()
            }
        };

        state.steps.push(AgentStep {
            decision,
            observation,
        });
        Ok(state)
    }
}

/// run-beautify：润色最终答复，替换为新的 Finished 决策
pub struct BeautifyNode {
    beautifier: Beautifier,
}

impl BeautifyNode {
    pub fn new(beautifier: Beautifier) -> Self {
        Self { beautifier }
    }
}

#[async_trait]
impl Node<AgentState> for BeautifyNode {
    fn id(&self) -> &str {
        BEAUTIFY_NODE
    }

    async fn run(&self, mut state: AgentState) -> Result<AgentState, AgentError> {
        tracing::info!(node = BEAUTIFY_NODE, "run beautify");
        let text = match &state.decision {
            Some(AgentDecision::Finished { output, .. }) => output.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };
        let polished = self.beautifier.beautify(&text).await?;
        state.decision = Some(AgentDecision::Finished {
            output: polished,
            log: Some(BEAUTIFY_LOG.to_string()),
        });
        Ok(state)
    }
}
