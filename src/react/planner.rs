//! ToolsAgent：带工具定义调用 LLM，把回复映射为 AgentDecision
//!
//! 提示词由 system + chat_history + 用户输入 + scratchpad 组成；scratchpad 把已完成的每一步
//! 渲染为一条描述工具调用的 assistant 文本消息和一条携带观察结果的 user 消息。
//! LLM 返回 tool_calls 时产出 AgentOutcome::Many（每个调用一个决策），否则产出单个决策。

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::core::{AgentDecision, AgentError, AgentStep};
use crate::llm::{LlmClient, LlmReply, LlmToolCall};
use crate::memory::Message;
use crate::tools::ToolSpec;

/// Agent 一次规划的原始结果：单个决策，或按调用顺序排列的多个决策
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentOutcome {
    Single(AgentDecision),
    Many(Vec<AgentDecision>),
}

impl AgentOutcome {
    /// 只保留第一个决策，其余丢弃（丢弃时记 warn）
    pub fn into_decision(self) -> AgentDecision {
        match self {
            Self::Single(decision) => decision,
            Self::Many(decisions) => {
                if decisions.len() > 1 {
                    tracing::warn!(
                        dropped = decisions.len() - 1,
                        "agent returned several decisions, keeping the first"
                    );
                }
                decisions
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| AgentDecision::unrecognized("[]"))
            }
        }
    }
}

pub struct ToolsAgent {
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
    tools: Vec<ToolSpec>,
}

impl ToolsAgent {
    pub fn new(llm: Arc<dyn LlmClient>, system_prompt: impl Into<String>, tools: Vec<ToolSpec>) -> Self {
        Self {
            llm,
            system_prompt: system_prompt.into(),
            tools,
        }
    }

    pub fn build_messages(
        &self,
        input: &str,
        chat_history: &[Message],
        steps: &[AgentStep],
    ) -> Vec<Message> {
        let mut messages = Vec::with_capacity(chat_history.len() + steps.len() * 2 + 2);
        messages.push(Message::system(self.system_prompt.clone()));
        messages.extend(chat_history.iter().cloned());
        messages.push(Message::user(input));
        messages.extend(scratchpad(steps));
        messages
    }

    pub async fn plan(
        &self,
        input: &str,
        chat_history: &[Message],
        steps: &[AgentStep],
    ) -> Result<AgentOutcome, AgentError> {
        let messages = self.build_messages(input, chat_history, steps);
        let reply = self.llm.complete_with_tools(&messages, &self.tools).await?;
        Ok(outcome_from_reply(reply))
    }
}

/// 把已完成的步骤渲染为对话消息：assistant 消息为决策的文本形式，user 消息携带观察结果
fn scratchpad(steps: &[AgentStep]) -> Vec<Message> {
    let mut messages = Vec::with_capacity(steps.len() * 2);
    for step in steps {
        let tool = match &step.decision {
            AgentDecision::ToolCall { name, .. } => name.as_str(),
            _ => "unknown",
        };
        messages.push(Message::assistant(step.decision.to_string()));
        messages.push(Message::user(format!(
            "Observation from {tool}: {}",
            step.observation
        )));
    }
    messages
}

pub fn outcome_from_reply(reply: LlmReply) -> AgentOutcome {
    if !reply.tool_calls.is_empty() {
        return AgentOutcome::Many(reply.tool_calls.iter().map(decision_from_call).collect());
    }
    let content = reply.content.trim();
    if content.is_empty() {
        AgentOutcome::Single(AgentDecision::unrecognized(reply.content))
    } else {
        AgentOutcome::Single(AgentDecision::finished(content))
    }
}

fn decision_from_call(call: &LlmToolCall) -> AgentDecision {
    match flatten_arguments(&call.arguments) {
        Some(arguments) => AgentDecision::ToolCall {
            name: call.name.clone(),
            arguments,
        },
        None => {
            tracing::warn!(tool = %call.name, arguments = %call.arguments, "unparsable tool arguments");
            AgentDecision::unrecognized(format!("{}({})", call.name, call.arguments))
        }
    }
}

/// JSON 对象 -> 字符串映射：字符串值原样保留，其他值渲染为 JSON 文本；空参数视为空对象
fn flatten_arguments(raw: &str) -> Option<BTreeMap<String, String>> {
    if raw.trim().is_empty() {
        return Some(BTreeMap::new());
    }
    let Value::Object(map) = serde_json::from_str::<Value>(raw).ok()? else {
        return None;
    };
    Some(
        map.into_iter()
            .map(|(k, v)| match v {
                Value::String(s) => (k, s),
                other => (k, other.to_string()),
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;
    use crate::memory::Role;

    fn agent(llm: MockLlmClient) -> ToolsAgent {
        ToolsAgent::new(Arc::new(llm), "你是一个有用的助手。", Vec::new())
    }

    #[test]
    fn test_tool_call_reply_maps_to_many() {
        let reply = LlmReply::tool_call("web_search", r#"{"query":"杭州天气","top_k":3}"#);
        let outcome = outcome_from_reply(reply);
        let AgentOutcome::Many(decisions) = outcome else {
            panic!("expected Many");
        };
        assert_eq!(
            decisions,
            vec![AgentDecision::tool_call(
                "web_search",
                [("query", "杭州天气"), ("top_k", "3")]
            )]
        );
    }

    #[test]
    fn test_text_reply_maps_to_finished() {
        let outcome = outcome_from_reply(LlmReply::text("  It is sunny. "));
        assert_eq!(outcome, AgentOutcome::Single(AgentDecision::finished("It is sunny.")));
    }

    #[test]
    fn test_empty_reply_maps_to_unrecognized() {
        let outcome = outcome_from_reply(LlmReply::text(""));
        assert!(matches!(
            outcome,
            AgentOutcome::Single(AgentDecision::Unrecognized { .. })
        ));
    }

    #[test]
    fn test_bad_arguments_map_to_unrecognized() {
        let reply = LlmReply::tool_call("web_search", "not json");
        let decision = outcome_from_reply(reply).into_decision();
        assert_eq!(decision, AgentDecision::unrecognized("web_search(not json)"));
    }

    #[test]
    fn test_into_decision_keeps_first() {
        let outcome = AgentOutcome::Many(vec![
            AgentDecision::tool_call("web_search", [("query", "a")]),
            AgentDecision::tool_call("web_search", [("query", "b")]),
        ]);
        assert_eq!(
            outcome.into_decision(),
            AgentDecision::tool_call("web_search", [("query", "a")])
        );
        assert!(matches!(
            AgentOutcome::Many(Vec::new()).into_decision(),
            AgentDecision::Unrecognized { .. }
        ));
    }

    #[test]
    fn test_build_messages_renders_scratchpad() {
        let agent = agent(MockLlmClient::new());
        let steps = vec![AgentStep {
            decision: AgentDecision::tool_call("web_search", [("query", "杭州天气")]),
            observation: "晴".to_string(),
        }];
        let history = vec![Message::user("你好"), Message::assistant("你好！")];
        let messages = agent.build_messages("杭州天气", &history, &steps);

        assert_eq!(messages.len(), 6);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[3].content, "杭州天气");
        assert_eq!(messages[4].role, Role::Assistant);
        assert!(messages[4].tool_calls.is_empty());
        assert!(messages[4].content.starts_with("tool=web_search"));
        assert_eq!(messages[5].content, "Observation from web_search: 晴");
    }

    #[tokio::test]
    async fn test_plan_sends_prompt_to_llm() {
        let llm = Arc::new(MockLlmClient::new().with_tool_reply(LlmReply::text("答案")));
        let agent = ToolsAgent::new(llm.clone(), "system", Vec::new());
        let outcome = agent.plan("问题", &[], &[]).await.unwrap();
        assert_eq!(outcome, AgentOutcome::Single(AgentDecision::finished("答案")));

        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0][0].content, "system");
        assert_eq!(requests[0][1].content, "问题");
    }

    #[tokio::test]
    async fn test_plan_propagates_llm_failure() {
        let agent = agent(MockLlmClient::new().with_tool_failure("connection refused"));
        let err = agent.plan("问题", &[], &[]).await.unwrap_err();
        assert!(matches!(err, AgentError::Transport(msg) if msg.contains("connection refused")));
    }
}
