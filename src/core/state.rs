//! 遍历状态：AgentDecision、AgentStep、AgentState
//!
//! AgentState 由一次图遍历独占，按值在节点之间传递；遍历结束时作为最终结果返回。

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::memory::Message;

/// Agent 每次规划产出的决策（三选一）
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentDecision {
    /// 需要调用工具
    ToolCall {
        name: String,
        arguments: BTreeMap<String, String>,
    },
    /// 已得到最终答复
    Finished {
        output: String,
        /// 产出该答复的说明，如「文本美化完成」
        #[serde(default, skip_serializing_if = "Option::is_none")]
        log: Option<String>,
    },
    /// 无法识别的 LLM 输出，原样保留
    Unrecognized { raw: String },
}

impl AgentDecision {
    pub fn tool_call<I, K, V>(name: impl Into<String>, arguments: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::ToolCall {
            name: name.into(),
            arguments: arguments
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn finished(output: impl Into<String>) -> Self {
        Self::Finished {
            output: output.into(),
            log: None,
        }
    }

    pub fn unrecognized(raw: impl Into<String>) -> Self {
        Self::Unrecognized { raw: raw.into() }
    }

    /// Finished 的 output；其他变体返回 None
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::Finished { output, .. } => Some(output),
            _ => None,
        }
    }
}

impl fmt::Display for AgentDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToolCall { name, arguments } => {
                write!(f, "tool={name} tool_input={arguments:?}")
            }
            Self::Finished { output, .. } => write!(f, "return_values={{output: {output}}}"),
            Self::Unrecognized { raw } => f.write_str(raw),
        }
    }
}

/// 一次完成的工具调用：(决策, 观察结果)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStep {
    pub decision: AgentDecision,
    pub observation: String,
}

/// 在 agent / action / beautify 节点间传递的状态
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AgentState {
    /// 用户原始输入，初始化后不再修改
    pub input: String,
    pub chat_history: Vec<Message>,
    /// 最近一次 agent 或 beautify 节点写入的决策
    pub decision: Option<AgentDecision>,
    /// 每完成一次工具调用追加一条
    pub steps: Vec<AgentStep>,
}

impl AgentState {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            ..Self::default()
        }
    }

    /// 最终输出文本：Finished 取 output，否则取决策的字符串形式
    pub fn final_output(&self) -> Option<String> {
        self.decision.as_ref().map(|d| match d.output() {
            Some(output) => output.to_string(),
            None => format!("{d:?}"),
        })
    }
}
