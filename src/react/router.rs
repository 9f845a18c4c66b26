//! Router：根据最近一次决策选择下一步

use std::fmt;
use std::sync::Arc;

use crate::core::{AgentDecision, AgentState};
use crate::workflow::RouterFn;

/// 路由标签，对应 agent 节点条件边中的 key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// 执行工具
    Continue,
    /// 润色最终答复
    Beautify,
    /// 结束遍历
    End,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Continue => "continue",
            Self::Beautify => "beautify",
            Self::End => "end",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Finished -> beautify，ToolCall -> continue，其余（含尚无决策）-> end
pub fn route(decision: Option<&AgentDecision>) -> Route {
    let route = match decision {
        Some(AgentDecision::Finished { .. }) => Route::Beautify,
        Some(AgentDecision::ToolCall { .. }) => Route::Continue,
        Some(AgentDecision::Unrecognized { .. }) | None => Route::End,
    };
    tracing::info!(route = %route, "router decision");
    route
}

/// 注册到 agent 节点条件边上的路由函数
pub fn agent_router() -> RouterFn<AgentState> {
    Arc::new(|state: &AgentState| route(state.decision.as_ref()).as_str().to_string())
}
