//! 工作流引擎
//!
//! CompiledGraph 从入口节点开始依次执行：节点返回新状态后，按固定后继或条件路由决定下一个节点，
//! 直到后继为 END。节点之间严格串行，任一节点失败立即终止整次遍历。

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::core::AgentError;
use crate::workflow::graph::{NextEntry, Node};
use crate::workflow::types::*;

/// 编译后的状态图（不可变），可多次 invoke，每次 invoke 独占自己的状态
pub struct CompiledGraph<S> {
    nodes: HashMap<NodeId, Arc<dyn Node<S>>>,
    entry: NodeId,
    next: HashMap<NodeId, NextEntry<S>>,
    recursion_limit: usize,
}

impl<S> CompiledGraph<S>
where
    S: Send + Debug + 'static,
{
    pub(super) fn new(
        nodes: HashMap<NodeId, Arc<dyn Node<S>>>,
        entry: NodeId,
        next: HashMap<NodeId, NextEntry<S>>,
        recursion_limit: usize,
    ) -> Self {
        Self {
            nodes,
            entry,
            next,
            recursion_limit,
        }
    }

    pub fn entry_point(&self) -> &str {
        &self.entry
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.nodes.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn recursion_limit(&self) -> usize {
        self.recursion_limit
    }

    /// 运行到 END，返回最终状态
    pub async fn invoke(&self, initial: S) -> Result<S, AgentError> {
        tracing::info!(entry = %self.entry, "workflow start");
        let mut state = initial;
        let mut current = self.entry.clone();
        let mut executed = 0usize;

        loop {
            if executed >= self.recursion_limit {
                tracing::warn!(limit = self.recursion_limit, node = %current, "recursion limit reached");
                return Err(WorkflowError::RecursionLimit(self.recursion_limit).into());
            }
            let node = self
                .nodes
                .get(&current)
                .ok_or_else(|| WorkflowError::UnknownNode(current.clone()))?;

            tracing::debug!(node = %current, state = ?state, "enter node");
            state = node.run(state).await?;
            executed += 1;

            let next = self.resolve_next(&current, &state)?;
            tracing::debug!(from = %current, to = %next, "route");
            if next == END {
                break;
            }
            current = next;
        }

        tracing::info!(nodes_executed = executed, "workflow end");
        Ok(state)
    }

    fn resolve_next(&self, current: &str, state: &S) -> Result<NodeId, WorkflowError> {
        match self.next.get(current) {
            Some(NextEntry::Fixed(to)) => Ok(to.clone()),
            Some(NextEntry::Conditional { router, path_map }) => {
                let label = router(state);
                path_map
                    .get(&label)
                    .cloned()
                    .ok_or_else(|| WorkflowError::UnroutableLabel {
                        node: current.to_string(),
                        label,
                    })
            }
            None => Err(WorkflowError::NoOutgoingEdge(current.to_string())),
        }
    }
}
