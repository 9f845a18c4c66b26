//! 工作流构建器
//!
//! 按 WorkflowSpec 组装 StateGraph：order 中的节点依次注册（首个为入口），
//! edges 中的固定边直接连接，条件边使用为该节点登记的路由函数。

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::workflow::engine::CompiledGraph;
use crate::workflow::graph::{Node, RouterFn, StateGraph};
use crate::workflow::types::*;

/// 配置驱动的工作流构建器
pub struct WorkflowBuilder<S> {
    spec: WorkflowSpec,
    nodes: HashMap<NodeId, Arc<dyn Node<S>>>,
    routers: HashMap<NodeId, RouterFn<S>>,
}

impl<S> WorkflowBuilder<S>
where
    S: Send + Debug + 'static,
{
    pub fn new(spec: WorkflowSpec) -> Self {
        Self {
            spec,
            nodes: HashMap::new(),
            routers: HashMap::new(),
        }
    }

    /// 提供一个可用节点；不在 order 中的节点不会进入图
    pub fn node(mut self, node: Arc<dyn Node<S>>) -> Self {
        self.nodes.insert(node.id().to_string(), node);
        self
    }

    /// 为 `from` 节点的条件边登记路由函数
    pub fn router(mut self, from: impl Into<NodeId>, router: RouterFn<S>) -> Self {
        self.routers.insert(from.into(), router);
        self
    }

    pub fn build(self) -> Result<CompiledGraph<S>, WorkflowError> {
        let Self {
            spec,
            mut nodes,
            mut routers,
        } = self;

        let entry = spec.order.first().cloned().ok_or_else(|| {
            WorkflowError::InvalidConfiguration("workflow order is empty".to_string())
        })?;

        let mut graph = StateGraph::new();
        for id in &spec.order {
            let node = nodes
                .remove(id)
                .ok_or_else(|| WorkflowError::UnknownNode(id.clone()))?;
            graph.add_node(node);
        }
        graph
            .add_edge(START, entry)
            .with_recursion_limit(spec.recursion_limit);

        for (from, edge) in spec.edges {
            if !spec.order.contains(&from) {
                return Err(WorkflowError::UnknownNode(from));
            }
            match edge {
                EdgeSpec::Fixed(to) => {
                    graph.add_edge(from, to);
                }
                EdgeSpec::Conditional(path_map) => {
                    let router = routers.remove(&from).ok_or_else(|| {
                        WorkflowError::InvalidConfiguration(format!(
                            "conditional edge from {from} has no router"
                        ))
                    })?;
                    graph.add_conditional_edges(from, router, path_map);
                }
            }
        }

        graph.compile()
    }
}
