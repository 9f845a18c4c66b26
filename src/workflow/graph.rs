//! 状态图构建
//!
//! add_node 注册节点，add_edge / add_conditional_edges 定义出边（START / END 为入口与出口），
//! compile 校验结构后得到可执行的 CompiledGraph。每个节点恰好有一种出边：固定后继或条件路由。

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::AgentError;
use crate::workflow::engine::CompiledGraph;
use crate::workflow::types::*;

/// 图节点：接收状态，返回更新后的状态
#[async_trait]
pub trait Node<S>: Send + Sync
where
    S: Send + Debug + 'static,
{
    fn id(&self) -> &str;

    async fn run(&self, state: S) -> Result<S, AgentError>;
}

/// 路由函数：根据当前状态返回路由标签
pub type RouterFn<S> = Arc<dyn Fn(&S) -> String + Send + Sync>;

/// 节点执行后如何确定下一个节点
pub enum NextEntry<S> {
    Fixed(NodeId),
    Conditional {
        router: RouterFn<S>,
        path_map: HashMap<String, NodeId>,
    },
}

/// 状态图构建器
pub struct StateGraph<S> {
    nodes: HashMap<NodeId, Arc<dyn Node<S>>>,
    entry: Option<NodeId>,
    next: HashMap<NodeId, NextEntry<S>>,
    /// 第一个被重复定义出边的节点，compile 时报错
    duplicate: Option<NodeId>,
    recursion_limit: usize,
}

impl<S> Default for StateGraph<S>
where
    S: Send + Debug + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> StateGraph<S>
where
    S: Send + Debug + 'static,
{
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            entry: None,
            next: HashMap::new(),
            duplicate: None,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }

    /// 注册节点；同 ID 覆盖
    pub fn add_node(&mut self, node: Arc<dyn Node<S>>) -> &mut Self {
        self.nodes.insert(node.id().to_string(), node);
        self
    }

    pub fn set_entry_point(&mut self, id: impl Into<NodeId>) -> &mut Self {
        self.entry = Some(id.into());
        self
    }

    /// 固定边；from 为 START 时设置入口
    pub fn add_edge(&mut self, from: impl Into<NodeId>, to: impl Into<NodeId>) -> &mut Self {
        let from = from.into();
        if from == START {
            return self.set_entry_point(to);
        }
        self.insert_next(from, NextEntry::Fixed(to.into()));
        self
    }

    /// 条件边：from 执行完后调用 router，以返回的标签在 path_map 中查找下一个节点
    pub fn add_conditional_edges<I, K, V>(
        &mut self,
        from: impl Into<NodeId>,
        router: RouterFn<S>,
        path_map: I,
    ) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<NodeId>,
    {
        let path_map = path_map
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.insert_next(from.into(), NextEntry::Conditional { router, path_map });
        self
    }

    pub fn with_recursion_limit(&mut self, limit: usize) -> &mut Self {
        self.recursion_limit = limit;
        self
    }

    fn insert_next(&mut self, from: NodeId, entry: NextEntry<S>) {
        if self.next.contains_key(&from) && self.duplicate.is_none() {
            self.duplicate = Some(from.clone());
        }
        self.next.insert(from, entry);
    }

    fn check_target(&self, to: &str) -> Result<(), WorkflowError> {
        if to == END || self.nodes.contains_key(to) {
            Ok(())
        } else {
            Err(WorkflowError::UnknownNode(to.to_string()))
        }
    }

    /// 校验并编译
    pub fn compile(self) -> Result<CompiledGraph<S>, WorkflowError> {
        if self.nodes.is_empty() {
            return Err(WorkflowError::EmptyGraph);
        }
        if let Some(from) = &self.duplicate {
            return Err(WorkflowError::DuplicateEdge(from.clone()));
        }
        let entry = self.entry.clone().ok_or(WorkflowError::MissingEntryPoint)?;
        if !self.nodes.contains_key(&entry) {
            return Err(WorkflowError::UnknownNode(entry));
        }
        if self.recursion_limit == 0 {
            return Err(WorkflowError::InvalidConfiguration(
                "recursion_limit must be positive".to_string(),
            ));
        }

        for (from, next) in &self.next {
            if !self.nodes.contains_key(from) {
                return Err(WorkflowError::UnknownNode(from.clone()));
            }
            match next {
                NextEntry::Fixed(to) => self.check_target(to)?,
                NextEntry::Conditional { path_map, .. } => {
                    for to in path_map.values() {
                        self.check_target(to)?;
                    }
                }
            }
        }

        // 排序后校验，保证错误信息稳定
        let mut ids: Vec<&NodeId> = self.nodes.keys().collect();
        ids.sort();
        if let Some(id) = ids.into_iter().find(|id| !self.next.contains_key(*id)) {
            return Err(WorkflowError::NoOutgoingEdge(id.clone()));
        }

        Ok(CompiledGraph::new(
            self.nodes,
            entry,
            self.next,
            self.recursion_limit,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Inc(&'static str);

    #[async_trait]
    impl Node<u32> for Inc {
        fn id(&self) -> &str {
            self.0
        }

        async fn run(&self, state: u32) -> Result<u32, AgentError> {
            Ok(state + 1)
        }
    }

    fn inc(id: &'static str) -> Arc<dyn Node<u32>> {
        Arc::new(Inc(id))
    }

    #[test]
    fn test_compile_empty_graph_fails() {
        let graph = StateGraph::<u32>::new();
        assert_eq!(graph.compile().err(), Some(WorkflowError::EmptyGraph));
    }

    #[test]
    fn test_compile_requires_entry_point() {
        let mut graph = StateGraph::<u32>::new();
        graph.add_node(inc("a")).add_edge("a", END);
        assert_eq!(graph.compile().err(), Some(WorkflowError::MissingEntryPoint));
    }

    #[test]
    fn test_compile_rejects_unknown_target() {
        let mut graph = StateGraph::<u32>::new();
        graph
            .add_node(inc("a"))
            .add_edge(START, "a")
            .add_edge("a", "missing");
        assert_eq!(
            graph.compile().err(),
            Some(WorkflowError::UnknownNode("missing".into()))
        );
    }

    #[test]
    fn test_compile_rejects_node_without_outgoing_edge() {
        let mut graph = StateGraph::<u32>::new();
        graph
            .add_node(inc("a"))
            .add_node(inc("b"))
            .set_entry_point("a")
            .add_edge("a", "b");
        assert_eq!(
            graph.compile().err(),
            Some(WorkflowError::NoOutgoingEdge("b".into()))
        );
    }

    #[test]
    fn test_compile_rejects_duplicate_outgoing_edge() {
        let mut graph = StateGraph::<u32>::new();
        let router: RouterFn<u32> = Arc::new(|_| "end".to_string());
        graph
            .add_node(inc("a"))
            .set_entry_point("a")
            .add_edge("a", END)
            .add_conditional_edges("a", router, [("end", END)]);
        assert_eq!(
            graph.compile().err(),
            Some(WorkflowError::DuplicateEdge("a".into()))
        );
    }

    #[test]
    fn test_compile_rejects_unknown_conditional_target() {
        let mut graph = StateGraph::<u32>::new();
        let router: RouterFn<u32> = Arc::new(|_| "go".to_string());
        graph
            .add_node(inc("a"))
            .set_entry_point("a")
            .add_conditional_edges("a", router, [("go", "nowhere")]);
        assert_eq!(
            graph.compile().err(),
            Some(WorkflowError::UnknownNode("nowhere".into()))
        );
    }

    #[test]
    fn test_compile_rejects_edge_from_unknown_node() {
        let mut graph = StateGraph::<u32>::new();
        graph
            .add_node(inc("a"))
            .set_entry_point("a")
            .add_edge("a", END)
            .add_edge("ghost", "a");
        assert_eq!(
            graph.compile().err(),
            Some(WorkflowError::UnknownNode("ghost".into()))
        );
    }
}
