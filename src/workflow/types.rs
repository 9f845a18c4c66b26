//! 工作流类型定义
//!
//! 节点 ID、START / END 哨兵、边的配置形式（固定后继或路由表）、工作流错误类型，
//! 以及两个内置的工作流预设。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type NodeId = String;

/// 图入口哨兵：`add_edge(START, "agent")` 等价于 `set_entry_point("agent")`
pub const START: &str = "__start__";

/// 图出口哨兵：后继为 END 时遍历结束
pub const END: &str = "__end__";

/// 递归上限（节点执行次数），与常见 agent 图框架的默认值一致
pub const DEFAULT_RECURSION_LIMIT: usize = 25;

/// 某节点的出边：固定后继，或「路由标签 -> 节点」表
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EdgeSpec {
    Fixed(NodeId),
    Conditional(BTreeMap<String, NodeId>),
}

/// 可配置的工作流：节点顺序（首个为入口）+ 边表 + 递归上限
/// 缺失的字段取自 with_beautify 预设
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowSpec {
    pub order: Vec<NodeId>,
    pub edges: BTreeMap<NodeId, EdgeSpec>,
    pub recursion_limit: usize,
}

impl WorkflowSpec {
    /// agent -> action 循环，Agent 完成即结束
    pub fn tool_agent() -> Self {
        Self {
            order: vec!["agent".into(), "action".into()],
            edges: BTreeMap::from([
                (
                    "agent".into(),
                    EdgeSpec::Conditional(BTreeMap::from([
                        ("continue".into(), "action".into()),
                        ("beautify".into(), END.into()),
                        ("end".into(), END.into()),
                    ])),
                ),
                ("action".into(), EdgeSpec::Fixed("agent".into())),
            ]),
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }

    /// agent -> action 循环，Agent 完成后进入 beautify 再结束
    pub fn with_beautify() -> Self {
        Self {
            order: vec!["agent".into(), "action".into(), "beautify".into()],
            edges: BTreeMap::from([
                (
                    "agent".into(),
                    EdgeSpec::Conditional(BTreeMap::from([
                        ("continue".into(), "action".into()),
                        ("beautify".into(), "beautify".into()),
                        ("end".into(), END.into()),
                    ])),
                ),
                ("action".into(), EdgeSpec::Fixed("agent".into())),
                ("beautify".into(), EdgeSpec::Fixed(END.into())),
            ]),
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }
}

impl Default for WorkflowSpec {
    fn default() -> Self {
        Self::with_beautify()
    }
}

/// 工作流错误类型（编译期校验 + 运行期路由）
#[derive(Error, Debug, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("Graph has no nodes")]
    EmptyGraph,
    #[error("Graph has no entry point")]
    MissingEntryPoint,
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),
    #[error("Node {0} already has an outgoing edge")]
    DuplicateEdge(NodeId),
    #[error("Node {0} has no outgoing edge")]
    NoOutgoingEdge(NodeId),
    #[error("Router label {label:?} from node {node} has no target")]
    UnroutableLabel { node: NodeId, label: String },
    #[error("Recursion limit of {0} reached without hitting END")]
    RecursionLimit(usize),
    #[error("Invalid workflow configuration: {0}")]
    InvalidConfiguration(String),
}
