//! 状态图工作流
//!
//! - types：NodeId、START / END、EdgeSpec / WorkflowSpec、WorkflowError
//! - graph：Node trait 与 StateGraph 构建器
//! - engine：CompiledGraph，按边逐个执行节点
//! - builder：按 WorkflowSpec（配置）组装 StateGraph

pub mod builder;
pub mod engine;
pub mod graph;
pub mod types;

pub use builder::WorkflowBuilder;
pub use engine::CompiledGraph;
pub use graph::{NextEntry, Node, RouterFn, StateGraph};
pub use types::*;
