//! 核心层：错误类型与遍历状态

pub mod error;
pub mod state;

pub use error::AgentError;
pub use state::{AgentDecision, AgentState, AgentStep};
