//! Agent 层：ToolsAgent（规划）、Beautifier（润色）、Router（分支选择）与三个步骤节点

pub mod beautify;
pub mod planner;
pub mod router;
pub mod steps;

pub use beautify::{Beautifier, BEAUTIFY_LOG};
pub use planner::{AgentOutcome, ToolsAgent};
pub use router::{agent_router, route, Route};
pub use steps::{ActionNode, AgentNode, BeautifyNode, ACTION_NODE, AGENT_NODE, BEAUTIFY_NODE, UNKNOWN_ACTION};
