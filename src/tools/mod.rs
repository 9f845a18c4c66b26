pub mod executor;
pub mod registry;
pub mod search;

pub use executor::{ToolExecutor, ToolMessage, ToolOutput};
pub use registry::{Tool, ToolRegistry, ToolSpec};
pub use search::{SearchError, WebSearchTool};
