//! searchflow - 联网搜索 Agent 工作流
//!
//! agent（LLM 规划）-> action（联网搜索）-> agent ... -> beautify（文笔润色）的状态图。
//!
//! 模块划分：
//! - **agent**: 无头运行时，按配置组装并运行工作流
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型、遍历状态与 Agent 决策
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / 智谱 GLM / Mock）
//! - **memory**: 对话消息
//! - **observability**: 日志初始化
//! - **react**: ToolsAgent、Beautifier、Router 与三个步骤节点
//! - **tools**: 工具注册表、联网搜索工具与执行器
//! - **workflow**: 状态图构建、校验与执行

pub mod agent;
pub mod config;
pub mod core;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod react;
pub mod tools;
pub mod workflow;
