//! searchflow 命令行入口
//!
//! `searchflow [问题...]`：初始化日志、加载配置、组装工作流，对问题跑一次遍历并打印最终输出。

use anyhow::Context;
use searchflow::{agent, config::load_config, observability};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let cfg = load_config(None).context("Failed to load config")?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let input = if args.is_empty() {
        cfg.default_input()
    } else {
        args.join(" ")
    };

    let llm = agent::create_llm(&cfg);
    let graph = agent::create_workflow(&cfg, llm).context("Failed to build workflow")?;
    let state = agent::run(&graph, input)
        .await
        .context("Workflow run failed")?;

    println!(
        "最终 Agent 输出消息: {}",
        state.final_output().unwrap_or_default()
    );
    Ok(())
}
