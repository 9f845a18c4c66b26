//! 联网搜索工具（智谱 web-search-pro）
//!
//! 每次调用向固定的工具端点发一次 POST（默认超时 300 秒，不重试），
//! 从 `choices[0].message.tool_calls[1].search_result[0].content` 取出搜索内容。
//!
//! 取值规则：缺失的对象字段按空对象处理，缺失的列表字段按 `[{}]` 处理，缺失的 content 用「未找到相关信息」代替；
//! 列表下标越界（例如 tool_calls 只有 1 项）或节点类型不符则报 Malformed，不会静默回退。
//! 非 200 状态码在 Tool 边界转成「联网搜索失败，状态码：{status}」作为普通结果返回。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};
use schemars::{schema_for, JsonSchema};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::AgentError;
use crate::tools::Tool;

pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://open.bigmodel.cn/api/paas/v4/tools";
pub const DEFAULT_SEARCH_ENGINE: &str = "web-search-pro";
pub const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 300;

/// content 缺失时的回退文本
pub const NOT_FOUND: &str = "未找到相关信息";

#[derive(Error, Debug)]
pub enum SearchError {
    /// 非 200 状态码；Display 即为返回给 Agent 的文本
    #[error("联网搜索失败，状态码：{0}")]
    Status(u16),
    #[error("search request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{0}")]
    Malformed(String),
}

impl From<SearchError> for AgentError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Transport(e) => AgentError::Transport(e.to_string()),
            SearchError::Malformed(msg) => AgentError::MalformedSearchResponse(msg),
            status @ SearchError::Status(_) => AgentError::Transport(status.to_string()),
        }
    }
}

/// web_search 的参数（仅用于生成 Schema）
#[allow(dead_code)]
#[derive(Deserialize, JsonSchema)]
struct WebSearchArgs {
    /// 搜索关键词或问题
    query: String,
}

/// 联网搜索工具
pub struct WebSearchTool {
    client: Client,
    endpoint: String,
    search_engine: String,
    api_key: String,
}

impl WebSearchTool {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: endpoint.into(),
            search_engine: DEFAULT_SEARCH_ENGINE.to_string(),
            api_key: api_key.into(),
        }
    }

    /// 请求体中的 "tool" 字段，默认 web-search-pro
    pub fn with_search_engine(mut self, search_engine: impl Into<String>) -> Self {
        self.search_engine = search_engine.into();
        self
    }

    pub async fn search(&self, query: &str) -> Result<String, SearchError> {
        let request_id = uuid::Uuid::new_v4().to_string();
        let payload = serde_json::json!({
            "request_id": request_id,
            "tool": self.search_engine,
            "stream": false,
            "messages": [{ "role": "user", "content": query }],
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, self.api_key.as_str())
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        tracing::info!(request_id = %request_id, status = status.as_u16(), "web search response");
        if status != StatusCode::OK {
            return Err(SearchError::Status(status.as_u16()));
        }

        let body = resp.text().await?;
        let body: Value = serde_json::from_str(&body)
            .map_err(|e| SearchError::Malformed(format!("response is not JSON: {e}")))?;
        let content = extract_search_content(&body)?;
        tracing::debug!(request_id = %request_id, content = %content, "web search result");
        Ok(content)
    }
}

/// 对象节点取字段；None 代表缺失后回退成的空对象
fn field<'a>(node: Option<&'a Value>, key: &str, path: &str) -> Result<Option<&'a Value>, SearchError> {
    match node {
        None => Ok(None),
        Some(Value::Object(map)) => Ok(map.get(key)),
        Some(other) => Err(SearchError::Malformed(format!(
            "{path}: expected object, got {other}"
        ))),
    }
}

/// 列表节点取下标；缺失的列表等价于 `[{}]`
fn element<'a>(list: Option<&'a Value>, index: usize, path: &str) -> Result<Option<&'a Value>, SearchError> {
    match list {
        None if index == 0 => Ok(None),
        None => Err(SearchError::Malformed(format!(
            "{path}[{index}]: index out of range (len 1)"
        ))),
        Some(Value::Array(items)) => items.get(index).map(Some).ok_or_else(|| {
            SearchError::Malformed(format!(
                "{path}[{index}]: index out of range (len {})",
                items.len()
            ))
        }),
        Some(other) => Err(SearchError::Malformed(format!(
            "{path}: expected array, got {other}"
        ))),
    }
}

/// 按固定路径提取搜索内容
pub fn extract_search_content(body: &Value) -> Result<String, SearchError> {
    let choices = field(Some(body), "choices", "$")?;
    let choice = element(choices, 0, "choices")?;
    let message = field(choice, "message", "choices[0]")?;
    let tool_calls = field(message, "tool_calls", "choices[0].message")?;
    let call = element(tool_calls, 1, "choices[0].message.tool_calls")?;
    let results = field(call, "search_result", "choices[0].message.tool_calls[1]")?;
    let first = element(results, 0, "choices[0].message.tool_calls[1].search_result")?;
    let content = field(first, "content", "choices[0].message.tool_calls[1].search_result[0]")?;

    // 显式的 null 与缺失的 content 同样按「未找到相关信息」处理
    Ok(match content {
        None | Some(Value::Null) => NOT_FOUND.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    })
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "调用联网搜索工具，返回搜索结果。"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::to_value(schema_for!(WebSearchArgs)).unwrap_or_else(|_| {
            serde_json::json!({
                "type": "object",
                "properties": { "query": { "type": "string" } },
                "required": ["query"]
            })
        })
    }

    async fn execute(&self, args: Value) -> Result<String, AgentError> {
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AgentError::MissingArgument("query".to_string()))?;
        tracing::info!(query = %query, "web search");
        match self.search(query).await {
            Ok(content) => Ok(content),
            Err(status @ SearchError::Status(_)) => {
                tracing::warn!(error = %status, "web search failed");
                Ok(status.to_string())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn response_with_content(content: &str) -> Value {
        json!({
            "choices": [{
                "message": {
                    "tool_calls": [
                        { "type": "search_intent", "search_intent": [] },
                        { "type": "search_result", "search_result": [{ "content": content }] }
                    ]
                }
            }]
        })
    }

    async fn tool_for(server: &MockServer) -> WebSearchTool {
        WebSearchTool::new(format!("{}/api/paas/v4/tools", server.uri()), "test-key", 5)
    }

    #[test]
    fn test_extract_content() {
        let body = response_with_content("X");
        assert_eq!(extract_search_content(&body).unwrap(), "X");
    }

    #[test]
    fn test_extract_missing_content_falls_back() {
        let body = json!({
            "choices": [{ "message": { "tool_calls": [{}, { "search_result": [{}] }] } }]
        });
        assert_eq!(extract_search_content(&body).unwrap(), NOT_FOUND);

        let body = json!({
            "choices": [{ "message": { "tool_calls": [{}, {}] } }]
        });
        assert_eq!(extract_search_content(&body).unwrap(), NOT_FOUND);
    }

    #[test]
    fn test_extract_null_content_falls_back() {
        let body = json!({
            "choices": [{ "message": { "tool_calls": [{}, { "search_result": [{ "content": null }] }] } }]
        });
        assert_eq!(extract_search_content(&body).unwrap(), NOT_FOUND);
    }

    #[test]
    fn test_extract_single_tool_call_is_malformed() {
        let body = json!({
            "choices": [{ "message": { "tool_calls": [{ "search_result": [{ "content": "X" }] }] } }]
        });
        let err = extract_search_content(&body).unwrap_err();
        assert!(matches!(err, SearchError::Malformed(ref m) if m.contains("tool_calls[1]")));
    }

    #[test]
    fn test_extract_missing_tool_calls_is_malformed() {
        // 缺失的 tool_calls 回退为 [{}]，下标 1 依旧越界
        let err = extract_search_content(&json!({})).unwrap_err();
        assert!(matches!(err, SearchError::Malformed(_)));
    }

    #[test]
    fn test_extract_empty_search_result_is_malformed() {
        let body = json!({
            "choices": [{ "message": { "tool_calls": [{}, { "search_result": [] }] } }]
        });
        assert!(matches!(
            extract_search_content(&body),
            Err(SearchError::Malformed(_))
        ));
    }

    #[test]
    fn test_status_error_message() {
        assert_eq!(SearchError::Status(500).to_string(), "联网搜索失败，状态码：500");
    }

    #[tokio::test]
    async fn test_search_sends_expected_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/paas/v4/tools"))
            .and(header("Authorization", "test-key"))
            .and(body_partial_json(json!({
                "tool": "web-search-pro",
                "stream": false,
                "messages": [{ "role": "user", "content": "杭州天气" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(response_with_content("晴")))
            .expect(1)
            .mount(&server)
            .await;

        let tool = tool_for(&server).await;
        assert_eq!(tool.search("杭州天气").await.unwrap(), "晴");
    }

    #[tokio::test]
    async fn test_search_single_tool_call_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "tool_calls": [{ "search_result": [{ "content": "X" }] }] } }]
            })))
            .mount(&server)
            .await;

        let tool = tool_for(&server).await;
        let err = tool
            .execute(json!({ "query": "anything" }))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::MalformedSearchResponse(_)));
    }

    #[tokio::test]
    async fn test_search_status_500_is_returned_as_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let tool = tool_for(&server).await;
        assert!(matches!(tool.search("q").await, Err(SearchError::Status(500))));
        let out = tool.execute(json!({ "query": "q" })).await.unwrap();
        assert_eq!(out, "联网搜索失败，状态码：500");
    }

    #[tokio::test]
    async fn test_search_non_json_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let tool = tool_for(&server).await;
        assert!(matches!(tool.search("q").await, Err(SearchError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_execute_requires_query() {
        let tool = WebSearchTool::new("http://127.0.0.1:9/unused", "k", 1);
        let err = tool.execute(json!({ "q": "typo" })).await.unwrap_err();
        assert!(matches!(err, AgentError::MissingArgument(arg) if arg == "query"));
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        // 先占用一个空闲端口再释放，保证连接被拒绝
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let tool = WebSearchTool::new(format!("http://127.0.0.1:{port}/tools"), "k", 1);
        let err = tool.execute(json!({ "query": "q" })).await.unwrap_err();
        assert!(matches!(err, AgentError::Transport(_)));
    }

    #[test]
    fn test_schema_requires_query() {
        let tool = WebSearchTool::new(DEFAULT_SEARCH_ENDPOINT, "", DEFAULT_SEARCH_TIMEOUT_SECS);
        let schema = tool.parameters_schema();
        assert_eq!(schema["required"], json!(["query"]));
        assert_eq!(schema["properties"]["query"]["type"], "string");
    }
}
