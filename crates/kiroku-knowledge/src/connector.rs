//! Knowledge connector: summarize via an OpenAI-style completions endpoint,
//! dedup-check and create records in a Notion database.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use kiroku_core::config::{NotionConfig, OpenAiConfig};

use crate::error::ServiceError;

/// Prefix prepended to the input when test mode replaces the real summarizer.
pub const DUMMY_SUMMARY_PREFIX: &str = "（テスト要約）";

/// Instruction prepended to the text sent to the summarizer.
const SUMMARY_PROMPT: &str = "次の内容を要約してください:";

/// Notion REST API version header value.
const NOTION_VERSION: &str = "2022-06-28";

/// The three store/summarizer operations the ingress handler depends on.
///
/// A trait seam so tests can substitute a recording double for the live
/// connector. Operations are independent; there is no shared transaction
/// and no retry.
#[async_trait]
pub trait Knowledge: Send + Sync {
    /// Condense `text` into a short summary.
    async fn summarize(&self, text: &str) -> Result<String, ServiceError>;

    /// True iff a record whose detail field exactly equals `detail`
    /// already exists (case-sensitive, on the raw unsummarized text).
    async fn record_exists(&self, detail: &str) -> Result<bool, ServiceError>;

    /// Create one record: timestamp title, category tag, summary, detail.
    async fn create_record(
        &self,
        summary: &str,
        detail: &str,
        category: &str,
    ) -> Result<(), ServiceError>;
}

/// Live connector backed by reqwest.
pub struct KnowledgeConnector {
    client: reqwest::Client,
    openai: OpenAiConfig,
    notion: NotionConfig,
    test_mode: bool,
}

impl KnowledgeConnector {
    pub fn new(openai: OpenAiConfig, notion: NotionConfig, test_mode: bool) -> Self {
        Self {
            client: reqwest::Client::new(),
            openai,
            notion,
            test_mode,
        }
    }
}

#[async_trait]
impl Knowledge for KnowledgeConnector {
    async fn summarize(&self, text: &str) -> Result<String, ServiceError> {
        // Test mode: deterministic local stand-in, no network call.
        if self.test_mode {
            info!("test_mode: skipping summarizer call");
            return Ok(format!("{DUMMY_SUMMARY_PREFIX}{text}"));
        }

        let url = format!("{}/v1/chat/completions", self.openai.base_url);
        let body = completion_body(&self.openai.model, text);

        debug!(model = %self.openai.model, "sending summarize request");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.openai.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status, body = %text, "summarizer API error");
            return Err(ServiceError::Api {
                service: "summarizer",
                status,
                message: text,
            });
        }

        let api_resp: CompletionResponse =
            resp.json().await.map_err(|e| ServiceError::Malformed {
                service: "summarizer",
                detail: e.to_string(),
            })?;

        let summary = api_resp
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ServiceError::Malformed {
                service: "summarizer",
                detail: "no choices in response".to_string(),
            })?;

        debug!(len = summary.len(), "received summary");
        Ok(summary)
    }

    async fn record_exists(&self, detail: &str) -> Result<bool, ServiceError> {
        let url = format!(
            "{}/v1/databases/{}/query",
            self.notion.base_url, self.notion.database_id
        );
        let body = serde_json::json!({
            "filter": {
                "property": "詳細",
                "rich_text": { "equals": detail },
            },
        });

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.notion.api_key)
            .header("Notion-Version", NOTION_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status, body = %text, "store query error");
            return Err(ServiceError::Api {
                service: "store",
                status,
                message: text,
            });
        }

        let query_resp: QueryResponse =
            resp.json().await.map_err(|e| ServiceError::Malformed {
                service: "store",
                detail: e.to_string(),
            })?;

        Ok(!query_resp.results.is_empty())
    }

    async fn create_record(
        &self,
        summary: &str,
        detail: &str,
        category: &str,
    ) -> Result<(), ServiceError> {
        let url = format!("{}/v1/pages", self.notion.base_url);
        let body = page_body(&self.notion.database_id, &title_now(), summary, detail, category);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.notion.api_key)
            .header("Notion-Version", NOTION_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status, body = %text, "store create error");
            return Err(ServiceError::Api {
                service: "store",
                status,
                message: text,
            });
        }

        Ok(())
    }
}

/// Request body for the chat completions endpoint.
fn completion_body(model: &str, text: &str) -> serde_json::Value {
    serde_json::json!({
        "model": model,
        "messages": [{
            "role": "user",
            "content": format!("{SUMMARY_PROMPT}\n{text}"),
        }],
    })
}

/// Request body for the Notion page-create endpoint.
///
/// Property names match the target database schema: `Name` (title),
/// `分類` (multi-select), `要約` and `詳細` (rich text).
fn page_body(
    database_id: &str,
    title: &str,
    summary: &str,
    detail: &str,
    category: &str,
) -> serde_json::Value {
    serde_json::json!({
        "parent": { "database_id": database_id },
        "properties": {
            "Name": { "title": [{ "text": { "content": title } }] },
            "分類": { "multi_select": [{ "name": category }] },
            "要約": { "rich_text": [{ "text": { "content": summary } }] },
            "詳細": { "rich_text": [{ "text": { "content": detail } }] },
        },
    })
}

/// Record title: the current local time as a plain timestamp string.
fn title_now() -> String {
    chrono::Local::now().format("%Y/%m/%d %H:%M:%S").to_string()
}

// API response types (private — deserialization only)

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct QueryResponse {
    results: Vec<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_body_embeds_prompt_and_model() {
        let body = completion_body("gpt-3.5-turbo", "本文");
        assert_eq!(body["model"], "gpt-3.5-turbo");
        let content = body["messages"][0]["content"].as_str().unwrap();
        assert!(content.starts_with(SUMMARY_PROMPT));
        assert!(content.ends_with("本文"));
        assert_eq!(body["messages"][0]["role"], "user");
    }

    #[test]
    fn page_body_maps_all_properties() {
        let body = page_body("db-1", "2025/01/01 00:00:00", "要約文", "詳細文", "学習");
        assert_eq!(body["parent"]["database_id"], "db-1");
        let props = &body["properties"];
        assert_eq!(
            props["Name"]["title"][0]["text"]["content"],
            "2025/01/01 00:00:00"
        );
        assert_eq!(props["分類"]["multi_select"][0]["name"], "学習");
        assert_eq!(props["要約"]["rich_text"][0]["text"]["content"], "要約文");
        assert_eq!(props["詳細"]["rich_text"][0]["text"]["content"], "詳細文");
    }

    #[test]
    fn title_is_a_local_timestamp() {
        let title = title_now();
        // e.g. "2025/08/31 12:34:56"
        assert_eq!(title.len(), 19);
        assert_eq!(&title[4..5], "/");
        assert_eq!(&title[13..14], ":");
    }
}
