//! Ollama adapter (§6.3). The teacher has no local-model adapter; this is
//! new, grounded on the wire contract plus the other adapters' shape.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use ws_domain::message::{Message, Role};
use ws_domain::Result;

use crate::traits::{GenerateOptions, GenerateResult, LlmProvider};
use crate::util::{excerpt, from_reqwest, status_to_error};

const LIST_MODELS_TIMEOUT: Duration = Duration::from_secs(30);
const GENERATE_TIMEOUT: Duration = Duration::from_secs(90);

pub struct OllamaProvider {
    base_url: String,
    model_name: String,
    client: Client,
}

impl OllamaProvider {
    pub fn new(base_url: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model_name: model_name.into(),
            client: Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct TagsResponse {
    models: Vec<TagEntry>,
}

#[derive(Deserialize)]
struct TagEntry {
    name: String,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatBody<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChoiceMessage,
    #[serde(default)]
    prompt_eval_count: Option<i64>,
    #[serde(default)]
    eval_count: Option<i64>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

fn role_to_str(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
    }
}

#[async_trait::async_trait]
impl LlmProvider for OllamaProvider {
    fn provider_id(&self) -> &'static str {
        "ollama"
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);
        let resp = self
            .client
            .get(&url)
            .timeout(LIST_MODELS_TIMEOUT)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, excerpt(&body)));
        }
        let parsed: TagsResponse = resp.json().await.map_err(from_reqwest)?;
        Ok(parsed.models.into_iter().map(|m| m.name).collect())
    }

    async fn generate(
        &self,
        messages: &[Message],
        _opts: &GenerateOptions,
    ) -> Result<GenerateResult> {
        let wire_messages = messages
            .iter()
            .map(|m| WireMessage {
                role: role_to_str(m.role),
                content: &m.content,
            })
            .collect();

        let body = ChatBody {
            model: &self.model_name,
            messages: wire_messages,
            stream: false,
        };

        let url = format!("{}/api/chat", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&body)
            .timeout(GENERATE_TIMEOUT)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, excerpt(&text)));
        }

        let raw: serde_json::Value = resp.json().await.map_err(from_reqwest)?;
        let parsed: ChatResponse = serde_json::from_value(raw.clone())
            .map_err(|e| ws_domain::Error::ProviderProtocol(e.to_string()))?;

        Ok(GenerateResult {
            text: parsed.message.content,
            token_in: parsed.prompt_eval_count,
            token_out: parsed.eval_count,
            raw,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let p = OllamaProvider::new("http://localhost:11434/", "llama3");
        assert_eq!(p.base_url, "http://localhost:11434");
    }
}
