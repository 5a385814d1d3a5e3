//! OpenAI-compatible adapter (§6.3). Serves both the `openai` and
//! `deepseek` variants — identical wire format, different default
//! `base_url` — the same way the teacher's `OpenAiCompatProvider` served
//! both plain OpenAI and Azure OpenAI as one struct.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use ws_domain::message::{Message, Role};
use ws_domain::Result;

use crate::traits::{GenerateOptions, GenerateResult, LlmProvider, ResponseFormat};
use crate::util::{excerpt, from_reqwest, status_to_error};

const LIST_MODELS_TIMEOUT: Duration = Duration::from_secs(30);
const GENERATE_TIMEOUT: Duration = Duration::from_secs(90);

pub struct OpenAiCompatProvider {
    id: &'static str,
    base_url: String,
    api_key: String,
    model_name: String,
    client: Client,
}

impl OpenAiCompatProvider {
    pub fn new(
        id: &'static str,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model_name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model_name: model_name.into(),
            client: Client::new(),
        }
    }
}

#[derive(Serialize)]
struct ChatBody<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormatWire>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ResponseFormatWire {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

fn role_to_str(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
    }
}

#[derive(Deserialize)]
struct ModelsResponse {
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: Option<i64>,
    completion_tokens: Option<i64>,
}

#[async_trait::async_trait]
impl LlmProvider for OpenAiCompatProvider {
    fn provider_id(&self) -> &'static str {
        self.id
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/v1/models", self.base_url);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .timeout(LIST_MODELS_TIMEOUT)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, excerpt(&body)));
        }
        let parsed: ModelsResponse = resp.json().await.map_err(from_reqwest)?;
        Ok(parsed.data.into_iter().map(|m| m.id).collect())
    }

    async fn generate(
        &self,
        messages: &[Message],
        opts: &GenerateOptions,
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
            temperature: opts.temperature,
            response_format: match opts.response_format {
                ResponseFormat::Json => Some(ResponseFormatWire { kind: "json_object" }),
                ResponseFormat::Text => None,
            },
            stop: opts.stop.as_deref(),
            max_tokens: opts.max_output_chars,
        };

        let url = format!("{}/v1/chat/completions", self.base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
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

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ws_domain::Error::ProviderProtocol("empty choices array".into()))?;

        Ok(GenerateResult {
            text: choice.message.content,
            token_in: parsed.usage.as_ref().and_then(|u| u.prompt_tokens),
            token_out: parsed.usage.as_ref().and_then(|u| u.completion_tokens),
            raw,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_mapping() {
        assert_eq!(role_to_str(Role::System), "system");
        assert_eq!(role_to_str(Role::User), "user");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let p = OpenAiCompatProvider::new("openai", "https://api.openai.com/", "k", "gpt-4o");
        assert_eq!(p.base_url, "https://api.openai.com");
    }
}
