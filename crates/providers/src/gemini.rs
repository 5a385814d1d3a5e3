//! Gemini adapter (§6.3). Adapted from the teacher's `GoogleProvider` shape
//! (struct holding `reqwest::Client` + config, `from_config`-style
//! constructor) but narrowed to `{list_models, generate}` and the REST
//! key-in-query-string auth Gemini uses instead of a bearer header.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use ws_domain::message::{Message, Role};
use ws_domain::Result;

use crate::traits::{GenerateOptions, GenerateResult, LlmProvider};
use crate::util::{excerpt, from_reqwest, status_to_error};

const LIST_MODELS_TIMEOUT: Duration = Duration::from_secs(30);
const GENERATE_TIMEOUT: Duration = Duration::from_secs(90);

pub struct GeminiProvider {
    base_url: String,
    api_key: String,
    model_name: String,
    client: Client,
}

impl GeminiProvider {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model_name: model_name.into(),
            client: Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct ModelsResponse {
    models: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    name: String,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct GenerateBody<'a> {
    contents: Vec<Content<'a>>,
}

fn role_to_gemini(role: Role) -> &'static str {
    // Gemini has no "system" role in `contents`; system messages are sent
    // as a "user" turn ahead of the real user turn (no separate system
    // instruction channel is used here, matching this crate's narrow
    // `{list_models, generate}` surface).
    match role {
        Role::System => "user",
        Role::User => "user",
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
    #[serde(default)]
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: String,
}

#[derive(Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount")]
    prompt_token_count: Option<i64>,
    #[serde(rename = "candidatesTokenCount")]
    candidates_token_count: Option<i64>,
}

#[async_trait::async_trait]
impl LlmProvider for GeminiProvider {
    fn provider_id(&self) -> &'static str {
        "gemini"
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/v1beta/models?key={}", self.base_url, self.api_key);
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
        let parsed: ModelsResponse = resp.json().await.map_err(from_reqwest)?;
        Ok(parsed.models.into_iter().map(|m| m.name).collect())
    }

    async fn generate(
        &self,
        messages: &[Message],
        _opts: &GenerateOptions,
    ) -> Result<GenerateResult> {
        let contents = messages
            .iter()
            .map(|m| Content {
                role: role_to_gemini(m.role),
                parts: vec![Part { text: &m.content }],
            })
            .collect();

        let body = GenerateBody { contents };

        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model_name, self.api_key
        );
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
        let parsed: GenerateResponse = serde_json::from_value(raw.clone())
            .map_err(|e| ws_domain::Error::ProviderProtocol(e.to_string()))?;

        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ws_domain::Error::ProviderProtocol("empty candidates array".into()))?;
        let text = candidate
            .content
            .parts
            .into_iter()
            .map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");

        Ok(GenerateResult {
            text,
            token_in: parsed.usage_metadata.as_ref().and_then(|u| u.prompt_token_count),
            token_out: parsed
                .usage_metadata
                .as_ref()
                .and_then(|u| u.candidates_token_count),
            raw,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let p = GeminiProvider::new(
            "https://generativelanguage.googleapis.com/",
            "key",
            "gemini-1.5-flash",
        );
        assert_eq!(p.base_url, "https://generativelanguage.googleapis.com");
    }
}
