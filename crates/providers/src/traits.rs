//! The provider abstraction (§4.2): a capability `{list_models, generate}`
//! polymorphic over the five wire protocols. Every adapter is constructed
//! from `{base_url, api_key, model_name, extra}` and carries no hidden
//! global state — no key rotation, no role routing, no streaming.

use ws_domain::message::Message;
use ws_domain::Result;

/// Knobs a caller may set on a single `generate` call (§4.2, §4.3).
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub max_output_chars: Option<u32>,
    pub temperature: Option<f32>,
    /// `Json` asks the adapter to request a structured response where the
    /// wire protocol supports it (OpenAI family's `response_format`); `Text`
    /// (the default) asks for nothing special.
    pub response_format: ResponseFormat,
    pub stop: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Text,
    Json,
}

/// Result of one `generate` call. `raw` carries the provider's unparsed
/// response body for diagnostics; it is never logged in full (§7).
#[derive(Debug, Clone)]
pub struct GenerateResult {
    pub text: String,
    pub token_in: Option<i64>,
    pub token_out: Option<i64>,
    pub raw: serde_json::Value,
}

/// Trait every wire adapter implements. Client 4xx maps to
/// `Error::ProviderClient`; timeout/5xx/connection failure maps to
/// `Error::ProviderTransient` so the Runner retries (§4.5, §7).
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Stable identifier matching `ProviderKind::as_str()`.
    fn provider_id(&self) -> &'static str;

    /// List model names available at `base_url` (§6.1 `GET /api/provider/{id}/models`).
    async fn list_models(&self) -> Result<Vec<String>>;

    /// Generate one completion for `messages`. Timeout is the caller's
    /// responsibility (Runner wraps this in the 90s budget of §5).
    async fn generate(
        &self,
        messages: &[Message],
        opts: &GenerateOptions,
    ) -> Result<GenerateResult>;
}
