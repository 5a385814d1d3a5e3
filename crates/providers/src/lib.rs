pub mod gemini;
pub mod mock;
pub mod ollama;
pub mod openai_compat;
pub mod traits;
pub(crate) mod util;

pub use gemini::GeminiProvider;
pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use traits::{GenerateOptions, GenerateResult, LlmProvider, ResponseFormat};

use std::sync::Arc;

use ws_domain::entities::{ProviderConfig, ProviderKind};
use ws_domain::Result;

/// Build the adapter named by `cfg.provider`. Callers pass in the
/// already-decrypted plaintext key — the Store owns decryption, adapters
/// never see ciphertext (§4.1, §4.2).
pub fn build_provider(cfg: &ProviderConfig, api_key_plain: &str) -> Result<Arc<dyn LlmProvider>> {
    let model_name = cfg.model_name.clone().unwrap_or_default();
    let provider: Arc<dyn LlmProvider> = match cfg.provider {
        ProviderKind::Openai => Arc::new(OpenAiCompatProvider::new(
            "openai",
            cfg.base_url.clone(),
            api_key_plain,
            model_name,
        )),
        ProviderKind::Deepseek => Arc::new(OpenAiCompatProvider::new(
            "deepseek",
            cfg.base_url.clone(),
            api_key_plain,
            model_name,
        )),
        ProviderKind::Ollama => Arc::new(OllamaProvider::new(cfg.base_url.clone(), model_name)),
        ProviderKind::Gemini => Arc::new(GeminiProvider::new(
            cfg.base_url.clone(),
            api_key_plain,
            model_name,
        )),
        ProviderKind::Mock => Arc::new(MockProvider::new(model_name)),
    };
    Ok(provider)
}
