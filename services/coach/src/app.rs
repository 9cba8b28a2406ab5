//! Wiring of the coach session from a loaded [`Config`].

use crate::config::Config;
use anyhow::Context;
use async_openai::config::OpenAIConfig;
use mbti_core::{
    llm_client::{LLMClient, OpenAICompatibleClient},
    persona::ProfileSet,
    prompts::PromptLibrary,
    retry::{RetryPolicy, RetryingClient},
};
use std::sync::Arc;
use tracing::info;

/// Builds the model client: an OpenAI-compatible client behind the retry policy.
pub fn build_llm_client(config: &Config) -> Arc<dyn LLMClient> {
    let openai_config = OpenAIConfig::new()
        .with_api_key(config.openai_api_key.clone())
        .with_api_base(config.api_base.clone());
    let client = OpenAICompatibleClient::new(
        openai_config,
        config.chat_model.clone(),
        config.request_timeout,
    );
    let policy = RetryPolicy {
        max_attempts: config.max_attempts,
        ..RetryPolicy::default()
    };
    Arc::new(RetryingClient::new(Arc::new(client), policy))
}

/// The built-in prompts, with overrides applied when a prompts directory is configured.
pub fn load_prompts(config: &Config) -> anyhow::Result<PromptLibrary> {
    match &config.prompts_path {
        Some(dir) => {
            info!(path = %dir.display(), "Loading prompt overrides");
            PromptLibrary::with_overrides(dir)
                .with_context(|| format!("Failed to read prompts from {}", dir.display()))
        }
        None => Ok(PromptLibrary::builtin()),
    }
}

/// Loads the persona profiles. A missing or malformed file yields an empty set.
pub fn load_profiles(config: &Config) -> ProfileSet {
    ProfileSet::load(&config.profiles_path)
}
