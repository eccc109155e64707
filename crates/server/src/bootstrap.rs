use std::sync::Arc;

use telcobot_agent::{
    billing_registry, shared_store, AgentRuntime, LlmClient, LlmError, OpenAiCompatibleClient,
    SharedBillingStore,
};
use telcobot_core::config::{AppConfig, ConfigError, LoadOptions};
use telcobot_core::BillingMockStore;
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub store: SharedBillingStore,
    pub agent_runtime: Arc<AgentRuntime>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("llm client setup failed: {0}")]
    Llm(#[from] LlmError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    let llm: Arc<dyn LlmClient> = Arc::new(OpenAiCompatibleClient::from_config(&config.llm)?);
    Ok(assemble(config, llm))
}

/// Wires the seeded store, the billing tools and the runtime around `llm`.
pub fn assemble(config: AppConfig, llm: Arc<dyn LlmClient>) -> Application {
    let store = shared_store(BillingMockStore::seeded());
    let registry = Arc::new(billing_registry(store.clone()));
    info!(
        event_name = "system.bootstrap.tools_registered",
        correlation_id = "bootstrap",
        tool_count = registry.len(),
        llm_model = %config.llm.model,
        llm_base_url = %config.llm.effective_base_url(),
        "billing tools registered"
    );

    let agent_runtime = Arc::new(AgentRuntime::new(llm, registry, &config.agent));
    Application { config, store, agent_runtime }
}

#[cfg(test)]
mod tests {
    use telcobot_core::config::{ConfigOverrides, LlmProvider, LoadOptions};

    use crate::bootstrap::bootstrap;

    #[tokio::test]
    async fn bootstrap_fails_fast_without_openai_api_key() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                llm_provider: Some(LlmProvider::OpenAi),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        let message = result.err().expect("error").to_string();
        assert!(message.contains("llm.api_key"));
    }

    #[tokio::test]
    async fn bootstrap_wires_seeded_store_for_local_models() {
        let app = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                llm_provider: Some(LlmProvider::Ollama),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await
        .expect("ollama needs no api key");

        assert_eq!(app.agent_runtime.tools().len(), 9);
        assert_eq!(app.store.lock().await.outstanding_invoices().len(), 1);
    }
}
