//! Collaborator contracts and their adapters
//!
//! The session only sees the traits; adapters are chosen once at startup
//! and injected into every session through `Services`.

mod error;
pub mod llm;
pub mod scheduler;
pub mod synth;
mod traits;

pub use error::{ServiceError, ServiceResult};
pub use llm::LlmClient;
pub use scheduler::{DisabledScheduler, WebhookScheduler};
pub use synth::BrowserSynthesizer;
pub use traits::{Extractor, Responder, Scheduler, Synthesizer, Transcriber};

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::Config;

/// The collaborators a session is built with
#[derive(Clone)]
pub struct Services {
    pub transcriber: Arc<dyn Transcriber>,
    pub responder: Arc<dyn Responder>,
    pub extractor: Arc<dyn Extractor>,
    pub synthesizer: Arc<dyn Synthesizer>,
    pub scheduler: Arc<dyn Scheduler>,
}

impl Services {
    /// Build the production adapters from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config
            .llm
            .api_key()
            .with_context(|| format!("{} is not set", config.llm.api_key_env))?;

        let llm = Arc::new(
            LlmClient::new(&config.llm, api_key).context("Failed to build LLM client")?,
        );
        info!("Using LLM endpoint {}", config.llm.base_url);

        let scheduler: Arc<dyn Scheduler> = match &config.scheduling.webhook_url {
            Some(url) => {
                info!("Scheduling events via {}", url);
                Arc::new(
                    WebhookScheduler::new(
                        url.clone(),
                        Duration::from_secs(config.llm.timeout_secs),
                    )
                    .context("Failed to build scheduling client")?,
                )
            }
            None => {
                warn!("No scheduling webhook configured. Scheduling will be disabled.");
                Arc::new(DisabledScheduler)
            }
        };

        info!("TTS handled client-side (browser speechSynthesis)");

        Ok(Self {
            transcriber: llm.clone(),
            responder: llm.clone(),
            extractor: llm,
            synthesizer: Arc::new(BrowserSynthesizer),
            scheduler,
        })
    }
}
