//! Application state.

use std::sync::Arc;

use tracing::{info, warn};

use scast_pipeline::{
    Ledger, JobRegistry, Orchestrator, ScriptEnhancer, SpeechSynthesizer, VideoRenderer,
};
use scast_store::{AccountStore, ArtifactStore, JobStore, MemoryStore, PgStore};
use scast_synth::{EnhancerClient, RendererClient, SpeechClient, SynthConfig};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    /// Create new application state.
    ///
    /// Connects to Postgres when `DATABASE_URL` is configured; otherwise
    /// falls back to the volatile in-memory store.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let (accounts, jobs, artifacts): (
            Arc<dyn AccountStore>,
            Arc<dyn JobStore>,
            Arc<dyn ArtifactStore>,
        ) = match &config.database_url {
            Some(url) => {
                let store = Arc::new(PgStore::connect(url).await?);
                info!("Using Postgres store");
                (
                    Arc::clone(&store) as Arc<dyn AccountStore>,
                    Arc::clone(&store) as Arc<dyn JobStore>,
                    store as Arc<dyn ArtifactStore>,
                )
            }
            None => {
                warn!("DATABASE_URL not set; using in-memory store (data is not persisted)");
                let store = Arc::new(MemoryStore::new());
                (
                    Arc::clone(&store) as Arc<dyn AccountStore>,
                    Arc::clone(&store) as Arc<dyn JobStore>,
                    store as Arc<dyn ArtifactStore>,
                )
            }
        };

        let synth_config = SynthConfig::from_env();
        let enhancer = Arc::new(EnhancerClient::new(&synth_config)?);
        let speech = Arc::new(SpeechClient::new(&synth_config)?);
        let renderer = Arc::new(RendererClient::new(&synth_config)?);

        Ok(Self::from_parts(
            config, accounts, jobs, artifacts, enhancer, speech, renderer,
        ))
    }

    /// Assemble state from explicit components. Tests use this to inject
    /// the in-memory store and fake collaborators.
    pub fn from_parts(
        config: ApiConfig,
        accounts: Arc<dyn AccountStore>,
        jobs: Arc<dyn JobStore>,
        artifacts: Arc<dyn ArtifactStore>,
        enhancer: Arc<dyn ScriptEnhancer>,
        speech: Arc<dyn SpeechSynthesizer>,
        renderer: Arc<dyn VideoRenderer>,
    ) -> Self {
        let ledger = Ledger::new(accounts);
        let registry = JobRegistry::new(jobs);
        let orchestrator =
            Orchestrator::new(ledger, registry, artifacts, enhancer, speech, renderer);

        Self {
            config,
            orchestrator: Arc::new(orchestrator),
        }
    }
}
