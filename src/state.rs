use std::sync::Arc;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::services::responder::{KnowledgeBase, ResponseSelector};
use crate::services::store::{SessionStore, StoreSettings};

/// The configured table file, or the built-in table carrying the configured
/// contact details. A table file is used as written.
pub fn load_knowledge_base(config: &AppConfig) -> anyhow::Result<KnowledgeBase> {
    match &config.knowledge_base_path {
        Some(path) => KnowledgeBase::from_path(path),
        None => {
            tracing::info!("using built-in knowledge base");
            Ok(KnowledgeBase::builtin().with_contact(&config.whatsapp_number, &config.contact_email))
        }
    }
}

pub struct AppState {
    pub config: AppConfig,
    pub sessions: SessionStore,
}

impl AppState {
    /// Validates config and the reply table, failing before any request is served.
    pub fn build(config: AppConfig, kb: KnowledgeBase) -> Result<Self, AppError> {
        config.validate()?;
        let selector = Arc::new(ResponseSelector::new(kb)?);
        let sessions = SessionStore::new(
            selector,
            StoreSettings {
                timing: config.timing(),
                idle_ttl: config.session_ttl(),
                welcome_message: config.welcome_message.clone(),
                rng_seed: config.rng_seed,
            },
        );
        Ok(Self { config, sessions })
    }
}
