pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod parsers;
pub mod routes;
pub mod services;
pub mod utils;

use crate::config::Config;
use crate::error::Result;
use crate::services::{
    ai_service::{GeminiClient, TextGenerator},
    exam_service::{ExamService, GenerationSettings},
    gateway_service::ModelGateway,
    identity_service::{FirebaseVerifier, IdentityVerifier},
    pdf_service::{PdftotextExtractor, TextExtractor},
    quota_service::QuotaTracker,
    user_service::UserService,
};
use reqwest::Client;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub quota: Arc<QuotaTracker>,
    pub exam_service: ExamService,
    pub text_extractor: Arc<dyn TextExtractor>,
    pub identity: Arc<dyn IdentityVerifier>,
    pub user_service: UserService,
}

impl AppState {
    pub fn new(pool: PgPool, config: &Config) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()?;

        let generator = Arc::new(GeminiClient::new(
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
            config.gemini_api_base.clone(),
            http_client.clone(),
        ));
        let identity = Arc::new(FirebaseVerifier::new(
            config.firebase_project_id.clone(),
            http_client,
        ));

        Ok(Self::from_parts(
            pool,
            Arc::new(QuotaTracker::new(config.quota_limits())),
            generator,
            config.generation_settings(),
            Arc::new(PdftotextExtractor::default()),
            identity,
        ))
    }

    /// Wires the state from already-built collaborators.
    pub fn from_parts(
        pool: PgPool,
        quota: Arc<QuotaTracker>,
        generator: Arc<dyn TextGenerator>,
        settings: GenerationSettings,
        text_extractor: Arc<dyn TextExtractor>,
        identity: Arc<dyn IdentityVerifier>,
    ) -> Self {
        let gateway = ModelGateway::new(quota.clone(), generator);
        Self {
            user_service: UserService::new(pool.clone()),
            exam_service: ExamService::new(gateway, settings),
            pool,
            quota,
            text_extractor,
            identity,
        }
    }
}
