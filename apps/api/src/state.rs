use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::config::Config;
use crate::llm_client::CompletionClient;
use crate::store::guest::UsageStore;
use crate::store::project_cache::ProjectCache;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub s3: S3Client,
    pub llm: CompletionClient,
    pub config: Config,
    /// Guest usage counters. Redis-backed in production; swapped for an
    /// in-memory double in tests.
    pub guest_usage: Arc<dyn UsageStore>,
    /// In-memory map of fetched project rows, read-through in the projects
    /// handlers and invalidated on update/delete.
    pub project_cache: Arc<ProjectCache>,
}
