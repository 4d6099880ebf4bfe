//! Vellum: the persistence and caching layer of a blogging platform.
//!
//! Posts, users and tags live in a relational store behind a shared
//! connection pool; comments live in a document store. Bounded,
//! expiring entity caches front the post and user repositories, and a
//! request-scoped context carries the acting user through privileged
//! operations.
//!
//! [`DataLayer::initialize`] is the composition root: it builds the
//! pool, connects the document store, runs migrations and wires the
//! cache-fronted content service. [`DataLayer::shutdown`] releases
//! both stores and is safe to call more than once.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;

use std::sync::Arc;

use tracing::info;

use crate::application::content::ContentService;
use crate::application::repos::{PostsRepo, UsersRepo};
use crate::cache::{CacheConfig, CacheStore};
use crate::config::Settings;
use crate::infra::InfraError;
use crate::infra::db::{PoolManager, PostgresRepositories};
use crate::infra::mongo::{DocumentStore, MongoComments};

/// The fully-wired persistence layer.
pub struct DataLayer {
    pool_manager: Arc<PoolManager>,
    document_store: Arc<DocumentStore>,
    relational: Arc<PostgresRepositories>,
    comments: Arc<MongoComments>,
    cache: Arc<CacheStore>,
    content: ContentService,
}

impl DataLayer {
    /// Connect both stores, run pending migrations and wire the
    /// services. Fails fatally when either store is unreachable.
    pub async fn initialize(settings: &Settings) -> Result<Self, InfraError> {
        let pool_manager = Arc::new(PoolManager::new());
        let pool = pool_manager.acquire(&settings.database).await?;

        PostgresRepositories::run_migrations(&pool)
            .await
            .map_err(|err| InfraError::database(format!("migration failed: {err}")))?;
        let relational = Arc::new(PostgresRepositories::new(pool));

        let document_store = Arc::new(DocumentStore::new());
        let database = document_store
            .database(&settings.document_store.uri, &settings.document_store.database)
            .await?;
        let comments = Arc::new(MongoComments::new(&database));

        let cache = Arc::new(CacheStore::new(&CacheConfig::from(&settings.cache)));
        let content = ContentService::new(
            Arc::clone(&relational) as Arc<dyn PostsRepo>,
            Arc::clone(&relational) as Arc<dyn UsersRepo>,
            Arc::clone(&cache),
        );

        info!("data layer initialized");
        Ok(Self {
            pool_manager,
            document_store,
            relational,
            comments,
            cache,
            content,
        })
    }

    /// The cache-fronted post and user service.
    pub fn content(&self) -> &ContentService {
        &self.content
    }

    /// Direct relational repository access (posts, users, tags).
    pub fn relational(&self) -> &Arc<PostgresRepositories> {
        &self.relational
    }

    /// The document-store comment repository.
    pub fn comments(&self) -> &Arc<MongoComments> {
        &self.comments
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    /// Release both stores. Idempotent; the relational pool stays
    /// closed for good while the document store may reconnect later.
    pub async fn shutdown(&self) {
        self.pool_manager.close().await;
        self.document_store.close().await;
        info!("data layer shut down");
    }
}
