//! Shared application state for all routes. Everything here is read-only after startup.

use crate::auth::{IdentityStore, MemoryIdentityStore, PgIdentityStore};
use crate::config::{ResolvedCatalog, Settings, SiteConfig};
use crate::drafts::{DraftStore, MemoryDraftStore, PgDraftStore};
use crate::error::AppError;
use crate::payments::{DisabledPaymentProvider, HttpPaymentProvider, PaymentProvider};
use crate::service::{EntityService, MemoryEntityService, PgEntityService};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    /// None when running on in-memory storage.
    pub pool: Option<PgPool>,
    pub settings: Arc<Settings>,
    pub catalog: Arc<ResolvedCatalog>,
    pub site: Arc<SiteConfig>,
    pub identity: Arc<dyn IdentityStore>,
    pub entities: Arc<dyn EntityService>,
    pub drafts: Arc<dyn DraftStore>,
    pub payments: Arc<dyn PaymentProvider>,
}

impl AppState {
    /// PostgreSQL-backed state. System tables must exist (`ensure_sys_tables`).
    pub fn postgres(pool: PgPool, settings: Settings, catalog: ResolvedCatalog, site: SiteConfig) -> Result<Self, AppError> {
        let schema = settings.schema.clone();
        Ok(AppState {
            identity: Arc::new(PgIdentityStore::new(pool.clone(), &schema)),
            entities: Arc::new(PgEntityService::new(pool.clone(), &schema)),
            drafts: Arc::new(PgDraftStore::new(pool.clone(), &schema)),
            payments: payment_provider(&settings)?,
            pool: Some(pool),
            settings: Arc::new(settings),
            catalog: Arc::new(catalog),
            site: Arc::new(site),
        })
    }

    /// Everything in process memory; data is lost on restart.
    pub fn in_memory(settings: Settings, catalog: ResolvedCatalog, site: SiteConfig) -> Result<Self, AppError> {
        Ok(AppState {
            pool: None,
            identity: Arc::new(MemoryIdentityStore::new()),
            entities: Arc::new(MemoryEntityService::new()),
            drafts: Arc::new(MemoryDraftStore::new()),
            payments: payment_provider(&settings)?,
            settings: Arc::new(settings),
            catalog: Arc::new(catalog),
            site: Arc::new(site),
        })
    }

    pub fn with_entities(mut self, entities: Arc<dyn EntityService>) -> Self {
        self.entities = entities;
        self
    }

    pub fn with_payments(mut self, payments: Arc<dyn PaymentProvider>) -> Self {
        self.payments = payments;
        self
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.settings.session_ttl_hours)
    }
}

fn payment_provider(settings: &Settings) -> Result<Arc<dyn PaymentProvider>, AppError> {
    Ok(match &settings.payment_secret_key {
        Some(key) => Arc::new(HttpPaymentProvider::new(settings.payment_api_base.clone(), key.clone())?),
        None => {
            tracing::warn!("PAYMENT_SECRET_KEY not set; donations are disabled");
            Arc::new(DisabledPaymentProvider)
        }
    })
}
