//! Camp community backend: catalog-driven, tenant-scoped RPC over PostgreSQL,
//! plus accounts, donations, applications and the form controllers that drive them.

pub mod auth;
pub mod case;
pub mod client;
pub mod config;
pub mod drafts;
pub mod error;
pub mod extractors;
pub mod forms;
pub mod handlers;
pub mod icons;
pub mod payments;
pub mod response;
pub mod routes;
pub mod rpc;
pub mod service;
pub mod state;
pub mod store;

pub use client::ApiClient;
pub use config::{load_catalog, parse_catalog, resolve, ResolvedCatalog, Settings, SiteConfig, BUILTIN_CATALOG};
pub use error::{AppError, ConfigError};
pub use routes::app;
pub use state::AppState;
pub use store::{ensure_database_exists, ensure_sys_tables};
