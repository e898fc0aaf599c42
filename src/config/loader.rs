//! Load the router catalog from the embedded JSON or from a file, then resolve it.

use crate::config::resolved::{ResolvedCatalog, ResolvedField, ResolvedRouter};
use crate::config::types::*;
use crate::config::validate;
use crate::error::ConfigError;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;

/// Catalog shipped with the crate.
pub const BUILTIN_CATALOG: &str = include_str!("../../catalog/routers.json");

/// Build the resolved catalog from raw router configs (validates first).
pub fn resolve(routers: &[RouterConfig]) -> Result<ResolvedCatalog, ConfigError> {
    validate(routers)?;

    let mut resolved = Vec::with_capacity(routers.len());
    let mut router_by_id = HashMap::new();
    for r in routers {
        let mut fields = Vec::with_capacity(r.fields.len());
        for f in &r.fields {
            let pattern = match &f.pattern {
                Some(p) => Some(Regex::new(p).map_err(|e| ConfigError::Validation(e.to_string()))?),
                None => None,
            };
            fields.push(ResolvedField {
                name: f.name.clone(),
                type_: f.type_,
                required: f.required,
                min_length: f.min_length,
                max_length: f.max_length,
                minimum: f.minimum,
                maximum: f.maximum,
                pattern,
                allowed: f.allowed.clone().unwrap_or_default(),
            });
        }
        router_by_id.insert(r.id.clone(), resolved.len());
        resolved.push(ResolvedRouter {
            id: r.id.clone(),
            label: r.label.clone().unwrap_or_else(|| r.id.clone()),
            operations: r.operations.iter().copied().collect(),
            fields,
            unique: r.unique.clone(),
            filterable: r.filterable.iter().cloned().collect(),
        });
    }

    Ok(ResolvedCatalog {
        routers: resolved,
        router_by_id,
    })
}

pub fn parse_catalog(json: &str) -> Result<Vec<RouterConfig>, ConfigError> {
    let file: CatalogFile = serde_json::from_str(json).map_err(|e| ConfigError::Load(e.to_string()))?;
    Ok(file.routers)
}

/// Load and resolve the catalog from `path`, or the built-in catalog when no path is given.
pub async fn load_catalog(path: Option<&Path>) -> Result<ResolvedCatalog, ConfigError> {
    let routers = match path {
        Some(p) => {
            let json = tokio::fs::read_to_string(p)
                .await
                .map_err(|e| ConfigError::Load(format!("{}: {}", p.display(), e)))?;
            parse_catalog(&json)?
        }
        None => parse_catalog(BUILTIN_CATALOG)?,
    };
    let catalog = resolve(&routers)?;
    tracing::info!(routers = catalog.routers.len(), "catalog loaded");
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_resolves() {
        let routers = parse_catalog(BUILTIN_CATALOG).unwrap();
        let catalog = resolve(&routers).unwrap();
        for id in [
            "assets",
            "compliance",
            "resources",
            "knowledgeBase",
            "supportTickets",
            "socialAccounts",
            "mobileDevices",
            "iotDevices",
            "blockchainRecords",
            "edgeNodes",
            "streaming",
            "virtualEvents",
            "arExperiences",
            "mlPipelines",
            "dataLake",
            "bpmProcesses",
            "contracts",
            "vendors",
            "projects",
            "timeTracking",
            "security",
            "backup",
            "analytics",
            "search",
            "media",
            "applications",
        ] {
            assert!(catalog.router(id).is_some(), "missing router {}", id);
        }
    }

    #[test]
    fn procedure_lookup_respects_operations() {
        let catalog = resolve(&parse_catalog(BUILTIN_CATALOG).unwrap()).unwrap();
        let (router, op) = catalog.procedure("assets.create").unwrap();
        assert_eq!(router.id, "assets");
        assert_eq!(op, Operation::Create);
        assert!(catalog.procedure("assets.explode").is_none());
        assert!(catalog.procedure("nope.list").is_none());
        assert!(catalog.procedure("applications.create").is_none());
    }

    #[test]
    fn asset_schema_declares_serial_number_unique() {
        let catalog = resolve(&parse_catalog(BUILTIN_CATALOG).unwrap()).unwrap();
        let assets = catalog.router("assets").unwrap();
        assert!(assets.field("serial_number").is_some());
        assert!(assets.unique.iter().any(|g| g == &vec!["serial_number".to_string()]));
    }
}
