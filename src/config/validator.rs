//! Catalog validation: unique router ids, field references and rule consistency.

use crate::config::{FieldType, RouterConfig};
use crate::error::ConfigError;
use regex::Regex;
use std::collections::HashSet;

/// Router ids handled by dedicated endpoints and therefore unavailable to the catalog.
pub const RESERVED_ROUTERS: &[&str] = &["auth"];

pub fn validate(routers: &[RouterConfig]) -> Result<(), ConfigError> {
    let mut router_ids = HashSet::new();
    for r in routers {
        if r.id.trim().is_empty() || r.id.contains('.') || r.id.contains('/') {
            return Err(ConfigError::Validation(format!("invalid router id '{}'", r.id)));
        }
        if RESERVED_ROUTERS.contains(&r.id.as_str()) {
            return Err(ConfigError::ReservedRouter(r.id.clone()));
        }
        if !router_ids.insert(r.id.as_str()) {
            return Err(ConfigError::DuplicateRouter(r.id.clone()));
        }
        if r.operations.is_empty() {
            return Err(ConfigError::Validation(format!("router {} exposes no operations", r.id)));
        }

        let mut field_names = HashSet::new();
        for f in &r.fields {
            if matches!(f.name.as_str(), "id" | "created_by" | "created_at" | "updated_at") {
                return Err(ConfigError::Validation(format!(
                    "router {}: field '{}' is managed by the server",
                    r.id, f.name
                )));
            }
            if !field_names.insert(f.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "router {}: duplicate field '{}'",
                    r.id, f.name
                )));
            }
            if f.type_ == FieldType::Enum && f.allowed.as_ref().map(|a| a.is_empty()).unwrap_or(true) {
                return Err(ConfigError::Validation(format!(
                    "router {}: enum field '{}' needs allowed values",
                    r.id, f.name
                )));
            }
            if let (Some(min), Some(max)) = (f.min_length, f.max_length) {
                if min > max {
                    return Err(ConfigError::Validation(format!(
                        "router {}: field '{}' has min_length > max_length",
                        r.id, f.name
                    )));
                }
            }
            if let (Some(min), Some(max)) = (f.minimum, f.maximum) {
                if min > max {
                    return Err(ConfigError::Validation(format!(
                        "router {}: field '{}' has minimum > maximum",
                        r.id, f.name
                    )));
                }
            }
            if let Some(pattern) = &f.pattern {
                Regex::new(pattern).map_err(|e| {
                    ConfigError::Validation(format!("router {}: field '{}' pattern: {}", r.id, f.name, e))
                })?;
            }
        }

        for group in &r.unique {
            if group.is_empty() {
                return Err(ConfigError::Validation(format!("router {}: empty unique group", r.id)));
            }
            for name in group {
                if !field_names.contains(name.as_str()) {
                    return Err(ConfigError::UnknownField {
                        router: r.id.clone(),
                        field: name.clone(),
                        context: "unique",
                    });
                }
            }
        }
        for name in &r.filterable {
            if !field_names.contains(name.as_str()) {
                return Err(ConfigError::UnknownField {
                    router: r.id.clone(),
                    field: name.clone(),
                    context: "filterable",
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FieldConfig, Operation};

    fn field(name: &str, type_: FieldType) -> FieldConfig {
        FieldConfig {
            name: name.into(),
            type_,
            required: false,
            min_length: None,
            max_length: None,
            minimum: None,
            maximum: None,
            pattern: None,
            allowed: None,
        }
    }

    fn router(id: &str) -> RouterConfig {
        RouterConfig {
            id: id.into(),
            label: None,
            operations: vec![Operation::Create, Operation::List],
            fields: vec![field("name", FieldType::Text)],
            unique: vec![],
            filterable: vec![],
        }
    }

    #[test]
    fn rejects_duplicate_router() {
        let err = validate(&[router("assets"), router("assets")]).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateRouter(id) if id == "assets"));
    }

    #[test]
    fn rejects_reserved_router() {
        assert!(matches!(validate(&[router("auth")]), Err(ConfigError::ReservedRouter(_))));
    }

    #[test]
    fn rejects_unknown_unique_field() {
        let mut r = router("assets");
        r.unique = vec![vec!["serial_number".into()]];
        assert!(matches!(validate(&[r]), Err(ConfigError::UnknownField { context: "unique", .. })));
    }

    #[test]
    fn rejects_enum_without_values() {
        let mut r = router("assets");
        r.fields.push(field("status", FieldType::Enum));
        assert!(validate(&[r]).is_err());
    }

    #[test]
    fn rejects_server_managed_field() {
        let mut r = router("assets");
        r.fields.push(field("created_at", FieldType::Datetime));
        assert!(validate(&[r]).is_err());
    }
}
