//! Resolved catalog: config validated and flattened for runtime use.

use crate::config::{FieldType, Operation};
use regex::Regex;
use std::collections::{HashMap, HashSet};

#[derive(Clone, Debug)]
pub struct ResolvedField {
    pub name: String,
    pub type_: FieldType,
    pub required: bool,
    pub min_length: Option<u32>,
    pub max_length: Option<u32>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    /// Compiled once at startup.
    pub pattern: Option<Regex>,
    pub allowed: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct ResolvedRouter {
    pub id: String,
    pub label: String,
    pub operations: HashSet<Operation>,
    pub fields: Vec<ResolvedField>,
    pub unique: Vec<Vec<String>>,
    pub filterable: HashSet<String>,
}

impl ResolvedRouter {
    pub fn field(&self, name: &str) -> Option<&ResolvedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn allows(&self, op: Operation) -> bool {
        self.operations.contains(&op)
    }
}

/// Immutable after startup; shared through `AppState`.
#[derive(Clone, Debug, Default)]
pub struct ResolvedCatalog {
    pub routers: Vec<ResolvedRouter>,
    pub router_by_id: HashMap<String, usize>,
}

impl ResolvedCatalog {
    pub fn router(&self, id: &str) -> Option<&ResolvedRouter> {
        self.router_by_id.get(id).map(|&i| &self.routers[i])
    }

    /// Look up `router.operation`, e.g. `assets.create`. Returns None for unknown routers and disabled operations.
    pub fn procedure(&self, name: &str) -> Option<(&ResolvedRouter, Operation)> {
        let (router_id, op) = name.rsplit_once('.')?;
        let op: Operation = op.parse().ok()?;
        let router = self.router(router_id)?;
        router.allows(op).then_some((router, op))
    }

    /// All enabled procedures as `(router, operation)` pairs, in catalog order.
    pub fn procedures(&self) -> impl Iterator<Item = (&ResolvedRouter, Operation)> {
        self.routers.iter().flat_map(|r| {
            Operation::ALL
                .into_iter()
                .filter(move |op| r.allows(*op))
                .map(move |op| (r, op))
        })
    }
}
