//! Raw catalog types matching `catalog/routers.json`.

use serde::{Deserialize, Serialize};

/// Operations a router may expose. `create`, `update` and `delete` are mutations; `list` and `get` are queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    List,
    Get,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Create,
        Operation::List,
        Operation::Get,
        Operation::Update,
        Operation::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::List => "list",
            Operation::Get => "get",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }

    pub fn is_query(&self) -> bool {
        matches!(self, Operation::List | Operation::Get)
    }
}

impl std::str::FromStr for Operation {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL.into_iter().find(|op| op.as_str() == s).ok_or(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Number,
    Integer,
    Boolean,
    /// RFC 3339 timestamp.
    Datetime,
    /// Calendar date, `YYYY-MM-DD`.
    Date,
    Email,
    Uuid,
    /// One of `allowed`.
    Enum,
    TextList,
    /// Arbitrary JSON, stored as-is and never inspected.
    Opaque,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub min_length: Option<u32>,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub allowed: Option<Vec<String>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RouterConfig {
    /// RPC router name, e.g. `assets` in `assets.create`.
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    pub operations: Vec<Operation>,
    pub fields: Vec<FieldConfig>,
    /// Field groups whose combined values must be unique per tenant.
    #[serde(default)]
    pub unique: Vec<Vec<String>>,
    /// Fields accepted in `list` filters.
    #[serde(default)]
    pub filterable: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    pub routers: Vec<RouterConfig>,
}
