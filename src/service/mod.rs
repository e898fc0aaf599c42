//! Domain services behind the RPC endpoints.

mod crud;
mod entity;
mod memory;
mod validation;
pub mod applications;

pub use crud::PgEntityService;
pub use entity::{EntityService, ListQuery, Scope, StoredRecord, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
pub use memory::MemoryEntityService;
pub use validation::{is_valid_email, InputValidator};
