pub mod caller;
pub mod tenant;

pub use caller::{session_token, Caller, SESSION_COOKIE};
pub use tenant::{TenantId, TENANT_ID_HEADER};
