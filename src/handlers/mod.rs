//! HTTP handlers: catalog procedures, auth procedures, public site endpoints, drafts.

pub mod auth;
pub mod drafts;
pub mod public;
pub mod rpc;
