//! Domains module containing business logic organized by bounded contexts.
//!
//! - `tools` is the protocol core: what a tool is, how calls are validated
//!   and dispatched, and which tools each service exposes.
//! - `adapters` talks to the AWS services behind those tools.

pub mod adapters;
pub mod tools;
