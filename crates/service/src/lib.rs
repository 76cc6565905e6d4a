//! Marketplace business layer on top of `models`.
//! - Domain types and validation per area (auth, catalog, orders, wallet).
//! - Repository traits with a relational and a JSON-collections backend.
//! - Chat-completion clients for the AI routes.

pub mod errors;
pub mod pagination;
pub mod runtime;
pub mod auth;
pub mod catalog;
pub mod orders;
pub mod wallet;
pub mod storage;
pub mod repo;
pub mod ai;
pub mod seed;
pub mod bootstrap;
#[cfg(test)]
pub mod test_support;
