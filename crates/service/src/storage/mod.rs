//! Storage abstractions for service layer
//!
//! Contains the single-table collection store used by the collections backend.

pub mod collection_store;

pub use collection_store::{CollectionSession, CollectionStore};
