//! Listings ("services") published by makers and browsed in the market.

pub mod domain;
pub mod repository;
pub mod service;

pub use service::CatalogService;
