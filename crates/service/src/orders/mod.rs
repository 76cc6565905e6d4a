//! Orders: balance settlement, status transitions and delayed auto-ship.

pub mod domain;
pub mod repository;
pub mod service;

pub use service::OrderService;
