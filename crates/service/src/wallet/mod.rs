//! Profile, addresses, wallet ledger and daily check-in.

pub mod domain;
pub mod repository;
pub mod service;

pub use service::WalletService;
