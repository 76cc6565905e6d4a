//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Registration, login, token issue/verify and password hashing live here;
//! storage backends implement `AuthRepository` under `crate::repo`.

pub mod domain;
pub mod errors;
pub mod password;
pub mod repository;
pub mod service;

pub use service::AuthService;
