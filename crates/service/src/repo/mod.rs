//! Storage backends. Both implement every repository trait and are used
//! through `Arc<dyn MarketRepository>`.

pub mod collections;
pub mod seaorm;

use crate::auth::repository::AuthRepository;
use crate::catalog::repository::CatalogRepository;
use crate::orders::repository::OrderRepository;
use crate::wallet::repository::WalletRepository;

/// All repositories a complete backend provides.
pub trait MarketRepository: AuthRepository + CatalogRepository + OrderRepository + WalletRepository {}

impl<T> MarketRepository for T where T: AuthRepository + CatalogRepository + OrderRepository + WalletRepository {}

pub use collections::CollectionsRepository;
pub use seaorm::SeaOrmRepository;

#[cfg(test)]
mod tests;
