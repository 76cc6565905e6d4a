pub mod errors;
pub mod db;
pub mod user;
pub mod user_credentials;
pub mod listing;
pub mod order;
pub mod address;
pub mod wallet_transaction;
pub mod store;

#[cfg(test)]
mod tests;
