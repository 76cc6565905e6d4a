//! Relational backend over SeaORM entities. Multi-row writes run in one DB transaction.

mod auth;
mod catalog;
mod convert;
mod orders;
mod wallet;

use sea_orm::DatabaseConnection;

#[derive(Clone)]
pub struct SeaOrmRepository {
    db: DatabaseConnection,
}

impl SeaOrmRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }

    pub fn db(&self) -> &DatabaseConnection { &self.db }
}

