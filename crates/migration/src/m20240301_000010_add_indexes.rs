//! Secondary indexes for the lookups the services issue on every request.
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_listing_provider")
                    .table(Listing::Table)
                    .col(Listing::ProviderId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_listing_status_sales")
                    .table(Listing::Table)
                    .col(Listing::Status)
                    .col(Listing::Sales)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_orders_buyer")
                    .table(Orders::Table)
                    .col(Orders::BuyerId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_orders_provider")
                    .table(Orders::Table)
                    .col(Orders::ProviderId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_address_user")
                    .table(Address::Table)
                    .col(Address::UserId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_wallet_transaction_user_created")
                    .table(WalletTransaction::Table)
                    .col(WalletTransaction::UserId)
                    .col(WalletTransaction::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_wallet_transaction_user_created").table(WalletTransaction::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_address_user").table(Address::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_orders_provider").table(Orders::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_orders_buyer").table(Orders::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_listing_status_sales").table(Listing::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_listing_provider").table(Listing::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Listing { Table, ProviderId, Status, Sales }

#[derive(DeriveIden)]
enum Orders { Table, BuyerId, ProviderId }

#[derive(DeriveIden)]
enum Address { Table, UserId }

#[derive(DeriveIden)]
enum WalletTransaction { Table, UserId, CreatedAt }
