//! Create `wallet_transaction` table: the append-only wallet ledger.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WalletTransaction::Table)
                    .if_not_exists()
                    .col(uuid(WalletTransaction::Id).primary_key())
                    .col(uuid(WalletTransaction::UserId).not_null())
                    .col(string_len(WalletTransaction::Kind, 16).not_null())
                    .col(string_len(WalletTransaction::Title, 128).not_null())
                    .col(big_integer(WalletTransaction::Amount).not_null())
                    .col(boolean(WalletTransaction::IsPoints).not_null().default(false))
                    .col(timestamp_with_time_zone(WalletTransaction::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_wallet_transaction_user")
                            .from(WalletTransaction::Table, WalletTransaction::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WalletTransaction::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum WalletTransaction {
    Table,
    Id,
    UserId,
    Kind,
    Title,
    Amount,
    IsPoints,
    CreatedAt,
}

#[derive(DeriveIden)]
enum User { Table, Id }
