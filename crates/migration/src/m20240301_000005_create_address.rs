//! Create `address` table (shipping addresses per user).
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Address::Table)
                    .if_not_exists()
                    .col(uuid(Address::Id).primary_key())
                    .col(uuid(Address::UserId).not_null())
                    .col(string_len(Address::Recipient, 64).not_null())
                    .col(string_len(Address::Phone, 32).not_null())
                    .col(string_len(Address::Region, 128).not_null())
                    .col(string_len(Address::Detail, 255).not_null())
                    .col(boolean(Address::IsDefault).not_null().default(false))
                    .col(timestamp_with_time_zone(Address::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_address_user")
                            .from(Address::Table, Address::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Address::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Address {
    Table,
    Id,
    UserId,
    Recipient,
    Phone,
    Region,
    Detail,
    IsDefault,
    CreatedAt,
}

#[derive(DeriveIden)]
enum User { Table, Id }
