//! Create `orders` table linking buyer, provider and listing.
//!
//! Listing FK restricts deletes so sold listings can only be taken offline.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(uuid(Orders::Id).primary_key())
                    .col(uuid(Orders::BuyerId).not_null())
                    .col(string_len(Orders::BuyerName, 64).not_null())
                    .col(uuid(Orders::ProviderId).not_null())
                    .col(uuid(Orders::ListingId).not_null())
                    .col(string_len(Orders::ListingTitle, 120).not_null())
                    .col(integer(Orders::Quantity).not_null())
                    .col(big_integer(Orders::UnitPriceCents).not_null())
                    .col(big_integer(Orders::AmountCents).not_null())
                    .col(big_integer(Orders::PointsAwarded).not_null().default(0))
                    .col(string_len(Orders::Status, 16).not_null())
                    .col(text_null(Orders::Notes))
                    .col(timestamp_with_time_zone(Orders::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Orders::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_buyer")
                            .from(Orders::Table, Orders::BuyerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_provider")
                            .from(Orders::Table, Orders::ProviderId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_listing")
                            .from(Orders::Table, Orders::ListingId)
                            .to(Listing::Table, Listing::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Orders::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Orders {
    Table,
    Id,
    BuyerId,
    BuyerName,
    ProviderId,
    ListingId,
    ListingTitle,
    Quantity,
    UnitPriceCents,
    AmountCents,
    PointsAwarded,
    Status,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum User { Table, Id }

#[derive(DeriveIden)]
enum Listing { Table, Id }
