//! Create `listing` table (maker services/products) with FK to `user`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Listing::Table)
                    .if_not_exists()
                    .col(uuid(Listing::Id).primary_key())
                    .col(uuid(Listing::ProviderId).not_null())
                    .col(string_len(Listing::ProviderName, 64).not_null())
                    .col(string_len(Listing::Title, 120).not_null())
                    .col(text(Listing::Description).not_null())
                    .col(big_integer(Listing::PriceCents).not_null())
                    .col(string_len(Listing::ListingType, 16).not_null())
                    .col(string_len(Listing::Status, 16).not_null())
                    .col(string_len_null(Listing::ProductionMode, 16))
                    .col(string_len_null(Listing::Image, 512))
                    .col(text_null(Listing::Details))
                    .col(json(Listing::Tags).not_null())
                    .col(integer(Listing::Sales).not_null().default(0))
                    .col(integer(Listing::Views).not_null().default(0))
                    .col(timestamp_with_time_zone(Listing::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Listing::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_listing_provider")
                            .from(Listing::Table, Listing::ProviderId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Listing::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Listing {
    Table,
    Id,
    ProviderId,
    ProviderName,
    Title,
    Description,
    PriceCents,
    ListingType,
    Status,
    ProductionMode,
    Image,
    Details,
    Tags,
    Sales,
    Views,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum User { Table, Id }
