//! Create `user` table.
//!
//! Holds identity, role, wallet counters and the check-in/level state.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(uuid(User::Id).primary_key())
                    .col(string_len(User::Email, 255).unique_key().not_null())
                    .col(string_len(User::Username, 64).not_null())
                    .col(string_len(User::Role, 16).not_null())
                    .col(big_integer(User::BalanceCents).not_null().default(0))
                    .col(big_integer(User::Points).not_null().default(0))
                    .col(integer(User::Coupons).not_null().default(0))
                    .col(big_integer(User::Exp).not_null().default(0))
                    .col(integer(User::Level).not_null().default(1))
                    .col(string_len_null(User::Avatar, 512))
                    .col(string_len_null(User::Sign, 255))
                    .col(string_len_null(User::Gender, 16))
                    .col(string_len_null(User::BackgroundImage, 512))
                    .col(string_len(User::Reputation, 32).not_null())
                    .col(json(User::MakerProfile).not_null())
                    // Explicitly define nullable date to avoid conflicting NULL/NOT NULL
                    .col(ColumnDef::new(User::LastCheckinDate).date().null())
                    .col(timestamp_with_time_zone(User::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(User::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(User::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum User {
    Table,
    Id,
    Email,
    Username,
    Role,
    BalanceCents,
    Points,
    Coupons,
    Exp,
    Level,
    Avatar,
    Sign,
    Gender,
    BackgroundImage,
    Reputation,
    MakerProfile,
    LastCheckinDate,
    CreatedAt,
    UpdatedAt,
}
