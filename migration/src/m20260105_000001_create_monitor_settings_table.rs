use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]

pub struct Migration;

#[async_trait::async_trait]

impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MonitorSettings::Table)
                    .if_not_exists()
                    .col(integer(MonitorSettings::Id).primary_key())
                    .col(string_null(MonitorSettings::AlertChannelId))
                    .col(integer(MonitorSettings::AlertThreshold).default(5))
                    .col(timestamp_with_time_zone(MonitorSettings::UpdatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MonitorSettings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]

pub enum MonitorSettings {
    Table,
    Id,
    AlertChannelId,
    AlertThreshold,
    UpdatedAt,
}
