// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

/// 航班表迁移
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Flights::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Flights::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Flights::ImportBatchId).uuid().not_null())
                    .col(ColumnDef::new(Flights::Date).date().not_null())
                    .col(ColumnDef::new(Flights::ArrivalDate).date())
                    .col(ColumnDef::new(Flights::FlightNumber).string_len(20))
                    .col(ColumnDef::new(Flights::DepartureAirportIata).string_len(4))
                    .col(ColumnDef::new(Flights::DepartureAirportIcao).string_len(4))
                    .col(ColumnDef::new(Flights::ArrivalAirportIata).string_len(4))
                    .col(ColumnDef::new(Flights::ArrivalAirportIcao).string_len(4))
                    .col(ColumnDef::new(Flights::Airline).string_len(100))
                    .col(ColumnDef::new(Flights::Aircraft).string_len(100))
                    .col(ColumnDef::new(Flights::Registration).string_len(20))
                    .col(
                        ColumnDef::new(Flights::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_flights_registration")
                    .table(Flights::Table)
                    .col(Flights::Registration)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_flights_batch")
                    .table(Flights::Table)
                    .col(Flights::ImportBatchId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Flights::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Flights {
    Table,
    Id,
    ImportBatchId,
    Date,
    ArrivalDate,
    FlightNumber,
    DepartureAirportIata,
    DepartureAirportIcao,
    ArrivalAirportIata,
    ArrivalAirportIcao,
    Airline,
    Aircraft,
    Registration,
    CreatedAt,
}
