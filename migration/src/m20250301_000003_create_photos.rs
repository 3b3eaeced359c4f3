// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

/// 候选照片与匹配表迁移
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CandidatePhotos::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CandidatePhotos::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CandidatePhotos::Source).string_len(30).not_null())
                    .col(
                        ColumnDef::new(CandidatePhotos::SourcePhotoId)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(CandidatePhotos::SourceUrl).string_len(500).not_null())
                    .col(ColumnDef::new(CandidatePhotos::ThumbnailUrl).string_len(500))
                    .col(ColumnDef::new(CandidatePhotos::FullImageUrl).string_len(500))
                    .col(
                        ColumnDef::new(CandidatePhotos::Registration)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(CandidatePhotos::AirportCode).string_len(4))
                    .col(ColumnDef::new(CandidatePhotos::PhotoDate).date())
                    .col(ColumnDef::new(CandidatePhotos::Photographer).string_len(200))
                    .col(
                        ColumnDef::new(CandidatePhotos::CreatedAt)
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
                    .name("uq_source_photo")
                    .table(CandidatePhotos::Table)
                    .col(CandidatePhotos::Source)
                    .col(CandidatePhotos::SourcePhotoId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_candidate_photos_registration")
                    .table(CandidatePhotos::Table)
                    .col(CandidatePhotos::Registration)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FlightPhotoMatches::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FlightPhotoMatches::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FlightPhotoMatches::FlightId).uuid().not_null())
                    .col(ColumnDef::new(FlightPhotoMatches::PhotoId).uuid().not_null())
                    .col(ColumnDef::new(FlightPhotoMatches::MatchScore).integer().not_null())
                    .col(ColumnDef::new(FlightPhotoMatches::MatchReasons).json().not_null())
                    .col(
                        ColumnDef::new(FlightPhotoMatches::CreatedAt)
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
                    .name("uq_flight_photo")
                    .table(FlightPhotoMatches::Table)
                    .col(FlightPhotoMatches::FlightId)
                    .col(FlightPhotoMatches::PhotoId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FlightPhotoMatches::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CandidatePhotos::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CandidatePhotos {
    Table,
    Id,
    Source,
    SourcePhotoId,
    SourceUrl,
    ThumbnailUrl,
    FullImageUrl,
    Registration,
    AirportCode,
    PhotoDate,
    Photographer,
    CreatedAt,
}

#[derive(DeriveIden)]
enum FlightPhotoMatches {
    Table,
    Id,
    FlightId,
    PhotoId,
    MatchScore,
    MatchReasons,
    CreatedAt,
}
