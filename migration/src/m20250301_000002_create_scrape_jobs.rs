// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

/// 抓取作业与执行记录表迁移
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // (registration, source) is unique by orchestration, not by constraint
        manager
            .create_table(
                Table::create()
                    .table(ScrapeJobs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ScrapeJobs::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ScrapeJobs::Registration).string_len(20).not_null())
                    .col(ColumnDef::new(ScrapeJobs::Source).string_len(30).not_null())
                    .col(ColumnDef::new(ScrapeJobs::Status).string_len(20).not_null())
                    .col(ColumnDef::new(ScrapeJobs::Priority).integer().not_null().default(0))
                    .col(ColumnDef::new(ScrapeJobs::PhotosFound).integer().not_null().default(0))
                    .col(ColumnDef::new(ScrapeJobs::LastScrapedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(ScrapeJobs::NextScrapeAfter).timestamp_with_time_zone())
                    .col(ColumnDef::new(ScrapeJobs::ErrorMessage).text())
                    .col(
                        ColumnDef::new(ScrapeJobs::CreatedAt)
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
                    .name("idx_scrape_jobs_registration_source")
                    .table(ScrapeJobs::Table)
                    .col(ScrapeJobs::Registration)
                    .col(ScrapeJobs::Source)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_scrape_jobs_status_next")
                    .table(ScrapeJobs::Table)
                    .col(ScrapeJobs::Status)
                    .col(ScrapeJobs::NextScrapeAfter)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ScrapeRuns::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ScrapeRuns::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ScrapeRuns::JobId).uuid().not_null())
                    .col(ColumnDef::new(ScrapeRuns::Source).string_len(30).not_null())
                    .col(ColumnDef::new(ScrapeRuns::Registration).string_len(20).not_null())
                    .col(ColumnDef::new(ScrapeRuns::Status).string_len(20).not_null())
                    .col(ColumnDef::new(ScrapeRuns::PhotosFound).integer().not_null().default(0))
                    .col(ColumnDef::new(ScrapeRuns::DurationSeconds).double())
                    .col(ColumnDef::new(ScrapeRuns::ErrorMessage).text())
                    .col(
                        ColumnDef::new(ScrapeRuns::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ScrapeRuns::FinishedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_scrape_runs_job_status")
                    .table(ScrapeRuns::Table)
                    .col(ScrapeRuns::JobId)
                    .col(ScrapeRuns::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ScrapeRuns::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ScrapeJobs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ScrapeJobs {
    Table,
    Id,
    Registration,
    Source,
    Status,
    Priority,
    PhotosFound,
    LastScrapedAt,
    NextScrapeAfter,
    ErrorMessage,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ScrapeRuns {
    Table,
    Id,
    JobId,
    Source,
    Registration,
    Status,
    PhotosFound,
    DurationSeconds,
    ErrorMessage,
    StartedAt,
    FinishedAt,
}
