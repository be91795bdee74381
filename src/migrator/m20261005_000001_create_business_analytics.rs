use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BusinessAnalytics::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BusinessAnalytics::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BusinessAnalytics::BusinessId).uuid().not_null())
                    .col(ColumnDef::new(BusinessAnalytics::Date).date().not_null())
                    .col(
                        ColumnDef::new(BusinessAnalytics::TotalServed)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(BusinessAnalytics::TotalCancelled)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(BusinessAnalytics::AvgWaitTime)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(BusinessAnalytics::PeakHour)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-business_analytics-business_id")
                            .from(BusinessAnalytics::Table, BusinessAnalytics::BusinessId)
                            .to(Businesses::Table, Businesses::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_business_analytics_business_date")
                    .table(BusinessAnalytics::Table)
                    .col(BusinessAnalytics::BusinessId)
                    .col(BusinessAnalytics::Date)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BusinessAnalytics::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum BusinessAnalytics {
    Table,
    Id,
    BusinessId,
    Date,
    TotalServed,
    TotalCancelled,
    AvgWaitTime,
    PeakHour,
}

#[derive(DeriveIden)]
enum Businesses {
    Table,
    Id,
}
