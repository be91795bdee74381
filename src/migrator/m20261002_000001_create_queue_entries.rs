use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(QueueEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(QueueEntries::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(QueueEntries::BusinessId).uuid().not_null())
                    .col(ColumnDef::new(QueueEntries::UserId).uuid().not_null())
                    .col(ColumnDef::new(QueueEntries::QueueNumber).integer().not_null())
                    .col(ColumnDef::new(QueueEntries::ServiceDate).date().not_null())
                    .col(
                        ColumnDef::new(QueueEntries::Status)
                            .string_len(16)
                            .not_null()
                            .default("waiting"),
                    )
                    .col(
                        ColumnDef::new(QueueEntries::EstimatedWaitTime)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(QueueEntries::JoinedAt).date_time().not_null())
                    .col(ColumnDef::new(QueueEntries::CalledAt).date_time())
                    .col(ColumnDef::new(QueueEntries::CompletedAt).date_time())
                    .col(
                        ColumnDef::new(QueueEntries::Notes)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-queue_entry-business_id")
                            .from(QueueEntries::Table, QueueEntries::BusinessId)
                            .to(Businesses::Table, Businesses::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-queue_entry-user_id")
                            .from(QueueEntries::Table, QueueEntries::UserId)
                            .to(UserProfiles::Table, UserProfiles::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Backstop for the counter: a number is issued once per business per day
        manager
            .create_index(
                Index::create()
                    .name("idx_queue_entries_business_day_number")
                    .table(QueueEntries::Table)
                    .col(QueueEntries::BusinessId)
                    .col(QueueEntries::ServiceDate)
                    .col(QueueEntries::QueueNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_queue_entries_business_status")
                    .table(QueueEntries::Table)
                    .col(QueueEntries::BusinessId)
                    .col(QueueEntries::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_queue_entries_user_status")
                    .table(QueueEntries::Table)
                    .col(QueueEntries::UserId)
                    .col(QueueEntries::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(QueueCounters::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(QueueCounters::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(QueueCounters::BusinessId).uuid().not_null())
                    .col(ColumnDef::new(QueueCounters::ServiceDate).date().not_null())
                    .col(
                        ColumnDef::new(QueueCounters::LastNumber)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-queue_counter-business_id")
                            .from(QueueCounters::Table, QueueCounters::BusinessId)
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
                    .name("idx_queue_counters_business_day")
                    .table(QueueCounters::Table)
                    .col(QueueCounters::BusinessId)
                    .col(QueueCounters::ServiceDate)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(QueueCounters::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(QueueEntries::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum QueueEntries {
    Table,
    Id,
    BusinessId,
    UserId,
    QueueNumber,
    ServiceDate,
    Status,
    EstimatedWaitTime,
    JoinedAt,
    CalledAt,
    CompletedAt,
    Notes,
}

#[derive(DeriveIden)]
enum QueueCounters {
    Table,
    Id,
    BusinessId,
    ServiceDate,
    LastNumber,
}

#[derive(DeriveIden)]
enum Businesses {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum UserProfiles {
    Table,
    Id,
}
