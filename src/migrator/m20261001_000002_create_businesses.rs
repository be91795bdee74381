use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Businesses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Businesses::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Businesses::Name).string().not_null())
                    .col(
                        ColumnDef::new(Businesses::BusinessType)
                            .string_len(16)
                            .not_null()
                            .default("clinic"),
                    )
                    .col(ColumnDef::new(Businesses::Description).text().not_null())
                    .col(ColumnDef::new(Businesses::Address).string().not_null())
                    .col(ColumnDef::new(Businesses::Phone).string().not_null())
                    .col(ColumnDef::new(Businesses::Email).string().not_null())
                    .col(
                        ColumnDef::new(Businesses::MaxDailyCapacity)
                            .integer()
                            .not_null()
                            .default(100),
                    )
                    .col(
                        ColumnDef::new(Businesses::AvgServiceTime)
                            .integer()
                            .not_null()
                            .default(15),
                    )
                    // One business per owner
                    .col(
                        ColumnDef::new(Businesses::OwnerId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Businesses::CreatedAt).date_time().not_null())
                    .col(ColumnDef::new(Businesses::UpdatedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-business-owner_id")
                            .from(Businesses::Table, Businesses::OwnerId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_businesses_name")
                    .table(Businesses::Table)
                    .col(Businesses::Name)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Businesses::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Businesses {
    Table,
    Id,
    Name,
    BusinessType,
    Description,
    Address,
    Phone,
    Email,
    MaxDailyCapacity,
    AvgServiceTime,
    OwnerId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Accounts {
    Table,
    Id,
}
