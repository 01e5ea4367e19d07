use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Essays::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Essays::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Essays::UserId).integer().not_null())
                    .col(ColumnDef::new(Essays::Topic).string().not_null())
                    .col(ColumnDef::new(Essays::Content).text().not_null())
                    .col(
                        ColumnDef::new(Essays::EssayType)
                            .string()
                            .not_null()
                            .default("Submission"),
                    )
                    .col(
                        ColumnDef::new(Essays::Score)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Essays::Feedback)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Essays::SubmittedAt).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_essays_user_id")
                            .from(Essays::Table, Essays::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // History and draft lookups are always per user, newest first
        manager
            .create_index(
                Index::create()
                    .name("idx_essays_user_submitted_at")
                    .table(Essays::Table)
                    .col(Essays::UserId)
                    .col(Essays::SubmittedAt)
                    .to_owned(),
            )
            .await?;

        // Draft listings and counts filter on type
        manager
            .create_index(
                Index::create()
                    .name("idx_essays_user_type")
                    .table(Essays::Table)
                    .col(Essays::UserId)
                    .col(Essays::EssayType)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Essays::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Essays {
    Table,
    Id,
    UserId,
    Topic,
    Content,
    EssayType,
    Score,
    Feedback,
    SubmittedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
