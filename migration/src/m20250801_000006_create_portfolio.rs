use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Portfolio::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Portfolio::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Portfolio::UserId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Portfolio::CoinId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Portfolio::Amount)
                            .decimal()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Portfolio::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_portfolio_user_id")
                            .from(Portfolio::Table, Portfolio::UserId)
                            .to(Users::Table, Users::UserId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One holding row per (user, coin); additive upserts merge into it
        manager
            .create_index(
                Index::create()
                    .name("idx_portfolio_user_coin_unique")
                    .table(Portfolio::Table)
                    .col(Portfolio::UserId)
                    .col(Portfolio::CoinId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Portfolio::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Portfolio {
    Table,
    Id,
    UserId,
    CoinId,
    Amount,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    UserId,
}
