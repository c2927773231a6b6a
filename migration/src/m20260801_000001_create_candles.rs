use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Candles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Candles::Id).big_unsigned().auto_increment().primary_key())
                    .col(ColumnDef::new(Candles::Symbol).string().not_null())
                    .col(ColumnDef::new(Candles::Timeframe).string().not_null()) // "1m" .. "60m"
                    .col(ColumnDef::new(Candles::TsUtc).timestamp().not_null())
                    .col(ColumnDef::new(Candles::Open).decimal_len(20, 8).not_null())
                    .col(ColumnDef::new(Candles::High).decimal_len(20, 8).not_null())
                    .col(ColumnDef::new(Candles::Low).decimal_len(20, 8).not_null())
                    .col(ColumnDef::new(Candles::Close).decimal_len(20, 8).not_null())
                    .col(ColumnDef::new(Candles::Volume).big_unsigned().not_null())
                    .col(ColumnDef::new(Candles::CreatedAt).timestamp().default(Expr::cust("CURRENT_TIMESTAMP")))
                    // One row per bar; re-ingesting a window must hit this key
                    .index(
                        Index::create()
                            .name("uix_candles_symbol_tf_ts")
                            .table(Candles::Table)
                            .col(Candles::Symbol)
                            .col(Candles::Timeframe)
                            .col(Candles::TsUtc)
                            .unique()
                    )
                    .index(
                        Index::create()
                            .name("idx_candles_symbol_tf")
                            .table(Candles::Table)
                            .col(Candles::Symbol)
                            .col(Candles::Timeframe)
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Candles::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Candles {
    Table,
    Id,
    Symbol,
    Timeframe,
    TsUtc,
    Open,
    High,
    Low,
    Close,
    Volume,
    CreatedAt,
}
