//! `SeaORM` Entity, @generated manually

use sea_orm::entity::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize)]
#[sea_orm(table_name = "candles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: u64,
    pub symbol: String,
    pub timeframe: String, // "1m" .. "60m"
    pub ts_utc: DateTimeUtc,
    #[sea_orm(column_type = "Decimal(Some((20, 8)))")]
    pub open: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 8)))")]
    pub high: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 8)))")]
    pub low: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 8)))")]
    pub close: Decimal,
    #[sea_orm(column_type = "BigUnsigned")]
    pub volume: u64,
    #[serde(skip)]
    pub created_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
