use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// One waybill: sender/receiver parties, freight totals, and routing
/// metadata. Line items live in `order_item`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[validate(length(
        min = 1,
        max = 50,
        message = "Order number must be between 1 and 50 characters"
    ))]
    pub order_number: String,

    pub sender: String,
    pub sender_phone: String,
    pub sender_address: String,
    pub product_code: String,
    pub receiver: String,
    pub receiver_phone: String,
    pub receiver_address: String,
    pub total_freight: Decimal,
    pub payment_method: String,
    pub return_requirement: String,
    pub other_expenses: Decimal,
    pub expense_details: String,
    pub carrier: String,
    pub carrier_address: String,
    pub arrival_address: String,
    pub departure_station_phone: Option<String>,
    pub arrival_station_phone: String,
    pub customer_order_no: String,
    // Submitted as an opaque form value; stored verbatim.
    pub date: Option<String>,
    pub departure_station: String,
    pub arrival_station: String,
    pub transport_method: String,
    pub delivery_method: String,
    pub sender_sign: String,
    pub receiver_sign: String,
    pub id_card: String,
    pub order_maker: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItem,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItem.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {}
