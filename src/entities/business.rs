use super::sea_orm_active_enums::BusinessType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "businesses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub business_type: BusinessType,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub max_daily_capacity: i32,
    /// Minutes per customer, used for the naive wait estimate.
    pub avg_service_time: i32,
    #[sea_orm(unique)]
    pub owner_id: Uuid,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::OwnerId",
        to = "super::account::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Owner,
    #[sea_orm(has_many = "super::queue_entry::Entity")]
    QueueEntry,
    #[sea_orm(has_many = "super::business_analytics::Entity")]
    BusinessAnalytics,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::queue_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::QueueEntry.def()
    }
}

impl Related<super::business_analytics::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BusinessAnalytics.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
