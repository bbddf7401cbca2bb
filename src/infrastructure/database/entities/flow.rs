use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "flows")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub flow_id: String,
    pub handle: String,
    pub name: String,
    pub flow_type: String,
    pub active_version: i32,
    pub deployment_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::flow_version::Entity")]
    FlowVersions,
}

impl Related<super::flow_version::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FlowVersions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
