use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub name: String,

    #[sea_orm(unique)]
    pub code: String,

    pub credits: i32,

    pub career_id: Uuid,

    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::career::Entity",
        from = "Column::CareerId",
        to = "super::career::Column::Id"
    )]
    Career,

    #[sea_orm(has_many = "super::class_group::Entity")]
    Groups,
}

impl Related<super::career::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Career.def()
    }
}

impl Related<super::class_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
