//! Enrollment of a student in a group (student <-> group join)

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "enrollments")]
pub struct Model {
    /// Student UUID (composite primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub student_id: Uuid,

    /// Group UUID (composite primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub group_id: Uuid,

    pub active: bool,

    pub enrolled_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Student,

    #[sea_orm(
        belongs_to = "super::class_group::Entity",
        from = "Column::GroupId",
        to = "super::class_group::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Group,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::class_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
