//! Course section taught in one academic period
//!
//! Named `class_groups` in the schema because `group` is reserved in SQL.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "class_groups")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub course_id: Uuid,

    pub period_id: Uuid,

    pub section_number: i32,

    pub schedule: Option<String>,

    pub room: Option<String>,

    pub capacity: Option<i32>,

    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id"
    )]
    Course,

    #[sea_orm(
        belongs_to = "super::academic_period::Entity",
        from = "Column::PeriodId",
        to = "super::academic_period::Column::Id"
    )]
    Period,

    #[sea_orm(has_many = "super::enrollment::Entity")]
    Enrollments,

    #[sea_orm(has_many = "super::teaching_assignment::Entity")]
    TeachingAssignments,
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl Related<super::academic_period::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Period.def()
    }
}

impl Related<super::enrollment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollments.def()
    }
}

impl Related<super::teaching_assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TeachingAssignments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
