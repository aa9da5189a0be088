//! Evaluation header: one student's assessment of one professor for one
//! group in one period

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "evaluations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub student_id: Uuid,

    pub professor_id: Uuid,

    pub group_id: Uuid,

    pub period_id: Uuid,

    #[sea_orm(column_type = "Text", nullable)]
    pub comments: Option<String>,

    pub completed: bool,

    /// Mean of the rating answers at submission time (NULL when none)
    #[sea_orm(column_type = "Double", nullable)]
    pub average_rating: Option<f64>,

    pub started_at: ChronoDateTimeUtc,

    pub completed_at: Option<ChronoDateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id"
    )]
    Student,

    #[sea_orm(
        belongs_to = "super::professor::Entity",
        from = "Column::ProfessorId",
        to = "super::professor::Column::Id"
    )]
    Professor,

    #[sea_orm(
        belongs_to = "super::class_group::Entity",
        from = "Column::GroupId",
        to = "super::class_group::Column::Id"
    )]
    Group,

    #[sea_orm(
        belongs_to = "super::academic_period::Entity",
        from = "Column::PeriodId",
        to = "super::academic_period::Column::Id"
    )]
    Period,

    /// Answers are owned by the evaluation and removed with it
    #[sea_orm(has_many = "super::evaluation_answer::Entity")]
    Answers,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::professor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Professor.def()
    }
}

impl Related<super::class_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl Related<super::academic_period::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Period.def()
    }
}

impl Related<super::evaluation_answer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Answers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
