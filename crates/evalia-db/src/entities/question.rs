//! Evaluation question definitions (the question bank)

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of answer a question expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    /// Likert rating from 1 to 5
    #[sea_orm(string_value = "rating")]
    Rating,

    /// Free text
    #[sea_orm(string_value = "text")]
    Text,

    /// One option out of `options`
    #[sea_orm(string_value = "multiple_choice")]
    MultipleChoice,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "questions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub category_id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub text: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    pub response_type: ResponseType,

    /// JSON array of option labels (multiple choice only)
    #[sea_orm(column_type = "Text", nullable)]
    pub options: Option<String>,

    pub required: bool,

    /// Position inside its category
    pub display_order: i32,

    /// Career scope; NULL means the question applies to every career
    pub career_id: Option<Uuid>,

    pub active: bool,

    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::question_category::Entity",
        from = "Column::CategoryId",
        to = "super::question_category::Column::Id"
    )]
    Category,

    #[sea_orm(
        belongs_to = "super::career::Entity",
        from = "Column::CareerId",
        to = "super::career::Column::Id"
    )]
    Career,

    #[sea_orm(has_many = "super::evaluation_answer::Entity")]
    Answers,
}

impl Related<super::question_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::career::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Career.def()
    }
}

impl Related<super::evaluation_answer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Answers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Option labels of a multiple-choice question
    pub fn option_list(&self) -> Vec<String> {
        self.options
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default()
    }
}
