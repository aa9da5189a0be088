//! Question bank: resolution of the applicable form and curation

use std::collections::HashMap;

use chrono::Utc;
use evalia_db::entities::{
    course,
    question::{self, ResponseType},
    question_category,
    user::UserRole,
};
use sea_orm::{
    sea_query::Condition, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::caller::Caller;
use crate::error::{EngineError, EngineResult, FieldIssue};

const CURATORS: [UserRole; 2] = [UserRole::Coordinator, UserRole::Admin];

/// A question together with the category it is shown under
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionView {
    pub question: question::Model,
    pub category: question_category::Model,
}

impl QuestionView {
    pub fn options(&self) -> Vec<String> {
        self.question.option_list()
    }
}

#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub category_id: Uuid,
    pub text: String,
    pub description: Option<String>,
    pub response_type: ResponseType,
    pub options: Option<Vec<String>>,
    pub required: bool,
    pub display_order: i32,
    pub career_id: Option<Uuid>,
}

/// Partial update; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct QuestionChanges {
    pub category_id: Option<Uuid>,
    pub text: Option<String>,
    pub description: Option<String>,
    pub options: Option<Vec<String>>,
    pub required: Option<bool>,
    pub display_order: Option<i32>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub position: i32,
}

/// Active questions that apply to `career_id`
///
/// Global questions (no career) always apply; career-scoped ones only for
/// their own career. Ordered by category position, then category, then the
/// question's own display order.
pub async fn applicable_questions<C: ConnectionTrait>(
    conn: &C,
    career_id: Option<Uuid>,
) -> EngineResult<Vec<QuestionView>> {
    let mut scope = Condition::any().add(question::Column::CareerId.is_null());
    if let Some(career_id) = career_id {
        scope = scope.add(question::Column::CareerId.eq(career_id));
    }

    let questions = question::Entity::find()
        .filter(question::Column::Active.eq(true))
        .filter(scope)
        .all(conn)
        .await?;

    with_categories(conn, questions).await
}

async fn with_categories<C: ConnectionTrait>(
    conn: &C,
    questions: Vec<question::Model>,
) -> EngineResult<Vec<QuestionView>> {
    if questions.is_empty() {
        return Ok(Vec::new());
    }

    let categories: HashMap<Uuid, question_category::Model> = question_category::Entity::find()
        .filter(question_category::Column::Id.is_in(questions.iter().map(|q| q.category_id)))
        .all(conn)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    let mut views: Vec<QuestionView> = questions
        .into_iter()
        .filter_map(|question| {
            let category = categories.get(&question.category_id)?.clone();
            Some(QuestionView { question, category })
        })
        .collect();

    views.sort_by(|a, b| {
        (a.category.position, a.category.id, a.question.display_order).cmp(&(
            b.category.position,
            b.category.id,
            b.question.display_order,
        ))
    });

    Ok(views)
}

/// The evaluation form a caller sees
///
/// With a course the course's career decides; without one a student gets
/// their own career's form and everyone else the global questions.
pub async fn questions_for(
    db: &DatabaseConnection,
    caller: &Caller,
    course_id: Option<Uuid>,
) -> EngineResult<Vec<QuestionView>> {
    let career_id = match course_id {
        Some(course_id) => Some(
            course::Entity::find_by_id(course_id)
                .one(db)
                .await?
                .ok_or_else(|| EngineError::not_found("course", course_id))?
                .career_id,
        ),
        None if caller.is(UserRole::Student) => Some(caller.student(db).await?.career_id),
        None => None,
    };

    let views = applicable_questions(db, career_id).await?;
    debug!("Resolved {} questions for {:?}", views.len(), career_id);

    Ok(views)
}

/// Every question, inactive ones included
pub async fn list_all_questions(
    db: &DatabaseConnection,
    caller: &Caller,
) -> EngineResult<Vec<QuestionView>> {
    caller.require_any(&CURATORS)?;
    caller.load_user(db).await?;

    let questions = question::Entity::find().all(db).await?;
    with_categories(db, questions).await
}

fn shape_issues(response_type: ResponseType, options: Option<&[String]>) -> Vec<FieldIssue> {
    let mut issues = Vec::new();

    match (response_type, options) {
        (ResponseType::MultipleChoice, None) | (ResponseType::MultipleChoice, Some([])) => {
            issues.push(FieldIssue::new(
                "options",
                "multiple choice questions need at least one option",
            ));
        }
        (ResponseType::MultipleChoice, Some(options)) => {
            if options.iter().any(|o| o.trim().is_empty()) {
                issues.push(FieldIssue::new("options", "options must not be blank"));
            }
            let mut seen = options.to_vec();
            seen.sort();
            seen.dedup();
            if seen.len() != options.len() {
                issues.push(FieldIssue::new("options", "options must be distinct"));
            }
        }
        (_, Some(_)) => {
            issues.push(FieldIssue::new(
                "options",
                "only multiple choice questions take options",
            ));
        }
        (_, None) => {}
    }

    issues
}

fn encode_options(options: Option<Vec<String>>) -> EngineResult<Option<String>> {
    options
        .map(|o| serde_json::to_string(&o))
        .transpose()
        .map_err(|e| EngineError::validation("options", e.to_string()))
}

async fn require_category<C: ConnectionTrait>(conn: &C, category_id: Uuid) -> EngineResult<()> {
    question_category::Entity::find_by_id(category_id)
        .one(conn)
        .await?
        .ok_or_else(|| EngineError::validation("category_id", "unknown question category"))?;
    Ok(())
}

pub async fn create_question(
    db: &DatabaseConnection,
    caller: &Caller,
    input: NewQuestion,
) -> EngineResult<QuestionView> {
    caller.require_any(&CURATORS)?;
    caller.load_user(db).await?;

    let mut issues = shape_issues(input.response_type, input.options.as_deref());
    if input.text.trim().is_empty() {
        issues.push(FieldIssue::new("text", "must not be empty"));
    }
    EngineError::check(issues)?;
    require_category(db, input.category_id).await?;

    let created = question::ActiveModel {
        id: Set(Uuid::new_v4()),
        category_id: Set(input.category_id),
        text: Set(input.text.trim().to_string()),
        description: Set(input.description),
        response_type: Set(input.response_type),
        options: Set(encode_options(input.options)?),
        required: Set(input.required),
        display_order: Set(input.display_order),
        career_id: Set(input.career_id),
        active: Set(true),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await?;

    info!("Question {} created by {}", created.id, caller.user_id);

    with_categories(db, vec![created.clone()])
        .await?
        .pop()
        .ok_or_else(|| EngineError::not_found("question", created.id))
}

pub async fn update_question(
    db: &DatabaseConnection,
    caller: &Caller,
    question_id: Uuid,
    changes: QuestionChanges,
) -> EngineResult<QuestionView> {
    caller.require_any(&CURATORS)?;
    caller.load_user(db).await?;

    let existing = question::Entity::find_by_id(question_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::not_found("question", question_id))?;

    let mut issues = Vec::new();
    if let Some(options) = &changes.options {
        issues.extend(shape_issues(existing.response_type, Some(options.as_slice())));
    }
    if changes.text.as_deref().is_some_and(|t| t.trim().is_empty()) {
        issues.push(FieldIssue::new("text", "must not be empty"));
    }
    EngineError::check(issues)?;
    if let Some(category_id) = changes.category_id {
        require_category(db, category_id).await?;
    }

    let mut active: question::ActiveModel = existing.into();
    if let Some(category_id) = changes.category_id {
        active.category_id = Set(category_id);
    }
    if let Some(text) = changes.text {
        active.text = Set(text.trim().to_string());
    }
    if let Some(description) = changes.description {
        active.description = Set(Some(description));
    }
    if changes.options.is_some() {
        active.options = Set(encode_options(changes.options)?);
    }
    if let Some(required) = changes.required {
        active.required = Set(required);
    }
    if let Some(display_order) = changes.display_order {
        active.display_order = Set(display_order);
    }
    if let Some(flag) = changes.active {
        active.active = Set(flag);
    }

    let updated = active.update(db).await?;
    info!("Question {} updated by {}", updated.id, caller.user_id);

    with_categories(db, vec![updated])
        .await?
        .pop()
        .ok_or_else(|| EngineError::not_found("question", question_id))
}

/// Soft delete; answers keep pointing at the row
pub async fn deactivate_question(
    db: &DatabaseConnection,
    caller: &Caller,
    question_id: Uuid,
) -> EngineResult<QuestionView> {
    update_question(
        db,
        caller,
        question_id,
        QuestionChanges {
            active: Some(false),
            ..Default::default()
        },
    )
    .await
}

pub async fn list_categories(db: &DatabaseConnection) -> EngineResult<Vec<question_category::Model>> {
    Ok(question_category::Entity::find()
        .filter(question_category::Column::Active.eq(true))
        .order_by_asc(question_category::Column::Position)
        .order_by_asc(question_category::Column::Name)
        .all(db)
        .await?)
}

pub async fn create_category(
    db: &DatabaseConnection,
    caller: &Caller,
    input: NewCategory,
) -> EngineResult<question_category::Model> {
    caller.require_any(&CURATORS)?;
    caller.load_user(db).await?;

    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(EngineError::validation("name", "must not be empty"));
    }
    if question_category::Entity::find()
        .filter(question_category::Column::Name.eq(&name))
        .one(db)
        .await?
        .is_some()
    {
        return Err(EngineError::validation("name", "category already exists"));
    }

    let category = question_category::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        description: Set(input.description),
        position: Set(input.position),
        active: Set(true),
    }
    .insert(db)
    .await?;

    info!("Question category '{}' created", category.name);
    Ok(category)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_multiple_choice_needs_options() {
        assert_eq!(shape_issues(ResponseType::MultipleChoice, None).len(), 1);
        assert_eq!(shape_issues(ResponseType::MultipleChoice, Some(&[][..])).len(), 1);
        assert!(shape_issues(
            ResponseType::MultipleChoice,
            Some(labels(&["Always", "Never"]).as_slice())
        )
        .is_empty());
    }

    #[test]
    fn test_options_must_be_distinct_and_non_blank() {
        let issues = shape_issues(
            ResponseType::MultipleChoice,
            Some(labels(&["Yes", "Yes", " "]).as_slice()),
        );
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn test_rating_and_text_take_no_options() {
        assert!(shape_issues(ResponseType::Rating, None).is_empty());
        assert!(shape_issues(ResponseType::Text, None).is_empty());
        assert_eq!(
            shape_issues(ResponseType::Rating, Some(labels(&["1"]).as_slice())),
            vec![FieldIssue::new(
                "options",
                "only multiple choice questions take options"
            )]
        );
    }

    #[test]
    fn test_encode_options_as_json_array() {
        assert_eq!(
            encode_options(Some(labels(&["A", "B"]))).unwrap().as_deref(),
            Some(r#"["A","B"]"#)
        );
        assert_eq!(encode_options(None).unwrap(), None);
    }
}
