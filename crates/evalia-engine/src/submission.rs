//! Submitting an evaluation: answer validation and the atomic write

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use evalia_db::entities::{
    evaluation, evaluation_answer,
    question::{self, ResponseType},
};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DbErr, Set, SqlErr, TransactionTrait,
};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::caller::Caller;
use crate::eligibility::{check_eligibility, EvaluationTarget};
use crate::error::{EngineError, EngineResult, FieldIssue};
use crate::questions::applicable_questions;

pub const RATING_MIN: i32 = 1;
pub const RATING_MAX: i32 = 5;
pub const MAX_COMMENT_LEN: usize = 2000;

/// One answer as sent by the client; exactly one value field is expected
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnswerInput {
    pub question_id: Uuid,
    pub rating: Option<i32>,
    pub text: Option<String>,
    pub option: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub professor_id: Uuid,
    pub group_id: Uuid,
    pub period_id: Uuid,
    pub comments: Option<String>,
    pub answers: Vec<AnswerInput>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnswerValue {
    Rating(i32),
    Text(String),
    Choice(String),
}

/// An answer checked against its question, ready to be stored
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedAnswer {
    pub question_id: Uuid,
    pub value: AnswerValue,
}

/// Check a full answer set against the applicable questions
///
/// Every issue is collected before failing so the form can highlight all of
/// them at once.
pub fn validate_answers(
    questions: &[question::Model],
    answers: &[AnswerInput],
) -> EngineResult<Vec<ValidatedAnswer>> {
    let by_id: HashMap<Uuid, &question::Model> = questions.iter().map(|q| (q.id, q)).collect();
    let mut seen = HashSet::new();
    let mut issues = Vec::new();
    let mut validated = Vec::with_capacity(answers.len());

    for (index, answer) in answers.iter().enumerate() {
        let field = format!("answers[{index}]");

        if !seen.insert(answer.question_id) {
            issues.push(FieldIssue::new(field, "question answered more than once"));
            continue;
        }

        let Some(question) = by_id.get(&answer.question_id) else {
            issues.push(FieldIssue::new(
                field,
                format!("question {} does not apply to this evaluation", answer.question_id),
            ));
            continue;
        };

        match answer_value(question, answer) {
            Ok(Some(value)) => validated.push(ValidatedAnswer {
                question_id: question.id,
                value,
            }),
            Ok(None) => {}
            Err(message) => issues.push(FieldIssue::new(field, message)),
        }
    }

    for question in questions.iter().filter(|q| q.required) {
        if !seen.contains(&question.id) {
            issues.push(FieldIssue::new(
                "answers",
                format!("missing answer for required question {}", question.id),
            ));
        }
    }

    EngineError::check(issues)?;
    Ok(validated)
}

/// `Ok(None)` is a blank text answer to an optional question, which counts as skipped
fn answer_value(
    question: &question::Model,
    answer: &AnswerInput,
) -> Result<Option<AnswerValue>, String> {
    let text = answer.text.as_deref().map(str::trim);
    let option = answer.option.as_deref();

    match question.response_type {
        ResponseType::Rating => match (answer.rating, text, option) {
            (Some(rating), None, None) if (RATING_MIN..=RATING_MAX).contains(&rating) => {
                Ok(Some(AnswerValue::Rating(rating)))
            }
            (Some(rating), None, None) => Err(format!(
                "rating {rating} is outside {RATING_MIN}..={RATING_MAX}"
            )),
            _ => Err("rating question expects only a rating".to_string()),
        },
        ResponseType::Text => match (answer.rating, text, option) {
            (None, Some(text), None) if !text.is_empty() => {
                Ok(Some(AnswerValue::Text(text.to_string())))
            }
            (None, Some(_), None) if !question.required => Ok(None),
            (None, Some(_), None) => Err("text answer must not be empty".to_string()),
            _ => Err("text question expects only a text answer".to_string()),
        },
        ResponseType::MultipleChoice => match (answer.rating, text, option) {
            (None, None, Some(choice)) if question.option_list().iter().any(|o| o == choice) => {
                Ok(Some(AnswerValue::Choice(choice.to_string())))
            }
            (None, None, Some(choice)) => Err(format!("'{choice}' is not one of the options")),
            _ => Err("multiple choice question expects only an option".to_string()),
        },
    }
}

/// Mean of the rating answers; `None` when there are none
pub fn average_rating(answers: &[ValidatedAnswer]) -> Option<f64> {
    let ratings: Vec<i32> = answers
        .iter()
        .filter_map(|a| match a.value {
            AnswerValue::Rating(r) => Some(r),
            _ => None,
        })
        .collect();

    if ratings.is_empty() {
        return None;
    }

    Some(ratings.iter().map(|&r| f64::from(r)).sum::<f64>() / ratings.len() as f64)
}

fn normalize_comments(comments: Option<String>) -> EngineResult<Option<String>> {
    let comments = comments
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    if comments
        .as_ref()
        .is_some_and(|c| c.chars().count() > MAX_COMMENT_LEN)
    {
        return Err(EngineError::validation(
            "comments",
            format!("must be at most {MAX_COMMENT_LEN} characters"),
        ));
    }

    Ok(comments)
}

/// Submit the calling student's evaluation
///
/// Eligibility and answers are checked before anything is written. The
/// header and its answers are then stored in one transaction; a concurrent
/// duplicate loses on the unique index and is reported as `AlreadyEvaluated`.
pub async fn submit_evaluation(
    db: &DatabaseConnection,
    caller: &Caller,
    request: SubmissionRequest,
) -> EngineResult<evaluation::Model> {
    let student = caller.student(db).await?;

    let target = EvaluationTarget {
        student_id: student.id,
        professor_id: request.professor_id,
        group_id: request.group_id,
        period_id: request.period_id,
    };

    if let Err(err) = check_eligibility(db, &target).await {
        warn!("Rejected evaluation by student {}: {}", student.id, err);
        return Err(err);
    }

    let questions: Vec<question::Model> = applicable_questions(db, Some(student.career_id))
        .await?
        .into_iter()
        .map(|view| view.question)
        .collect();

    let answers = validate_answers(&questions, &request.answers)?;
    let comments = normalize_comments(request.comments)?;

    write_evaluation(db, &target, comments, &answers).await
}

/// Store header and answers as one unit
///
/// If any statement fails the transaction is dropped without commit and no
/// header survives.
pub async fn write_evaluation(
    db: &DatabaseConnection,
    target: &EvaluationTarget,
    comments: Option<String>,
    answers: &[ValidatedAnswer],
) -> EngineResult<evaluation::Model> {
    let now = Utc::now();
    let txn = db.begin().await?;

    let header = evaluation::ActiveModel {
        id: Set(Uuid::new_v4()),
        student_id: Set(target.student_id),
        professor_id: Set(target.professor_id),
        group_id: Set(target.group_id),
        period_id: Set(target.period_id),
        comments: Set(comments),
        completed: Set(true),
        average_rating: Set(average_rating(answers)),
        started_at: Set(now),
        completed_at: Set(Some(now)),
    }
    .insert(&txn)
    .await
    .map_err(duplicate_evaluation)?;

    for answer in answers {
        let (rating, text_answer, selected_option) = match &answer.value {
            AnswerValue::Rating(r) => (Some(*r), None, None),
            AnswerValue::Text(t) => (None, Some(t.clone()), None),
            AnswerValue::Choice(o) => (None, None, Some(o.clone())),
        };

        evaluation_answer::ActiveModel {
            id: Set(Uuid::new_v4()),
            evaluation_id: Set(header.id),
            question_id: Set(answer.question_id),
            rating: Set(rating),
            text_answer: Set(text_answer),
            selected_option: Set(selected_option),
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await.map_err(duplicate_evaluation)?;

    info!(
        "Evaluation {} stored: student {} -> professor {} (group {}, {} answers)",
        header.id,
        target.student_id,
        target.professor_id,
        target.group_id,
        answers.len()
    );

    Ok(header)
}

fn duplicate_evaluation(err: DbErr) -> EngineError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => EngineError::AlreadyEvaluated,
        _ => EngineError::Storage(err),
    }
}
