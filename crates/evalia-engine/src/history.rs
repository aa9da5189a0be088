//! Read side of evaluations: a student's history, pending work, detail
//! views and anonymous comments

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use evalia_db::entities::{
    academic_period, class_group, course, enrollment, evaluation, evaluation_answer,
    question::{self, ResponseType},
    question_category,
    user::UserRole,
};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use tracing::debug;
use uuid::Uuid;

use crate::caller::Caller;
use crate::catalog::{professor_summaries, summarize_groups, GroupSummary, ProfessorSummary};
use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone)]
pub struct AnswerDetail {
    pub answer: evaluation_answer::Model,
    pub question_text: String,
    pub response_type: ResponseType,
    pub category_name: String,
}

/// An evaluation joined with everything needed to display it
#[derive(Debug, Clone)]
pub struct EvaluationDetail {
    pub evaluation: evaluation::Model,
    pub professor: Option<ProfessorSummary>,
    pub group: class_group::Model,
    pub course: course::Model,
    pub period: academic_period::Model,
    pub answers: Vec<AnswerDetail>,
}

/// Comment left on a professor, stripped of the student's identity
#[derive(Debug, Clone, PartialEq)]
pub struct CommentEntry {
    pub comments: String,
    pub course_name: String,
    pub period_code: String,
    pub completed_at: Option<DateTime<Utc>>,
}

/// The calling student's evaluations, newest first
pub async fn list_my_evaluations(
    db: &DatabaseConnection,
    caller: &Caller,
) -> EngineResult<Vec<EvaluationDetail>> {
    let student = caller.student(db).await?;

    let evaluations = evaluation::Entity::find()
        .filter(evaluation::Column::StudentId.eq(student.id))
        .order_by_desc(evaluation::Column::CompletedAt)
        .all(db)
        .await?;

    debug!(
        "Student {} has {} evaluations",
        student.id,
        evaluations.len()
    );

    load_details(db, evaluations).await
}

/// One evaluation, for its author or academic staff
pub async fn evaluation_detail(
    db: &DatabaseConnection,
    caller: &Caller,
    evaluation_id: Uuid,
) -> EngineResult<EvaluationDetail> {
    let evaluation = evaluation::Entity::find_by_id(evaluation_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::not_found("evaluation", evaluation_id))?;

    if caller.role.is_staff_reader() {
        caller.load_user(db).await?;
    } else if caller.is(UserRole::Student) {
        if caller.student(db).await?.id != evaluation.student_id {
            return Err(EngineError::forbidden(
                "students may only read their own evaluations",
            ));
        }
    } else {
        return Err(EngineError::forbidden(
            "evaluations are visible to their author and academic staff",
        ));
    }

    load_details(db, vec![evaluation])
        .await?
        .pop()
        .ok_or_else(|| EngineError::not_found("evaluation", evaluation_id))
}

/// Groups the calling student attends whose professor they have not yet
/// evaluated
pub async fn pending_evaluations(
    db: &DatabaseConnection,
    caller: &Caller,
    period_id: Option<Uuid>,
) -> EngineResult<Vec<GroupSummary>> {
    let student = caller.student(db).await?;

    let group_ids: Vec<Uuid> = enrollment::Entity::find()
        .filter(enrollment::Column::StudentId.eq(student.id))
        .filter(enrollment::Column::Active.eq(true))
        .all(db)
        .await?
        .into_iter()
        .map(|e| e.group_id)
        .collect();

    if group_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut query = class_group::Entity::find()
        .filter(class_group::Column::Id.is_in(group_ids))
        .filter(class_group::Column::Active.eq(true));
    if let Some(period_id) = period_id {
        query = query.filter(class_group::Column::PeriodId.eq(period_id));
    }
    let groups = query.all(db).await?;

    let done: HashSet<(Uuid, Uuid, Uuid)> = evaluation::Entity::find()
        .filter(evaluation::Column::StudentId.eq(student.id))
        .all(db)
        .await?
        .into_iter()
        .map(|e| (e.professor_id, e.group_id, e.period_id))
        .collect();

    let pending = summarize_groups(db, groups)
        .await?
        .into_iter()
        .filter(|summary| match &summary.professor {
            Some(professor) => {
                !done.contains(&(professor.id, summary.group.id, summary.group.period_id))
            }
            None => false,
        })
        .collect();

    Ok(pending)
}

/// Free-text comments received by a professor
pub async fn professor_comments(
    db: &DatabaseConnection,
    caller: &Caller,
    professor_id: Uuid,
    period_id: Option<Uuid>,
) -> EngineResult<Vec<CommentEntry>> {
    caller.require_professor_access(db, professor_id).await?;

    let mut query = evaluation::Entity::find()
        .filter(evaluation::Column::ProfessorId.eq(professor_id))
        .filter(evaluation::Column::Completed.eq(true))
        .filter(evaluation::Column::Comments.is_not_null());
    if let Some(period_id) = period_id {
        query = query.filter(evaluation::Column::PeriodId.eq(period_id));
    }

    let evaluations = query
        .order_by_desc(evaluation::Column::CompletedAt)
        .all(db)
        .await?;

    let details = load_details(db, evaluations).await?;

    Ok(details
        .into_iter()
        .filter_map(|detail| {
            Some(CommentEntry {
                comments: detail.evaluation.comments?,
                course_name: detail.course.name,
                period_code: detail.period.code,
                completed_at: detail.evaluation.completed_at,
            })
        })
        .collect())
}

/// Join evaluations with professor, group, course, period and answers,
/// keeping the input order
pub async fn load_details<C: ConnectionTrait>(
    conn: &C,
    evaluations: Vec<evaluation::Model>,
) -> EngineResult<Vec<EvaluationDetail>> {
    if evaluations.is_empty() {
        return Ok(Vec::new());
    }

    let group_ids: HashSet<Uuid> = evaluations.iter().map(|e| e.group_id).collect();
    let groups: HashMap<Uuid, class_group::Model> = class_group::Entity::find()
        .filter(class_group::Column::Id.is_in(group_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|g| (g.id, g))
        .collect();

    let course_ids: HashSet<Uuid> = groups.values().map(|g| g.course_id).collect();
    let courses: HashMap<Uuid, course::Model> = course::Entity::find()
        .filter(course::Column::Id.is_in(course_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    let period_ids: HashSet<Uuid> = evaluations.iter().map(|e| e.period_id).collect();
    let periods: HashMap<Uuid, academic_period::Model> = academic_period::Entity::find()
        .filter(academic_period::Column::Id.is_in(period_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let professor_ids: Vec<Uuid> = evaluations
        .iter()
        .map(|e| e.professor_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let professors = professor_summaries(conn, &professor_ids).await?;

    let answers = evaluation_answer::Entity::find()
        .filter(evaluation_answer::Column::EvaluationId.is_in(evaluations.iter().map(|e| e.id)))
        .all(conn)
        .await?;

    let question_ids: HashSet<Uuid> = answers.iter().map(|a| a.question_id).collect();
    let questions: HashMap<Uuid, question::Model> = question::Entity::find()
        .filter(question::Column::Id.is_in(question_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|q| (q.id, q))
        .collect();

    let category_ids: HashSet<Uuid> = questions.values().map(|q| q.category_id).collect();
    let categories: HashMap<Uuid, question_category::Model> = question_category::Entity::find()
        .filter(question_category::Column::Id.is_in(category_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    let mut answers_by_evaluation: HashMap<Uuid, Vec<AnswerDetail>> = HashMap::new();
    for answer in answers {
        let Some(question) = questions.get(&answer.question_id) else {
            continue;
        };
        let category_name = categories
            .get(&question.category_id)
            .map(|c| c.name.clone())
            .unwrap_or_default();

        answers_by_evaluation
            .entry(answer.evaluation_id)
            .or_default()
            .push(AnswerDetail {
                question_text: question.text.clone(),
                response_type: question.response_type,
                category_name,
                answer,
            });
    }

    Ok(evaluations
        .into_iter()
        .filter_map(|evaluation| {
            let group = groups.get(&evaluation.group_id)?.clone();
            let course = courses.get(&group.course_id)?.clone();
            let period = periods.get(&evaluation.period_id)?.clone();
            let professor = professors.get(&evaluation.professor_id).cloned();
            let answers = answers_by_evaluation
                .remove(&evaluation.id)
                .unwrap_or_default();

            Some(EvaluationDetail {
                evaluation,
                professor,
                group,
                course,
                period,
                answers,
            })
        })
        .collect())
}
