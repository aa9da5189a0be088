//! Eligibility of a student to evaluate a professor for a group and period

use evalia_db::entities::{
    class_group, course, enrollment, evaluation, student, teaching_assignment,
};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use tracing::debug;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

/// The tuple an evaluation is unique over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EvaluationTarget {
    pub student_id: Uuid,
    pub professor_id: Uuid,
    pub group_id: Uuid,
    pub period_id: Uuid,
}

/// What the checks loaded, reused by the writer
#[derive(Debug, Clone)]
pub struct Eligible {
    pub student: student::Model,
    pub group: class_group::Model,
    pub course: course::Model,
}

/// Pure read; no rows are written
///
/// Enrollment is checked before anything about the professor or the period so
/// that a student outside the group always gets `NotEnrolled`. Any existing
/// evaluation for the tuple blocks, completed or not.
pub async fn check_eligibility<C: ConnectionTrait>(
    conn: &C,
    target: &EvaluationTarget,
) -> EngineResult<Eligible> {
    let student = student::Entity::find_by_id(target.student_id)
        .one(conn)
        .await?
        .filter(|s| s.active)
        .ok_or_else(|| EngineError::not_found("student", target.student_id))?;

    let group = class_group::Entity::find_by_id(target.group_id)
        .one(conn)
        .await?
        .filter(|g| g.active)
        .ok_or_else(|| EngineError::not_found("group", target.group_id))?;

    let enrolled = enrollment::Entity::find_by_id((target.student_id, target.group_id))
        .one(conn)
        .await?
        .is_some_and(|e| e.active);
    if !enrolled {
        debug!(
            "Student {} is not enrolled in group {}",
            target.student_id, target.group_id
        );
        return Err(EngineError::NotEnrolled);
    }

    if group.period_id != target.period_id {
        return Err(EngineError::validation(
            "period_id",
            "group does not belong to this period",
        ));
    }

    let assigned = teaching_assignment::Entity::find()
        .filter(teaching_assignment::Column::GroupId.eq(target.group_id))
        .filter(teaching_assignment::Column::ProfessorId.eq(target.professor_id))
        .filter(teaching_assignment::Column::Active.eq(true))
        .one(conn)
        .await?
        .is_some();
    if !assigned {
        return Err(EngineError::validation(
            "professor_id",
            "professor is not assigned to this group",
        ));
    }

    if find_existing(conn, target).await?.is_some() {
        return Err(EngineError::AlreadyEvaluated);
    }

    let course = course::Entity::find_by_id(group.course_id)
        .one(conn)
        .await?
        .ok_or_else(|| EngineError::not_found("course", group.course_id))?;

    Ok(Eligible {
        student,
        group,
        course,
    })
}

/// Existing evaluation for exactly this tuple, in any state
pub async fn find_existing<C: ConnectionTrait>(
    conn: &C,
    target: &EvaluationTarget,
) -> EngineResult<Option<evaluation::Model>> {
    Ok(evaluation::Entity::find()
        .filter(evaluation::Column::StudentId.eq(target.student_id))
        .filter(evaluation::Column::ProfessorId.eq(target.professor_id))
        .filter(evaluation::Column::GroupId.eq(target.group_id))
        .filter(evaluation::Column::PeriodId.eq(target.period_id))
        .one(conn)
        .await?)
}
