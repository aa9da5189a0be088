//! Read-only browsing of careers, courses, groups and periods

use std::collections::{HashMap, HashSet};

use evalia_db::entities::{
    academic_period, career, class_group, course, professor, teaching_assignment,
    user::{self, UserRole},
};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use tracing::debug;
use uuid::Uuid;

use crate::caller::Caller;
use crate::error::{EngineError, EngineResult};

/// Public face of a professor (no credentials)
#[derive(Debug, Clone, PartialEq)]
pub struct ProfessorSummary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub department: Option<String>,
}

/// A group with the course, period and professor it belongs to
#[derive(Debug, Clone)]
pub struct GroupSummary {
    pub group: class_group::Model,
    pub course: course::Model,
    pub period: academic_period::Model,
    pub professor: Option<ProfessorSummary>,
}

pub async fn list_careers(db: &DatabaseConnection) -> EngineResult<Vec<career::Model>> {
    Ok(career::Entity::find()
        .filter(career::Column::Active.eq(true))
        .order_by_asc(career::Column::Name)
        .all(db)
        .await?)
}

pub async fn list_courses(
    db: &DatabaseConnection,
    career_id: Uuid,
) -> EngineResult<Vec<course::Model>> {
    career::Entity::find_by_id(career_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::not_found("career", career_id))?;

    Ok(course::Entity::find()
        .filter(course::Column::CareerId.eq(career_id))
        .filter(course::Column::Active.eq(true))
        .order_by_asc(course::Column::Code)
        .all(db)
        .await?)
}

/// Periods, most recent code first
pub async fn list_periods(db: &DatabaseConnection) -> EngineResult<Vec<academic_period::Model>> {
    Ok(academic_period::Entity::find()
        .order_by_desc(academic_period::Column::Code)
        .all(db)
        .await?)
}

pub async fn list_groups(
    db: &DatabaseConnection,
    course_id: Uuid,
    period_id: Option<Uuid>,
) -> EngineResult<Vec<GroupSummary>> {
    course::Entity::find_by_id(course_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::not_found("course", course_id))?;

    let mut query = class_group::Entity::find()
        .filter(class_group::Column::CourseId.eq(course_id))
        .filter(class_group::Column::Active.eq(true));
    if let Some(period_id) = period_id {
        query = query.filter(class_group::Column::PeriodId.eq(period_id));
    }

    let groups = query.all(db).await?;
    debug!("Found {} groups for course {}", groups.len(), course_id);

    summarize_groups(db, groups).await
}

pub async fn group_detail(db: &DatabaseConnection, group_id: Uuid) -> EngineResult<GroupSummary> {
    let group = class_group::Entity::find_by_id(group_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::not_found("group", group_id))?;

    summarize_groups(db, vec![group])
        .await?
        .pop()
        .ok_or_else(|| EngineError::not_found("group", group_id))
}

/// Active professors, for deans, coordinators and admins
pub async fn list_professors(
    db: &DatabaseConnection,
    caller: &Caller,
) -> EngineResult<Vec<ProfessorSummary>> {
    caller.require_any(&[UserRole::Coordinator, UserRole::Dean, UserRole::Admin])?;
    caller.load_user(db).await?;

    let ids: Vec<Uuid> = professor::Entity::find()
        .filter(professor::Column::Active.eq(true))
        .all(db)
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect();

    let mut professors: Vec<_> = professor_summaries(db, &ids).await?.into_values().collect();
    professors.sort_by(|a, b| a.full_name.cmp(&b.full_name));

    Ok(professors)
}

/// Groups the calling professor teaches
pub async fn professor_groups(
    db: &DatabaseConnection,
    caller: &Caller,
    period_id: Option<Uuid>,
) -> EngineResult<Vec<GroupSummary>> {
    let professor = caller.professor(db).await?;

    let group_ids: Vec<Uuid> = teaching_assignment::Entity::find()
        .filter(teaching_assignment::Column::ProfessorId.eq(professor.id))
        .filter(teaching_assignment::Column::Active.eq(true))
        .all(db)
        .await?
        .into_iter()
        .map(|a| a.group_id)
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

    summarize_groups(db, query.all(db).await?).await
}

/// Summaries keyed by professor id
pub(crate) async fn professor_summaries<C: ConnectionTrait>(
    conn: &C,
    professor_ids: &[Uuid],
) -> EngineResult<HashMap<Uuid, ProfessorSummary>> {
    if professor_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let professors = professor::Entity::find()
        .filter(professor::Column::Id.is_in(professor_ids.iter().copied()))
        .all(conn)
        .await?;

    let users: HashMap<Uuid, user::Model> = user::Entity::find()
        .filter(user::Column::Id.is_in(professors.iter().map(|p| p.user_id)))
        .all(conn)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    Ok(professors
        .into_iter()
        .filter_map(|p| {
            let user = users.get(&p.user_id)?;
            Some((
                p.id,
                ProfessorSummary {
                    id: p.id,
                    user_id: p.user_id,
                    full_name: user.full_name(),
                    email: user.email.clone(),
                    department: p.department,
                },
            ))
        })
        .collect())
}

/// Attach course, period and assigned professor to each group
pub(crate) async fn summarize_groups<C: ConnectionTrait>(
    conn: &C,
    groups: Vec<class_group::Model>,
) -> EngineResult<Vec<GroupSummary>> {
    if groups.is_empty() {
        return Ok(Vec::new());
    }

    let course_ids: HashSet<Uuid> = groups.iter().map(|g| g.course_id).collect();
    let period_ids: HashSet<Uuid> = groups.iter().map(|g| g.period_id).collect();

    let courses: HashMap<Uuid, course::Model> = course::Entity::find()
        .filter(course::Column::Id.is_in(course_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    let periods: HashMap<Uuid, academic_period::Model> = academic_period::Entity::find()
        .filter(academic_period::Column::Id.is_in(period_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let assignments: HashMap<Uuid, Uuid> = teaching_assignment::Entity::find()
        .filter(teaching_assignment::Column::GroupId.is_in(groups.iter().map(|g| g.id)))
        .filter(teaching_assignment::Column::Active.eq(true))
        .all(conn)
        .await?
        .into_iter()
        .map(|a| (a.group_id, a.professor_id))
        .collect();

    let professor_ids: Vec<Uuid> = assignments.values().copied().collect();
    let professors = professor_summaries(conn, &professor_ids).await?;

    let mut summaries: Vec<GroupSummary> = groups
        .into_iter()
        .filter_map(|group| {
            let course = courses.get(&group.course_id)?.clone();
            let period = periods.get(&group.period_id)?.clone();
            let professor = assignments
                .get(&group.id)
                .and_then(|id| professors.get(id))
                .cloned();
            Some(GroupSummary {
                group,
                course,
                period,
                professor,
            })
        })
        .collect();

    summaries.sort_by(|a, b| {
        (&a.course.code, a.group.section_number).cmp(&(&b.course.code, b.group.section_number))
    });

    Ok(summaries)
}
