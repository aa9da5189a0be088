//! Read-only academic catalog

use axum::{extract::State, Json};
use evalia_engine::catalog;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::error::{engine_error, ApiError};
use crate::extract::{ApiPath, ApiQuery};
use crate::models::{
    CareerList, CourseList, ErrorResponse, Group, GroupList, PeriodList, PeriodQuery,
};
use crate::AppState;

/// List active careers
///
/// Public so the registration form can offer a career to students.
#[utoipa::path(
    get,
    path = "/api/careers",
    responses(
        (status = 200, description = "Active careers", body = CareerList),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn list_careers(State(state): State<Arc<AppState>>) -> Result<Json<CareerList>, ApiError> {
    let careers = catalog::list_careers(&state.db)
        .await
        .map_err(engine_error)?;

    let careers: Vec<_> = careers.into_iter().map(Into::into).collect();
    let total = careers.len();
    Ok(Json(CareerList { careers, total }))
}

/// List the active courses of a career
#[utoipa::path(
    get,
    path = "/api/careers/{id}/courses",
    params(
        ("id" = Uuid, Path, description = "Career ID")
    ),
    responses(
        (status = 200, description = "Courses of the career", body = CourseList),
        (status = 404, description = "Career not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "catalog"
)]
pub async fn list_career_courses(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<CourseList>, ApiError> {
    debug!("Listing courses of career {}", id);

    let courses = catalog::list_courses(&state.db, id)
        .await
        .map_err(engine_error)?;

    let courses: Vec<_> = courses.into_iter().map(Into::into).collect();
    let total = courses.len();
    Ok(Json(CourseList { courses, total }))
}

/// List the groups of a course
#[utoipa::path(
    get,
    path = "/api/courses/{id}/groups",
    params(
        ("id" = Uuid, Path, description = "Course ID"),
        PeriodQuery
    ),
    responses(
        (status = 200, description = "Groups with their assigned professor", body = GroupList),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "catalog"
)]
pub async fn list_course_groups(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<PeriodQuery>,
) -> Result<Json<GroupList>, ApiError> {
    let groups = catalog::list_groups(&state.db, id, query.period_id)
        .await
        .map_err(engine_error)?;

    let groups: Vec<Group> = groups.into_iter().map(Into::into).collect();
    let total = groups.len();
    Ok(Json(GroupList { groups, total }))
}

/// List academic periods, most recent first
#[utoipa::path(
    get,
    path = "/api/periods",
    responses(
        (status = 200, description = "Academic periods", body = PeriodList)
    ),
    security(("bearer_auth" = [])),
    tag = "catalog"
)]
pub async fn list_periods(State(state): State<Arc<AppState>>) -> Result<Json<PeriodList>, ApiError> {
    let periods = catalog::list_periods(&state.db)
        .await
        .map_err(engine_error)?;

    let periods: Vec<_> = periods.into_iter().map(Into::into).collect();
    let total = periods.len();
    Ok(Json(PeriodList { periods, total }))
}

/// Get one group
#[utoipa::path(
    get,
    path = "/api/groups/{id}",
    params(
        ("id" = Uuid, Path, description = "Group ID")
    ),
    responses(
        (status = 200, description = "Group detail", body = Group),
        (status = 404, description = "Group not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "catalog"
)]
pub async fn get_group(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Group>, ApiError> {
    let group = catalog::group_detail(&state.db, id)
        .await
        .map_err(engine_error)?;

    Ok(Json(group.into()))
}
