//! Professor listings, reports and comments

use axum::{extract::State, Extension, Json};
use evalia_engine::{
    catalog, history,
    statistics::{self, StatisticsFilter},
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::error::{engine_error, ApiError};
use crate::extract::{ApiPath, ApiQuery};
use crate::middleware::AuthUser;
use crate::models::{
    CommentList, ErrorResponse, GroupList, PeriodQuery, ProfessorList,
    ProfessorStatisticsResponse, StatisticsQuery,
};
use crate::AppState;

/// List active professors
#[utoipa::path(
    get,
    path = "/api/professors",
    responses(
        (status = 200, description = "Active professors", body = ProfessorList),
        (status = 403, description = "Caller is not a coordinator, dean or admin", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "professors"
)]
pub async fn list_professors(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<ProfessorList>, ApiError> {
    let professors = catalog::list_professors(&state.db, &auth_user.caller())
        .await
        .map_err(engine_error)?;

    let professors: Vec<_> = professors.into_iter().map(Into::into).collect();
    let total = professors.len();
    Ok(Json(ProfessorList { professors, total }))
}

/// Groups the calling professor teaches
#[utoipa::path(
    get,
    path = "/api/professors/me/groups",
    params(PeriodQuery),
    responses(
        (status = 200, description = "Teaching assignments", body = GroupList),
        (status = 403, description = "Caller is not a professor", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "professors"
)]
pub async fn my_groups(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<PeriodQuery>,
) -> Result<Json<GroupList>, ApiError> {
    let groups = catalog::professor_groups(&state.db, &auth_user.caller(), query.period_id)
        .await
        .map_err(engine_error)?;

    let groups: Vec<_> = groups.into_iter().map(Into::into).collect();
    let total = groups.len();
    Ok(Json(GroupList { groups, total }))
}

/// Aggregated ratings of a professor
///
/// All figures are recomputed from the stored rating answers.
#[utoipa::path(
    get,
    path = "/api/professors/{id}/statistics",
    params(
        ("id" = Uuid, Path, description = "Professor ID"),
        StatisticsQuery
    ),
    responses(
        (status = 200, description = "Professor statistics", body = ProfessorStatisticsResponse),
        (status = 403, description = "Professors may only read their own statistics", body = ErrorResponse),
        (status = 404, description = "Professor not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "professors"
)]
pub async fn professor_statistics(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<StatisticsQuery>,
) -> Result<Json<ProfessorStatisticsResponse>, ApiError> {
    debug!("Statistics for professor {} requested by {}", id, auth_user.email);

    let filter = StatisticsFilter {
        period_id: query.period_id,
        course_id: query.course_id,
    };
    let stats = statistics::professor_statistics(&state.db, &auth_user.caller(), id, filter)
        .await
        .map_err(engine_error)?;

    Ok(Json(stats.into()))
}

/// Anonymous comments left for a professor
#[utoipa::path(
    get,
    path = "/api/professors/{id}/comments",
    params(
        ("id" = Uuid, Path, description = "Professor ID"),
        PeriodQuery
    ),
    responses(
        (status = 200, description = "Comments without student identity", body = CommentList),
        (status = 403, description = "Professors may only read their own comments", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "professors"
)]
pub async fn professor_comments(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<PeriodQuery>,
) -> Result<Json<CommentList>, ApiError> {
    let comments = history::professor_comments(&state.db, &auth_user.caller(), id, query.period_id)
        .await
        .map_err(engine_error)?;

    let comments: Vec<_> = comments.into_iter().map(Into::into).collect();
    let total = comments.len();
    Ok(Json(CommentList { comments, total }))
}
