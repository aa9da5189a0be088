//! Evaluation submission and the student's read side

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use evalia_db::entities::evaluation;
use evalia_engine::{
    history::{self, EvaluationDetail},
    questions,
    submission::{self, AnswerInput, SubmissionRequest},
    EngineResult,
};
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

use super::json_body;
use crate::error::{engine_error, ApiError};
use crate::extract::{ApiPath, ApiQuery};
use crate::middleware::AuthUser;
use crate::models::{
    ErrorResponse, Evaluation, EvaluationDetails, EvaluationList, GroupList, PeriodQuery, Question,
    QuestionList, QuestionQuery, SubmitEvaluationRequest,
};
use crate::AppState;

impl From<SubmitEvaluationRequest> for SubmissionRequest {
    fn from(req: SubmitEvaluationRequest) -> Self {
        Self {
            professor_id: req.professor_id,
            group_id: req.group_id,
            period_id: req.period_id,
            comments: req.comments,
            answers: req
                .answers
                .into_iter()
                .map(|a| AnswerInput {
                    question_id: a.question_id,
                    rating: a.rating,
                    text: a.text,
                    option: a.option,
                })
                .collect(),
        }
    }
}

/// Submit an evaluation
///
/// The header and every answer are stored in one transaction. A second
/// submission for the same professor, group and period is rejected with
/// `ALREADY_EVALUATED`.
#[utoipa::path(
    post,
    path = "/api/evaluations",
    request_body = SubmitEvaluationRequest,
    responses(
        (status = 201, description = "Evaluation stored. The body is the bare `Evaluation` header if the joined detail could not be loaded afterwards", body = EvaluationDetails),
        (status = 400, description = "Validation failed or already evaluated", body = ErrorResponse),
        (status = 403, description = "Not a student or not enrolled in the group", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "evaluations"
)]
pub async fn submit_evaluation(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    payload: Result<Json<SubmitEvaluationRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let req = json_body(payload)?;
    let caller = auth_user.caller();

    let stored = submission::submit_evaluation(&state.db, &caller, req.into())
        .await
        .map_err(engine_error)?;
    let detail = history::evaluation_detail(&state.db, &caller, stored.id).await;

    Ok(created_response(stored, detail))
}

/// The write is already committed here, so a failed re-read must not turn into an error
fn created_response(
    stored: evaluation::Model,
    detail: EngineResult<EvaluationDetail>,
) -> Response {
    match detail {
        Ok(detail) => (StatusCode::CREATED, Json(EvaluationDetails::from(detail))).into_response(),
        Err(e) => {
            error!(
                "Evaluation {} stored but loading its detail failed: {}",
                stored.id, e
            );
            (StatusCode::CREATED, Json(Evaluation::from(stored))).into_response()
        }
    }
}

/// The calling student's evaluations
#[utoipa::path(
    get,
    path = "/api/evaluations",
    responses(
        (status = 200, description = "Evaluations with professor, course, period and answers", body = EvaluationList),
        (status = 403, description = "Caller is not a student", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "evaluations"
)]
pub async fn list_my_evaluations(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<EvaluationList>, ApiError> {
    let details = history::list_my_evaluations(&state.db, &auth_user.caller())
        .await
        .map_err(engine_error)?;

    let evaluations: Vec<EvaluationDetails> = details.into_iter().map(Into::into).collect();
    let total = evaluations.len();
    Ok(Json(EvaluationList { evaluations, total }))
}

/// Groups still waiting for the caller's evaluation
#[utoipa::path(
    get,
    path = "/api/evaluations/pending",
    params(PeriodQuery),
    responses(
        (status = 200, description = "Groups with a professor not yet evaluated", body = GroupList),
        (status = 403, description = "Caller is not a student", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "evaluations"
)]
pub async fn pending_evaluations(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<PeriodQuery>,
) -> Result<Json<GroupList>, ApiError> {
    let groups = history::pending_evaluations(&state.db, &auth_user.caller(), query.period_id)
        .await
        .map_err(engine_error)?;

    let groups: Vec<_> = groups.into_iter().map(Into::into).collect();
    let total = groups.len();
    Ok(Json(GroupList { groups, total }))
}

/// Questions that make up the evaluation form
///
/// Global questions plus those scoped to the career of `course_id`, or of
/// the calling student when no course is given.
#[utoipa::path(
    get,
    path = "/api/evaluations/questions",
    params(QuestionQuery),
    responses(
        (status = 200, description = "Ordered applicable questions", body = QuestionList),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "evaluations"
)]
pub async fn evaluation_questions(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<QuestionQuery>,
) -> Result<Json<QuestionList>, ApiError> {
    debug!("Resolving questions for {} (course {:?})", auth_user.email, query.course_id);

    let views = questions::questions_for(&state.db, &auth_user.caller(), query.course_id)
        .await
        .map_err(engine_error)?;

    let questions: Vec<Question> = views.into_iter().map(Into::into).collect();
    let total = questions.len();
    Ok(Json(QuestionList { questions, total }))
}

/// One evaluation with its answers
#[utoipa::path(
    get,
    path = "/api/evaluations/{id}",
    params(
        ("id" = Uuid, Path, description = "Evaluation ID")
    ),
    responses(
        (status = 200, description = "Evaluation detail", body = EvaluationDetails),
        (status = 403, description = "Not the owning student nor staff", body = ErrorResponse),
        (status = 404, description = "Evaluation not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "evaluations"
)]
pub async fn get_evaluation(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<EvaluationDetails>, ApiError> {
    let detail = history::evaluation_detail(&state.db, &auth_user.caller(), id)
        .await
        .map_err(engine_error)?;

    Ok(Json(detail.into()))
}
