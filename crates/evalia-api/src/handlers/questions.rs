//! Question bank curation

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use evalia_engine::questions::{self, NewCategory, NewQuestion, QuestionChanges};
use std::sync::Arc;
use uuid::Uuid;

use super::json_body;
use crate::error::{engine_error, ApiError};
use crate::extract::ApiPath;
use crate::middleware::AuthUser;
use crate::models::{
    CreateCategoryRequest, CreateQuestionRequest, ErrorResponse, Question, QuestionCategory,
    QuestionCategoryList, QuestionList, UpdateQuestionRequest,
};
use crate::AppState;

/// List every question, inactive ones included
#[utoipa::path(
    get,
    path = "/api/questions",
    responses(
        (status = 200, description = "Full question bank", body = QuestionList),
        (status = 403, description = "Caller is not a coordinator or admin", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "questions"
)]
pub async fn list_questions(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<QuestionList>, ApiError> {
    let views = questions::list_all_questions(&state.db, &auth_user.caller())
        .await
        .map_err(engine_error)?;

    let questions: Vec<Question> = views.into_iter().map(Into::into).collect();
    let total = questions.len();
    Ok(Json(QuestionList { questions, total }))
}

#[utoipa::path(
    post,
    path = "/api/questions",
    request_body = CreateQuestionRequest,
    responses(
        (status = 201, description = "Question created", body = Question),
        (status = 400, description = "Invalid question", body = ErrorResponse),
        (status = 403, description = "Caller is not a coordinator or admin", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "questions"
)]
pub async fn create_question(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    payload: Result<Json<CreateQuestionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Question>), ApiError> {
    let req = json_body(payload)?;
    let input = NewQuestion {
        category_id: req.category_id,
        text: req.text,
        description: req.description,
        response_type: req.response_type,
        options: req.options,
        required: req.required,
        display_order: req.display_order,
        career_id: req.career_id,
    };

    let view = questions::create_question(&state.db, &auth_user.caller(), input)
        .await
        .map_err(engine_error)?;

    Ok((StatusCode::CREATED, Json(view.into())))
}

#[utoipa::path(
    patch,
    path = "/api/questions/{id}",
    params(
        ("id" = Uuid, Path, description = "Question ID")
    ),
    request_body = UpdateQuestionRequest,
    responses(
        (status = 200, description = "Question updated", body = Question),
        (status = 400, description = "Invalid change", body = ErrorResponse),
        (status = 403, description = "Caller is not a coordinator or admin", body = ErrorResponse),
        (status = 404, description = "Question not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "questions"
)]
pub async fn update_question(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    payload: Result<Json<UpdateQuestionRequest>, JsonRejection>,
) -> Result<Json<Question>, ApiError> {
    let req = json_body(payload)?;
    let changes = QuestionChanges {
        category_id: req.category_id,
        text: req.text,
        description: req.description,
        options: req.options,
        required: req.required,
        display_order: req.display_order,
        active: req.active,
    };

    let view = questions::update_question(&state.db, &auth_user.caller(), id, changes)
        .await
        .map_err(engine_error)?;

    Ok(Json(view.into()))
}

/// Deactivate a question; answers keep referencing it
#[utoipa::path(
    delete,
    path = "/api/questions/{id}",
    params(
        ("id" = Uuid, Path, description = "Question ID")
    ),
    responses(
        (status = 204, description = "Question deactivated"),
        (status = 403, description = "Caller is not a coordinator or admin", body = ErrorResponse),
        (status = 404, description = "Question not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "questions"
)]
pub async fn delete_question(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    questions::deactivate_question(&state.db, &auth_user.caller(), id)
        .await
        .map_err(engine_error)?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/question-categories",
    responses(
        (status = 200, description = "Active categories in display order", body = QuestionCategoryList)
    ),
    security(("bearer_auth" = [])),
    tag = "questions"
)]
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<QuestionCategoryList>, ApiError> {
    let categories = questions::list_categories(&state.db)
        .await
        .map_err(engine_error)?;

    let categories: Vec<QuestionCategory> = categories.into_iter().map(Into::into).collect();
    let total = categories.len();
    Ok(Json(QuestionCategoryList { categories, total }))
}

#[utoipa::path(
    post,
    path = "/api/question-categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = QuestionCategory),
        (status = 400, description = "Invalid or duplicate name", body = ErrorResponse),
        (status = 403, description = "Caller is not a coordinator or admin", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "questions"
)]
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    payload: Result<Json<CreateCategoryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<QuestionCategory>), ApiError> {
    let req = json_body(payload)?;
    let input = NewCategory {
        name: req.name,
        description: req.description,
        position: req.position,
    };

    let category = questions::create_category(&state.db, &auth_user.caller(), input)
        .await
        .map_err(engine_error)?;

    Ok((StatusCode::CREATED, Json(category.into())))
}
