pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod session;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{delete, get, patch, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use sea_orm::DatabaseConnection;

/// Application state shared across handlers
pub struct AppState {
    pub db: DatabaseConnection,
    pub allow_signup: bool,
    /// HMAC secret used to sign session tokens
    pub jwt_secret: String,
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Evalia API",
        version = "0.1.0",
        description = "REST API for student evaluations of university professors"
    ),
    modifiers(&BearerAuth),
    paths(
        handlers::system::health_check,
        handlers::auth::auth_config,
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::get_current_user,
        handlers::auth::change_password,
        handlers::users::create_user,
        handlers::users::deactivate_user,
        handlers::catalog::list_careers,
        handlers::catalog::list_career_courses,
        handlers::catalog::list_course_groups,
        handlers::catalog::list_periods,
        handlers::catalog::get_group,
        handlers::professors::list_professors,
        handlers::professors::my_groups,
        handlers::professors::professor_statistics,
        handlers::professors::professor_comments,
        handlers::questions::list_questions,
        handlers::questions::create_question,
        handlers::questions::update_question,
        handlers::questions::delete_question,
        handlers::questions::list_categories,
        handlers::questions::create_category,
        handlers::evaluations::submit_evaluation,
        handlers::evaluations::list_my_evaluations,
        handlers::evaluations::pending_evaluations,
        handlers::evaluations::evaluation_questions,
        handlers::evaluations::get_evaluation,
    ),
    components(
        schemas(
            models::HealthResponse,
            models::ErrorResponse,
            models::FieldError,
            models::AuthConfig,
            models::RegisterRequest,
            models::RegisterResponse,
            models::LoginRequest,
            models::LoginResponse,
            models::ChangePasswordRequest,
            models::User,
            models::ProfessorProfile,
            models::StudentProfile,
            models::Career,
            models::CareerList,
            models::Course,
            models::CourseList,
            models::Period,
            models::PeriodList,
            models::Professor,
            models::ProfessorList,
            models::Group,
            models::GroupList,
            models::Question,
            models::QuestionList,
            models::CreateQuestionRequest,
            models::UpdateQuestionRequest,
            models::QuestionCategory,
            models::QuestionCategoryList,
            models::CreateCategoryRequest,
            models::AnswerRequest,
            models::SubmitEvaluationRequest,
            models::Evaluation,
            models::Answer,
            models::EvaluationDetails,
            models::EvaluationList,
            models::Comment,
            models::CommentList,
            models::CourseStatistics,
            models::CategoryStatistics,
            models::PeriodStatistics,
            models::ProfessorStatisticsResponse,
        )
    ),
    tags(
        (name = "auth", description = "Registration, login and session endpoints"),
        (name = "users", description = "Administrator account management"),
        (name = "catalog", description = "Careers, courses, periods and groups"),
        (name = "professors", description = "Professor listings, statistics and comments"),
        (name = "questions", description = "Question bank curation"),
        (name = "evaluations", description = "Evaluation submission and history"),
        (name = "system", description = "System health and info endpoints")
    )
)]
struct ApiDoc;

/// API server configuration
pub struct ApiServerConfig {
    /// Address to bind the API server
    pub bind_addr: SocketAddr,
    /// Enable CORS for browser clients
    pub enable_cors: bool,
    /// Allowed CORS origins (if None, local development origins are allowed)
    pub cors_origins: Option<Vec<String>>,
    /// JWT secret for signing session tokens
    pub jwt_secret: String,
}

/// API Server
pub struct ApiServer {
    config: ApiServerConfig,
    state: Arc<AppState>,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(config: ApiServerConfig, db: DatabaseConnection, allow_signup: bool) -> Self {
        let state = Arc::new(AppState {
            db,
            allow_signup,
            jwt_secret: config.jwt_secret.clone(),
        });

        Self { config, state }
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let api_doc = ApiDoc::openapi();

        let jwt_state = Arc::new(middleware::JwtState::new(self.config.jwt_secret.as_bytes()));

        // Build PUBLIC routes (no authentication required)
        let public_router = Router::new()
            .route("/api/health", get(handlers::health_check))
            .route("/api/auth/config", get(handlers::auth_config))
            .route("/api/auth/register", post(handlers::register))
            .route("/api/auth/login", post(handlers::login))
            .route("/api/auth/logout", post(handlers::logout))
            .route("/api/careers", get(handlers::list_careers))
            .with_state(self.state.clone());

        // Build PROTECTED routes (require session token authentication)
        let protected_router = Router::new()
            .route("/api/auth/me", get(handlers::get_current_user))
            .route("/api/auth/password", post(handlers::change_password))
            .route("/api/users", post(handlers::create_user))
            .route("/api/users/{id}", delete(handlers::deactivate_user))
            // Catalog
            .route(
                "/api/careers/{id}/courses",
                get(handlers::list_career_courses),
            )
            .route("/api/courses/{id}/groups", get(handlers::list_course_groups))
            .route("/api/periods", get(handlers::list_periods))
            .route("/api/groups/{id}", get(handlers::get_group))
            // Professors
            .route("/api/professors", get(handlers::list_professors))
            .route("/api/professors/me/groups", get(handlers::my_groups))
            .route(
                "/api/professors/{id}/statistics",
                get(handlers::professor_statistics),
            )
            .route(
                "/api/professors/{id}/comments",
                get(handlers::professor_comments),
            )
            // Question bank
            .route(
                "/api/questions",
                get(handlers::list_questions).post(handlers::create_question),
            )
            .route(
                "/api/questions/{id}",
                patch(handlers::update_question).delete(handlers::delete_question),
            )
            .route(
                "/api/question-categories",
                get(handlers::list_categories).post(handlers::create_category),
            )
            // Evaluations
            .route(
                "/api/evaluations",
                get(handlers::list_my_evaluations).post(handlers::submit_evaluation),
            )
            .route(
                "/api/evaluations/pending",
                get(handlers::pending_evaluations),
            )
            .route(
                "/api/evaluations/questions",
                get(handlers::evaluation_questions),
            )
            .route(
                "/api/evaluations/preguntas",
                get(handlers::evaluation_questions),
            )
            .route("/api/evaluations/{id}", get(handlers::get_evaluation))
            .with_state(self.state.clone())
            .layer(axum_middleware::from_fn_with_state(
                jwt_state.clone(),
                middleware::require_auth,
            ));

        let api_router = public_router.merge(protected_router);

        // SwaggerUi serves the document at /api/openapi.json
        let router = Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", api_doc))
            .merge(api_router);

        let mut router = router.layer(TraceLayer::new_for_http());

        if self.config.enable_cors {
            router = router.layer(self.cors_layer());
        }

        router
    }

    fn cors_layer(&self) -> CorsLayer {
        // Cookie sessions need credentials, which rules out a wildcard origin
        let allow_origin = match &self.config.cors_origins {
            Some(origins) => {
                let origins: Vec<HeaderValue> = origins
                    .iter()
                    .filter_map(|o| match HeaderValue::from_str(o) {
                        Ok(value) => Some(value),
                        Err(_) => {
                            warn!("Ignoring invalid CORS origin: {}", o);
                            None
                        }
                    })
                    .collect();
                AllowOrigin::list(origins)
            }
            None => AllowOrigin::predicate(|origin: &HeaderValue, _| {
                let origin_str = origin.to_str().unwrap_or("");
                origin_str.starts_with("http://localhost:")
                    || origin_str.starts_with("http://127.0.0.1:")
                    || origin_str.starts_with("https://localhost:")
                    || origin_str.starts_with("https://127.0.0.1:")
            }),
        };

        CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::PATCH,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
            .allow_credentials(true)
            .allow_origin(allow_origin)
    }

    /// Start the API server
    pub async fn start(self) -> Result<(), anyhow::Error> {
        let router = self.build_router();

        info!("Starting API server on {}", self.config.bind_addr);
        info!(
            "OpenAPI spec: http://{}/api/openapi.json",
            self.config.bind_addr
        );
        info!("Swagger UI: http://{}/swagger-ui", self.config.bind_addr);

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        axum::serve(listener, router)
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_generation() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/api/evaluations"));
        assert!(doc.paths.paths.contains_key("/api/professors/{id}/statistics"));
        let schemes = doc.components.map(|c| c.security_schemes).unwrap_or_default();
        assert!(schemes.contains_key("bearer_auth"));
    }
}
