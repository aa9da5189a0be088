use chrono::{DateTime, Utc};
use evalia_db::entities::{
    academic_period, career, course, question::ResponseType, question_category, user::UserRole,
};
use evalia_engine::{
    accounts::Profile,
    catalog::{GroupSummary, ProfessorSummary},
    history::{AnswerDetail, CommentEntry, EvaluationDetail},
    questions::QuestionView,
    statistics::{CategoryBreakdown, CourseBreakdown, PeriodBreakdown, ProfessorStatistics},
    FieldIssue,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Per-field problems for validation failures
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<FieldError>,
}

/// One invalid input field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl From<FieldIssue> for FieldError {
    fn from(issue: FieldIssue) -> Self {
        Self {
            field: issue.field,
            message: issue.message,
        }
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Authentication settings the login page needs before a session exists
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthConfig {
    /// Whether public registration is enabled
    pub signup_enabled: bool,
    /// Roles that may self-register
    pub self_service_roles: Vec<String>,
}

/// User registration request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// User email address (must be unique)
    pub email: String,
    /// User password (minimum 8 characters)
    pub password: String,
    pub given_name: String,
    pub family_name: String,
    /// Role; synonyms such as `profesor` or `docente` are accepted
    #[schema(value_type = String, example = "student")]
    pub role: UserRole,
    /// Students only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_code: Option<String>,
    /// Students only (required)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub career_id: Option<Uuid>,
    /// Students only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semester: Option<i32>,
    /// Professors only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_code: Option<String>,
    /// Professors only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

/// User registration response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    /// Newly created user
    pub user: User,
    /// Session token
    pub token: String,
    /// Token expiration timestamp
    pub expires_at: DateTime<Utc>,
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// Logged in user
    pub user: User,
    /// Session token
    pub token: String,
    /// Token expiration timestamp
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// User information
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// User UUID
    pub id: Uuid,
    /// User email
    pub email: String,
    pub given_name: String,
    pub family_name: String,
    /// User role
    #[schema(value_type = String, example = "professor")]
    pub role: UserRole,
    /// Whether the account is active
    pub is_active: bool,
    /// When the user was created
    pub created_at: DateTime<Utc>,
    /// Professor extension, when the user teaches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub professor: Option<ProfessorProfile>,
    /// Student extension, when the user studies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student: Option<StudentProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfessorProfile {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StudentProfile {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_code: Option<String>,
    pub career_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semester: Option<i32>,
}

impl From<Profile> for User {
    fn from(profile: Profile) -> Self {
        let Profile {
            user,
            professor,
            student,
        } = profile;

        Self {
            id: user.id,
            email: user.email,
            given_name: user.given_name,
            family_name: user.family_name,
            role: user.role,
            is_active: user.active,
            created_at: user.created_at,
            professor: professor.map(|p| ProfessorProfile {
                id: p.id,
                employee_code: p.employee_code,
                department: p.department,
            }),
            student: student.map(|s| StudentProfile {
                id: s.id,
                student_code: s.student_code,
                career_id: s.career_id,
                semester: s.semester,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Career {
    pub id: Uuid,
    pub name: String,
    pub code: String,
}

impl From<career::Model> for Career {
    fn from(model: career::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            code: model.code,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CareerList {
    pub careers: Vec<Career>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Course {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub credits: i32,
    pub career_id: Uuid,
}

impl From<course::Model> for Course {
    fn from(model: course::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            code: model.code,
            credits: model.credits,
            career_id: model.career_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CourseList {
    pub courses: Vec<Course>,
    pub total: usize,
}

/// Academic period, e.g. "2025-2"
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Period {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub active: bool,
}

impl From<academic_period::Model> for Period {
    fn from(model: academic_period::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            code: model.code,
            active: model.active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PeriodList {
    pub periods: Vec<Period>,
    pub total: usize,
}

/// Professor as shown to other users
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Professor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

impl From<ProfessorSummary> for Professor {
    fn from(summary: ProfessorSummary) -> Self {
        Self {
            id: summary.id,
            user_id: summary.user_id,
            full_name: summary.full_name,
            email: summary.email,
            department: summary.department,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfessorList {
    pub professors: Vec<Professor>,
    pub total: usize,
}

/// A section of a course in one period
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Group {
    pub id: Uuid,
    pub section_number: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i32>,
    pub course: Course,
    pub period: Period,
    /// Assigned professor, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub professor: Option<Professor>,
}

impl From<GroupSummary> for Group {
    fn from(summary: GroupSummary) -> Self {
        Self {
            id: summary.group.id,
            section_number: summary.group.section_number,
            schedule: summary.group.schedule,
            room: summary.group.room,
            capacity: summary.group.capacity,
            course: summary.course.into(),
            period: summary.period.into(),
            professor: summary.professor.map(Into::into),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GroupList {
    pub groups: Vec<Group>,
    pub total: usize,
}

/// Optional period filter
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PeriodQuery {
    /// Restrict to one academic period
    pub period_id: Option<Uuid>,
}

// ---------------------------------------------------------------------------
// Question bank
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Question {
    pub id: Uuid,
    pub category_id: Uuid,
    pub category_name: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// rating, text or multiple_choice
    #[schema(value_type = String, example = "rating")]
    pub response_type: ResponseType,
    /// Option labels (multiple choice only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    pub required: bool,
    pub display_order: i32,
    /// Career scope; absent for global questions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub career_id: Option<Uuid>,
    pub active: bool,
}

impl From<QuestionView> for Question {
    fn from(view: QuestionView) -> Self {
        let options = view.options();
        let QuestionView { question, category } = view;

        Self {
            id: question.id,
            category_id: category.id,
            category_name: category.name,
            text: question.text,
            description: question.description,
            response_type: question.response_type,
            options,
            required: question.required,
            display_order: question.display_order,
            career_id: question.career_id,
            active: question.active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuestionList {
    pub questions: Vec<Question>,
    pub total: usize,
}

/// Course whose career decides the question set
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QuestionQuery {
    pub course_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateQuestionRequest {
    pub category_id: Uuid,
    pub text: String,
    #[serde(default)]
    pub description: Option<String>,
    #[schema(value_type = String, example = "rating")]
    pub response_type: ResponseType,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub display_order: i32,
    /// Leave empty for a global question
    #[serde(default)]
    pub career_id: Option<Uuid>,
}

fn default_required() -> bool {
    true
}

/// Partial question update
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateQuestionRequest {
    pub category_id: Option<Uuid>,
    pub text: Option<String>,
    pub description: Option<String>,
    pub options: Option<Vec<String>>,
    pub required: Option<bool>,
    pub display_order: Option<i32>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuestionCategory {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub position: i32,
}

impl From<question_category::Model> for QuestionCategory {
    fn from(model: question_category::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            position: model.position,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuestionCategoryList {
    pub categories: Vec<QuestionCategory>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub position: i32,
}

// ---------------------------------------------------------------------------
// Evaluations
// ---------------------------------------------------------------------------

/// One answer; set exactly the field matching the question's type
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnswerRequest {
    pub question_id: Uuid,
    /// 1 to 5, for rating questions
    #[serde(default)]
    pub rating: Option<i32>,
    /// For text questions
    #[serde(default)]
    pub text: Option<String>,
    /// For multiple choice questions
    #[serde(default)]
    pub option: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmitEvaluationRequest {
    pub professor_id: Uuid,
    pub group_id: Uuid,
    pub period_id: Uuid,
    #[serde(default)]
    pub comments: Option<String>,
    pub answers: Vec<AnswerRequest>,
}

/// Evaluation header
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Evaluation {
    pub id: Uuid,
    pub professor_id: Uuid,
    pub group_id: Uuid,
    pub period_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    pub completed: bool,
    /// Mean of the rating answers; absent when none were given
    pub average_rating: Option<f64>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<evalia_db::entities::evaluation::Model> for Evaluation {
    fn from(model: evalia_db::entities::evaluation::Model) -> Self {
        Self {
            id: model.id,
            professor_id: model.professor_id,
            group_id: model.group_id,
            period_id: model.period_id,
            comments: model.comments,
            completed: model.completed,
            average_rating: model.average_rating,
            started_at: model.started_at,
            completed_at: model.completed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Answer {
    pub question_id: Uuid,
    pub question_text: String,
    pub category_name: String,
    #[schema(value_type = String, example = "rating")]
    pub response_type: ResponseType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option: Option<String>,
}

impl From<AnswerDetail> for Answer {
    fn from(detail: AnswerDetail) -> Self {
        Self {
            question_id: detail.answer.question_id,
            question_text: detail.question_text,
            category_name: detail.category_name,
            response_type: detail.response_type,
            rating: detail.answer.rating,
            text: detail.answer.text_answer,
            option: detail.answer.selected_option,
        }
    }
}

/// Evaluation with professor, course, period and answers
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EvaluationDetails {
    pub evaluation: Evaluation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub professor: Option<Professor>,
    pub course: Course,
    pub period: Period,
    pub section_number: i32,
    pub answers: Vec<Answer>,
}

impl From<EvaluationDetail> for EvaluationDetails {
    fn from(detail: EvaluationDetail) -> Self {
        Self {
            evaluation: detail.evaluation.into(),
            professor: detail.professor.map(Into::into),
            course: detail.course.into(),
            period: detail.period.into(),
            section_number: detail.group.section_number,
            answers: detail.answers.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EvaluationList {
    pub evaluations: Vec<EvaluationDetails>,
    pub total: usize,
}

/// Anonymous comment left for a professor
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Comment {
    pub comments: String,
    pub course_name: String,
    pub period_code: String,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<CommentEntry> for Comment {
    fn from(entry: CommentEntry) -> Self {
        Self {
            comments: entry.comments,
            course_name: entry.course_name,
            period_code: entry.period_code,
            completed_at: entry.completed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommentList {
    pub comments: Vec<Comment>,
    pub total: usize,
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatisticsQuery {
    pub period_id: Option<Uuid>,
    pub course_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CourseStatistics {
    pub course_id: Uuid,
    pub course_code: String,
    pub course_name: String,
    pub evaluations: u64,
    pub average_rating: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryStatistics {
    pub category_id: Uuid,
    pub category_name: String,
    pub ratings: u64,
    pub average_rating: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PeriodStatistics {
    pub period_id: Uuid,
    pub period_code: String,
    pub evaluations: u64,
    pub average_rating: Option<f64>,
}

/// Aggregated ratings of one professor
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfessorStatisticsResponse {
    pub professor_id: Uuid,
    pub total_evaluations: u64,
    /// Absent when no rating answers exist
    pub average_rating: Option<f64>,
    pub by_course: Vec<CourseStatistics>,
    pub by_category: Vec<CategoryStatistics>,
    pub by_period: Vec<PeriodStatistics>,
}

impl From<CourseBreakdown> for CourseStatistics {
    fn from(b: CourseBreakdown) -> Self {
        Self {
            course_id: b.course_id,
            course_code: b.course_code,
            course_name: b.course_name,
            evaluations: b.evaluations,
            average_rating: b.average_rating,
        }
    }
}

impl From<CategoryBreakdown> for CategoryStatistics {
    fn from(b: CategoryBreakdown) -> Self {
        Self {
            category_id: b.category_id,
            category_name: b.category_name,
            ratings: b.ratings,
            average_rating: b.average_rating,
        }
    }
}

impl From<PeriodBreakdown> for PeriodStatistics {
    fn from(b: PeriodBreakdown) -> Self {
        Self {
            period_id: b.period_id,
            period_code: b.period_code,
            evaluations: b.evaluations,
            average_rating: b.average_rating,
        }
    }
}

impl From<ProfessorStatistics> for ProfessorStatisticsResponse {
    fn from(stats: ProfessorStatistics) -> Self {
        Self {
            professor_id: stats.professor_id,
            total_evaluations: stats.total_evaluations,
            average_rating: stats.average_rating,
            by_course: stats.by_course.into_iter().map(Into::into).collect(),
            by_category: stats.by_category.into_iter().map(Into::into).collect(),
            by_period: stats.by_period.into_iter().map(Into::into).collect(),
        }
    }
}
