//! User accounts: registration, login, profile and deactivation

use chrono::Utc;
use evalia_auth::{check_stored_password, hash_password, PasswordCheck};
use evalia_db::entities::{
    career, professor, student,
    user::{self, UserRole},
};
use sea_orm::{
    sea_query::{Expr, Func, SimpleExpr},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Set, SqlErr, TransactionTrait,
};
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::caller::Caller;
use crate::error::{EngineError, EngineResult, FieldIssue};

/// Roles anyone may sign up for without an administrator
pub const SELF_SERVICE_ROLES: [UserRole; 2] = [UserRole::Student, UserRole::Professor];

/// Input of a registration, role-specific fields included
#[derive(Debug, Clone, Validate)]
pub struct NewAccount {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub given_name: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub family_name: String,
    pub role: UserRole,
    pub student_code: Option<String>,
    pub career_id: Option<Uuid>,
    #[validate(range(min = 1, max = 20, message = "must be between 1 and 20"))]
    pub semester: Option<i32>,
    pub employee_code: Option<String>,
    pub department: Option<String>,
}

impl NewAccount {
    /// Lowercased email and trimmed names, as stored
    pub fn normalized(mut self) -> Self {
        self.email = normalize_email(&self.email);
        self.given_name = self.given_name.trim().to_string();
        self.family_name = self.family_name.trim().to_string();
        self
    }
}

#[derive(Debug, Validate)]
struct NewPassword {
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    password: String,
}

/// A user together with its role extension
#[derive(Debug, Clone)]
pub struct Profile {
    pub user: user::Model,
    pub professor: Option<professor::Model>,
    pub student: Option<student::Model>,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Case-insensitive match on the stored email; imported rows keep their casing
fn email_matches(email: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(user::Column::Email))).eq(normalize_email(email))
}

/// Flattens derived field errors, sorted by field name
fn field_issues(errors: ValidationErrors) -> Vec<FieldIssue> {
    let mut issues: Vec<FieldIssue> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                FieldIssue::new(field.to_string(), message)
            })
        })
        .collect();
    issues.sort_by(|a, b| a.field.cmp(&b.field));
    issues
}

/// Shape checks that need no database access
pub fn validate_new_account(account: &NewAccount) -> Vec<FieldIssue> {
    let normalized = account.clone().normalized();
    let mut issues = match normalized.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => field_issues(errors),
    };

    match account.role {
        UserRole::Student => {
            if account.career_id.is_none() {
                issues.push(FieldIssue::new("career_id", "required for students"));
            }
        }
        _ => {
            if account.career_id.is_some() || account.student_code.is_some() {
                issues.push(FieldIssue::new(
                    "role",
                    "student fields are only accepted for students",
                ));
            }
        }
    }

    issues
}

/// Public self-registration, limited to students and professors
pub async fn register(db: &DatabaseConnection, account: NewAccount) -> EngineResult<Profile> {
    if !SELF_SERVICE_ROLES.contains(&account.role) {
        return Err(EngineError::forbidden(format!(
            "role '{}' cannot be self-registered",
            account.role
        )));
    }

    create(db, account).await
}

/// Administrator-created account of any role
pub async fn create_account(
    db: &DatabaseConnection,
    caller: &Caller,
    account: NewAccount,
) -> EngineResult<Profile> {
    caller.require_any(&[UserRole::Admin])?;
    caller.load_user(db).await?;

    create(db, account).await
}

async fn create(db: &DatabaseConnection, account: NewAccount) -> EngineResult<Profile> {
    EngineError::check(validate_new_account(&account))?;

    let account = account.normalized();

    if user::Entity::find()
        .filter(email_matches(&account.email))
        .one(db)
        .await?
        .is_some()
    {
        return Err(EngineError::EmailTaken);
    }

    if let Some(career_id) = account.career_id {
        let usable = career::Entity::find_by_id(career_id)
            .one(db)
            .await?
            .is_some_and(|c| c.active);
        if !usable {
            return Err(EngineError::validation(
                "career_id",
                "must reference an active career",
            ));
        }
    }

    let password_hash = hash_password(&account.password)?;
    let now = Utc::now();

    let txn = db.begin().await?;

    let user = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(account.email),
        password_hash: Set(password_hash),
        given_name: Set(account.given_name),
        family_name: Set(account.family_name),
        role: Set(account.role),
        active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await
    .map_err(email_conflict)?;

    let mut profile = Profile {
        user,
        professor: None,
        student: None,
    };

    match account.role {
        UserRole::Student => {
            // career_id presence was validated above
            let career_id = account
                .career_id
                .ok_or_else(|| EngineError::validation("career_id", "required for students"))?;
            let record = student::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(profile.user.id),
                student_code: Set(account.student_code),
                career_id: Set(career_id),
                semester: Set(account.semester),
                active: Set(true),
            }
            .insert(&txn)
            .await?;
            profile.student = Some(record);
        }
        UserRole::Professor => {
            let record = professor::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(profile.user.id),
                employee_code: Set(account.employee_code),
                department: Set(account.department),
                active: Set(true),
            }
            .insert(&txn)
            .await?;
            profile.professor = Some(record);
        }
        UserRole::Coordinator | UserRole::Dean | UserRole::Admin => {}
    }

    txn.commit().await?;

    info!(
        "Registered user {} ({}) as {}",
        profile.user.id, profile.user.email, profile.user.role
    );

    Ok(profile)
}

fn email_conflict(err: DbErr) -> EngineError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => EngineError::EmailTaken,
        _ => EngineError::Storage(err),
    }
}

/// Verify credentials and return the profile
///
/// A legacy plaintext password that matches is replaced by an Argon2id hash
/// before this returns, so the plaintext comparison happens at most once.
pub async fn authenticate(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
) -> EngineResult<Profile> {
    let Some(user) = user::Entity::find()
        .filter(email_matches(email))
        .one(db)
        .await?
    else {
        warn!("Login attempt for unknown email {}", normalize_email(email));
        return Err(EngineError::InvalidCredentials);
    };

    let check = check_stored_password(password, &user.password_hash)?;
    if !check.is_accepted() {
        warn!("Wrong password for user {}", user.id);
        return Err(EngineError::InvalidCredentials);
    }

    if !user.active {
        warn!("Login attempt for deactivated user {}", user.id);
        return Err(EngineError::AccountDisabled);
    }

    let user = if check == PasswordCheck::LegacyMatch {
        let mut active: user::ActiveModel = user.into();
        active.password_hash = Set(hash_password(password)?);
        active.updated_at = Set(Utc::now());
        let upgraded = active.update(db).await?;
        info!("Upgraded legacy password of user {}", upgraded.id);
        upgraded
    } else {
        user
    };

    info!("User {} authenticated", user.id);

    load_profile(db, user).await
}

/// Profile of the calling user
pub async fn profile(db: &DatabaseConnection, caller: &Caller) -> EngineResult<Profile> {
    let user = caller.load_user(db).await?;
    debug!("Loading profile of {}", user.id);
    load_profile(db, user).await
}

pub async fn load_profile<C: ConnectionTrait>(conn: &C, user: user::Model) -> EngineResult<Profile> {
    let professor = professor::Entity::find()
        .filter(professor::Column::UserId.eq(user.id))
        .one(conn)
        .await?;
    let student = student::Entity::find()
        .filter(student::Column::UserId.eq(user.id))
        .one(conn)
        .await?;

    Ok(Profile {
        user,
        professor,
        student,
    })
}

pub async fn find_active_user_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> EngineResult<user::Model> {
    user::Entity::find()
        .filter(email_matches(email))
        .filter(user::Column::Active.eq(true))
        .one(db)
        .await?
        .ok_or_else(|| EngineError::not_found("user", normalize_email(email)))
}

pub async fn change_password(
    db: &DatabaseConnection,
    caller: &Caller,
    current_password: &str,
    new_password: &str,
) -> EngineResult<()> {
    let user = caller.load_user(db).await?;

    if !check_stored_password(current_password, &user.password_hash)?.is_accepted() {
        return Err(EngineError::InvalidCredentials);
    }
    if let Err(errors) = (NewPassword {
        password: new_password.to_string(),
    })
    .validate()
    {
        return Err(EngineError::Validation(field_issues(errors)));
    }

    let user_id = user.id;
    let mut active: user::ActiveModel = user.into();
    active.password_hash = Set(hash_password(new_password)?);
    active.updated_at = Set(Utc::now());
    active.update(db).await?;

    info!("User {} changed password", user_id);
    Ok(())
}

/// Soft-delete an account and its role extension
pub async fn deactivate_user(
    db: &DatabaseConnection,
    caller: &Caller,
    user_id: Uuid,
) -> EngineResult<user::Model> {
    caller.require_any(&[UserRole::Admin])?;
    caller.load_user(db).await?;

    if caller.user_id == user_id {
        return Err(EngineError::validation(
            "user_id",
            "administrators cannot deactivate themselves",
        ));
    }

    let user = user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::not_found("user", user_id))?;

    let txn = db.begin().await?;

    let mut active: user::ActiveModel = user.into();
    active.active = Set(false);
    active.updated_at = Set(Utc::now());
    let user = active.update(&txn).await?;

    if let Some(record) = professor::Entity::find()
        .filter(professor::Column::UserId.eq(user_id))
        .one(&txn)
        .await?
    {
        let mut record: professor::ActiveModel = record.into();
        record.active = Set(false);
        record.update(&txn).await?;
    }
    if let Some(record) = student::Entity::find()
        .filter(student::Column::UserId.eq(user_id))
        .one(&txn)
        .await?
    {
        let mut record: student::ActiveModel = record.into();
        record.active = Set(false);
        record.update(&txn).await?;
    }

    txn.commit().await?;

    info!("User {} deactivated by {}", user_id, caller.user_id);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(role: UserRole) -> NewAccount {
        NewAccount {
            email: "Ana.Lopez@Uni.edu ".to_string(),
            password: "correct-horse".to_string(),
            given_name: "Ana".to_string(),
            family_name: "Lopez".to_string(),
            role,
            student_code: None,
            career_id: None,
            semester: None,
            employee_code: None,
            department: None,
        }
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ana.Lopez@Uni.EDU "), "ana.lopez@uni.edu");
    }

    #[test]
    fn test_email_shapes() {
        for bad in ["no-at-sign", "@uni.edu", "a b@uni.edu"] {
            let mut candidate = account(UserRole::Professor);
            candidate.email = bad.to_string();
            let issues = validate_new_account(&candidate);
            assert_eq!(issues, vec![FieldIssue::new("email", "must be a valid email address")]);
        }
    }

    #[test]
    fn test_semester_out_of_range() {
        let mut student = account(UserRole::Student);
        student.career_id = Some(Uuid::new_v4());
        student.semester = Some(21);

        let issues = validate_new_account(&student);
        assert_eq!(issues, vec![FieldIssue::new("semester", "must be between 1 and 20")]);
    }

    #[test]
    fn test_valid_professor_account() {
        assert!(validate_new_account(&account(UserRole::Professor)).is_empty());
    }

    #[test]
    fn test_student_requires_career() {
        let issues = validate_new_account(&account(UserRole::Student));
        assert_eq!(issues, vec![FieldIssue::new("career_id", "required for students")]);

        let mut with_career = account(UserRole::Student);
        with_career.career_id = Some(Uuid::new_v4());
        assert!(validate_new_account(&with_career).is_empty());
    }

    #[test]
    fn test_collects_every_issue() {
        let mut bad = account(UserRole::Dean);
        bad.email = "nope".to_string();
        bad.password = "short".to_string();
        bad.given_name = "  ".to_string();

        let fields: Vec<_> = validate_new_account(&bad)
            .into_iter()
            .map(|issue| issue.field)
            .collect();
        assert_eq!(fields, vec!["email", "given_name", "password"]);
    }

    #[test]
    fn test_student_fields_rejected_for_staff() {
        let mut coordinator = account(UserRole::Coordinator);
        coordinator.career_id = Some(Uuid::new_v4());

        let issues = validate_new_account(&coordinator);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "role");
    }
}
