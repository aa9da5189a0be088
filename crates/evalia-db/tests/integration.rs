//! Integration tests for evalia-db
//!
//! Exercises the schema against a real SQLite in-memory database

use chrono::Utc;
use evalia_db::{
    connect,
    entities::{
        academic_period, career, class_group, course, enrollment, evaluation, evaluation_answer,
        professor, question, question_category, student,
        user::{self, UserRole},
    },
    migrate,
};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    Set, SqlErr,
};
use uuid::Uuid;

async fn setup_test_db() -> DatabaseConnection {
    let db = connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    migrate(&db).await.expect("Failed to run migrations");

    db
}

async fn insert_user(db: &DatabaseConnection, email: &str, role: UserRole) -> user::Model {
    user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set("plaintext".to_string()),
        given_name: Set("Test".to_string()),
        family_name: Set("User".to_string()),
        role: Set(role),
        active: Set(true),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("Failed to insert user")
}

/// Everything needed to insert an evaluation row
struct Fixture {
    student_id: Uuid,
    professor_id: Uuid,
    group_id: Uuid,
    period_id: Uuid,
    question_id: Uuid,
}

async fn seed(db: &DatabaseConnection) -> Fixture {
    let career = career::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Computer Science".to_string()),
        code: Set("CS".to_string()),
        active: Set(true),
    }
    .insert(db)
    .await
    .unwrap();

    let course = course::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Data Structures".to_string()),
        code: Set("CS201".to_string()),
        credits: Set(4),
        career_id: Set(career.id),
        active: Set(true),
    }
    .insert(db)
    .await
    .unwrap();

    let period = academic_period::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Second term 2025".to_string()),
        code: Set("2025-2".to_string()),
        active: Set(true),
    }
    .insert(db)
    .await
    .unwrap();

    let group = class_group::ActiveModel {
        id: Set(Uuid::new_v4()),
        course_id: Set(course.id),
        period_id: Set(period.id),
        section_number: Set(1),
        schedule: Set(None),
        room: Set(None),
        capacity: Set(Some(30)),
        active: Set(true),
    }
    .insert(db)
    .await
    .unwrap();

    let student_user = insert_user(db, "student@uni.edu", UserRole::Student).await;
    let student = student::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(student_user.id),
        student_code: Set(Some("S-001".to_string())),
        career_id: Set(career.id),
        semester: Set(Some(3)),
        active: Set(true),
    }
    .insert(db)
    .await
    .unwrap();

    let professor_user = insert_user(db, "prof@uni.edu", UserRole::Professor).await;
    let professor = professor::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(professor_user.id),
        employee_code: Set(None),
        department: Set(Some("Computing".to_string())),
        active: Set(true),
    }
    .insert(db)
    .await
    .unwrap();

    let category = question_category::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Clarity".to_string()),
        description: Set(None),
        position: Set(1),
        active: Set(true),
    }
    .insert(db)
    .await
    .unwrap();

    let question = question::ActiveModel {
        id: Set(Uuid::new_v4()),
        category_id: Set(category.id),
        text: Set("Explains concepts clearly".to_string()),
        description: Set(None),
        response_type: Set(question::ResponseType::Rating),
        options: Set(None),
        required: Set(true),
        display_order: Set(1),
        career_id: Set(None),
        active: Set(true),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .unwrap();

    Fixture {
        student_id: student.id,
        professor_id: professor.id,
        group_id: group.id,
        period_id: period.id,
        question_id: question.id,
    }
}

fn evaluation_row(f: &Fixture) -> evaluation::ActiveModel {
    evaluation::ActiveModel {
        id: Set(Uuid::new_v4()),
        student_id: Set(f.student_id),
        professor_id: Set(f.professor_id),
        group_id: Set(f.group_id),
        period_id: Set(f.period_id),
        comments: Set(None),
        completed: Set(true),
        average_rating: Set(Some(5.0)),
        started_at: Set(Utc::now()),
        completed_at: Set(Some(Utc::now())),
    }
}

#[tokio::test]
async fn test_database_connection() {
    let db = connect("sqlite::memory:").await.expect("Failed to connect");

    let backend = db.get_database_backend();
    assert!(matches!(backend, sea_orm::DatabaseBackend::Sqlite));
}

#[tokio::test]
async fn test_migrations_run_successfully() {
    let db = connect("sqlite::memory:").await.expect("Failed to connect");

    assert!(migrate(&db).await.is_ok());
    // Running again is a no-op
    assert!(migrate(&db).await.is_ok());
}

#[tokio::test]
async fn test_user_email_is_unique() {
    let db = setup_test_db().await;

    insert_user(&db, "dup@uni.edu", UserRole::Student).await;

    let err = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set("dup@uni.edu".to_string()),
        password_hash: Set("x".to_string()),
        given_name: Set("Other".to_string()),
        family_name: Set("User".to_string()),
        role: Set(UserRole::Professor),
        active: Set(true),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    }
    .insert(&db)
    .await
    .expect_err("duplicate email must be rejected");

    assert!(matches!(
        err.sql_err(),
        Some(SqlErr::UniqueConstraintViolation(_))
    ));
}

#[tokio::test]
async fn test_evaluation_tuple_is_unique() {
    let db = setup_test_db().await;
    let fixture = seed(&db).await;

    evaluation_row(&fixture)
        .insert(&db)
        .await
        .expect("first evaluation inserts");

    let err = evaluation_row(&fixture)
        .insert(&db)
        .await
        .expect_err("second evaluation for the same tuple must fail");

    assert!(matches!(
        err.sql_err(),
        Some(SqlErr::UniqueConstraintViolation(_))
    ));
    assert_eq!(evaluation::Entity::find().count(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn test_answers_are_removed_with_their_evaluation() {
    let db = setup_test_db().await;
    let fixture = seed(&db).await;

    let header = evaluation_row(&fixture).insert(&db).await.unwrap();

    evaluation_answer::ActiveModel {
        id: Set(Uuid::new_v4()),
        evaluation_id: Set(header.id),
        question_id: Set(fixture.question_id),
        rating: Set(Some(5)),
        text_answer: Set(None),
        selected_option: Set(None),
    }
    .insert(&db)
    .await
    .unwrap();

    assert_eq!(evaluation_answer::Entity::find().count(&db).await.unwrap(), 1);

    header.delete(&db).await.unwrap();

    assert_eq!(evaluation_answer::Entity::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_rating_outside_scale_is_rejected() {
    let db = setup_test_db().await;
    let fixture = seed(&db).await;
    let header = evaluation_row(&fixture).insert(&db).await.unwrap();

    let result = evaluation_answer::ActiveModel {
        id: Set(Uuid::new_v4()),
        evaluation_id: Set(header.id),
        question_id: Set(fixture.question_id),
        rating: Set(Some(9)),
        text_answer: Set(None),
        selected_option: Set(None),
    }
    .insert(&db)
    .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_answer_must_reference_existing_question() {
    let db = setup_test_db().await;
    let fixture = seed(&db).await;
    let header = evaluation_row(&fixture).insert(&db).await.unwrap();

    let result = evaluation_answer::ActiveModel {
        id: Set(Uuid::new_v4()),
        evaluation_id: Set(header.id),
        question_id: Set(Uuid::new_v4()),
        rating: Set(Some(3)),
        text_answer: Set(None),
        selected_option: Set(None),
    }
    .insert(&db)
    .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_student_enrolled_in_group_at_most_once() {
    let db = setup_test_db().await;
    let fixture = seed(&db).await;

    let row = || enrollment::ActiveModel {
        student_id: Set(fixture.student_id),
        group_id: Set(fixture.group_id),
        active: Set(true),
        enrolled_at: Set(Utc::now()),
    };

    row().insert(&db).await.expect("first enrollment inserts");
    assert!(row().insert(&db).await.is_err());
}

#[tokio::test]
async fn test_question_options_roundtrip_as_json() {
    let db = setup_test_db().await;
    let fixture = seed(&db).await;

    let stored = question::Entity::find_by_id(fixture.question_id)
        .one(&db)
        .await
        .unwrap()
        .expect("question exists");
    assert!(stored.option_list().is_empty());

    let mut active: question::ActiveModel = stored.into();
    active.response_type = Set(question::ResponseType::MultipleChoice);
    active.options = Set(Some(r#"["Always","Sometimes","Never"]"#.to_string()));
    let updated = active.update(&db).await.unwrap();

    assert_eq!(
        updated.option_list(),
        vec!["Always".to_string(), "Sometimes".to_string(), "Never".to_string()]
    );
}
