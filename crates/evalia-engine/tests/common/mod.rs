//! Shared fixture: one career, one course with two groups in period 2025-2,
//! a professor teaching both groups and a student enrolled in the first one

#![allow(dead_code)]

use chrono::Utc;
use evalia_db::entities::{
    academic_period, career, class_group, course, enrollment, professor,
    question::{self, ResponseType},
    question_category, student, teaching_assignment,
    user::{self, UserRole},
};
use evalia_engine::{submission::AnswerInput, Caller};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use uuid::Uuid;

pub struct Campus {
    pub db: DatabaseConnection,
    pub career_id: Uuid,
    pub other_career_id: Uuid,
    pub course_id: Uuid,
    pub period_id: Uuid,
    pub group_id: Uuid,
    pub other_group_id: Uuid,
    pub student: Caller,
    pub student_id: Uuid,
    pub professor: Caller,
    pub professor_id: Uuid,
    pub dean: Caller,
    pub clarity_id: Uuid,
    pub rating_questions: Vec<Uuid>,
    pub comment_question: Uuid,
}

pub async fn setup_test_db() -> DatabaseConnection {
    let db = evalia_db::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");
    evalia_db::migrate(&db)
        .await
        .expect("Failed to run migrations");
    db
}

pub async fn insert_user(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
    role: UserRole,
) -> user::Model {
    user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set(password.to_string()),
        given_name: Set("Test".to_string()),
        family_name: Set(email.split('@').next().unwrap_or("user").to_string()),
        role: Set(role),
        active: Set(true),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("Failed to insert user")
}

pub fn caller_for(user: &user::Model) -> Caller {
    Caller::new(user.id, user.email.clone(), user.role)
}

pub async fn insert_career(db: &DatabaseConnection, code: &str) -> career::Model {
    career::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(format!("Career {code}")),
        code: Set(code.to_string()),
        active: Set(true),
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn insert_group(
    db: &DatabaseConnection,
    course_id: Uuid,
    period_id: Uuid,
    section: i32,
) -> class_group::Model {
    class_group::ActiveModel {
        id: Set(Uuid::new_v4()),
        course_id: Set(course_id),
        period_id: Set(period_id),
        section_number: Set(section),
        schedule: Set(Some("Mon 08:00-10:00".to_string())),
        room: Set(Some("B-204".to_string())),
        capacity: Set(Some(35)),
        active: Set(true),
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn assign(db: &DatabaseConnection, professor_id: Uuid, group_id: Uuid) {
    teaching_assignment::ActiveModel {
        id: Set(Uuid::new_v4()),
        professor_id: Set(professor_id),
        group_id: Set(group_id),
        active: Set(true),
    }
    .insert(db)
    .await
    .unwrap();
}

pub async fn enroll(db: &DatabaseConnection, student_id: Uuid, group_id: Uuid) {
    enrollment::ActiveModel {
        student_id: Set(student_id),
        group_id: Set(group_id),
        active: Set(true),
        enrolled_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .unwrap();
}

pub async fn insert_category(db: &DatabaseConnection, name: &str, position: i32) -> Uuid {
    question_category::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        description: Set(None),
        position: Set(position),
        active: Set(true),
    }
    .insert(db)
    .await
    .unwrap()
    .id
}

pub async fn insert_question(
    db: &DatabaseConnection,
    category_id: Uuid,
    response_type: ResponseType,
    required: bool,
    display_order: i32,
    career_id: Option<Uuid>,
) -> Uuid {
    question::ActiveModel {
        id: Set(Uuid::new_v4()),
        category_id: Set(category_id),
        text: Set(format!("Question {display_order}")),
        description: Set(None),
        response_type: Set(response_type),
        options: Set(None),
        required: Set(required),
        display_order: Set(display_order),
        career_id: Set(career_id),
        active: Set(true),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .unwrap()
    .id
}

pub async fn add_student(
    db: &DatabaseConnection,
    email: &str,
    career_id: Uuid,
) -> (Caller, Uuid) {
    let user = insert_user(db, email, "password123", UserRole::Student).await;
    let record = student::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.id),
        student_code: Set(None),
        career_id: Set(career_id),
        semester: Set(Some(4)),
        active: Set(true),
    }
    .insert(db)
    .await
    .unwrap();
    (caller_for(&user), record.id)
}

pub async fn add_professor(db: &DatabaseConnection, email: &str) -> (Caller, Uuid) {
    let user = insert_user(db, email, "password123", UserRole::Professor).await;
    let record = professor::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.id),
        employee_code: Set(None),
        department: Set(Some("Computing".to_string())),
        active: Set(true),
    }
    .insert(db)
    .await
    .unwrap();
    (caller_for(&user), record.id)
}

pub async fn campus() -> Campus {
    let db = setup_test_db().await;

    let career = insert_career(&db, "CS").await;
    let other_career = insert_career(&db, "EE").await;

    let course = course::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Data Structures".to_string()),
        code: Set("CS201".to_string()),
        credits: Set(4),
        career_id: Set(career.id),
        active: Set(true),
    }
    .insert(&db)
    .await
    .unwrap();

    let period = academic_period::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Second term 2025".to_string()),
        code: Set("2025-2".to_string()),
        active: Set(true),
    }
    .insert(&db)
    .await
    .unwrap();

    let group = insert_group(&db, course.id, period.id, 1).await;
    let other_group = insert_group(&db, course.id, period.id, 2).await;

    let (professor, professor_id) = add_professor(&db, "prof@uni.edu").await;
    assign(&db, professor_id, group.id).await;
    assign(&db, professor_id, other_group.id).await;

    let (student, student_id) = add_student(&db, "student@uni.edu", career.id).await;
    enroll(&db, student_id, group.id).await;

    let dean = caller_for(&insert_user(&db, "dean@uni.edu", "password123", UserRole::Dean).await);

    let clarity_id = insert_category(&db, "Clarity", 1).await;
    let mut rating_questions = Vec::new();
    for order in 1..=5 {
        rating_questions.push(
            insert_question(&db, clarity_id, ResponseType::Rating, true, order, None).await,
        );
    }
    let comment_question =
        insert_question(&db, clarity_id, ResponseType::Text, false, 6, None).await;

    Campus {
        db,
        career_id: career.id,
        other_career_id: other_career.id,
        course_id: course.id,
        period_id: period.id,
        group_id: group.id,
        other_group_id: other_group.id,
        student,
        student_id,
        professor,
        professor_id,
        dean,
        clarity_id,
        rating_questions,
        comment_question,
    }
}

/// One rating answer per required question, in order
pub fn rating_answers(campus: &Campus, ratings: &[i32]) -> Vec<AnswerInput> {
    campus
        .rating_questions
        .iter()
        .zip(ratings)
        .map(|(&question_id, &rating)| AnswerInput {
            question_id,
            rating: Some(rating),
            ..Default::default()
        })
        .collect()
}
