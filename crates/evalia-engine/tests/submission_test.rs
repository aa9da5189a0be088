//! Evaluation submission against a real SQLite database

mod common;

use common::{campus, rating_answers, Campus};
use evalia_db::entities::{evaluation, evaluation_answer, user::UserRole};
use evalia_engine::{
    eligibility::{check_eligibility, EvaluationTarget},
    history,
    submission::{
        submit_evaluation, write_evaluation, AnswerInput, AnswerValue, SubmissionRequest,
        ValidatedAnswer,
    },
    Caller, EngineError,
};
use sea_orm::{EntityTrait, PaginatorTrait};
use uuid::Uuid;

fn request(campus: &Campus, answers: Vec<AnswerInput>) -> SubmissionRequest {
    SubmissionRequest {
        professor_id: campus.professor_id,
        group_id: campus.group_id,
        period_id: campus.period_id,
        comments: None,
        answers,
    }
}

async fn evaluation_count(campus: &Campus) -> u64 {
    evaluation::Entity::find().count(&campus.db).await.unwrap()
}

#[tokio::test]
async fn test_submission_stores_header_and_answers() {
    let campus = campus().await;

    let mut answers = rating_answers(&campus, &[5, 5, 4, 3, 5]);
    answers.push(AnswerInput {
        question_id: campus.comment_question,
        text: Some("Explains with examples".to_string()),
        ..Default::default()
    });
    let mut req = request(&campus, answers);
    req.comments = Some("Great course".to_string());

    let created = submit_evaluation(&campus.db, &campus.student, req)
        .await
        .expect("submission succeeds");

    assert!(created.completed);
    assert!(created.completed_at.is_some());
    assert_eq!(created.student_id, campus.student_id);
    assert_eq!(created.comments.as_deref(), Some("Great course"));
    let average = created.average_rating.expect("ratings were given");
    assert!((average - 4.4).abs() < 1e-9);

    assert_eq!(
        evaluation_answer::Entity::find()
            .count(&campus.db)
            .await
            .unwrap(),
        6
    );
}

#[tokio::test]
async fn test_second_submission_is_already_evaluated() {
    let campus = campus().await;

    submit_evaluation(
        &campus.db,
        &campus.student,
        request(&campus, rating_answers(&campus, &[4, 4, 4, 4, 4])),
    )
    .await
    .unwrap();

    let err = submit_evaluation(
        &campus.db,
        &campus.student,
        request(&campus, rating_answers(&campus, &[1, 1, 1, 1, 1])),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, EngineError::AlreadyEvaluated));
    assert_eq!(evaluation_count(&campus).await, 1);
}

#[tokio::test]
async fn test_concurrent_submissions_only_one_wins() {
    let campus = campus().await;

    let first = request(&campus, rating_answers(&campus, &[5, 4, 3, 2, 1]));
    let second = request(&campus, rating_answers(&campus, &[1, 2, 3, 4, 5]));

    let (a, b) = tokio::join!(
        submit_evaluation(&campus.db, &campus.student, first),
        submit_evaluation(&campus.db, &campus.student, second),
    );

    let outcomes = [a, b];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(EngineError::AlreadyEvaluated))));
    assert_eq!(evaluation_count(&campus).await, 1);
}

#[tokio::test]
async fn test_unique_index_is_the_final_guard() {
    let campus = campus().await;
    let target = EvaluationTarget {
        student_id: campus.student_id,
        professor_id: campus.professor_id,
        group_id: campus.group_id,
        period_id: campus.period_id,
    };
    let answers = vec![ValidatedAnswer {
        question_id: campus.rating_questions[0],
        value: AnswerValue::Rating(3),
    }];

    write_evaluation(&campus.db, &target, None, &answers)
        .await
        .unwrap();

    // bypasses the eligibility pre-check entirely
    let err = write_evaluation(&campus.db, &target, None, &answers)
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::AlreadyEvaluated));
}

#[tokio::test]
async fn test_failed_answer_insert_leaves_no_header() {
    let campus = campus().await;
    let target = EvaluationTarget {
        student_id: campus.student_id,
        professor_id: campus.professor_id,
        group_id: campus.group_id,
        period_id: campus.period_id,
    };
    let answers = vec![
        ValidatedAnswer {
            question_id: campus.rating_questions[0],
            value: AnswerValue::Rating(5),
        },
        // no such question: the foreign key rejects this row
        ValidatedAnswer {
            question_id: Uuid::new_v4(),
            value: AnswerValue::Rating(4),
        },
    ];

    let err = write_evaluation(&campus.db, &target, None, &answers)
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Storage(_)));
    assert_eq!(evaluation_count(&campus).await, 0);
    assert_eq!(
        evaluation_answer::Entity::find()
            .count(&campus.db)
            .await
            .unwrap(),
        0
    );

    // the tuple is still free afterwards
    assert!(check_eligibility(&campus.db, &target).await.is_ok());
}

#[tokio::test]
async fn test_not_enrolled_regardless_of_answers() {
    let campus = campus().await;

    for answers in [
        rating_answers(&campus, &[5, 5, 5, 5, 5]),
        Vec::new(),
        vec![AnswerInput {
            question_id: Uuid::new_v4(),
            rating: Some(42),
            ..Default::default()
        }],
    ] {
        let mut req = request(&campus, answers);
        req.group_id = campus.other_group_id;

        let err = submit_evaluation(&campus.db, &campus.student, req)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotEnrolled), "got {err:?}");
    }

    assert_eq!(evaluation_count(&campus).await, 0);
}

#[tokio::test]
async fn test_missing_required_answer_writes_nothing() {
    let campus = campus().await;

    let err = submit_evaluation(
        &campus.db,
        &campus.student,
        request(&campus, rating_answers(&campus, &[5, 5, 4, 3])),
    )
    .await
    .unwrap_err();

    match err {
        EngineError::Validation(issues) => {
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].field, "answers");
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(evaluation_count(&campus).await, 0);
}

#[tokio::test]
async fn test_professor_must_teach_the_group() {
    let campus = campus().await;
    let (_, stranger_id) = common::add_professor(&campus.db, "other@uni.edu").await;

    let mut req = request(&campus, rating_answers(&campus, &[3, 3, 3, 3, 3]));
    req.professor_id = stranger_id;

    let err = submit_evaluation(&campus.db, &campus.student, req)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(ref issues) if issues[0].field == "professor_id"));
}

#[tokio::test]
async fn test_only_students_submit() {
    let campus = campus().await;

    for caller in [&campus.professor, &campus.dean] {
        let err = submit_evaluation(
            &campus.db,
            caller,
            request(&campus, rating_answers(&campus, &[3, 3, 3, 3, 3])),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EngineError::Forbidden(_)));
    }

    let unknown = Caller::new(Uuid::new_v4(), "ghost@uni.edu", UserRole::Student);
    let err = submit_evaluation(
        &campus.db,
        &unknown,
        request(&campus, rating_answers(&campus, &[3, 3, 3, 3, 3])),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, EngineError::Unauthenticated));
}

#[tokio::test]
async fn test_written_evaluation_reads_back_identically() {
    let campus = campus().await;
    let answers = rating_answers(&campus, &[2, 3, 4, 5, 1]);

    let created = submit_evaluation(&campus.db, &campus.student, request(&campus, answers))
        .await
        .unwrap();

    let listed = history::list_my_evaluations(&campus.db, &campus.student)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);

    let detail = &listed[0];
    assert_eq!(detail.evaluation.id, created.id);
    assert_eq!(detail.course.name, "Data Structures");
    assert_eq!(detail.period.code, "2025-2");
    assert_eq!(
        detail.professor.as_ref().map(|p| p.id),
        Some(campus.professor_id)
    );

    let mut stored: Vec<(Uuid, Option<i32>)> = detail
        .answers
        .iter()
        .map(|a| (a.answer.question_id, a.answer.rating))
        .collect();
    stored.sort();
    let mut submitted: Vec<(Uuid, Option<i32>)> = campus
        .rating_questions
        .iter()
        .copied()
        .zip([2, 3, 4, 5, 1].map(Some))
        .collect();
    submitted.sort();
    assert_eq!(stored, submitted);

    let by_staff = history::evaluation_detail(&campus.db, &campus.dean, created.id)
        .await
        .unwrap();
    assert_eq!(by_staff.answers.len(), 5);

    let err = history::evaluation_detail(&campus.db, &campus.professor, created.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn test_pending_list_shrinks_after_submission() {
    let campus = campus().await;
    common::enroll(&campus.db, campus.student_id, campus.other_group_id).await;

    let pending = history::pending_evaluations(&campus.db, &campus.student, None)
        .await
        .unwrap();
    assert_eq!(pending.len(), 2);

    submit_evaluation(
        &campus.db,
        &campus.student,
        request(&campus, rating_answers(&campus, &[4, 4, 4, 4, 4])),
    )
    .await
    .unwrap();

    let pending = history::pending_evaluations(&campus.db, &campus.student, None)
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].group.id, campus.other_group_id);
}

#[tokio::test]
async fn test_comments_are_anonymous_and_scoped() {
    let campus = campus().await;
    let mut req = request(&campus, rating_answers(&campus, &[5, 5, 5, 5, 5]));
    req.comments = Some("Great course".to_string());
    submit_evaluation(&campus.db, &campus.student, req)
        .await
        .unwrap();

    let own = history::professor_comments(&campus.db, &campus.professor, campus.professor_id, None)
        .await
        .unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].comments, "Great course");
    assert_eq!(own[0].course_name, "Data Structures");

    let (other, _) = common::add_professor(&campus.db, "nosy@uni.edu").await;
    let err = history::professor_comments(&campus.db, &other, campus.professor_id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = history::professor_comments(&campus.db, &campus.student, campus.professor_id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}
