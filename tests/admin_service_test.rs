mod common;

use assessment_backend::{
    dto::admin_dto::{CandidatePayload, CreateAssessmentRequest, UpdateAssessmentRequest},
    error::Error,
    services::{
        assessment_service::AssessmentService, attempt_service::AttemptService,
        candidate_service::CandidateService, question_service::QuestionService,
        stats_service::StatsService, violation_service::ViolationService,
    },
};
use common::{descriptive, mcq, seed_assessment, seed_candidate};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

async fn stored_totals(pool: &PgPool, assessment_id: Uuid) -> (Decimal, Decimal) {
    sqlx::query_as(
        r#"
        SELECT a.total_marks, COALESCE(SUM(q.marks), 0)
        FROM assessments a
        LEFT JOIN questions q ON q.assessment_id = a.id
        WHERE a.id = $1
        GROUP BY a.total_marks
        "#,
    )
    .bind(assessment_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

#[tokio::test]
async fn total_marks_tracks_question_changes() {
    let Some(pool) = common::test_pool().await else { return };
    let assessment = seed_assessment(&pool, 40, 30, &[]).await;
    assert_eq!(assessment.total_marks, Decimal::ZERO);
    let questions = QuestionService::new(pool.clone());

    let (first, total) = questions
        .add_question(assessment.id, &mcq("Q1", 3, &["a", "b"], "b"))
        .await
        .unwrap();
    assert_eq!(total, Decimal::from(3));
    let (stored, summed) = stored_totals(&pool, assessment.id).await;
    assert_eq!(stored, summed);

    let (inserted, total) = questions
        .bulk_add_questions(
            assessment.id,
            &[descriptive("Q2", 10), mcq("Q3", 2, &["x", "y", "z"], "z")],
        )
        .await
        .unwrap();
    assert_eq!(inserted, 2);
    assert_eq!(total, Decimal::from(15));
    let (stored, summed) = stored_totals(&pool, assessment.id).await;
    assert_eq!(stored, summed);

    let total = questions.delete_question(assessment.id, first).await.unwrap();
    assert_eq!(total, Decimal::from(12));
    let (stored, summed) = stored_totals(&pool, assessment.id).await;
    assert_eq!(stored, summed);

    assert!(matches!(
        questions.delete_question(assessment.id, first).await,
        Err(Error::QuestionNotFound)
    ));

    let listed = questions.list_questions(assessment.id).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[1].correct_answer.as_deref(), Some("c"));
}

#[tokio::test]
async fn bulk_questions_are_all_or_nothing() {
    let Some(pool) = common::test_pool().await else { return };
    let assessment = seed_assessment(&pool, 40, 30, &[descriptive("Existing", 4)]).await;
    let questions = QuestionService::new(pool.clone());

    let err = questions
        .bulk_add_questions(
            assessment.id,
            &[
                descriptive("Fine", 5),
                mcq("Broken", 5, &["a", "b"], "not an option"),
                descriptive("Also fine", 5),
            ],
        )
        .await
        .unwrap_err();
    match err {
        Error::InvalidQuestion(msg) => assert!(msg.contains("#2"), "{msg}"),
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(common::question_ids(&pool, assessment.id).await.len(), 1);
    let (stored, summed) = stored_totals(&pool, assessment.id).await;
    assert_eq!(stored, Decimal::from(4));
    assert_eq!(stored, summed);

    assert!(matches!(
        questions
            .add_question(Uuid::new_v4(), &descriptive("Orphan", 1))
            .await,
        Err(Error::AssessmentNotFound)
    ));
}

#[tokio::test]
async fn bulk_candidates_skip_bad_rows() {
    let Some(pool) = common::test_pool().await else { return };
    let candidates = CandidateService::new(pool.clone());
    let tag = Uuid::new_v4().simple().to_string();
    let existing = format!("existing_{tag}@example.com");
    candidates
        .add_candidate(&CandidatePayload {
            email: existing.clone(),
            full_name: None,
        })
        .await
        .unwrap();

    let batch = vec![
        CandidatePayload {
            email: format!("new1_{tag}@example.com"),
            full_name: Some("New One".into()),
        },
        CandidatePayload {
            email: "not-an-email".into(),
            full_name: None,
        },
        CandidatePayload {
            email: existing.to_uppercase(),
            full_name: None,
        },
        CandidatePayload {
            email: format!("new2_{tag}@example.com"),
            full_name: None,
        },
        CandidatePayload {
            email: format!("new2_{tag}@example.com"),
            full_name: None,
        },
    ];
    let counts = candidates.bulk_add_candidates(&batch).await.unwrap();
    assert_eq!(counts.inserted_count, 2);
    assert_eq!(counts.skipped_count, 3);

    assert!(matches!(
        candidates
            .add_candidate(&CandidatePayload {
                email: existing,
                full_name: None,
            })
            .await,
        Err(Error::Conflict(_))
    ));
    assert!(matches!(
        candidates
            .add_candidate(&CandidatePayload {
                email: "nope".into(),
                full_name: None,
            })
            .await,
        Err(Error::Validation(_))
    ));
}

#[tokio::test]
async fn assessment_codes_are_normalized_and_unique() {
    let Some(pool) = common::test_pool().await else { return };
    let assessments = AssessmentService::new(pool.clone());
    let raw = format!(" rust-{} ", &Uuid::new_v4().simple().to_string()[..8]);

    let created = assessments
        .create_assessment(&CreateAssessmentRequest {
            title: "Rust basics".into(),
            duration_minutes: 45,
            pass_percentage: None,
            code: Some(raw.clone()),
        })
        .await
        .unwrap();
    assert_eq!(created.code, raw.trim().to_uppercase());
    assert_eq!(created.pass_percentage, Decimal::from(40));
    assert_eq!(created.status, "ACTIVE");

    assert!(matches!(
        assessments
            .create_assessment(&CreateAssessmentRequest {
                title: "Copy".into(),
                duration_minutes: 45,
                pass_percentage: None,
                code: Some(raw.to_lowercase()),
            })
            .await,
        Err(Error::Conflict(_))
    ));

    let generated = assessments
        .create_assessment(&CreateAssessmentRequest {
            title: "Generated".into(),
            duration_minutes: 10,
            pass_percentage: Some(Decimal::from(75)),
            code: None,
        })
        .await
        .unwrap();
    assert_eq!(generated.code.len(), 6);

    let updated = assessments
        .update_assessment(
            created.id,
            &UpdateAssessmentRequest {
                title: Some("Rust basics II".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "Rust basics II");
    assert_eq!(updated.duration_minutes, 45);
    assert_eq!(updated.code, created.code);

    assert!(matches!(
        assessments
            .update_assessment(
                created.id,
                &UpdateAssessmentRequest {
                    pass_percentage: Some(Decimal::from(101)),
                    ..Default::default()
                },
            )
            .await,
        Err(Error::BadRequest(_))
    ));
    assert!(matches!(
        assessments.get_assessment(Uuid::new_v4()).await,
        Err(Error::AssessmentNotFound)
    ));
}

#[tokio::test]
async fn violations_and_admin_views() {
    let Some(pool) = common::test_pool().await else { return };
    let assessment = seed_assessment(
        &pool,
        40,
        30,
        &[mcq("Pick", 2, &["yes", "no"], "yes"), descriptive("Essay", 3)],
    )
    .await;
    let candidate = seed_candidate(&pool).await;
    let intruder = seed_candidate(&pool).await;
    let attempts = AttemptService::new(pool.clone(), 0);
    let violations = ViolationService::new(pool.clone());

    let started = attempts
        .start_attempt(candidate, &assessment.code, None)
        .await
        .unwrap();
    let ids = common::question_ids(&pool, assessment.id).await;
    attempts
        .save_answer(started.attempt_id, candidate, ids[0], "a")
        .await
        .unwrap();
    attempts
        .save_answer(started.attempt_id, candidate, ids[1], "words")
        .await
        .unwrap();

    violations
        .log_violation(started.attempt_id, candidate, "TAB_SWITCH")
        .await
        .unwrap();
    violations
        .log_violation(started.attempt_id, candidate, "FULLSCREEN_EXIT")
        .await
        .unwrap();
    assert!(matches!(
        violations
            .log_violation(started.attempt_id, intruder, "TAB_SWITCH")
            .await,
        Err(Error::AttemptNotFound)
    ));

    let logged = violations.list_violations(started.attempt_id).await.unwrap();
    let kinds: Vec<&str> = logged.iter().map(|v| v.violation_type.as_str()).collect();
    assert_eq!(kinds, vec!["TAB_SWITCH", "FULLSCREEN_EXIT"]);

    let summary = attempts.attempt_summary(started.attempt_id).await.unwrap();
    assert_eq!(summary.violation_count, 2);
    assert_eq!(summary.status, "IN_PROGRESS");

    attempts
        .submit_attempt(started.attempt_id, candidate)
        .await
        .unwrap();

    let details = attempts.attempt_details(started.attempt_id).await.unwrap();
    assert_eq!(details.total_marks, Decimal::from(5));
    assert_eq!(details.answers.len(), 2);
    assert_eq!(details.answers[0].correct_answer.as_deref(), Some("a"));
    assert!(details.answers[0].is_graded);
    assert!(!details.answers[1].is_graded);

    let pending = attempts.descriptive_answers(started.attempt_id).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].answer, "words");
    assert_eq!(pending[0].max_marks, Decimal::from(3));

    let listed = attempts.list_attempts(assessment.id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].candidate_id, candidate);

    let stats = StatsService::new(pool.clone()).dashboard_stats().await.unwrap();
    let row = stats
        .per_assessment
        .iter()
        .find(|s| s.assessment_id == assessment.id)
        .expect("assessment listed in stats");
    assert_eq!(row.attempt_count, 1);
    assert_eq!(row.pass_count + row.fail_count, 0);
    assert!(stats.total_attempts >= 1);
    assert!(stats.recent_attempts.len() <= 10);
}
