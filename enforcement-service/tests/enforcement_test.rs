//! End-to-end authorization tests against the full router.
//!
//! Every request goes through the real middleware and token validation;
//! the only double is the in-memory directory store.

use authz_core::Role;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use enforcement_service::config::TokenConfig;
use enforcement_service::models::{
    ClassRecord, SubmissionRecord, SubmissionStatus, TaskRecord, UserRecord,
};
use enforcement_service::store::{DirectoryStore, MemoryDirectory};
use enforcement_service::token::TokenService;
use enforcement_service::{build_router, AppState};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;

fn token_service() -> TokenService {
    TokenService::new(&TokenConfig {
        secret: "integration-test-secret".to_string(),
        ttl_minutes: 15,
    })
}

fn class_fixture(id: &str, teacher_id: &str, school_id: &str, students: &[&str]) -> ClassRecord {
    let now = Utc::now();
    ClassRecord {
        id: id.to_string(),
        name: "Matemática 7A".to_string(),
        subject: "Matemática".to_string(),
        description: String::new(),
        teacher_id: teacher_id.to_string(),
        teacher_name: "Maria Silva".to_string(),
        student_ids: students.iter().map(|s| s.to_string()).collect(),
        school_id: school_id.to_string(),
        is_active: true,
        deleted_by: None,
        created_at: now,
        updated_at: now,
    }
}

fn task_fixture(id: &str, class_id: &str, teacher_id: &str, school_id: &str) -> TaskRecord {
    let now = Utc::now();
    TaskRecord {
        id: id.to_string(),
        class_id: class_id.to_string(),
        title: "Lista de exercícios 1".to_string(),
        description: String::new(),
        teacher_id: teacher_id.to_string(),
        school_id: school_id.to_string(),
        due_date: None,
        is_active: true,
        deleted_by: None,
        created_at: now,
        updated_at: now,
    }
}

fn submission_fixture(
    id: &str,
    class_id: &str,
    student_id: &str,
    status: SubmissionStatus,
) -> SubmissionRecord {
    SubmissionRecord {
        id: id.to_string(),
        class_id: class_id.to_string(),
        student_id: student_id.to_string(),
        school_id: "school-1".to_string(),
        grade: match status {
            SubmissionStatus::Pending => None,
            _ => Some(8.5),
        },
        status,
        submitted_at: Utc::now(),
    }
}

/// Two schools: school-1 with a director, two teachers, two students and
/// one class owned by the first teacher; school-2 with its own director
/// and one student.
fn test_app() -> (Router, Arc<MemoryDirectory>, TokenService) {
    let store = Arc::new(MemoryDirectory::new());

    store.seed_user(UserRecord::new(
        "D1",
        "director@school1.com",
        "Diretor Um",
        Role::Director,
        "school-1",
        true,
    ));
    store.seed_user(UserRecord::new(
        "T1",
        "maria@teacher.com",
        "Maria Silva",
        Role::Teacher,
        "school-1",
        true,
    ));
    store.seed_user(UserRecord::new(
        "T2",
        "joao@teacher.com",
        "João Souza",
        Role::Teacher,
        "school-1",
        true,
    ));
    store.seed_user(UserRecord::new(
        "S1",
        "ana@student.com",
        "Ana Lima",
        Role::Student,
        "school-1",
        true,
    ));
    store.seed_user(UserRecord::new(
        "S2",
        "rui@student.com",
        "Rui Costa",
        Role::Student,
        "school-1",
        true,
    ));
    store.seed_user(UserRecord::new(
        "D2",
        "director@school2.com",
        "Diretor Dois",
        Role::Director,
        "school-2",
        true,
    ));
    store.seed_user(UserRecord::new(
        "X1",
        "alien@school2.com",
        "Aluno Externo",
        Role::Student,
        "school-2",
        true,
    ));

    store.seed_class(class_fixture("C1", "T1", "school-1", &["S1"]));
    store.seed_task(task_fixture("TASK1", "C1", "T1", "school-1"));
    store.seed_submission(submission_fixture("SUB1", "C1", "S1", SubmissionStatus::Graded));
    store.seed_submission(submission_fixture("SUB2", "C1", "S1", SubmissionStatus::Pending));

    let tokens = token_service();
    let state = AppState {
        tokens: tokens.clone(),
        store: store.clone(),
    };
    (build_router(state), store, tokens)
}

fn director_token(tokens: &TokenService) -> String {
    tokens
        .issue("D1", "director@school1.com", Role::Director, "school-1", true)
        .unwrap()
}

fn teacher_token(tokens: &TokenService) -> String {
    tokens
        .issue("T1", "maria@teacher.com", Role::Teacher, "school-1", true)
        .unwrap()
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let (app, _store, _tokens) = test_app();
    let response = app
        .oneshot(request(Method::GET, "/admin/audit", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_token_is_unauthorized() {
    let (app, _store, tokens) = test_app();
    let token = tokens
        .issue_expired("D1", "director@school1.com", Role::Director, "school-1")
        .unwrap();
    let response = app
        .oneshot(request(Method::GET, "/admin/audit", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn inactive_caller_is_unauthorized() {
    let (app, _store, tokens) = test_app();
    let token = tokens
        .issue("T1", "maria@teacher.com", Role::Teacher, "school-1", false)
        .unwrap();
    let response = app
        .oneshot(request(
            Method::POST,
            "/classes",
            Some(&token),
            Some(json!({ "name": "Física", "subject": "Física" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn teacher_cannot_set_roles_regardless_of_payload() {
    let (app, store, tokens) = test_app();
    let token = teacher_token(&tokens);
    let response = app
        .oneshot(request(
            Method::POST,
            "/admin/users/S1/role",
            Some(&token),
            Some(json!({ "role": "director", "school_id": "school-1" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(store.audit_count(), 0);
}

#[tokio::test]
async fn director_sets_role_and_audits_once() {
    let (app, store, tokens) = test_app();
    let token = director_token(&tokens);
    let response = app
        .oneshot(request(
            Method::POST,
            "/admin/users/S1/role",
            Some(&token),
            Some(json!({ "role": "teacher", "school_id": "school-1" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let user = store.user("S1").await.unwrap().unwrap();
    assert_eq!(user.role, Role::Teacher);
    assert_eq!(store.audit_count(), 1);
    let records = store.audit_for_school("school-1").await.unwrap();
    assert_eq!(records[0].action, "set_user_role");
    assert_eq!(records[0].actor_id, "D1");
    assert_eq!(records[0].resource_id.as_deref(), Some("S1"));
}

#[tokio::test]
async fn cross_school_role_change_is_denied_without_audit() {
    let (app, store, tokens) = test_app();
    // A director of school-2 targeting a school-1 user.
    let token = tokens
        .issue("D2", "director@school2.com", Role::Director, "school-2", true)
        .unwrap();
    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/admin/users/S1/role",
            Some(&token),
            Some(json!({ "role": "teacher", "school_id": "school-2" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // A director naming a foreign school in the payload.
    let token = director_token(&tokens);
    let response = app
        .oneshot(request(
            Method::POST,
            "/admin/users/S1/role",
            Some(&token),
            Some(json!({ "role": "teacher", "school_id": "school-2" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(store.audit_count(), 0);
    let user = store.user("S1").await.unwrap().unwrap();
    assert_eq!(user.role, Role::Student);
}

#[tokio::test]
async fn unknown_role_string_is_rejected() {
    let (app, store, tokens) = test_app();
    let token = director_token(&tokens);
    let response = app
        .oneshot(request(
            Method::POST,
            "/admin/users/S1/role",
            Some(&token),
            Some(json!({ "role": "admin", "school_id": "school-1" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.audit_count(), 0);
}

#[tokio::test]
async fn approval_activates_user_and_audits() {
    let (app, store, tokens) = test_app();
    store.seed_user(UserRecord::new(
        "T3",
        "pending@teacher.com",
        "Pendente",
        Role::Teacher,
        "school-1",
        false,
    ));
    let token = director_token(&tokens);
    let response = app
        .oneshot(request(
            Method::POST,
            "/admin/users/T3/approval",
            Some(&token),
            Some(json!({ "approved": true })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let user = store.user("T3").await.unwrap().unwrap();
    assert!(user.is_active);
    assert_eq!(user.approved_by.as_deref(), Some("D1"));
    let records = store.audit_for_school("school-1").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].action, "approve_user");
}

#[tokio::test]
async fn rejection_is_audited_as_rejection() {
    let (app, store, tokens) = test_app();
    store.seed_user(UserRecord::new(
        "T3",
        "pending@teacher.com",
        "Pendente",
        Role::Teacher,
        "school-1",
        false,
    ));
    let token = director_token(&tokens);
    let response = app
        .oneshot(request(
            Method::POST,
            "/admin/users/T3/approval",
            Some(&token),
            Some(json!({ "approved": false })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let user = store.user("T3").await.unwrap().unwrap();
    assert!(!user.is_active);
    assert_eq!(user.rejected_by.as_deref(), Some("D1"));
    let records = store.audit_for_school("school-1").await.unwrap();
    assert_eq!(records[0].action, "reject_user");
}

#[tokio::test]
async fn delete_user_soft_deletes_and_clears_rosters() {
    let (app, store, tokens) = test_app();
    let token = director_token(&tokens);
    let response = app
        .oneshot(request(Method::DELETE, "/admin/users/S1", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let user = store.user("S1").await.unwrap().unwrap();
    assert!(!user.is_active);
    assert_eq!(user.deleted_by.as_deref(), Some("D1"));
    let class = store.class("C1").await.unwrap().unwrap();
    assert!(class.student_ids.is_empty());
    assert_eq!(store.audit_count(), 1);
}

#[tokio::test]
async fn create_class_lands_in_caller_school() {
    let (app, store, tokens) = test_app();
    let token = teacher_token(&tokens);
    let response = app
        .oneshot(request(
            Method::POST,
            "/classes",
            Some(&token),
            Some(json!({
                "name": "História 8B",
                "subject": "História",
                // A forged school id in the payload is ignored.
                "school_id": "school-2"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let id = body["id"].as_str().unwrap().to_string();

    let class = store.class(&id).await.unwrap().unwrap();
    assert_eq!(class.school_id, "school-1");
    assert_eq!(class.teacher_id, "T1");
    assert_eq!(class.teacher_name, "Maria Silva");
    let records = store.audit_for_school("school-1").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].action, "create_class");
}

#[tokio::test]
async fn empty_class_name_is_rejected() {
    let (app, store, tokens) = test_app();
    let token = teacher_token(&tokens);
    let response = app
        .oneshot(request(
            Method::POST,
            "/classes",
            Some(&token),
            Some(json!({ "name": "   ", "subject": "História" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.audit_count(), 0);
}

#[tokio::test]
async fn student_cannot_create_classes() {
    let (app, _store, tokens) = test_app();
    let token = tokens
        .issue("S1", "ana@student.com", Role::Student, "school-1", true)
        .unwrap();
    let response = app
        .oneshot(request(
            Method::POST,
            "/classes",
            Some(&token),
            Some(json!({ "name": "Clube", "subject": "Xadrez" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn owner_teacher_updates_class() {
    let (app, store, tokens) = test_app();
    let token = teacher_token(&tokens);
    let response = app
        .oneshot(request(
            Method::PUT,
            "/classes/C1",
            Some(&token),
            Some(json!({ "name": "Matemática 7B" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let class = store.class("C1").await.unwrap().unwrap();
    assert_eq!(class.name, "Matemática 7B");
    assert_eq!(class.subject, "Matemática");
    assert_eq!(store.audit_count(), 1);
}

#[tokio::test]
async fn non_owner_teacher_cannot_update_class() {
    let (app, store, tokens) = test_app();
    let token = tokens
        .issue("T2", "joao@teacher.com", Role::Teacher, "school-1", true)
        .unwrap();
    let response = app
        .oneshot(request(
            Method::PUT,
            "/classes/C1",
            Some(&token),
            Some(json!({ "name": "Tomada" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(store.audit_count(), 0);
    let class = store.class("C1").await.unwrap().unwrap();
    assert_eq!(class.name, "Matemática 7A");
}

#[tokio::test]
async fn director_updates_any_class_in_school() {
    let (app, store, tokens) = test_app();
    let token = director_token(&tokens);
    let response = app
        .oneshot(request(
            Method::PUT,
            "/classes/C1",
            Some(&token),
            Some(json!({ "description": "Turma da manhã" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let class = store.class("C1").await.unwrap().unwrap();
    assert_eq!(class.description, "Turma da manhã");
}

#[tokio::test]
async fn foreign_director_cannot_touch_class() {
    let (app, store, tokens) = test_app();
    let token = tokens
        .issue("D2", "director@school2.com", Role::Director, "school-2", true)
        .unwrap();
    let response = app
        .oneshot(request(
            Method::PUT,
            "/classes/C1",
            Some(&token),
            Some(json!({ "name": "Invasão" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(store.audit_count(), 0);
}

#[tokio::test]
async fn teacher_cannot_delete_own_class() {
    let (app, store, tokens) = test_app();
    let token = teacher_token(&tokens);
    let response = app
        .oneshot(request(Method::DELETE, "/classes/C1", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let class = store.class("C1").await.unwrap().unwrap();
    assert!(class.is_active);
}

#[tokio::test]
async fn director_deletes_class() {
    let (app, store, tokens) = test_app();
    let token = director_token(&tokens);
    let response = app
        .oneshot(request(Method::DELETE, "/classes/C1", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let class = store.class("C1").await.unwrap().unwrap();
    assert!(!class.is_active);
    assert_eq!(class.deleted_by.as_deref(), Some("D1"));
    let records = store.audit_for_school("school-1").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].action, "delete_class");
}

#[tokio::test]
async fn enrollment_add_and_remove() {
    let (app, store, tokens) = test_app();
    let token = teacher_token(&tokens);
    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/classes/C1/students",
            Some(&token),
            Some(json!({ "student_id": "S2" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let class = store.class("C1").await.unwrap().unwrap();
    assert!(class.student_ids.contains(&"S2".to_string()));

    let response = app
        .oneshot(request(
            Method::DELETE,
            "/classes/C1/students/S2",
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let class = store.class("C1").await.unwrap().unwrap();
    assert!(!class.student_ids.contains(&"S2".to_string()));
    // One audit record per mutation.
    assert_eq!(store.audit_count(), 2);
}

#[tokio::test]
async fn cross_school_enrollment_is_denied() {
    let (app, store, tokens) = test_app();
    let token = teacher_token(&tokens);
    let response = app
        .oneshot(request(
            Method::POST,
            "/classes/C1/students",
            Some(&token),
            Some(json!({ "student_id": "X1" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(store.audit_count(), 0);
    let class = store.class("C1").await.unwrap().unwrap();
    assert!(!class.student_ids.contains(&"X1".to_string()));
}

#[tokio::test]
async fn duplicate_enrollment_conflicts() {
    let (app, store, tokens) = test_app();
    let token = teacher_token(&tokens);
    let response = app
        .oneshot(request(
            Method::POST,
            "/classes/C1/students",
            Some(&token),
            Some(json!({ "student_id": "S1" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(store.audit_count(), 0);
}

#[tokio::test]
async fn removing_an_unenrolled_student_is_not_a_mutation() {
    let (app, store, tokens) = test_app();
    let token = teacher_token(&tokens);
    let response = app
        .oneshot(request(
            Method::DELETE,
            "/classes/C1/students/S2",
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(store.audit_count(), 0);
}

#[tokio::test]
async fn owner_teacher_creates_task_in_own_class() {
    let (app, store, tokens) = test_app();
    let token = teacher_token(&tokens);
    let response = app
        .oneshot(request(
            Method::POST,
            "/tasks",
            Some(&token),
            Some(json!({ "class_id": "C1", "title": "Lista 2" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let id = body["id"].as_str().unwrap().to_string();

    let task = store.task(&id).await.unwrap().unwrap();
    assert_eq!(task.class_id, "C1");
    assert_eq!(task.teacher_id, "T1");
    assert_eq!(task.school_id, "school-1");
    let records = store.audit_for_school("school-1").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].action, "create_task");
}

#[tokio::test]
async fn non_owner_teacher_cannot_author_tasks() {
    let (app, store, tokens) = test_app();
    let token = tokens
        .issue("T2", "joao@teacher.com", Role::Teacher, "school-1", true)
        .unwrap();
    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/tasks",
            Some(&token),
            Some(json!({ "class_id": "C1", "title": "Intruso" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(request(
            Method::PUT,
            "/tasks/TASK1",
            Some(&token),
            Some(json!({ "title": "Tomada" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(store.audit_count(), 0);
    let task = store.task("TASK1").await.unwrap().unwrap();
    assert_eq!(task.title, "Lista de exercícios 1");
}

#[tokio::test]
async fn owner_teacher_updates_task() {
    let (app, store, tokens) = test_app();
    let token = teacher_token(&tokens);
    let response = app
        .oneshot(request(
            Method::PUT,
            "/tasks/TASK1",
            Some(&token),
            Some(json!({ "description": "Entrega na sexta" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let task = store.task("TASK1").await.unwrap().unwrap();
    assert_eq!(task.description, "Entrega na sexta");
    assert_eq!(task.title, "Lista de exercícios 1");
    let records = store.audit_for_school("school-1").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].action, "update_task");
}

#[tokio::test]
async fn task_deletion_is_director_only() {
    let (app, store, tokens) = test_app();
    let token = teacher_token(&tokens);
    let response = app
        .clone()
        .oneshot(request(Method::DELETE, "/tasks/TASK1", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(store.task("TASK1").await.unwrap().unwrap().is_active);

    let token = director_token(&tokens);
    let response = app
        .oneshot(request(Method::DELETE, "/tasks/TASK1", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let task = store.task("TASK1").await.unwrap().unwrap();
    assert!(!task.is_active);
    assert_eq!(task.deleted_by.as_deref(), Some("D1"));
    let records = store.audit_for_school("school-1").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].action, "delete_task");
}

#[tokio::test]
async fn foreign_director_cannot_touch_task() {
    let (app, store, tokens) = test_app();
    let token = tokens
        .issue("D2", "director@school2.com", Role::Director, "school-2", true)
        .unwrap();
    let response = app
        .oneshot(request(
            Method::PUT,
            "/tasks/TASK1",
            Some(&token),
            Some(json!({ "title": "Invasão" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(store.audit_count(), 0);
}

#[tokio::test]
async fn stats_are_director_only_and_school_scoped() {
    let (app, store, tokens) = test_app();
    let token = teacher_token(&tokens);
    let response = app
        .clone()
        .oneshot(request(Method::GET, "/admin/stats", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let token = director_token(&tokens);
    let response = app
        .oneshot(request(Method::GET, "/admin/stats", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["school_id"], "school-1");
    assert_eq!(body["total_users"], 5);
    assert_eq!(body["students"], 2);
    assert_eq!(body["teachers"], 2);
    assert_eq!(body["directors"], 1);
    assert_eq!(body["total_classes"], 1);
    assert_eq!(body["total_submissions"], 2);
    // Reads are not audited.
    assert_eq!(store.audit_count(), 0);
}

#[tokio::test]
async fn release_grades_flips_graded_submissions_only() {
    let (app, store, tokens) = test_app();
    let token = teacher_token(&tokens);
    let response = app
        .oneshot(request(
            Method::POST,
            "/classes/C1/grades/release",
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["released"], 1);
    let records = store.audit_for_school("school-1").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].action, "release_grades");
}

#[tokio::test]
async fn non_owner_teacher_cannot_release_grades() {
    let (app, store, tokens) = test_app();
    let token = tokens
        .issue("T2", "joao@teacher.com", Role::Teacher, "school-1", true)
        .unwrap();
    let response = app
        .oneshot(request(
            Method::POST,
            "/classes/C1/grades/release",
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(store.audit_count(), 0);
}

#[tokio::test]
async fn export_is_director_only_and_school_scoped() {
    let (app, store, tokens) = test_app();
    let token = teacher_token(&tokens);
    let response = app
        .clone()
        .oneshot(request(Method::GET, "/admin/export", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let token = director_token(&tokens);
    let response = app
        .oneshot(request(Method::GET, "/admin/export", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["school_id"], "school-1");
    // Five school-1 users were seeded; school-2 identities never appear.
    assert_eq!(body["users"].as_array().unwrap().len(), 5);
    for user in body["users"].as_array().unwrap() {
        assert_eq!(user["school_id"], "school-1");
    }
    let records = store.audit_for_school("school-1").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].action, "export_data");
}

#[tokio::test]
async fn audit_listing_is_scoped_to_the_callers_school() {
    let (app, _store, tokens) = test_app();
    let token = director_token(&tokens);
    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/admin/users/S1/role",
            Some(&token),
            Some(json!({ "role": "teacher", "school_id": "school-1" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let foreign = tokens
        .issue("D2", "director@school2.com", Role::Director, "school-2", true)
        .unwrap();
    let response = app
        .clone()
        .oneshot(request(Method::GET, "/admin/audit", Some(&foreign), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body.as_array().unwrap().is_empty());

    let response = app
        .oneshot(request(Method::GET, "/admin/audit", Some(&token), None))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn health_endpoint_is_public() {
    let (app, _store, _tokens) = test_app();
    let response = app
        .oneshot(request(Method::GET, "/health", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
