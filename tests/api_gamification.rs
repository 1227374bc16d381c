//! Points ledger, achievements, and content authoring over HTTP.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use aula::auth::Role;
use common::{body_json, seed_user, setup};

fn authed_json(method: &str, uri: &str, token: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn authed_get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn awarded_points_show_up_in_the_total() {
    let (app, state) = setup();
    let (_teacher_id, teacher_token) = seed_user(&state, "prof@example.com", Role::Teacher);
    let (student_id, student_token) = seed_user(&state, "aluno@example.com", Role::Student);

    let response = app
        .clone()
        .oneshot(authed_json(
            "POST",
            "/api/points",
            &teacher_token,
            json!({
                "user_id": student_id,
                "points": 80,
                "kind": "assessment_completion",
                "description": "Prova final",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(authed_get(
            &format!("/api/users/{}/points", student_id),
            &student_token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["total"], 80);

    let response = app
        .oneshot(authed_get(
            &format!("/api/users/{}/points/transactions", student_id),
            &student_token,
        ))
        .await
        .unwrap();
    let history = body_json(response).await;
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["kind"], "assessment_completion");
}

#[tokio::test]
async fn students_cannot_award_points() {
    let (app, state) = setup();
    let (student_id, student_token) = seed_user(&state, "aluno@example.com", Role::Student);

    let response = app
        .oneshot(authed_json(
            "POST",
            "/api/points",
            &student_token,
            json!({ "user_id": student_id, "points": 9999, "kind": "custom" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn achievement_check_unlocks_once_and_awards_points() {
    let (app, state) = setup();
    let (_teacher_id, teacher_token) = seed_user(&state, "prof@example.com", Role::Teacher);
    let (student_id, student_token) = seed_user(&state, "aluno@example.com", Role::Student);

    let check = json!({ "course_completions": 1 });

    let response = app
        .clone()
        .oneshot(authed_json(
            "POST",
            &format!("/api/users/{}/achievements/check", student_id),
            &teacher_token,
            check.clone(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let unlocked = body_json(response).await;
    assert_eq!(unlocked.as_array().unwrap().len(), 1);
    assert_eq!(unlocked[0]["id"], "primeiro-curso");

    // Second check with the same state unlocks nothing
    let response = app
        .clone()
        .oneshot(authed_json(
            "POST",
            &format!("/api/users/{}/achievements/check", student_id),
            &teacher_token,
            check,
        ))
        .await
        .unwrap();
    assert!(body_json(response).await.as_array().unwrap().is_empty());

    // The unlock awarded its points exactly once
    let response = app
        .clone()
        .oneshot(authed_get(
            &format!("/api/users/{}/points", student_id),
            &student_token,
        ))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["total"], 50);

    let response = app
        .oneshot(authed_get(
            &format!("/api/users/{}/achievements", student_id),
            &student_token,
        ))
        .await
        .unwrap();
    let achievements = body_json(response).await;
    assert_eq!(achievements.as_array().unwrap().len(), 1);
    assert_eq!(achievements[0]["id"], "primeiro-curso");
}

#[tokio::test]
async fn content_kind_is_immutable_through_the_api() {
    let (app, state) = setup();
    let (_teacher_id, teacher_token) = seed_user(&state, "prof@example.com", Role::Teacher);

    let response = app
        .clone()
        .oneshot(authed_json(
            "POST",
            "/api/content",
            &teacher_token,
            json!({
                "title": "Introdução",
                "kind": "text",
                "body": { "body": "Bem-vindo." },
                "course_id": "curso-rust",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let item = body_json(response).await;
    let item_id = item["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(authed_json(
            "PUT",
            &format!("/api/content/{}", item_id),
            &teacher_token,
            json!({
                "title": "Introdução",
                "kind": "video",
                "body": { "url": "https://videos.example.com/aula1" },
                "course_id": "curso-rust",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Stored item kept its original kind
    let response = app
        .oneshot(authed_get(&format!("/api/content/{}", item_id), &teacher_token))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["kind"], "text");
}

#[tokio::test]
async fn course_content_listing() {
    let (app, state) = setup();
    let (_teacher_id, teacher_token) = seed_user(&state, "prof@example.com", Role::Teacher);
    let (_student_id, student_token) = seed_user(&state, "aluno@example.com", Role::Student);

    for title in ["Aula 1", "Aula 2"] {
        let response = app
            .clone()
            .oneshot(authed_json(
                "POST",
                "/api/content",
                &teacher_token,
                json!({
                    "title": title,
                    "kind": "text",
                    "body": { "body": "..." },
                    "course_id": "curso-rust",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    // Students read content but cannot author it
    let response = app
        .clone()
        .oneshot(authed_get("/api/courses/curso-rust/content", &student_token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);

    let response = app
        .oneshot(authed_json(
            "POST",
            "/api/content",
            &student_token,
            json!({
                "title": "Não permitido",
                "kind": "text",
                "body": {},
                "course_id": "curso-rust",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
