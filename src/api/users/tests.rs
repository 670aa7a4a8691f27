use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::test_support;

#[tokio::test]
#[ignore = "requires running PostgreSQL and Redis"]
async fn signup_login_and_profile_update() {
    let ctx = test_support::setup_test_context().await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/signup",
            None,
            Some(json!({
                "email": "Asha.Rao@Hostel.Local",
                "name": "Asha Rao",
                "studentId": "S-1042",
                "room": "B-214",
                "password": "resident-pass"
            })),
        ))
        .await
        .expect("signup");
    let status = response.status();
    let created = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {created}");
    assert_eq!(created["user"]["email"], "asha.rao@hostel.local");
    assert_eq!(created["user"]["is_admin"], false);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/signup",
            None,
            Some(json!({
                "email": "asha.rao@hostel.local",
                "name": "Someone Else",
                "password": "resident-pass"
            })),
        ))
        .await
        .expect("duplicate signup");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"email": "asha.rao@hostel.local", "password": "resident-pass"})),
        ))
        .await
        .expect("login");
    assert_eq!(response.status(), StatusCode::OK);
    let login = test_support::read_json(response).await;
    let token = login["access_token"].as_str().expect("token").to_string();

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            "/api/v1/users/me",
            Some(&token),
            Some(json!({"room": "C-101"})),
        ))
        .await
        .expect("update profile");
    let status = response.status();
    let profile = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {profile}");
    assert_eq!(profile["room"], "C-101");
    assert_eq!(profile["name"], "Asha Rao");

    let response = ctx
        .app
        .oneshot(test_support::json_request(Method::GET, "/api/v1/auth/me", Some(&token), None))
        .await
        .expect("me");
    let me = test_support::read_json(response).await;
    assert_eq!(me["room"], "C-101");
}

#[tokio::test]
#[ignore = "requires running PostgreSQL and Redis"]
async fn login_rejects_wrong_password() {
    let ctx = test_support::setup_test_context().await;
    test_support::insert_user(ctx.state.db(), "ravi@hostel.local", "Ravi", "A-12").await;

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"email": "ravi@hostel.local", "password": "wrong-pass"})),
        ))
        .await
        .expect("login");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires running PostgreSQL and Redis"]
async fn signup_rejects_short_password() {
    let ctx = test_support::setup_test_context().await;

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/signup",
            None,
            Some(json!({"email": "meera@hostel.local", "name": "Meera", "password": "short"})),
        ))
        .await
        .expect("signup");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
