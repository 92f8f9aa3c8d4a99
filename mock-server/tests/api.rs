use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, router, MockControl, Movement, ATHLETE_EMAIL, ATHLETE_PASSWORD, COACH_EMAIL, COACH_PASSWORD};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: &str) -> Request<String> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(body.to_string()).unwrap()
}

fn get_request(uri: &str, token: Option<&str>) -> Request<String> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(String::new()).unwrap()
}

async fn login(app: &Router, email: &str, password: &str) -> Value {
    let body = json!({ "email": email, "password": password }).to_string();
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/v1/auth/login", None, &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await
}

// --- health ---

#[tokio::test]
async fn health_is_public() {
    let resp = app().oneshot(get_request("/api/v1/health", None)).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["status"], "ok");
}

// --- auth ---

#[tokio::test]
async fn login_returns_token_pair_and_role() {
    let app = app();
    let body = login(&app, COACH_EMAIL, COACH_PASSWORD).await;

    assert_eq!(body["role"], "COACH");
    assert!(body["accessToken"].is_string());
    assert!(body["refreshToken"].is_string());
}

#[tokio::test]
async fn login_with_bad_password_returns_401_detail() {
    let body = json!({ "email": COACH_EMAIL, "password": "wrong" }).to_string();
    let resp = app()
        .oneshot(json_request("POST", "/api/v1/auth/login", None, &body))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = body_json(resp).await;
    assert_eq!(body["detail"], "Invalid credentials");
}

#[tokio::test]
async fn login_with_malformed_body_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/api/v1/auth/login", None, r#"{"email":1}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn me_requires_bearer_token() {
    let resp = app().oneshot(get_request("/api/v1/me", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app().oneshot(get_request("/api/v1/me", Some("bogus"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_returns_current_user() {
    let app = app();
    let tokens = login(&app, ATHLETE_EMAIL, ATHLETE_PASSWORD).await;
    let access = tokens["accessToken"].as_str().unwrap();

    let resp = app.oneshot(get_request("/api/v1/me", Some(access))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let me: Value = body_json(resp).await;
    assert_eq!(me["email"], ATHLETE_EMAIL);
    assert_eq!(me["role"], "ATHLETE");
    assert_eq!(me["status"], "ACTIVE");
}

#[tokio::test]
async fn refresh_rotates_refresh_token() {
    let control = MockControl::new();
    let app = router(control.clone());
    let tokens = login(&app, ATHLETE_EMAIL, ATHLETE_PASSWORD).await;
    let body = json!({ "refreshToken": tokens["refreshToken"] }).to_string();

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/v1/auth/refresh", None, &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let refreshed: Value = body_json(resp).await;
    assert_ne!(refreshed["refreshToken"], tokens["refreshToken"]);

    let resp = app
        .oneshot(json_request("POST", "/api/v1/auth/refresh", None, &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(control.refresh_calls().await, 2);
}

#[tokio::test]
async fn expired_access_token_is_rejected() {
    let control = MockControl::new();
    let app = router(control.clone());
    let tokens = login(&app, ATHLETE_EMAIL, ATHLETE_PASSWORD).await;
    control.expire_access_tokens().await;

    let resp = app
        .oneshot(get_request("/api/v1/me", tokens["accessToken"].as_str()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = body_json(resp).await;
    assert_eq!(body["detail"], "Token expired");
}

#[tokio::test]
async fn logout_revokes_refresh_token() {
    let app = app();
    let tokens = login(&app, ATHLETE_EMAIL, ATHLETE_PASSWORD).await;
    let body = json!({ "refreshToken": tokens["refreshToken"] }).to_string();

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/v1/auth/logout", tokens["accessToken"].as_str(), &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(json_request("POST", "/api/v1/auth/refresh", None, &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invitation_registration_flow() {
    let control = MockControl::new();
    let app = router(control.clone());
    let coach = login(&app, COACH_EMAIL, COACH_PASSWORD).await;
    let invite = json!({ "email": "New@Example.com", "gymId": control.gym_id().await }).to_string();

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/v1/auth/invitations", coach["accessToken"].as_str(), &invite))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let invitation: Value = body_json(resp).await;

    let register = json!({ "token": invitation["token"], "password": "pw", "athlete": {} }).to_string();
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/v1/auth/register-from-invite", None, &register))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let registered: Value = body_json(resp).await;
    assert_eq!(registered["role"], "ATHLETE");

    let resp = app
        .oneshot(json_request("POST", "/api/v1/auth/register-from-invite", None, &register))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

// --- catalog and workouts ---

#[tokio::test]
async fn movement_search_is_case_insensitive() {
    let app = app();
    let tokens = login(&app, COACH_EMAIL, COACH_PASSWORD).await;

    let resp = app
        .oneshot(get_request("/api/v1/movements?query=SQUAT", tokens["accessToken"].as_str()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let movements: Vec<Movement> = body_json(resp).await;
    let names: Vec<&str> = movements.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Air Squat", "Back Squat"]);
}

#[tokio::test]
async fn unknown_workout_returns_404_detail() {
    let app = app();
    let tokens = login(&app, ATHLETE_EMAIL, ATHLETE_PASSWORD).await;

    let resp = app
        .oneshot(get_request("/api/v1/workouts/missing", tokens["accessToken"].as_str()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let bytes = body_bytes(resp).await;
    assert_eq!(&bytes[..], br#"{"detail":"Workout not found"}"#);
}

#[tokio::test]
async fn athlete_cannot_reach_coach_routes() {
    let app = app();
    let tokens = login(&app, ATHLETE_EMAIL, ATHLETE_PASSWORD).await;

    let resp = app
        .oneshot(get_request("/api/v1/coach/overview", tokens["accessToken"].as_str()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn created_workout_is_hidden_until_published() {
    let control = MockControl::new();
    let app = router(control.clone());
    let coach = login(&app, COACH_EMAIL, COACH_PASSWORD).await;
    let token = coach["accessToken"].as_str();
    let deadlift = control.movement_id("Deadlift").await.unwrap();
    let body = json!({
        "title": "  Deadlift test ",
        "description": "",
        "isTest": true,
        "type": "BLOCKS",
        "visibility": "COMMUNITY",
        "scoreType": "REPS",
        "scales": [{"code": "RX", "label": "RX", "notes": "", "referenceLoads": {}}],
        "blocks": [{
            "ord": 1, "name": "Main", "blockType": "WORK", "repeatInt": 1, "timeSeconds": 600,
            "movements": [{"ord": 1, "movementId": deadlift, "reps": 6, "loadRule": "ATHLETE_CHOICE", "notes": ""}]
        }],
        "capacityWeights": [{"capacityType": "STRENGTH", "weight": 1.0}]
    })
    .to_string();

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/v1/coach/workouts", token, &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let created: Value = body_json(resp).await;
    assert_eq!(created["title"], "Deadlift test");
    assert!(created.get("publishedAt").is_none());
    let id = created["id"].as_str().unwrap().to_string();

    let resp = app.clone().oneshot(get_request("/api/v1/workouts", token)).await.unwrap();
    let published: Vec<Value> = body_json(resp).await;
    assert!(published.iter().all(|w| w["id"] != id.as_str()));

    let resp = app
        .clone()
        .oneshot(json_request("POST", &format!("/api/v1/coach/workouts/{id}/publish"), token, ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let summary: Value = body_json(resp).await;
    assert!(summary["publishedAt"].is_string());

    let resp = app
        .oneshot(get_request(&format!("/api/v1/workouts/{id}"), token))
        .await
        .unwrap();
    let detail: Value = body_json(resp).await;
    assert_eq!(detail["blocks"][0]["movements"][0]["movement"]["name"], "Deadlift");
}

// --- athlete ---

#[tokio::test]
async fn attempt_on_published_workout() {
    let app = app();
    let tokens = login(&app, ATHLETE_EMAIL, ATHLETE_PASSWORD).await;
    let token = tokens["accessToken"].as_str();

    let resp = app.clone().oneshot(get_request("/api/v1/workouts", token)).await.unwrap();
    let workouts: Vec<Value> = body_json(resp).await;
    let id = workouts[0]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/v1/athlete/workouts/{id}/attempt");

    let resp = app
        .clone()
        .oneshot(json_request("POST", &uri, token, r#"{"scaleCode":"RX"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let attempt: Value = body_json(resp).await;
    assert_eq!(attempt["status"], "DRAFT");

    let resp = app
        .oneshot(json_request("POST", &uri, token, r#"{"scaleCode":"ELITE"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn dashboard_lists_every_capacity() {
    let app = app();
    let tokens = login(&app, ATHLETE_EMAIL, ATHLETE_PASSWORD).await;

    let resp = app
        .oneshot(get_request("/api/v1/athlete/dashboard", tokens["accessToken"].as_str()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let dashboard: Value = body_json(resp).await;
    assert_eq!(dashboard["levelBand"], "BEGINNER");
    assert_eq!(dashboard["capacities"].as_array().unwrap().len(), 4);
    assert_eq!(dashboard["trends30d"].as_array().unwrap().len(), 4);
}
