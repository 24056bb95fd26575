use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use services::{AppServices, Clock};
use signplay_core::time::fixed_now;
use tower::ServiceExt;

use super::{AppState, cors_layer, router};

async fn setup() -> (Router, String) {
    setup_with_origins(&["*".to_owned()]).await
}

async fn setup_with_origins(origins: &[String]) -> (Router, String) {
    let services = AppServices::in_memory(Clock::fixed(fixed_now()));
    let registration = services.users().register("ada").await.unwrap();
    (
        router(AppState::from(&services), cors_layer(origins)),
        registration.token,
    )
}

fn preflight(uri: &str, origin: &str) -> Request<Body> {
    Request::builder()
        .method("OPTIONS")
        .uri(uri)
        .header(header::ORIGIN, origin)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(
            header::ACCESS_CONTROL_REQUEST_HEADERS,
            "authorization,content-type",
        )
        .body(Body::empty())
        .unwrap()
}

fn save_request(token: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/game/save-result")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn play(correct: i64, predicted: Option<i64>) -> Value {
    let accuracy = if predicted == Some(correct) { 100 } else { 0 };
    json!({
        "question": "5 + 3",
        "correctAnswer": correct,
        "predictedAnswer": predicted,
        "accuracy": accuracy,
        "speed": 0,
        "dexterityScore": 85
    })
}

#[tokio::test]
async fn health_needs_no_token() {
    let (app, _) = setup().await;
    let response = app.oneshot(get_request("/api/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"status": "Backend running"}));
}

#[tokio::test]
async fn game_routes_require_a_valid_bearer_token() {
    let (app, _) = setup().await;
    for token in [None, Some("wrong")] {
        let response = app
            .clone()
            .oneshot(get_request("/api/game/stats", token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn save_result_recomputes_correctness_and_updates_stats() {
    let (app, token) = setup().await;

    let mut lying = play(8, Some(7));
    lying["isCorrect"] = json!(true);
    for body in [play(8, Some(8)), play(8, Some(8)), lying] {
        let response = app.clone().oneshot(save_request(&token, &body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let saved = json_body(response).await;
        assert_eq!(saved["success"], json!(true));
        assert_eq!(saved["gameRecord"]["question"], json!("5 + 3"));
    }

    let response = app
        .clone()
        .oneshot(get_request("/api/game/stats", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let stats = json_body(response).await;
    assert_eq!(stats["user"]["totalGamesPlayed"], json!(3));
    assert_eq!(stats["user"]["averageAccuracy"], json!(67));
    assert_eq!(stats["user"]["dexterityScore"], json!(85));
    let recent = stats["recentGames"].as_array().unwrap();
    assert_eq!(recent.len(), 3);
    assert_eq!(recent[0]["isCorrect"], json!(false));
    assert_eq!(recent[0]["predictedAnswer"], json!(7));
}

#[tokio::test]
async fn history_lists_everything_newest_first() {
    let (app, token) = setup().await;
    for predicted in [Some(1), Some(2), None, Some(8), Some(5), Some(6)] {
        let response = app
            .clone()
            .oneshot(save_request(&token, &play(8, predicted)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(get_request("/api/game/history", Some(&token)))
        .await
        .unwrap();
    let history = json_body(response).await;
    let answers: Vec<Value> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["predictedAnswer"].clone())
        .collect();
    assert_eq!(
        answers,
        vec![json!(6), json!(5), json!(8), Value::Null, json!(2), json!(1)]
    );

    let response = app
        .oneshot(get_request("/api/game/stats", Some(&token)))
        .await
        .unwrap();
    let stats = json_body(response).await;
    assert_eq!(stats["recentGames"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn invalid_payloads_are_bad_requests() {
    let (app, token) = setup().await;

    let mut too_accurate = play(8, Some(8));
    too_accurate["accuracy"] = json!(150);
    let mut blank = play(8, Some(8));
    blank["question"] = json!("   ");
    let missing_fields = json!({ "question": "1 + 1" });

    for body in [too_accurate, blank, missing_fields] {
        let response = app.clone().oneshot(save_request(&token, &body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"].is_string());
    }

    let response = app
        .oneshot(get_request("/api/game/history", Some(&token)))
        .await
        .unwrap();
    assert_eq!(json_body(response).await, json!([]));
}

#[tokio::test]
async fn lowercase_bearer_scheme_is_accepted() {
    let (app, token) = setup().await;
    let request = Request::builder()
        .method("GET")
        .uri("/api/game/stats")
        .header(header::AUTHORIZATION, format!("bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn browser_preflight_is_answered_for_any_origin_by_default() {
    let (app, _) = setup().await;
    let response = app
        .oneshot(preflight("/api/game/save-result", "http://localhost:3000"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    let methods = headers[header::ACCESS_CONTROL_ALLOW_METHODS]
        .to_str()
        .unwrap()
        .to_ascii_uppercase();
    assert!(methods.contains("POST"));
    let allowed = headers[header::ACCESS_CONTROL_ALLOW_HEADERS]
        .to_str()
        .unwrap()
        .to_ascii_lowercase();
    assert!(allowed.contains("authorization"));
    assert!(allowed.contains("content-type"));
}

#[tokio::test]
async fn configured_origins_are_echoed_and_others_left_out() {
    let (app, token) = setup_with_origins(&["http://localhost:3000".to_owned()]).await;

    let response = app
        .clone()
        .oneshot(preflight("/api/game/save-result", "http://localhost:3000"))
        .await
        .unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );

    let response = app
        .clone()
        .oneshot(preflight("/api/game/save-result", "http://evil.example"))
        .await
        .unwrap();
    assert!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none()
    );

    let mut request = get_request("/api/game/stats", Some(&token));
    request
        .headers_mut()
        .insert(header::ORIGIN, "http://localhost:3000".parse().unwrap());
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );
}
