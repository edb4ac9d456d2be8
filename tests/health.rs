use axum::{extract::State, http::StatusCode};
use yapee_store::{config::AppConfig, routes::health::health_check, state::AppState};

#[tokio::test]
async fn health_check_returns_ok() {
    let state = AppState::in_memory(AppConfig::with_secrets("test-storage", "test-jwt"));
    let (status, response) = health_check(State(state)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response.0.message, "Health check");

    let data = response.0.data.expect("health data");
    assert_eq!(data.status, "ok");
}
