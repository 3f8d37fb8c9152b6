use chrono::Duration;
use serde_json::Value;

use crate::helpers::{session_token, spawn_app};

#[tokio::test]
async fn session_endpoint_returns_the_current_user() {
    let app = spawn_app().await;
    let token = session_token(Duration::hours(1));

    let response = app
        .api_client
        .get(&format!("{}/auth/session", &app.address))
        .header("Cookie", format!("session={}", token))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    let session: Value = response.json().await.unwrap();
    assert_eq!(session["user"]["id"], "staff-1");
    assert_eq!(session["user"]["email"], "staff@example.com");
}

#[tokio::test]
async fn session_endpoint_accepts_a_bearer_token() {
    let app = spawn_app().await;
    let token = session_token(Duration::hours(1));

    let response = app
        .api_client
        .get(&format!("{}/auth/session", &app.address))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
}

#[tokio::test]
async fn session_endpoint_without_a_session_returns_401() {
    let app = spawn_app().await;

    let response = app
        .api_client
        .get(&format!("{}/auth/session", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn session_endpoint_rejects_a_tampered_token() {
    let app = spawn_app().await;
    let token = format!("{}x", session_token(Duration::hours(1)));

    let response = app
        .api_client
        .get(&format!("{}/auth/session", &app.address))
        .header("Cookie", format!("session={}", token))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["message"], "Invalid session");
}

#[tokio::test]
async fn signout_clears_the_session_cookie() {
    let app = spawn_app().await;

    let response = app
        .api_client
        .post(&format!("{}/auth/signout", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    let cookie = response
        .headers()
        .get("set-cookie")
        .expect("no Set-Cookie header")
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("session="));
    assert!(cookie.contains("Max-Age=0"));

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["ok"], true);
}
