use chrono::Duration;
use serde_json::{json, Value};

use crate::helpers::{
    application, guardian, random_application, session_config, session_token, spawn_app,
    spawn_app_with,
};

#[tokio::test]
async fn submit_returns_201_with_the_enriched_record() {
    let app = spawn_app().await;
    let mut body = application("Shericka", "Campbell");
    body["guardians"] = json!([guardian(), guardian()]);
    body["affiliations"] = json!([{ "name": "MVP Track Club" }]);

    let response = app.post_application(&body).await;

    assert_eq!(201, response.status().as_u16());
    let created: Value = response.json().await.unwrap();
    assert!(!created["id"].as_str().unwrap().is_empty());
    assert!(created["submissionDate"].is_string());
    assert_eq!(created["firstName"], "Shericka");
    assert_eq!(created["guardians"].as_array().unwrap().len(), 2);
    assert_eq!(created["affiliations"].as_array().unwrap().len(), 1);
    for guardian in created["guardians"].as_array().unwrap() {
        assert_eq!(guardian["applicationId"], created["id"]);
    }
    assert_eq!(app.storage.application_count().await, 1);
    assert_eq!(app.storage.guardian_count().await, 2);
}

#[tokio::test]
async fn submit_without_guardians_returns_400_and_stores_nothing() {
    let app = spawn_app().await;
    let mut body = random_application();
    body["guardians"] = json!([]);

    let response = app.post_application(&body).await;

    assert_eq!(400, response.status().as_u16());
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["success"], false);
    assert!(error["message"]
        .as_str()
        .unwrap()
        .contains("At least one guardian is required"));
    assert_eq!(error["errors"][0]["path"], "guardians");
    assert_eq!(app.storage.application_count().await, 0);
}

#[tokio::test]
async fn submit_reports_every_invalid_field_in_one_response() {
    let app = spawn_app().await;
    let mut body = random_application();
    body["age"] = json!(15);
    body["gpa"] = json!("5.0");
    body["guardians"][0]["telephone"] = json!("123");
    body.as_object_mut().unwrap().remove("email");

    let response = app.post_application(&body).await;

    assert_eq!(400, response.status().as_u16());
    let error: Value = response.json().await.unwrap();
    let paths: Vec<&str> = error["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["path"].as_str().unwrap())
        .collect();
    for expected in ["age", "gpa", "email", "guardians[0].telephone"] {
        assert!(paths.contains(&expected), "missing {} in {:?}", expected, paths);
    }
}

#[tokio::test]
async fn a_wrongly_typed_field_does_not_hide_the_others() {
    let app = spawn_app().await;
    let mut body = random_application();
    body["age"] = json!("twenty");
    body["gpa"] = json!("9");
    body["guardians"] = json!([]);

    let response = app.post_application(&body).await;

    assert_eq!(400, response.status().as_u16());
    let error: Value = response.json().await.unwrap();
    let paths: Vec<&str> = error["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["path"].as_str().unwrap())
        .collect();
    assert_eq!(paths, vec!["age", "gpa", "guardians"]);
}

#[tokio::test]
async fn malformed_json_returns_400() {
    let app = spawn_app().await;

    let response = app
        .api_client
        .post(&format!("{}/api/applications", &app.address))
        .header("Content-Type", "application/json")
        .body("{\"surname\": ")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(400, response.status().as_u16());
    assert_eq!(app.storage.application_count().await, 0);
}

#[tokio::test]
async fn submit_requires_a_session_when_configured() {
    let app = spawn_app_with(session_config(true)).await;

    let response = app.post_application(&random_application()).await;
    assert_eq!(401, response.status().as_u16());
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["message"], "Not authenticated");

    // An invalid body is still rejected as unauthenticated first.
    let response = app.post_application(&json!({})).await;
    assert_eq!(401, response.status().as_u16());

    assert_eq!(app.storage.application_count().await, 0);
}

#[tokio::test]
async fn submit_with_a_valid_session_is_accepted() {
    let app = spawn_app_with(session_config(true)).await;
    let token = session_token(Duration::hours(1));

    let response = app
        .post_application_with_session(&random_application(), &token)
        .await;

    assert_eq!(201, response.status().as_u16());
    assert_eq!(app.storage.application_count().await, 1);
}

#[tokio::test]
async fn submit_with_an_expired_session_is_rejected() {
    let app = spawn_app_with(session_config(true)).await;
    let token = session_token(Duration::hours(-1));

    let response = app
        .post_application_with_session(&random_application(), &token)
        .await;

    assert_eq!(401, response.status().as_u16());
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["message"], "Session expired");
}

#[tokio::test]
async fn listing_returns_newest_first() {
    let app = spawn_app().await;
    let first = app.submit(&application("Ackeem", "Blake")).await;
    let second = app.submit(&application("Natoya", "Goule")).await;
    let third = app.submit(&application("Oblique", "Seville")).await;

    let response = app.get_applications(None).await;

    assert_eq!(200, response.status().as_u16());
    let listed: Vec<Value> = response.json().await.unwrap();
    let ids: Vec<&Value> = listed.iter().map(|a| &a["id"]).collect();
    assert_eq!(ids, vec![&third["id"], &second["id"], &first["id"]]);
}

#[tokio::test]
async fn listing_an_empty_store_returns_an_empty_array() {
    let app = spawn_app().await;

    let response = app.get_applications(None).await;

    assert_eq!(200, response.status().as_u16());
    let listed: Vec<Value> = response.json().await.unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn search_is_a_case_insensitive_substring_match() {
    let app = spawn_app().await;
    app.submit(&application("Shericka", "Campbell")).await;
    app.submit(&application("Ackeem", "Blake")).await;

    let listed: Vec<Value> = app.get_applications(Some("camp")).await.json().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["surname"], "Campbell");

    let listed: Vec<Value> = app.get_applications(Some("ACKEEM")).await.json().await.unwrap();
    assert_eq!(listed.len(), 1);

    let listed: Vec<Value> = app.get_applications(Some("football")).await.json().await.unwrap();
    assert_eq!(listed.len(), 2);

    let listed: Vec<Value> = app.get_applications(Some("netball")).await.json().await.unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn a_blank_search_returns_everything() {
    let app = spawn_app().await;
    app.submit(&application("Shericka", "Campbell")).await;
    app.submit(&application("Ackeem", "Blake")).await;

    let listed: Vec<Value> = app.get_applications(Some("   ")).await.json().await.unwrap();

    assert_eq!(listed.len(), 2);
}

// Wildcards in the query are passed through to LIKE, so "%" matches everything.
#[tokio::test]
async fn search_wildcards_are_not_escaped() {
    let app = spawn_app().await;
    app.submit(&application("Shericka", "Campbell")).await;
    app.submit(&application("Ackeem", "Blake")).await;

    let listed: Vec<Value> = app.get_applications(Some("%")).await.json().await.unwrap();

    assert_eq!(listed.len(), 2);
}

#[tokio::test]
async fn get_by_id_round_trips_every_submitted_field() {
    let app = spawn_app().await;
    let mut body = application("Shericka", "Campbell");
    body["middleName"] = json!("Ann");
    body["semester1Amount"] = json!(150000);
    body["semester2Amount"] = json!(95000);
    body["didTransfer"] = json!(true);
    body["transferProgrammeName"] = json!("Associate Degree in Sport");
    body["majorAccomplishments"] = json!("ISSA Champs 400m gold");
    body["nationalRepresentative"] = json!(true);
    body["nationalRepDetails"] = json!("CARIFTA 2021");
    body["scholarshipAccommodation"] = json!(false);
    body["guardians"] = json!([guardian(), guardian()]);
    body["affiliations"] = json!([{ "name": "MVP Track Club" }, { "name": "Racers" }]);
    let created = app.submit(&body).await;

    let response = app.get_application(created["id"].as_str().unwrap()).await;

    assert_eq!(200, response.status().as_u16());
    let fetched: Value = response.json().await.unwrap();
    assert_eq!(fetched, created);
    assert_same_fields(&body, &fetched, "");
    for list in ["guardians", "affiliations"] {
        let submitted = body[list].as_array().unwrap();
        let stored = fetched[list].as_array().unwrap();
        assert_eq!(submitted.len(), stored.len(), "{} count", list);
        for (index, (sent, kept)) in submitted.iter().zip(stored).enumerate() {
            assert_same_fields(sent, kept, &format!("{}[{}]", list, index));
            assert_eq!(kept["applicationId"], created["id"]);
        }
    }
}

/// Every key sent must come back with the same value.
fn assert_same_fields(sent: &Value, kept: &Value, at: &str) {
    for (key, value) in sent.as_object().unwrap() {
        if value.is_array() {
            continue;
        }
        assert_eq!(&kept[key], value, "{}.{} did not round-trip", at, key);
    }
}

#[tokio::test]
async fn get_by_unknown_id_returns_404() {
    let app = spawn_app().await;

    let response = app.get_application("4f1c2d9e-0000-4000-8000-000000000000").await;

    assert_eq!(404, response.status().as_u16());
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["message"], "Application not found");
}
