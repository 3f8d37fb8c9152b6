use chrono::Duration;
use fake::faker::address::en::StreetName;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use once_cell::sync::Lazy;
use scholarship_portal::core::config::SessionConfig;
use scholarship_portal::core::session::{issue_session_token, SessionClaims, SessionUser};
use scholarship_portal::core::{get_subscriber, init_subscriber};
use scholarship_portal::db::{InMemoryStorage, Storage};
use scholarship_portal::scholarship_web_server::run;
use secrecy::Secret;
use serde_json::{json, Value};
use std::net::TcpListener;
use std::sync::Arc;

pub const SESSION_SECRET: &str = "integration-test-session-secret";

// Logs stay silent unless TEST_LOG is set.
static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    };
});

pub struct TestApp {
    pub address: String,
    pub storage: Arc<InMemoryStorage>,
    pub api_client: reqwest::Client,
}

impl TestApp {
    pub async fn post_application(&self, body: &Value) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/api/applications", &self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_application_with_session(
        &self,
        body: &Value,
        token: &str,
    ) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/api/applications", &self.address))
            .header("Cookie", format!("session={}", token))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_applications(&self, search: Option<&str>) -> reqwest::Response {
        let mut request = self
            .api_client
            .get(&format!("{}/api/applications", &self.address));
        if let Some(search) = search {
            request = request.query(&[("search", search)]);
        }
        request.send().await.expect("Failed to execute request.")
    }

    pub async fn get_application(&self, id: &str) -> reqwest::Response {
        self.api_client
            .get(&format!("{}/api/applications/{}", &self.address, id))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Submits and returns the created record.
    pub async fn submit(&self, body: &Value) -> Value {
        let response = self.post_application(body).await;
        assert_eq!(201, response.status().as_u16());
        response.json().await.expect("Response was not JSON")
    }
}

pub fn session_config(required: bool) -> SessionConfig {
    SessionConfig {
        secret: Some(Secret::new(SESSION_SECRET.to_string())),
        required,
        cookie_name: "session".to_string(),
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(session_config(false)).await
}

pub async fn spawn_app_with(session: SessionConfig) -> TestApp {
    let storage = Arc::new(InMemoryStorage::new());
    let address = spawn_server(storage.clone(), session);

    TestApp {
        address,
        storage,
        api_client: reqwest::Client::new(),
    }
}

/// Serves the routes on a random port over any backend and returns its base URL.
pub fn spawn_server(storage: Arc<dyn Storage>, session: SessionConfig) -> String {
    Lazy::force(&TRACING);

    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let server = run(listener, storage, session).expect("Failed to build server");
    let _ = tokio::spawn(server);

    format!("http://127.0.0.1:{}", port)
}

pub fn session_token(lifetime: Duration) -> String {
    let claims = SessionClaims::new(
        SessionUser {
            id: "staff-1".to_string(),
            email: Some("staff@example.com".to_string()),
            name: Some("Scholarship Office".to_string()),
        },
        lifetime,
    );
    issue_session_token(&claims, SESSION_SECRET).unwrap()
}

pub fn guardian() -> Value {
    json!({
        "surname": LastName().fake::<String>(),
        "firstName": FirstName().fake::<String>(),
        "middleInitial": "K",
        "relation": "Parent",
        "telephone": "876-555-0142",
        "address": format!("{} {}", (1..200).fake::<u16>(), StreetName().fake::<String>()),
    })
}

/// A complete, valid payload for an applicant with the given names.
pub fn application(first_name: &str, surname: &str) -> Value {
    json!({
        "surname": surname,
        "firstName": first_name,
        "gender": "M",
        "nationality": "Jamaican",
        "dateOfBirth": "2002-09-30",
        "age": 22,
        "studentId": format!("{}", (1_000_000..9_999_999).fake::<u32>()),
        "projectedGraduationYear": "2026",
        "telephone": "876-555-0100",
        "email": SafeEmail().fake::<String>(),
        "homeAddress": format!("{} {}", (1..200).fake::<u16>(), StreetName().fake::<String>()),
        "facultySchool": "School of Engineering",
        "courseOfStudy": "Civil Engineering",
        "yearStartedUtech": "2022",
        "gpa": "3.20",
        "programmeType": "Undergraduate",
        "programmeMode": "Full-time",
        "yearInSchool": "2nd",
        "didTransfer": false,
        "sport": "Football",
        "eventPosition": "Midfielder",
        "nationalRepresentative": false,
        "scholarshipTuition": true,
        "scholarshipBooks": true,
        "guardians": [guardian()],
        "affiliations": []
    })
}

pub fn random_application() -> Value {
    application(&FirstName().fake::<String>(), &LastName().fake::<String>())
}
