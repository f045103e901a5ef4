use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use healthtools::analytics::Analytics;
use healthtools::api::models::{QUERY_REQUIRED, SearchEnvelope};
use healthtools::api::{AppState, create_router};
use healthtools::error::{MessengerError, SearchError};
use healthtools::messenger::MessageSender;
use healthtools::search::SearchIndex;

mod test_helpers {
    use super::*;

    pub struct NullSender;

    #[async_trait]
    impl MessageSender for NullSender {
        async fn send_message(&self, _recipient: &str, _text: &str) -> Result<(), MessengerError> {
            Ok(())
        }
    }

    pub enum Outcome {
        Docs(Vec<Value>),
        Fail(u16, &'static str),
    }

    /// Returns a canned outcome and remembers what it was asked.
    pub struct FakeIndex {
        pub outcome: Outcome,
        pub calls: Mutex<Vec<(String, String)>>,
    }

    impl FakeIndex {
        pub fn new(outcome: Outcome) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl SearchIndex for FakeIndex {
        async fn lookup(&self, index: &str, query: &str) -> Result<Vec<Value>, SearchError> {
            self.calls
                .lock()
                .unwrap()
                .push((index.to_string(), query.to_string()));
            match &self.outcome {
                Outcome::Docs(docs) => Ok(docs.clone()),
                Outcome::Fail(status, body) => Err(SearchError::Api {
                    status: *status,
                    body: body.to_string(),
                }),
            }
        }
    }

    pub fn app(index: Arc<FakeIndex>) -> Router {
        app_with_analytics(index, Analytics::disabled())
    }

    pub fn app_with_analytics(index: Arc<FakeIndex>, analytics: Analytics) -> Router {
        create_router(AppState::new("token", Arc::new(NullSender), index, analytics))
    }

    pub fn tracking(server: &MockServer) -> Analytics {
        Analytics::new(
            reqwest::Client::new(),
            Some("UA-TEST".to_string()),
            format!("{}/collect", server.uri()),
        )
    }

    /// Gives spawned analytics uploads time to land, then checks expectations.
    pub async fn settle_and_verify(server: &MockServer, want: usize) {
        for _ in 0..25 {
            let seen = server.received_requests().await.unwrap_or_default().len();
            if want > 0 && seen >= want {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        server.verify().await;
    }

    pub async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }
}

use test_helpers::*;

#[tokio::test]
async fn test_empty_query_returns_error_field() {
    let index = FakeIndex::new(Outcome::Docs(vec![json!({"name": "x"})]));

    for uri in [
        "/nhif-outpatient/search.json?q=",
        "/nhif-outpatient/search.json",
    ] {
        let (status, body) = get(app(index.clone()), uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["error"], QUERY_REQUIRED);
        assert_eq!(body["data"]["nhif_outpatient"], json!([]));
    }
    assert!(index.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_no_matches_returns_not_found_message() {
    let index = FakeIndex::new(Outcome::Docs(vec![]));

    let (status, body) = get(app(index.clone()), "/nhif-outpatient/search.json?q=clinic").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(
        body["message"],
        "No NHIF Outpatient facility by that name found."
    );
    assert_eq!(body["data"]["nhif_outpatient"], json!([]));
    assert_eq!(
        *index.calls.lock().unwrap(),
        vec![("nhif-outpatient".to_string(), "clinic".to_string())]
    );
}

#[tokio::test]
async fn test_matches_are_passed_through() {
    let docs = vec![
        json!({"name": "Kenyatta National Hospital", "code": 1}),
        json!({"name": "Kijabe Hospital", "code": 2}),
    ];
    let index = FakeIndex::new(Outcome::Docs(docs.clone()));

    let (_, body) = get(app(index), "/doctors/search.json?q=k").await;
    let envelope: SearchEnvelope = serde_json::from_value(body).unwrap();

    assert_eq!(envelope.status.as_deref(), Some("success"));
    assert!(envelope.message.is_none());
    assert_eq!(envelope.items("doctors"), docs.as_slice());
}

#[tokio::test]
async fn test_lookup_failure_returns_error_envelope() {
    let index = FakeIndex::new(Outcome::Fail(503, "cluster unavailable"));

    let (status, body) = get(app(index), "/nurses/search.json?q=wanjiku").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "error");
    assert_eq!(
        body["message"],
        "search service returned 503: cluster unavailable"
    );
    assert_eq!(body["data"]["nurses"], json!([]));
}

#[tokio::test]
async fn test_unknown_registry_is_not_found() {
    let index = FakeIndex::new(Outcome::Docs(vec![]));

    let (status, body) = get(app(index.clone()), "/pharmacies/search.json?q=x").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
    assert!(index.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_index_lists_every_registry() {
    let (status, body) = get(app(FakeIndex::new(Outcome::Docs(vec![]))), "/").await;

    assert_eq!(status, StatusCode::OK);
    let endpoints = body["endpoints"].as_object().unwrap();
    assert!(endpoints.contains_key("/health"));
    assert!(endpoints.contains_key("/webhook"));
    for registry in healthtools::search::REGISTRIES {
        assert!(endpoints.contains_key(&registry.search_path()));
    }
    assert_eq!(
        body["endpoints"]["/doctors/search.json"]["args"]["q"]["required"],
        true
    );
}

#[tokio::test]
async fn test_repeated_query_key_uses_first_value() {
    let index = FakeIndex::new(Outcome::Docs(vec![json!({"name": "a"})]));

    let (status, body) = get(app(index.clone()), "/doctors/search.json?q=a&q=b").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(
        *index.calls.lock().unwrap(),
        vec![("doctors".to_string(), "a".to_string())]
    );

    // an empty first value is still a missing query
    let (status, body) = get(app(index), "/doctors/search.json?q=&q=b").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"], QUERY_REQUIRED);
}

#[tokio::test]
async fn test_search_sends_one_analytics_event() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/collect"))
        .and(body_string_contains("tid=UA-TEST"))
        .and(body_string_contains("ec=Doctors"))
        .and(body_string_contains("ea=search"))
        .and(body_string_contains("el=kamau"))
        .and(body_string_contains("ev=2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let index = FakeIndex::new(Outcome::Docs(vec![json!({"n": 1}), json!({"n": 2})]));
    let (status, _) = get(
        app_with_analytics(index, tracking(&server)),
        "/doctors/search.json?q=kamau",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    settle_and_verify(&server, 1).await;
}

#[tokio::test]
async fn test_empty_result_still_sends_analytics_event() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/collect"))
        .and(body_string_contains("ec=Nurses"))
        .and(body_string_contains("ev=0"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let index = FakeIndex::new(Outcome::Docs(vec![]));
    get(
        app_with_analytics(index, tracking(&server)),
        "/nurses/search.json?q=nobody",
    )
    .await;

    settle_and_verify(&server, 1).await;
}

#[tokio::test]
async fn test_missing_query_and_failure_send_no_analytics() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/collect"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let ok_index = FakeIndex::new(Outcome::Docs(vec![json!({"n": 1})]));
    get(
        app_with_analytics(ok_index, tracking(&server)),
        "/doctors/search.json?q=",
    )
    .await;

    let failing = FakeIndex::new(Outcome::Fail(500, "boom"));
    let (_, body) = get(
        app_with_analytics(failing, tracking(&server)),
        "/doctors/search.json?q=kamau",
    )
    .await;
    assert_eq!(body["status"], "error");

    settle_and_verify(&server, 0).await;
}
