mod common;

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::Value;
use tower::ServiceExt;

use common::{build_app, employer_vacancy, external_job, test_config, FakeExternalJobs, FakeVacancies, Fakes};

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn ids(json: &Value) -> Vec<String> {
    json["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn employer_listings_precede_external_listings() {
    let a = employer_vacancy("Electrician");
    let b = employer_vacancy("Electrical Estimator");
    let (a_id, b_id) = (a.id.to_string(), b.id.to_string());
    let fakes = Fakes {
        vacancies: Arc::new(FakeVacancies { rows: vec![a, b] }),
        external: Arc::new(FakeExternalJobs {
            cached: vec![
                external_job("c", "Approved Electrician", "Volt Ltd", Some(Utc::now())),
                external_job("d", "Maintenance Electrician", "Amp Co", None),
            ],
            ..Default::default()
        }),
        ..Default::default()
    };
    let app = build_app(&fakes, test_config(&[]));

    let (status, json) = get(&app, "/api/jobs/feed").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&json), vec![a_id, b_id, "c".to_string(), "d".to_string()]);
    assert_eq!(json["items"][0]["source"], "employer");
    assert_eq!(json["items"][0]["salary"], "From £35,000");
    assert_eq!(json["items"][2]["source"], "external");
    assert_eq!(json["items"][2]["is_fresh"], true);
    assert_eq!(json["items"][3]["is_fresh"], false);
    assert_eq!(json["employer_count"], 2);
    assert_eq!(json["external_total"], 2);
}

#[tokio::test]
async fn irrelevant_trades_are_dropped_from_external_listings() {
    let fakes = Fakes {
        external: Arc::new(FakeExternalJobs {
            cached: vec![
                external_job("1", "Electrician/Plumber required", "Mixed Trades", None),
                external_job("2", "Plumber and Electrician required", "Mixed Trades", None),
                external_job("3", "Joiner", "Wood Co", None),
            ],
            ..Default::default()
        }),
        ..Default::default()
    };
    let app = build_app(&fakes, test_config(&[]));

    let (status, json) = get(&app, "/api/jobs/feed?source=external").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&json), vec!["1".to_string()]);
}

#[tokio::test]
async fn pagination_applies_to_external_listings_only() {
    let fakes = Fakes {
        vacancies: Arc::new(FakeVacancies {
            rows: vec![employer_vacancy("Electrician"), employer_vacancy("Electrical Engineer")],
        }),
        external: Arc::new(FakeExternalJobs {
            cached: (1..=5)
                .map(|i| external_job(&i.to_string(), "Electrician", &format!("Firm {}", i), None))
                .collect(),
            ..Default::default()
        }),
        ..Default::default()
    };
    let app = build_app(&fakes, test_config(&[]));

    let (status, json) = get(&app, "/api/jobs/feed?page=2&per_page=2").await;

    assert_eq!(status, StatusCode::OK);
    let ids = ids(&json);
    assert_eq!(ids.len(), 4);
    assert_eq!(&ids[2..], &["3".to_string(), "4".to_string()]);
    assert_eq!(json["total_pages"], 3);
    assert_eq!(json["page"], 2);
}

#[tokio::test]
async fn free_text_search_uses_live_results_and_dedupes() {
    let fakes = Fakes {
        external: Arc::new(FakeExternalJobs {
            live: Some(vec![
                external_job("1", "Electrician", "Volt Ltd", None),
                external_job("2", " ELECTRICIAN", "volt ltd ", Some(Utc::now() - Duration::hours(2))),
                external_job("3", "Electrician", "Amp Co", None),
            ]),
            ..Default::default()
        }),
        ..Default::default()
    };
    let app = build_app(&fakes, test_config(&[]));

    let (status, json) = get(&app, "/api/jobs/feed?q=electrician&source=external").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&json), vec!["1".to_string(), "3".to_string()]);
    assert_eq!(
        fakes.external.searches.lock().unwrap().clone(),
        vec!["electrician".to_string()]
    );
    assert!(json["last_updated"].is_string());
}

#[tokio::test]
async fn default_feed_does_not_dedupe() {
    let fakes = Fakes {
        external: Arc::new(FakeExternalJobs {
            cached: vec![
                external_job("1", "Electrician", "Volt Ltd", None),
                external_job("2", "electrician", "VOLT LTD", None),
            ],
            ..Default::default()
        }),
        ..Default::default()
    };
    let app = build_app(&fakes, test_config(&[]));

    let (_, json) = get(&app, "/api/jobs/feed").await;
    assert_eq!(ids(&json).len(), 2);
}

#[tokio::test]
async fn invalid_filters_are_rejected() {
    let fakes = Fakes::default();
    let app = build_app(&fakes, test_config(&[]));

    let (status, json) = get(&app, "/api/jobs/feed?salary_min=50000&salary_max=20000").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());

    let (status, _) = get(&app, "/api/jobs/feed?per_page=500").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_and_openapi_are_served() {
    let fakes = Fakes::default();
    let app = build_app(&fakes, test_config(&[]));

    let (status, json) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");

    let (status, json) = get(&app, "/api/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["paths"]["/api/jobs/feed"].is_object());
    assert!(json["paths"]["/api/webhooks/stripe-connect"].is_object());
}

#[tokio::test]
async fn public_routes_are_rate_limited() {
    let fakes = Fakes::default();
    let app = build_app(&fakes, test_config(&[("PUBLIC_RPS", "1")]));

    let (first, _) = get(&app, "/api/jobs/feed").await;
    let (second, _) = get(&app, "/api/jobs/feed").await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn live_search_honours_job_type() {
    let mut permanent = external_job("1", "Electrician", "Volt Ltd", None);
    permanent.job_type = "Permanent".into();
    let mut contract = external_job("2", "Electrician", "Amp Co", None);
    contract.job_type = "Contract".into();
    let fakes = Fakes {
        external: Arc::new(FakeExternalJobs {
            live: Some(vec![permanent, contract]),
            ..Default::default()
        }),
        ..Default::default()
    };
    let app = build_app(&fakes, test_config(&[]));

    let (status, json) = get(&app, "/api/jobs/feed?source=external&q=electrician&job_type=Contract").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&json), vec!["2".to_string()]);
    assert_eq!(json["items"][0]["job_type"], "Contract");
}
