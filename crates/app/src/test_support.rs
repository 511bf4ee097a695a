use std::sync::{
    atomic::{AtomicI64, Ordering},
    Arc,
};

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use recovery_storage::Database;

use crate::router::{app_router, AppState};
use crate::telemetry;

/// 2024-05-01T00:00:00Z
const START_SECS: i64 = 1_714_521_600;

/// Router over a fresh in-memory database with a manually advanced clock.
pub struct TestApp {
    pub router: Router,
    pub database: Database,
    clock_secs: Arc<AtomicI64>,
}

impl TestApp {
    pub async fn new() -> Self {
        let metrics = telemetry::init_metrics().expect("metrics init");
        let database = Database::connect("sqlite::memory:")
            .await
            .expect("connect");
        database.run_migrations().await.expect("migrations");

        let clock_secs = Arc::new(AtomicI64::new(START_SECS));
        let source = clock_secs.clone();
        let state = AppState::new(metrics, database.clone()).with_clock(Arc::new(move || {
            DateTime::<Utc>::from_timestamp(source.load(Ordering::SeqCst), 0)
                .expect("valid timestamp")
        }));

        Self {
            router: app_router(state),
            database,
            clock_secs,
        }
    }

    pub fn advance_clock(&self, secs: i64) {
        self.clock_secs.fetch_add(secs, Ordering::SeqCst);
    }

    pub async fn create_client(&self, email: &str) -> Value {
        let (status, body) = send(
            &self.router,
            Method::POST,
            "/clients",
            Some(client_body(email)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "client creation failed: {body}");
        body
    }

    pub async fn create_case(
        &self,
        client_id: i64,
        invoice_number: &str,
        invoice: &str,
        due: &str,
        status: &str,
    ) -> Value {
        let (code, body) = send(
            &self.router,
            Method::POST,
            "/cases",
            Some(json!({
                "client_id": client_id,
                "invoice_number": invoice_number,
                "invoice_amount": 1500.0,
                "invoice_date": invoice,
                "due_date": due,
                "status": status,
            })),
        )
        .await;
        assert_eq!(code, StatusCode::CREATED, "case creation failed: {body}");
        body
    }
}

pub fn client_body(email: &str) -> Value {
    json!({
        "client_name": "Acme",
        "company_name": "Acme Industries",
        "city": "Lyon",
        "contact_person": "Jane Doe",
        "phone": "+33 4 72 00 00 00",
        "email": email,
    })
}

/// Sends one request and decodes the JSON body (`Value::Null` when empty).
pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(builder.body(body).expect("request"))
        .await
        .expect("handler should respond");

    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should read")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}
