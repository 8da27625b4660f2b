//! End-to-end webhook delivery against a local axum endpoint.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};

use deadline_notify::{Delivery, Notifier, NotifyError, WebhookNotifier};

type Received = Arc<Mutex<Vec<serde_json::Value>>>;

async fn spawn_endpoint(status: StatusCode) -> (String, Received) {
    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route(
            "/send",
            post(
                move |State(received): State<Received>, Json(body): Json<serde_json::Value>| async move {
                    received.lock().unwrap().push(body);
                    status
                },
            ),
        )
        .with_state(received.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/send"), received)
}

fn delivery() -> Delivery {
    Delivery {
        phone_number: "+49 30 1234567".to_string(),
        message: "Data quality work order X (WO-1) has 2 days remaining before its deadline."
            .to_string(),
    }
}

#[tokio::test]
async fn posts_phone_number_and_message() {
    let (url, received) = spawn_endpoint(StatusCode::OK).await;
    let notifier = WebhookNotifier::new(url, HashMap::new()).unwrap();

    notifier.send(&delivery()).await.unwrap();

    let bodies = received.lock().unwrap().clone();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["PhoneNumber"], "+49 30 1234567");
    assert!(bodies[0]["Message"]
        .as_str()
        .unwrap()
        .contains("2 days remaining"));
}

#[tokio::test]
async fn non_success_status_is_reported() {
    let (url, _received) = spawn_endpoint(StatusCode::SERVICE_UNAVAILABLE).await;
    let notifier = WebhookNotifier::new(url, HashMap::new()).unwrap();

    match notifier.send(&delivery()).await.unwrap_err() {
        NotifyError::Rejected { status, .. } => assert_eq!(status, 503),
        other => panic!("expected Rejected, got: {other:?}"),
    }
}
