//! End-to-end tests against a real listener.
//!
//! Each test binds the router on an ephemeral localhost port and talks to it
//! over HTTP the way existing clients do (form-encoded and multipart bodies).

use std::net::SocketAddr;
use std::sync::Arc;

use hotel_rating_api::api::{create_router, AppState};
use hotel_rating_api::predictor::{KnnPredictor, MockPredictor, SharedPredictor};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Start a server with the given predictor and return its address.
async fn spawn_server(predictor: SharedPredictor) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = create_router(AppState::new(predictor));

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    addr
}

fn url(addr: SocketAddr, path: &str) -> String {
    format!("http://{}{}", addr, path)
}

#[tokio::test]
async fn root_and_hello() {
    let addr = spawn_server(Arc::new(MockPredictor::returning(1.0))).await;
    let client = reqwest::Client::new();

    let root = client.get(url(addr, "/")).send().await.unwrap();
    assert_eq!(root.status(), StatusCode::OK);
    assert_eq!(root.text().await.unwrap(), "API is running!");

    let hello = client.get(url(addr, "/api/hello")).send().await.unwrap();
    assert_eq!(hello.status(), StatusCode::OK);
    let body: Value = hello.json().await.unwrap();
    assert_eq!(body, json!({"message": "Hello, World!"}));
}

#[tokio::test]
async fn form_prediction_round_trip() {
    let mock = MockPredictor::returning(4.4);
    let addr = spawn_server(Arc::new(mock.clone())).await;

    let response = reqwest::Client::new()
        .post(url(addr, "/api/predictHotel"))
        .form(&[("longtitude", "106.809331"), ("latitude", "-6.216947")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"data": 4.4}));
    assert_eq!(mock.calls(), vec![(106.809331, -6.216947)]);
}

#[tokio::test]
async fn multipart_prediction() {
    let mock = MockPredictor::returning(json!({"rating": 3.2}));
    let addr = spawn_server(Arc::new(mock.clone())).await;

    let form = reqwest::multipart::Form::new()
        .text("longtitude", "10.5")
        .text("latitude", "20.25");
    let response = reqwest::Client::new()
        .post(url(addr, "/api/predictHotel"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"data": {"rating": 3.2}}));
    assert_eq!(mock.calls(), vec![(10.5, 20.25)]);
}

#[tokio::test]
async fn server_keeps_serving_after_bad_requests() {
    let mock = MockPredictor::returning(2.0);
    let addr = spawn_server(Arc::new(mock.clone())).await;
    let client = reqwest::Client::new();

    let missing = client
        .post(url(addr, "/api/predictHotel"))
        .form(&[("longtitude", "10.5")])
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let garbage = client
        .post(url(addr, "/api/predictHotel"))
        .form(&[("longtitude", "abc"), ("latitude", "1")])
        .send()
        .await
        .unwrap();
    assert_eq!(garbage.status(), StatusCode::BAD_REQUEST);

    let ok = client
        .post(url(addr, "/api/predictHotel"))
        .form(&[("longtitude", "1"), ("latitude", "1")])
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn failing_predictor_returns_500_and_server_survives() {
    let addr = spawn_server(Arc::new(MockPredictor::failing("model offline"))).await;
    let client = reqwest::Client::new();

    let response = client
        .post(url(addr, "/api/predictHotel"))
        .form(&[("longtitude", "1"), ("latitude", "1")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let root = client.get(url(addr, "/")).send().await.unwrap();
    assert_eq!(root.status(), StatusCode::OK);
}

#[tokio::test]
async fn bundled_data_set_serves_deterministic_predictions() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/hotels.csv");
    let model = KnnPredictor::from_path(path, 5).unwrap();
    let addr = spawn_server(Arc::new(model)).await;
    let client = reqwest::Client::new();

    let mut bodies = Vec::new();
    for _ in 0..2 {
        let response = client
            .post(url(addr, "/api/predictHotel"))
            .form(&[("longtitude", "106.809331"), ("latitude", "-6.216947")])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        bodies.push(response.json::<Value>().await.unwrap());
    }

    assert_eq!(bodies[0], bodies[1]);
    let rating = bodies[0]["data"].as_f64().unwrap();
    assert!((1.0..=5.0).contains(&rating), "rating out of range: {}", rating);
}
