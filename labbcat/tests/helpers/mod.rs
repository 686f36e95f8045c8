#![allow(dead_code)]

use labbcat::types::LabbcatUrl;
use labbcat::{ClientConfig, LabbcatView};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub type AnyResult = Result<(), Box<dyn std::error::Error>>;

/// Base path of LaBB-CAT on the mock server.
pub const BASE: &str = "/labbcat/";

pub const SERVER_VERSION: &str = "20240131.1200";

pub fn labbcat_url(server: &MockServer) -> LabbcatUrl {
    LabbcatUrl::try_from(format!("{}{}", server.uri(), BASE)).unwrap()
}

/// Path of a resource on the mock server.
pub fn resource(r: &str) -> String {
    format!("{}{}", BASE, r)
}

/// A successful response envelope.
pub fn envelope(model: Value) -> Value {
    envelope_of_version(SERVER_VERSION, model)
}

pub fn envelope_of_version(version: &str, model: Value) -> Value {
    json!({
        "title": "LaBB-CAT",
        "version": version,
        "code": 0,
        "errors": [],
        "messages": [],
        "model": model
    })
}

pub fn ok(model: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(envelope(model))
}

pub fn task_status(id: &str, running: bool) -> Value {
    json!({
        "threadId": id,
        "threadName": "test",
        "running": running,
        "duration": 1,
        "percentComplete": if running { 50 } else { 100 },
        "status": if running { "Running" } else { "Finished" },
        "refreshSeconds": 1
    })
}

/// Mock server for a LaBB-CAT which does not require authorization.
pub async fn open_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(resource("api/store/")))
        .respond_with(ok(json!({})))
        .mount(&server)
        .await;
    server
}

pub async fn view_client(server: &MockServer) -> LabbcatView {
    LabbcatView::build(labbcat_url(server), &ClientConfig::default())
        .unwrap()
        .connect()
        .await
        .unwrap()
}
