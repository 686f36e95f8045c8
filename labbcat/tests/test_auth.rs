mod helpers;

use async_trait::async_trait;
use helpers::*;
use labbcat::auth::{AuthPhase, AuthScheme, CredentialProvider};
use labbcat::errors::{AuthError, LabbcatError};
use labbcat::types::Username;
use labbcat::{ClientConfig, LabbcatView};
use rstest::*;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use wiremock::matchers::{any, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BASIC_LABBCAT: &str = "Basic bGFiYmNhdDpsYWJiY2F0";

fn basic_challenge() -> ResponseTemplate {
    ResponseTemplate::new(401).insert_header("WWW-Authenticate", "Basic realm=\"LaBB-CAT\"")
}

/// Answers prompts from a list of usernames and passwords, then cancels.
struct Answers {
    remaining: Mutex<VecDeque<(&'static str, &'static str)>>,
    password: Mutex<Option<&'static str>>,
}

impl Answers {
    fn new(answers: &[(&'static str, &'static str)]) -> Self {
        Self {
            remaining: Mutex::new(answers.iter().copied().collect()),
            password: Mutex::new(None),
        }
    }
}

#[async_trait]
impl CredentialProvider for Answers {
    async fn prompt_username(&self) -> Result<Username, AuthError> {
        let (username, password) = self
            .remaining
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(AuthError::Cancelled)?;
        *self.password.lock().unwrap() = Some(password);
        Ok(Username::from(username))
    }

    async fn prompt_password(&self, _username: &Username) -> Result<String, AuthError> {
        self.password
            .lock()
            .unwrap()
            .take()
            .map(str::to_string)
            .ok_or(AuthError::Cancelled)
    }
}

async fn connect_as(server: &MockServer, password: &str) -> Result<LabbcatView, LabbcatError> {
    LabbcatView::build(labbcat_url(server), &ClientConfig::default())?
        .credentials("labbcat".into(), password.to_string())
        .connect()
        .await
}

#[rstest]
#[tokio::test]
async fn test_open_server() -> AnyResult {
    let server = open_server().await;
    let client = view_client(&server).await;
    assert!(client.authorization().await?.is_none());
    assert!(matches!(client.auth_phase().await, AuthPhase::Authenticated(None)));
    Ok(())
}

#[rstest]
#[tokio::test]
async fn test_basic_auth_is_negotiated_once() -> AnyResult {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(resource("api/store/")))
        .and(header("Authorization", BASIC_LABBCAT))
        .respond_with(ok(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(resource("api/store/getId")))
        .and(header("Authorization", BASIC_LABBCAT))
        .respond_with(ok(json!("demo")))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(any())
        .respond_with(basic_challenge())
        .expect(1)
        .mount(&server)
        .await;

    let client = connect_as(&server, "labbcat").await?;
    assert_eq!(client.get_id().await?, "demo");
    assert_eq!(client.get_id().await?, "demo");
    let authorization = client.authorization().await?.unwrap();
    assert_eq!(authorization.scheme(), AuthScheme::Basic);
    assert_eq!(authorization.token(), BASIC_LABBCAT);
    Ok(())
}

#[rstest]
#[tokio::test]
async fn test_rejected_credentials_are_retried_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(resource("api/store/")))
        .respond_with(basic_challenge())
        .expect(2)
        .mount(&server)
        .await;

    let error = connect_as(&server, "wrong").await.unwrap_err();
    assert!(matches!(error, LabbcatError::Auth(AuthError::CredentialsInvalid)));
    assert_eq!(error.to_string(), "Username/password invalid");
}

#[rstest]
#[tokio::test]
async fn test_credentials_required() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(resource("api/store/")))
        .respond_with(basic_challenge())
        .expect(1)
        .mount(&server)
        .await;

    let error = LabbcatView::build(labbcat_url(&server), &ClientConfig::default())
        .unwrap()
        .connect()
        .await
        .unwrap_err();
    assert!(matches!(error, LabbcatError::Auth(AuthError::CredentialsRequired)));
}

#[rstest]
#[tokio::test]
async fn test_form_login() -> AnyResult {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(resource("api/store/")))
        .and(header("Cookie", "JSESSIONID=after"))
        .respond_with(ok(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(resource("j_security_check")))
        .and(header("Cookie", "JSESSIONID=before"))
        .and(body_string_contains("j_username=labbcat"))
        .and(body_string_contains("j_password=labbcat"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", "http://localhost/labbcat/")
                .insert_header("Set-Cookie", "JSESSIONID=after; Path=/labbcat; HttpOnly"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(resource("api/store/")))
        .respond_with(
            ResponseTemplate::new(401)
                .insert_header("Set-Cookie", "JSESSIONID=before; Path=/labbcat; HttpOnly"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = connect_as(&server, "labbcat").await?;
    let authorization = client.authorization().await?.unwrap();
    assert_eq!(authorization.scheme(), AuthScheme::Form);
    assert_eq!(authorization.token(), "Cookie: JSESSIONID=after");
    Ok(())
}

#[rstest]
#[case(json!("20200101.0000"), Some("20200101.0000"))]
#[case(json!(null), None)]
#[tokio::test]
async fn test_server_too_old(#[case] version: serde_json::Value, #[case] expected: Option<&str>) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(resource("api/store/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "title": "LaBB-CAT",
            "version": version,
            "code": 0,
            "errors": [],
            "messages": [],
            "model": {}
        })))
        .mount(&server)
        .await;

    let error = LabbcatView::build(labbcat_url(&server), &ClientConfig::default())
        .unwrap()
        .connect()
        .await
        .unwrap_err();
    match error {
        LabbcatError::Auth(AuthError::ServerTooOld { server, required }) => {
            assert_eq!(server.as_deref(), expected);
            assert_eq!(required, "20210210.2032");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[rstest]
#[tokio::test]
async fn test_minimum_version_is_configurable() -> AnyResult {
    let server = open_server().await;
    let config = ClientConfig {
        min_version: "20990101.0000".to_string(),
        ..Default::default()
    };
    let result = LabbcatView::build(labbcat_url(&server), &config)?
        .connect()
        .await;
    assert!(matches!(
        result,
        Err(LabbcatError::Auth(AuthError::ServerTooOld { .. }))
    ));
    Ok(())
}

#[rstest]
#[tokio::test]
async fn test_expired_authorization_is_renegotiated() -> AnyResult {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(resource("api/store/")))
        .and(header("Authorization", BASIC_LABBCAT))
        .respond_with(ok(json!({})))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(resource("api/store/getId")))
        .and(header("Authorization", BASIC_LABBCAT))
        .respond_with(basic_challenge())
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(resource("api/store/getId")))
        .and(header("Authorization", BASIC_LABBCAT))
        .respond_with(ok(json!("demo")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(any())
        .respond_with(basic_challenge())
        .expect(2)
        .mount(&server)
        .await;

    let client = connect_as(&server, "labbcat").await?;
    assert_eq!(client.get_id().await?, "demo");
    Ok(())
}

#[rstest]
#[tokio::test]
async fn test_application_error() -> AnyResult {
    let server = open_server().await;
    Mock::given(method("GET"))
        .and(path(resource("api/store/getTranscriptIdsInCorpus")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "title": "LaBB-CAT",
            "version": SERVER_VERSION,
            "code": 1,
            "errors": ["Corpus not found: nonexistent"],
            "messages": [],
            "model": null
        })))
        .mount(&server)
        .await;
    let client = view_client(&server).await;
    let error = client
        .get_transcript_ids_in_corpus(&"nonexistent".into())
        .await
        .unwrap_err();
    assert!(matches!(error, LabbcatError::Response { code: 1, .. }));
    assert_eq!(error.to_string(), "Corpus not found: nonexistent");
    Ok(())
}

#[rstest]
#[tokio::test]
async fn test_html_error_page() -> AnyResult {
    let server = open_server().await;
    Mock::given(method("GET"))
        .and(path(resource("api/store/getLayerIds")))
        .respond_with(
            ResponseTemplate::new(500).set_body_string("<html>Internal Server Error</html>"),
        )
        .mount(&server)
        .await;
    let client = view_client(&server).await;
    let error = client.get_layer_ids().await.unwrap_err();
    assert!(matches!(error, LabbcatError::Http { .. }));
    assert_eq!(
        error.status(),
        Some(labbcat::reqwest::StatusCode::INTERNAL_SERVER_ERROR)
    );
    Ok(())
}

#[rstest]
#[tokio::test]
async fn test_credentials_survive_failed_renegotiation() -> AnyResult {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(resource("api/store/")))
        .and(header("Authorization", BASIC_LABBCAT))
        .respond_with(ok(json!({})))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(resource("api/store/")))
        .and(header("Authorization", BASIC_LABBCAT))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>Server Error</html>"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(resource("api/store/")))
        .and(header("Authorization", BASIC_LABBCAT))
        .respond_with(ok(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(resource("api/store/getId")))
        .and(header("Authorization", BASIC_LABBCAT))
        .respond_with(basic_challenge())
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(resource("api/store/getId")))
        .and(header("Authorization", BASIC_LABBCAT))
        .respond_with(ok(json!("demo")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(any())
        .respond_with(basic_challenge())
        .expect(3)
        .mount(&server)
        .await;

    let client = connect_as(&server, "labbcat").await?;
    let error = client.get_id().await.unwrap_err();
    assert!(matches!(error, LabbcatError::Http { .. }));
    assert_eq!(client.get_id().await?, "demo");
    Ok(())
}

#[rstest]
#[tokio::test]
async fn test_prompted_again_after_rejection() -> AnyResult {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(resource("api/store/")))
        .and(header("Authorization", BASIC_LABBCAT))
        .respond_with(ok(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(resource("api/store/")))
        .respond_with(basic_challenge())
        .expect(2)
        .mount(&server)
        .await;

    let provider = Answers::new(&[("labbcat", "wrong"), ("labbcat", "labbcat")]);
    let client = LabbcatView::build(labbcat_url(&server), &ClientConfig::default())?
        .credential_provider(provider)
        .connect()
        .await?;
    let authorization = client.authorization().await?.unwrap();
    assert_eq!(authorization.token(), BASIC_LABBCAT);
    Ok(())
}

#[rstest]
#[tokio::test]
async fn test_cancelled_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(resource("api/store/")))
        .respond_with(basic_challenge())
        .expect(1)
        .mount(&server)
        .await;

    let error = LabbcatView::build(labbcat_url(&server), &ClientConfig::default())
        .unwrap()
        .credential_provider(Answers::new(&[]))
        .connect()
        .await
        .unwrap_err();
    assert!(matches!(error, LabbcatError::Auth(AuthError::Cancelled)));
}

#[rstest]
#[tokio::test]
async fn test_api_requests_time_out() -> AnyResult {
    let server = open_server().await;
    Mock::given(method("GET"))
        .and(path(resource("api/store/getId")))
        .respond_with(ok(json!("demo")).set_delay(Duration::from_millis(1500)))
        .mount(&server)
        .await;
    let config = ClientConfig {
        timeout: Duration::from_millis(300),
        ..Default::default()
    };
    let client = LabbcatView::build(labbcat_url(&server), &config)?
        .connect()
        .await?;
    match client.get_id().await {
        Err(LabbcatError::Transport(e)) => assert!(e.is_timeout()),
        other => panic!("unexpected result: {:?}", other),
    }
    Ok(())
}
