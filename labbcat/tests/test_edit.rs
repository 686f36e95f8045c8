mod helpers;

use helpers::*;
use labbcat::models::Corpus;
use labbcat::types::{LayerId, TaskId, TranscriptId};
use labbcat::{ClientConfig, LabbcatAdmin, LabbcatEdit};
use rstest::*;
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer};

#[rstest]
#[tokio::test]
async fn test_new_transcript() -> AnyResult {
    let server = open_server().await;
    Mock::given(method("POST"))
        .and(path(resource("edit/transcript/new")))
        .and(body_string_contains("name=\"todo\""))
        .and(body_string_contains("name=\"uploadfile1_0\"; filename=\"test.eaf\""))
        .and(body_string_contains("<ANNOTATION_DOCUMENT/>"))
        .and(body_string_contains("name=\"uploadmedia1\"; filename=\"test.wav\""))
        .and(body_string_contains("interview"))
        .respond_with(ok(json!({ "result": { "test.eaf": 77 } })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir()?;
    let dir = camino::Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    std::fs::write(dir.join("test.eaf"), "<ANNOTATION_DOCUMENT/>")?;
    std::fs::write(dir.join("test.wav"), "RIFF")?;

    let client = LabbcatEdit::build(labbcat_url(&server), &ClientConfig::default())?
        .connect()
        .await?;
    let task = client
        .new_transcript(&dir.join("test.eaf"))
        .media([dir.join("test.wav")], "")
        .transcript_type("interview")
        .await?;
    assert_eq!(task, Some(TaskId::from("77")));
    Ok(())
}

#[rstest]
#[tokio::test]
async fn test_cancelled_upload_is_not_sent() -> AnyResult {
    let server = open_server().await;
    Mock::given(method("POST"))
        .and(path(resource("edit/transcript/new")))
        .respond_with(ok(json!({ "result": {} })))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir()?;
    let transcript = camino::Utf8PathBuf::from_path_buf(dir.path().join("test.eaf")).unwrap();
    std::fs::write(&transcript, "<ANNOTATION_DOCUMENT/>")?;

    let client = LabbcatEdit::build(labbcat_url(&server), &ClientConfig::default())?
        .connect()
        .await?;
    let upload = client.new_transcript(&transcript);
    upload.cancellation_token().cancel();
    assert_eq!(upload.await?, None);
    Ok(())
}

#[rstest]
#[tokio::test]
async fn test_delete_transcript() -> AnyResult {
    let server = open_server().await;
    Mock::given(method("POST"))
        .and(path(resource("api/edit/store/deleteTranscript")))
        .and(body_string_contains("id=test.eaf"))
        .respond_with(ok(json!(null)))
        .expect(1)
        .mount(&server)
        .await;

    let client = LabbcatEdit::build(labbcat_url(&server), &ClientConfig::default())?
        .connect()
        .await?;
    client.delete_transcript(&TranscriptId::from("test.eaf")).await?;
    Ok(())
}

async fn admin_client(server: &MockServer) -> LabbcatAdmin {
    LabbcatAdmin::build(labbcat_url(server), &ClientConfig::default())
        .unwrap()
        .connect()
        .await
        .unwrap()
}

#[rstest]
#[tokio::test]
async fn test_generate_layer() -> AnyResult {
    let server = open_server().await;
    Mock::given(method("POST"))
        .and(path(resource("admin/layers/regenerate")))
        .and(body_string_contains("phonemes=phonemes"))
        .and(body_string_contains("sure=true"))
        .respond_with(ok(json!({ "threadId": "12" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = admin_client(&server).await;
    let task = client.generate_layer(&LayerId::from("phonemes")).await?;
    assert_eq!(task, TaskId::from("12"));
    Ok(())
}

#[rstest]
#[tokio::test]
async fn test_create_corpus() -> AnyResult {
    let server = open_server().await;
    Mock::given(method("POST"))
        .and(path(resource("api/admin/corpora")))
        .and(body_json(json!({
            "corpus_name": "unit-test",
            "corpus_language": "en"
        })))
        .respond_with(ok(json!({
            "corpus_id": 3,
            "corpus_name": "unit-test",
            "corpus_language": "en",
            "corpus_description": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = admin_client(&server).await;
    let corpus = Corpus {
        language: Some("en".to_string()),
        ..Corpus::new("unit-test".into())
    };
    let created = client.create_corpus(&corpus).await?;
    assert_eq!(created.id, Some(3));
    assert_eq!(created.name.as_str(), "unit-test");
    Ok(())
}
