//! Adding, changing and deleting transcripts.

use super::access::CanEdit;
use super::LabbcatClient;
use crate::errors::LabbcatError;
use crate::requests::Params;
use crate::types::{task_id_from_string_or_number, CorpusId, TaskId, TranscriptId};
use crate::upload::file_part;
use camino::{Utf8Path, Utf8PathBuf};
use futures::future::BoxFuture;
use log::debug;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::IntoFuture;
use tokio_util::sync::CancellationToken;

const EDIT_STORE_RESOURCE: &str = "api/edit/store/";

#[derive(Clone, Copy)]
enum UploadMode {
    New,
    Update,
}

impl UploadMode {
    fn todo(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Update => "update",
        }
    }
}

#[derive(Deserialize)]
struct UploadModel {
    #[serde(default)]
    result: HashMap<String, Value>,
}

/// Upload of a transcript file and its media, created by [LabbcatClient::new_transcript]
/// or [LabbcatClient::update_transcript].
///
/// Resolves to the ID of the task which processes the upload, or `None` if the upload
/// was cancelled.
#[must_use = "does nothing unless awaited"]
pub struct TranscriptUpload<'a, A: CanEdit> {
    client: &'a LabbcatClient<A>,
    mode: UploadMode,
    transcript: Utf8PathBuf,
    media: Vec<Utf8PathBuf>,
    media_suffix: String,
    transcript_type: Option<String>,
    corpus: Option<CorpusId>,
    episode: Option<String>,
    cancel: CancellationToken,
}

impl<'a, A: CanEdit> TranscriptUpload<'a, A> {
    /// Media files of the transcript. `track_suffix` distinguishes tracks when a
    /// transcript has more than one recording, and is usually empty.
    pub fn media<I, P>(self, files: I, track_suffix: &str) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Utf8PathBuf>,
    {
        Self {
            media: files.into_iter().map(Into::into).collect(),
            media_suffix: track_suffix.to_string(),
            ..self
        }
    }

    /// e.g. `interview`
    pub fn transcript_type(self, transcript_type: impl Into<String>) -> Self {
        Self {
            transcript_type: Some(transcript_type.into()),
            ..self
        }
    }

    pub fn corpus(self, corpus: CorpusId) -> Self {
        Self {
            corpus: Some(corpus),
            ..self
        }
    }

    /// Name of the series the transcript belongs to.
    pub fn episode(self, episode: impl Into<String>) -> Self {
        Self {
            episode: Some(episode.into()),
            ..self
        }
    }

    pub fn with_cancellation(self, cancel: CancellationToken) -> Self {
        Self { cancel, ..self }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn send(self) -> Result<Option<TaskId>, LabbcatError> {
        let mut form = Params::new()
            .add("todo", self.mode.todo())
            .add("auto", true)
            .add_opt("transcriptType", self.transcript_type.as_ref())
            .add_opt("corpus", self.corpus.as_ref())
            .add_opt("episode", self.episode.as_ref())
            .into_form()
            .part(
                "uploadfile1_0",
                file_part(self.transcript.as_std_path(), &self.cancel).await?,
            );
        let media_field = format!("uploadmedia{}1", self.media_suffix);
        for media in &self.media {
            form = form.part(
                media_field.clone(),
                file_part(media.as_std_path(), &self.cancel).await?,
            );
        }
        let envelope = match self
            .client
            .session
            .post_multipart("edit/transcript/new", form, &self.cancel)
            .await?
        {
            Some(envelope) => envelope,
            None => return Ok(None),
        };
        let model: UploadModel = envelope.model()?;
        let file_name = self.transcript.file_name().unwrap_or_default();
        let task = model
            .result
            .get(file_name)
            .or_else(|| model.result.values().next())
            .cloned()
            .map(task_id_from_string_or_number)
            .transpose()
            .map_err(|e| LabbcatError::Protocol {
                status: reqwest::StatusCode::OK,
                detail: format!("Unexpected upload result: {}", e),
            })?
            .ok_or_else(|| LabbcatError::Protocol {
                status: reqwest::StatusCode::OK,
                detail: format!("No task was started for {}", file_name),
            })?;
        debug!("upload of {} is processed by task {}", self.transcript, task);
        Ok(Some(task))
    }
}

impl<'a, A: CanEdit> IntoFuture for TranscriptUpload<'a, A> {
    type Output = Result<Option<TaskId>, LabbcatError>;
    type IntoFuture = BoxFuture<'a, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.send())
    }
}

impl<A: CanEdit> LabbcatClient<A> {
    fn upload(&self, mode: UploadMode, transcript: &Utf8Path) -> TranscriptUpload<'_, A> {
        TranscriptUpload {
            client: self,
            mode,
            transcript: transcript.to_path_buf(),
            media: Vec::new(),
            media_suffix: String::new(),
            transcript_type: None,
            corpus: None,
            episode: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Upload a new transcript.
    pub fn new_transcript(&self, transcript: &Utf8Path) -> TranscriptUpload<'_, A> {
        self.upload(UploadMode::New, transcript)
    }

    /// Upload a new version of an existing transcript.
    pub fn update_transcript(&self, transcript: &Utf8Path) -> TranscriptUpload<'_, A> {
        self.upload(UploadMode::Update, transcript)
    }

    /// Delete a transcript and its media.
    pub async fn delete_transcript(&self, id: &TranscriptId) -> Result<(), LabbcatError> {
        let resource = format!("{}deleteTranscript", EDIT_STORE_RESOURCE);
        self.session
            .post(&resource, &Params::new().add("id", id))
            .await?;
        Ok(())
    }
}
