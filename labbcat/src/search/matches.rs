use super::match_id::{InvalidMatchId, MatchId};
use crate::client::access::Access;
use crate::errors::LabbcatError;
use crate::requests::Params;
use crate::types::{CorpusId, ParticipantId, TaskId, TranscriptId};
use crate::LabbcatClient;
use async_stream::try_stream;
use futures::future::BoxFuture;
use futures::Stream;
use log::debug;
use serde::{Deserialize, Serialize};
use std::future::IntoFuture;
use tokio_util::sync::CancellationToken;

/// One result of a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Match {
    /// See [MatchId] for what this encodes.
    pub match_id: String,
    pub transcript: TranscriptId,
    pub participant: ParticipantId,
    pub corpus: CorpusId,
    /// Start offset of the utterance containing the match, in seconds.
    #[serde(rename = "Line", default)]
    pub utterance_start: Option<f64>,
    /// End offset of the utterance containing the match, in seconds.
    #[serde(rename = "LineEnd", default)]
    pub utterance_end: Option<f64>,
    #[serde(default)]
    pub before_match: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub after_match: String,
}

impl Match {
    pub fn id(&self) -> Result<MatchId, InvalidMatchId> {
        self.match_id.parse()
    }
}

impl AsRef<str> for Match {
    fn as_ref(&self) -> &str {
        &self.match_id
    }
}

#[derive(Deserialize)]
struct MatchesModel {
    #[serde(default)]
    matches: Vec<Match>,
}

/// Request for the results of a search task, created by [LabbcatClient::get_matches].
///
/// Waits for the search to finish first. Resolves to `None` if it is still running when
/// the wait is cancelled.
#[must_use = "does nothing unless awaited"]
pub struct GetMatches<'a, A: Access> {
    client: &'a LabbcatClient<A>,
    task: &'a TaskId,
    words_context: u32,
    page_length: Option<u32>,
    page_number: Option<u32>,
    cancel: CancellationToken,
}

impl<'a, A: Access> GetMatches<'a, A> {
    pub fn page_length(self, page_length: u32) -> Self {
        Self {
            page_length: Some(page_length),
            ..self
        }
    }

    /// Zero-based page number.
    pub fn page_number(self, page_number: u32) -> Self {
        Self {
            page_number: Some(page_number),
            ..self
        }
    }

    pub fn with_cancellation(self, cancel: CancellationToken) -> Self {
        Self { cancel, ..self }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the search to finish. `false` if it was cancelled first.
    async fn finished(&self) -> Result<bool, LabbcatError> {
        let status = self
            .client
            .wait_for_task(self.task)
            .with_cancellation(self.cancel.clone())
            .await?;
        if status.running {
            debug!("stopped waiting for results of {}", self.task);
        }
        Ok(!status.running)
    }

    async fn fetch_page(
        &self,
        page_length: Option<u32>,
        page_number: Option<u32>,
    ) -> Result<Vec<Match>, LabbcatError> {
        let params = Params::new()
            .add("threadId", self.task)
            .add("words_context", self.words_context)
            .add_opt("pageLength", page_length)
            .add_opt("pageNumber", page_number);
        let model: Option<MatchesModel> = self
            .client
            .session
            .get("resultsStream", &params)
            .await?
            .model()?;
        Ok(model.map(|m| m.matches).unwrap_or_default())
    }

    pub async fn fetch(self) -> Result<Option<Vec<Match>>, LabbcatError> {
        if !self.finished().await? {
            return Ok(None);
        }
        self.fetch_page(self.page_length, self.page_number)
            .await
            .map(Some)
    }

    /// Get all results, `page_length` at a time. The stream is empty if the wait
    /// for the search is cancelled.
    pub fn stream(
        self,
        page_length: u32,
    ) -> impl Stream<Item = Result<Match, LabbcatError>> + 'a {
        let page_length = page_length.max(1);
        try_stream! {
            if self.finished().await? {
                let mut page_number = 0;
                loop {
                    let page = self.fetch_page(Some(page_length), Some(page_number)).await?;
                    // a server which ignores the page length sends everything at once
                    let last = page.len() != page_length as usize;
                    for m in page {
                        yield m;
                    }
                    if last || self.cancel.is_cancelled() {
                        break;
                    }
                    page_number += 1;
                }
            }
        }
    }
}

impl<'a, A: Access> IntoFuture for GetMatches<'a, A> {
    type Output = Result<Option<Vec<Match>>, LabbcatError>;
    type IntoFuture = BoxFuture<'a, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.fetch())
    }
}

impl<A: Access> LabbcatClient<A> {
    /// Get the results of a search task, with `words_context` words of context
    /// before and after each match.
    pub fn get_matches<'a>(&'a self, task: &'a TaskId, words_context: u32) -> GetMatches<'a, A> {
        GetMatches {
            client: self,
            task,
            words_context,
            page_length: None,
            page_number: None,
            cancel: CancellationToken::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_match() {
        let m: Match = serde_json::from_str(
            r#"{
                "MatchId": "g_6;em_12_419;n_9-n_10;p_4;#=ew_0_3;prefix=001-;[0]=ew_0_3",
                "Transcript": "AP511_MikeThorpe.eaf",
                "Participant": "Mike Thorpe",
                "Corpus": "UC",
                "Line": 26.79,
                "LineEnd": 29.5,
                "BeforeMatch": "and",
                "Text": "the",
                "AfterMatch": "end"
            }"#,
        )
        .unwrap();
        assert_eq!(m.transcript.as_str(), "AP511_MikeThorpe.eaf");
        assert_eq!(m.utterance_start, Some(26.79));
        assert_eq!(m.text, "the");
        let id = m.id().unwrap();
        assert_eq!(id.target_annotation_id.as_deref(), Some("ew_0_3"));
        assert_eq!(id.attributes.get("[0]").map(String::as_str), Some("ew_0_3"));
    }
}
