use super::matches::Match;
use super::pattern::Pattern;
use crate::client::access::Access;
use crate::errors::LabbcatError;
use crate::requests::Params;
use crate::types::{ParticipantId, StartedTask, TaskId};
use crate::LabbcatClient;
use log::{debug, warn};
use tokio_util::sync::CancellationToken;

/// A search, created by [LabbcatClient::search], with optional restrictions on which
/// utterances are searched.
#[must_use]
pub struct SearchBuilder<'a, A: Access> {
    client: &'a LabbcatClient<A>,
    pattern: &'a Pattern,
    params: Params,
    cancel: CancellationToken,
}

impl<'a, A: Access> SearchBuilder<'a, A> {
    fn add(self, f: impl FnOnce(Params) -> Params) -> Self {
        Self {
            params: f(self.params),
            ..self
        }
    }

    /// Only search utterances of these participants.
    pub fn participants<I: IntoIterator<Item = ParticipantId>>(self, participants: I) -> Self {
        self.add(|p| p.add_all("participant_id", participants))
    }

    /// Only search transcripts of these types, e.g. `interview`
    pub fn transcript_types<I, T>(self, transcript_types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        self.add(|p| p.add_all("transcript_type", transcript_types))
    }

    /// Only search utterances of the main participant of each transcript.
    pub fn main_participant_only(self) -> Self {
        self.add(|p| p.flag("only_main_speaker", true))
    }

    /// Only match words which are aligned.
    pub fn aligned_only(self) -> Self {
        self.add(|p| p.flag("only_aligned", true))
    }

    /// Minimum alignment confidence of matched words, as a percentage.
    pub fn offset_threshold(self, percent: u8) -> Self {
        self.add(|p| p.add("offset_threshold", percent))
    }

    /// Maximum number of matches per transcript.
    pub fn matches_per_transcript(self, n: u32) -> Self {
        self.add(|p| p.add("matches_per_transcript", n))
    }

    /// Exclude utterances which overlap others by more than this percentage.
    pub fn overlap_threshold(self, percent: u8) -> Self {
        self.add(|p| p.add("overlap_threshold", percent))
    }

    /// Stop waiting for results when `cancel` is triggered.
    pub fn with_cancellation(self, cancel: CancellationToken) -> Self {
        Self { cancel, ..self }
    }

    /// Start the search, returning the ID of the task which carries it out.
    pub async fn submit(&self) -> Result<TaskId, LabbcatError> {
        if self.pattern.is_empty() {
            return Err(LabbcatError::InvalidArgument(
                "Search pattern has no layer constraints".to_string(),
            ));
        }
        let params = Params::new()
            .add("command", "search")
            .add("searchJson", self.pattern)
            .add("words_context", 0)
            .extend(self.params.clone());
        let started: StartedTask = self.client.session.get("search", &params).await?.model()?;
        debug!("search {} started: {}", started.thread_id, self.pattern);
        Ok(started.thread_id)
    }

    /// Search, wait for the search to finish, and get up to `max_matches` of the results.
    ///
    /// The search task is released afterwards, whether or not getting the results succeeds.
    pub async fn matches(
        self,
        words_context: u32,
        max_matches: Option<u32>,
    ) -> Result<Option<Vec<Match>>, LabbcatError> {
        let task = self.submit().await?;
        let mut request = self
            .client
            .get_matches(&task, words_context)
            .with_cancellation(self.cancel.clone());
        if let Some(max_matches) = max_matches {
            request = request.page_length(max_matches).page_number(0);
        }
        let result = request.await;
        if let Err(e) = self.client.release_task(&task).await {
            warn!("Could not release search {}: {}", task, e);
        }
        result
    }
}

impl<A: Access> LabbcatClient<A> {
    /// Search for tokens which match `pattern`.
    ///
    /// ```no_run
    /// # async fn f(client: labbcat::LabbcatView) -> Result<(), labbcat::errors::LabbcatError> {
    /// use labbcat::PatternBuilder;
    ///
    /// let pattern = PatternBuilder::new().add_match_layer("orthography", "the").build();
    /// let task = client.search(&pattern).main_participant_only().submit().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn search<'a>(&'a self, pattern: &'a Pattern) -> SearchBuilder<'a, A> {
        SearchBuilder {
            client: self,
            pattern,
            params: Params::new(),
            cancel: CancellationToken::new(),
        }
    }
}
