use crate::client::access::Access;
use crate::errors::LabbcatError;
use crate::models::Annotation;
use crate::requests::Params;
use crate::types::LayerId;
use crate::upload::file_part;
use crate::LabbcatClient;
use futures::future::BoxFuture;
use log::debug;
use std::future::IntoFuture;
use std::io::Write;
use tokio_util::sync::CancellationToken;

/// Annotations of matches, one row per match ID and
/// `layer_ids.len() * annotations_per_layer` columns per row.
pub type AnnotationTable = Vec<Vec<Option<Annotation>>>;

/// Request for annotations related to search matches, created by
/// [LabbcatClient::get_match_annotations].
#[must_use = "does nothing unless awaited"]
pub struct MatchAnnotations<'a, A: Access> {
    client: &'a LabbcatClient<A>,
    match_ids: Vec<String>,
    layer_ids: Vec<LayerId>,
    target_offset: i32,
    annotations_per_layer: u32,
    cancel: CancellationToken,
}

impl<'a, A: Access> MatchAnnotations<'a, A> {
    /// Get annotations of the token this many tokens after each match target
    /// (negative for before). Default is 0.
    pub fn target_offset(self, target_offset: i32) -> Self {
        Self {
            target_offset,
            ..self
        }
    }

    /// Get up to this many annotations per layer. Default is 1.
    pub fn annotations_per_layer(self, annotations_per_layer: u32) -> Self {
        Self {
            annotations_per_layer,
            ..self
        }
    }

    /// Abandon the upload of the match IDs when `cancel` is triggered.
    pub fn with_cancellation(self, cancel: CancellationToken) -> Self {
        Self { cancel, ..self }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Resolves to `None` if cancelled.
    pub async fn fetch(self) -> Result<Option<AnnotationTable>, LabbcatError> {
        let width = self.layer_ids.len() * self.annotations_per_layer as usize;
        if self.match_ids.is_empty() || width == 0 {
            return Ok(Some(vec![vec![None; width]; self.match_ids.len()]));
        }

        // removed when dropped, however this function returns
        let mut csv = tempfile::Builder::new()
            .prefix("getMatchAnnotations_")
            .suffix(".csv")
            .tempfile()?;
        writeln!(csv, "MatchId")?;
        for id in &self.match_ids {
            writeln!(csv, "{}", id)?;
        }
        csv.flush()?;

        let form = Params::new()
            .add_all("layer", &self.layer_ids)
            .add("targetOffset", self.target_offset)
            .add("annotationsPerLayer", self.annotations_per_layer)
            .add("csvFieldDelimiter", ",")
            .add("targetColumn", 0)
            .add("copyColumns", false)
            .into_form()
            .part("uploadfile", file_part(csv.path(), &self.cancel).await?);
        let envelope = match self
            .client
            .session
            .post_multipart("api/getMatchAnnotations", form, &self.cancel)
            .await?
        {
            Some(envelope) => envelope,
            None => return Ok(None),
        };
        let rows: Option<AnnotationTable> = envelope.model()?;
        debug!(
            "got annotations of {} matches",
            rows.as_ref().map(Vec::len).unwrap_or_default()
        );
        Ok(Some(reshape(
            rows.unwrap_or_default(),
            self.match_ids.len(),
            width,
        )))
    }
}

/// Pad or truncate the table the server sent to the requested dimensions.
fn reshape(mut rows: AnnotationTable, height: usize, width: usize) -> AnnotationTable {
    rows.resize_with(height, Vec::new);
    for row in rows.iter_mut() {
        row.resize(width, None);
    }
    rows
}

impl<'a, A: Access> IntoFuture for MatchAnnotations<'a, A> {
    type Output = Result<Option<AnnotationTable>, LabbcatError>;
    type IntoFuture = BoxFuture<'a, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.fetch())
    }
}

impl<A: Access> LabbcatClient<A> {
    /// Get annotations on the given layers related to search matches.
    ///
    /// `match_ids` may be [Match](super::Match)es or their IDs.
    pub fn get_match_annotations<I, M>(
        &self,
        match_ids: I,
        layer_ids: &[LayerId],
    ) -> MatchAnnotations<'_, A>
    where
        I: IntoIterator<Item = M>,
        M: AsRef<str>,
    {
        MatchAnnotations {
            client: self,
            match_ids: match_ids
                .into_iter()
                .map(|m| m.as_ref().to_string())
                .collect(),
            layer_ids: layer_ids.to_vec(),
            target_offset: 0,
            annotations_per_layer: 1,
            cancel: CancellationToken::new(),
        }
    }
}
