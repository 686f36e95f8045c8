//! Read-only queries of the graph store.

use super::access::Access;
use super::LabbcatClient;
use crate::auth::STORE_RESOURCE;
use crate::errors::LabbcatError;
use crate::requests::Params;
use crate::types::{CorpusId, LayerId, ParticipantId, TranscriptId};
use serde::de::DeserializeOwned;
use serde_json::Value;

impl<A: Access> LabbcatClient<A> {
    async fn store_query<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &Params,
    ) -> Result<T, LabbcatError> {
        let resource = format!("{}{}", STORE_RESOURCE, method);
        self.session.get(&resource, params).await?.model()
    }

    async fn store_list<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &Params,
    ) -> Result<Vec<T>, LabbcatError> {
        let list: Option<Vec<T>> = self.store_query(method, params).await?;
        Ok(list.unwrap_or_default())
    }

    /// Get the name of the LaBB-CAT instance.
    pub async fn get_id(&self) -> Result<String, LabbcatError> {
        self.store_query("getId", &Params::new()).await
    }

    pub async fn get_layer_ids(&self) -> Result<Vec<LayerId>, LabbcatError> {
        self.store_list("getLayerIds", &Params::new()).await
    }

    pub async fn get_corpus_ids(&self) -> Result<Vec<CorpusId>, LabbcatError> {
        self.store_list("getCorpusIds", &Params::new()).await
    }

    pub async fn get_participant_ids(&self) -> Result<Vec<ParticipantId>, LabbcatError> {
        self.store_list("getParticipantIds", &Params::new()).await
    }

    pub async fn get_transcript_ids(&self) -> Result<Vec<TranscriptId>, LabbcatError> {
        self.store_list("getTranscriptIds", &Params::new()).await
    }

    pub async fn get_transcript_ids_in_corpus(
        &self,
        corpus: &CorpusId,
    ) -> Result<Vec<TranscriptId>, LabbcatError> {
        self.store_list("getTranscriptIdsInCorpus", &Params::new().add("id", corpus))
            .await
    }

    /// Count transcripts which match an expression, e.g. `/Ada.+/.test(id)`
    pub async fn count_matching_transcript_ids(
        &self,
        expression: &str,
    ) -> Result<u64, LabbcatError> {
        self.store_query(
            "countMatchingTranscriptIds",
            &Params::new().add("expression", expression),
        )
        .await
    }

    /// Get IDs of transcripts which match an expression, a page at a time,
    /// optionally ordered by an expression such as `id DESC`.
    pub async fn get_matching_transcript_ids(
        &self,
        expression: &str,
        page_length: Option<u32>,
        page_number: Option<u32>,
        order: Option<&str>,
    ) -> Result<Vec<TranscriptId>, LabbcatError> {
        let params = Params::new()
            .add("expression", expression)
            .add_opt("pageLength", page_length)
            .add_opt("pageNumber", page_number)
            .add_opt("order", order);
        self.store_list("getMatchingTranscriptIds", &params).await
    }

    /// Get fragments of a series of transcripts.
    pub async fn get_fragment_series(
        &self,
        _series_id: &str,
        _layer_ids: &[LayerId],
    ) -> Result<Vec<Value>, LabbcatError> {
        Err(LabbcatError::NotImplemented("getFragmentSeries"))
    }
}
