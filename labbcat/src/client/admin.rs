//! System administration.

use super::access::CanAdmin;
use super::LabbcatClient;
use crate::errors::LabbcatError;
use crate::models::Corpus;
use crate::requests::Params;
use crate::types::{CorpusId, LayerId, MimeType, StartedTask, TaskId};
use reqwest::Method;

const CORPORA_RESOURCE: &str = "api/admin/corpora";

impl<A: CanAdmin> LabbcatClient<A> {
    /// Regenerate the annotations of a layer, e.g. after its configuration changed.
    /// Returns the ID of the task which does it.
    pub async fn generate_layer(&self, layer_id: &LayerId) -> Result<TaskId, LabbcatError> {
        // the layer ID is both the name and the value of the parameter
        let params = Params::new()
            .add(layer_id.to_string(), layer_id)
            .add("sure", true);
        let started: StartedTask = self
            .session
            .post("admin/layers/regenerate", &params)
            .await?
            .model()?;
        Ok(started.thread_id)
    }

    pub async fn create_corpus(&self, corpus: &Corpus) -> Result<Corpus, LabbcatError> {
        self.session
            .send_json(Method::POST, CORPORA_RESOURCE, corpus)
            .await?
            .model()
    }

    /// List corpora, optionally a page at a time.
    pub async fn read_corpora(
        &self,
        page_number: Option<u32>,
        page_length: Option<u32>,
    ) -> Result<Vec<Corpus>, LabbcatError> {
        let params = Params::new()
            .add_opt("pageNumber", page_number)
            .add_opt("pageLength", page_length);
        let corpora: Option<Vec<Corpus>> =
            self.session.get(CORPORA_RESOURCE, &params).await?.model()?;
        Ok(corpora.unwrap_or_default())
    }

    pub async fn update_corpus(&self, corpus: &Corpus) -> Result<Corpus, LabbcatError> {
        self.session
            .send_json(Method::PUT, CORPORA_RESOURCE, corpus)
            .await?
            .model()
    }

    pub async fn delete_corpus(&self, name: &CorpusId) -> Result<(), LabbcatError> {
        self.session
            .delete(&format!("{}/{}", CORPORA_RESOURCE, name))
            .await?;
        Ok(())
    }

    /// Add a transcript format to the server.
    pub fn register_serializer(&self, _mime_type: &MimeType) -> Result<(), LabbcatError> {
        Err(LabbcatError::NotImplemented("registerSerializer"))
    }

    pub fn deregister_serializer(&self, _mime_type: &MimeType) -> Result<(), LabbcatError> {
        Err(LabbcatError::NotImplemented("deregisterSerializer"))
    }

    pub fn register_deserializer(&self, _mime_type: &MimeType) -> Result<(), LabbcatError> {
        Err(LabbcatError::NotImplemented("registerDeserializer"))
    }

    pub fn deregister_deserializer(&self, _mime_type: &MimeType) -> Result<(), LabbcatError> {
        Err(LabbcatError::NotImplemented("deregisterDeserializer"))
    }
}
