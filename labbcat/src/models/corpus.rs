use crate::types::CorpusId;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// A collection of transcripts.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    /// Assigned by the server.
    #[serde(rename = "corpus_id", default)]
    pub id: Option<i64>,
    #[serde(rename = "corpus_name")]
    pub name: CorpusId,
    /// ISO 639 code, e.g. `en`
    #[serde(rename = "corpus_language", default)]
    pub language: Option<String>,
    #[serde(rename = "corpus_description", default)]
    pub description: Option<String>,
}

impl Corpus {
    pub fn new(name: CorpusId) -> Self {
        Self {
            id: None,
            name,
            language: None,
            description: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_names() {
        let corpus = Corpus {
            language: Some("en".to_string()),
            ..Corpus::new(CorpusId::from("QB"))
        };
        assert_eq!(
            serde_json::to_value(&corpus).unwrap(),
            json!({"corpus_name": "QB", "corpus_language": "en"})
        );
    }
}
