use crate::types::LayerId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::skip_serializing_none;

/// An annotation of a transcript.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: String,
    pub layer_id: Option<LayerId>,
    pub label: Option<String>,
    pub start_id: Option<String>,
    pub end_id: Option<String>,
    pub parent_id: Option<String>,
    pub ordinal: Option<i32>,
    /// How sure the annotator was, from 0 to 100.
    pub confidence: Option<i32>,
    /// Anything else the server sent.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}
