use aliri_braid::braid;
use serde::{Deserialize, Deserializer};

/// ID of a server-side task (called a "thread" by LaBB-CAT).
#[braid(serde)]
pub struct TaskId;

/// ID of an annotation layer, e.g. `orthography`
#[braid(serde)]
pub struct LayerId;

/// ID of a transcript, which is usually its file name, e.g. `AP511_MikeThorpe.eaf`
#[braid(serde)]
pub struct TranscriptId;

/// ID of a participant (speaker).
#[braid(serde)]
pub struct ParticipantId;

/// Name of a corpus.
#[braid(serde)]
pub struct CorpusId;

/// LaBB-CAT sometimes sends task IDs as JSON numbers.
pub(crate) fn task_id_from_string_or_number<'de, D>(deserializer: D) -> Result<TaskId, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(serde_json::Number),
    }

    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => TaskId::new(s),
        StringOrNumber::Number(n) => TaskId::new(n.to_string()),
    })
}

/// The `model` of a response which started a task.
#[derive(Debug, Deserialize)]
pub(crate) struct StartedTask {
    #[serde(
        rename = "threadId",
        deserialize_with = "task_id_from_string_or_number"
    )]
    pub thread_id: TaskId,
}
