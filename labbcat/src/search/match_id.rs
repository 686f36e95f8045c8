//! Parsing of match identifiers, e.g.
//! `g_243;em_12_20035;n_72700-n_72709;p_76;#=ew_0_12345;prefix=024-;[0]=ew_0_12345`
//!
//! Fields are separated by `;`. The first is the transcript; the others are recognised
//! by their form.

use crate::types::TranscriptId;
use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum InvalidMatchId {
    #[error("Match ID is empty")]
    Empty,

    #[error("Match ID has no start-end interval: {0}")]
    MissingInterval(String),

    #[error("Match ID has an invalid offset \"{offset}\": {id}")]
    InvalidOffset { offset: String, id: String },
}

/// Where a match is in its transcript.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchInterval {
    /// IDs of the start and end anchors, e.g. `n_72700`
    Anchors { start: String, end: String },
    /// Offsets in seconds.
    Offsets { start: f64, end: f64 },
}

/// A match identifier, decomposed.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchId {
    pub transcript_id: TranscriptId,
    pub interval: MatchInterval,
    /// From an `em_...` or `m_...` field.
    pub utterance_id: Option<String>,
    /// From a `#=...` field.
    pub target_annotation_id: Option<String>,
    /// From a `prefix=...` field.
    pub prefix: Option<String>,
    /// All other fields. Fields without `=` have an empty value.
    pub attributes: BTreeMap<String, String>,
}

impl MatchId {
    pub fn start_anchor_id(&self) -> Option<&str> {
        match &self.interval {
            MatchInterval::Anchors { start, .. } => Some(start),
            MatchInterval::Offsets { .. } => None,
        }
    }

    pub fn end_anchor_id(&self) -> Option<&str> {
        match &self.interval {
            MatchInterval::Anchors { end, .. } => Some(end),
            MatchInterval::Offsets { .. } => None,
        }
    }

    pub fn start_offset(&self) -> Option<f64> {
        match self.interval {
            MatchInterval::Offsets { start, .. } => Some(start),
            MatchInterval::Anchors { .. } => None,
        }
    }

    pub fn end_offset(&self) -> Option<f64> {
        match self.interval {
            MatchInterval::Offsets { end, .. } => Some(end),
            MatchInterval::Anchors { .. } => None,
        }
    }
}

impl FromStr for MatchId {
    type Err = InvalidMatchId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = s.split(';');
        let transcript_id = fields
            .next()
            .filter(|f| !f.is_empty())
            .ok_or(InvalidMatchId::Empty)?;
        let fields: Vec<&str> = fields.collect();

        // the first field with a '-' after its first character
        let (interval_index, interval_field) = fields
            .iter()
            .enumerate()
            .find(|(_, f)| f.find('-').is_some_and(|i| i > 0))
            .ok_or_else(|| InvalidMatchId::MissingInterval(s.to_string()))?;
        let mut ends = interval_field.split('-');
        let start = ends.next().unwrap_or_default();
        let end = ends.next().unwrap_or_default();
        let interval = if start.starts_with("n_") {
            MatchInterval::Anchors {
                start: start.to_string(),
                end: end.to_string(),
            }
        } else {
            let offset = |o: &str| {
                o.parse::<f64>().map_err(|_| InvalidMatchId::InvalidOffset {
                    offset: o.to_string(),
                    id: s.to_string(),
                })
            };
            MatchInterval::Offsets {
                start: offset(start)?,
                end: offset(end)?,
            }
        };

        let mut id = MatchId {
            transcript_id: TranscriptId::from(transcript_id),
            interval,
            utterance_id: None,
            target_annotation_id: None,
            prefix: None,
            attributes: BTreeMap::new(),
        };
        for (i, field) in fields.into_iter().enumerate() {
            if i == interval_index {
                continue;
            }
            if let Some(prefix) = field.strip_prefix("prefix=") {
                id.prefix = Some(prefix.to_string());
            } else if field.starts_with("em_") || field.starts_with("m_") {
                id.utterance_id = Some(field.to_string());
            } else if let Some(target) = field.strip_prefix("#=") {
                id.target_annotation_id = Some(target.to_string());
            } else {
                let (name, value) = field.split_once('=').unwrap_or((field, ""));
                id.attributes.insert(name.to_string(), value.to_string());
            }
        }
        Ok(id)
    }
}
