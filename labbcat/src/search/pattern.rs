//! Search patterns: a sequence of columns, each a set of layer constraints which must
//! all hold for one token.

use crate::types::LayerId;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_with::skip_serializing_none;
use std::fmt;

/// A constraint on the annotations of one layer.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LayerConstraint {
    /// Regular expression the label must match.
    pub pattern: Option<String>,
    /// Negates `pattern`.
    pub not: Option<bool>,
    /// Inclusive lower bound, for numeric layers.
    pub min: Option<String>,
    /// Exclusive upper bound, for numeric layers.
    pub max: Option<String>,
}

/// One token position of a [Pattern].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    #[serde(serialize_with = "ordered_layers")]
    layers: Vec<(LayerId, LayerConstraint)>,
    /// Maximum distance to the next column. Absent on the last column.
    #[serde(skip_serializing_if = "Option::is_none")]
    adj: Option<u32>,
}

impl Column {
    pub fn layers(&self) -> &[(LayerId, LayerConstraint)] {
        &self.layers
    }

    pub fn adjacency(&self) -> Option<u32> {
        self.adj
    }
}

/// Layers are written as a JSON object, in the order they were added.
fn ordered_layers<S: Serializer>(
    layers: &[(LayerId, LayerConstraint)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(layers.len()))?;
    for (layer_id, constraint) in layers {
        map.serialize_entry(layer_id, constraint)?;
    }
    map.end()
}

/// A search pattern, serialized as the JSON LaBB-CAT expects, e.g.
///
/// ```json
/// {"columns":[{"layers":{"orthography":{"pattern":"the"}},"adj":2},{"layers":{"orthography":{"pattern":"end"}}}]}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Pattern {
    columns: Vec<Column>,
}

impl Pattern {
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// A pattern without any layer constraints matches nothing and cannot be searched for.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

#[derive(Debug, Clone)]
struct ColumnBuilder {
    layers: Vec<(LayerId, LayerConstraint)>,
    adj: u32,
}

/// Builds a [Pattern] one column at a time. Layer constraints apply to the latest column,
/// which is created on demand.
///
/// ```
/// use labbcat::PatternBuilder;
///
/// let pattern = PatternBuilder::new()
///     .add_match_layer("orthography", "the")
///     .add_column_with_adjacency(2)
///     .add_match_layer("orthography", "end")
///     .build();
/// assert_eq!(pattern.columns().len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct PatternBuilder {
    columns: Vec<ColumnBuilder>,
}

impl PatternBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new column, immediately following the previous one.
    pub fn add_column(self) -> Self {
        self.add_column_with_adjacency(1)
    }

    /// Start a new column, which may be at most `adj` tokens after the previous one.
    ///
    /// Sets `adj` of the latest column instead, if that column has no constraints yet.
    pub fn add_column_with_adjacency(mut self, adj: u32) -> Self {
        match self.columns.last_mut() {
            Some(last) if last.layers.is_empty() => last.adj = adj,
            _ => self.columns.push(ColumnBuilder {
                layers: Vec::new(),
                adj,
            }),
        }
        self
    }

    /// Number of columns started so far.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Labels of `layer_id` must match the regular expression `pattern`.
    pub fn add_match_layer(self, layer_id: impl Into<LayerId>, pattern: impl Into<String>) -> Self {
        self.constrain(
            layer_id.into(),
            LayerConstraint {
                pattern: Some(pattern.into()),
                ..Default::default()
            },
        )
    }

    /// Labels of `layer_id` must not match the regular expression `pattern`.
    pub fn add_not_match_layer(
        self,
        layer_id: impl Into<LayerId>,
        pattern: impl Into<String>,
    ) -> Self {
        self.constrain(
            layer_id.into(),
            LayerConstraint {
                pattern: Some(pattern.into()),
                not: Some(true),
                ..Default::default()
            },
        )
    }

    /// Labels of numeric layer `layer_id` must be at least `min`.
    pub fn add_min_layer(self, layer_id: impl Into<LayerId>, min: f64) -> Self {
        self.constrain(
            layer_id.into(),
            LayerConstraint {
                min: Some(min.to_string()),
                ..Default::default()
            },
        )
    }

    /// Labels of numeric layer `layer_id` must be less than `max`.
    pub fn add_max_layer(self, layer_id: impl Into<LayerId>, max: f64) -> Self {
        self.constrain(
            layer_id.into(),
            LayerConstraint {
                max: Some(max.to_string()),
                ..Default::default()
            },
        )
    }

    /// Labels of numeric layer `layer_id` must be at least `min` and less than `max`.
    pub fn add_range_layer(self, layer_id: impl Into<LayerId>, min: f64, max: f64) -> Self {
        self.constrain(
            layer_id.into(),
            LayerConstraint {
                min: Some(min.to_string()),
                max: Some(max.to_string()),
                ..Default::default()
            },
        )
    }

    /// Replaces any earlier constraint on the same layer in the same column.
    fn constrain(mut self, layer_id: LayerId, constraint: LayerConstraint) -> Self {
        if self.columns.is_empty() {
            self = self.add_column();
        }
        if let Some(column) = self.columns.last_mut() {
            match column.layers.iter_mut().find(|(id, _)| *id == layer_id) {
                Some((_, existing)) => *existing = constraint,
                None => column.layers.push((layer_id, constraint)),
            }
        }
        self
    }

    /// Columns without constraints are left out.
    pub fn build(self) -> Pattern {
        let mut columns: Vec<Column> = self
            .columns
            .into_iter()
            .filter(|c| !c.layers.is_empty())
            .map(|c| Column {
                layers: c.layers,
                adj: Some(c.adj),
            })
            .collect();
        if let Some(last) = columns.last_mut() {
            last.adj = None;
        }
        Pattern { columns }
    }
}

impl From<PatternBuilder> for Pattern {
    fn from(builder: PatternBuilder) -> Self {
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use serde_json::json;

    #[rstest]
    fn test_single_column() {
        let pattern = PatternBuilder::new()
            .add_match_layer("orthography", "the")
            .build();
        assert_eq!(
            serde_json::to_value(&pattern).unwrap(),
            json!({"columns": [{"layers": {"orthography": {"pattern": "the"}}}]})
        );
    }

    #[rstest]
    fn test_adjacency_only_between_columns() {
        let pattern = PatternBuilder::new()
            .add_match_layer("orthography", "the")
            .add_column_with_adjacency(2)
            .add_match_layer("orthography", "end")
            .build();
        assert_eq!(
            serde_json::to_value(&pattern).unwrap(),
            json!({"columns": [
                {"layers": {"orthography": {"pattern": "the"}}, "adj": 2},
                {"layers": {"orthography": {"pattern": "end"}}}
            ]})
        );
    }

    #[rstest]
    fn test_constraint_kinds() {
        let pattern = PatternBuilder::new()
            .add_not_match_layer("orthography", "the")
            .add_range_layer("syllableCount", 2.0, 4.5)
            .add_min_layer("frequency", 10.0)
            .build();
        assert_eq!(
            serde_json::to_value(&pattern).unwrap(),
            json!({"columns": [{"layers": {
                "orthography": {"pattern": "the", "not": true},
                "syllableCount": {"min": "2", "max": "4.5"},
                "frequency": {"min": "10"}
            }}]})
        );
    }

    #[rstest]
    fn test_layer_order_is_kept() {
        let json = PatternBuilder::new()
            .add_match_layer("segment", "I")
            .add_match_layer("orthography", "it")
            .build()
            .to_json();
        assert!(json.find("segment").unwrap() < json.find("orthography").unwrap());
    }

    #[rstest]
    fn test_same_layer_is_replaced() {
        let pattern = PatternBuilder::new()
            .add_match_layer("orthography", "the")
            .add_max_layer("orthography", 3.0)
            .build();
        let layers = pattern.columns()[0].layers();
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].1.max.as_deref(), Some("3"));
        assert_eq!(layers[0].1.pattern, None);
    }

    #[rstest]
    fn test_empty_column_is_reused() {
        let builder = PatternBuilder::new()
            .add_column()
            .add_column_with_adjacency(3);
        assert_eq!(builder.column_count(), 1);
        let pattern = builder
            .add_match_layer("orthography", "a")
            .add_column()
            .add_match_layer("orthography", "b")
            .build();
        assert_eq!(pattern.columns()[0].adjacency(), Some(3));
        assert_eq!(pattern.columns()[1].adjacency(), None);
    }

    #[rstest]
    fn test_trailing_empty_column_is_dropped() {
        let pattern = PatternBuilder::new()
            .add_match_layer("orthography", "a")
            .add_column()
            .build();
        assert_eq!(pattern.columns().len(), 1);
        assert_eq!(pattern.columns()[0].adjacency(), None);
    }

    #[rstest]
    fn test_empty() {
        assert!(PatternBuilder::new().build().is_empty());
        assert!(PatternBuilder::new().add_column().build().is_empty());
    }
}
