//! Parameters of requests sent to LaBB-CAT.
use reqwest::multipart::Form;
use serde::Serialize;

/// Query string or form parameters. The same name may appear more than once, which
/// is how LaBB-CAT receives lists, e.g. `layer=orthography&layer=segment`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub(crate) struct Params(Vec<(String, String)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.0.push((name.into(), value.to_string()));
        self
    }

    pub fn add_opt<V: ToString>(self, name: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.add(name, value),
            None => self,
        }
    }

    pub fn add_all<V: ToString>(
        mut self,
        name: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.0.extend(
            values
                .into_iter()
                .map(|v| (name.to_string(), v.to_string())),
        );
        self
    }

    pub fn extend(mut self, other: Params) -> Self {
        self.0.extend(other.0);
        self
    }

    /// Add `name=true` only if `on` is set.
    pub fn flag(self, name: impl Into<String>, on: bool) -> Self {
        if on {
            self.add(name, true)
        } else {
            self
        }
    }

    /// Convert to the text fields of a multipart form.
    pub fn into_form(self) -> Form {
        self.0
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value))
    }
}
