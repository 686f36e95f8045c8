//! NewType for the address of a LaBB-CAT server.

use crate::errors::InvalidLabbcatUrl;
use aliri_braid::braid;

/// A [LabbcatUrl] is the base URL of a LaBB-CAT server, e.g.
/// `https://labbcat.canterbury.ac.nz/demo/`
///
/// Resource paths are appended directly, so the URL must end with `/`.
#[braid(validator, serde)]
pub struct LabbcatUrl(String);

impl aliri_braid::Validator for LabbcatUrl {
    type Error = InvalidLabbcatUrl;

    fn validate(s: &str) -> Result<(), Self::Error> {
        if !(s.starts_with("http://") || s.starts_with("https://")) {
            Err(InvalidLabbcatUrl::Protocol(s.to_string()))
        } else if !s.ends_with('/') {
            Err(InvalidLabbcatUrl::TrailingSlash(s.to_string()))
        } else {
            Ok(())
        }
    }
}

impl LabbcatUrl {
    /// Absolute URL of a resource under this server, e.g. `api/store/`.
    pub fn join(&self, resource: &str) -> String {
        format!("{}{}", self.as_str(), resource)
    }
}
