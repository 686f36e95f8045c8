//! Primitive LaBB-CAT API data types and NewType-patterns.
mod ids;
mod labbcat_url;
mod strings;

pub use ids::*;
pub use labbcat_url::*;
pub use strings::*;
