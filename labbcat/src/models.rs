//! Representations of data from LaBB-CAT.
mod annotation;
mod corpus;

pub use annotation::*;
pub use corpus::*;
