//! Searching transcripts for patterns, and getting data about the matches.
//!
//! A search runs as a server-side task: [LabbcatClient::search](crate::LabbcatClient::search)
//! starts it, [LabbcatClient::get_matches](crate::LabbcatClient::get_matches) waits for it and
//! gets the results. Match IDs can then be used to get annotations and media of the matches.

mod annotations;
mod builder;
mod fragments;
mod match_id;
mod matches;
mod pattern;

pub use annotations::*;
pub use builder::*;
pub use fragments::*;
pub use match_id::*;
pub use matches::*;
pub use pattern::*;
