//! Client library for [LaBB-CAT](https://labbcat.canterbury.ac.nz), a browser-based
//! linguistic annotation store.
//!
//! Connect with [LabbcatView], [LabbcatEdit] or [LabbcatAdmin], depending on what
//! you intend to do. Authorization is negotiated when connecting and reused afterwards.

pub mod auth;
mod client;
pub mod config;
pub mod errors;
pub mod models;
mod requests;
pub mod response;
pub mod search;
pub mod task;
pub mod types;
mod upload;

pub use client::access::{Access, AdminAccess, CanAdmin, CanEdit, EditAccess, ViewAccess};
pub use client::builder::LabbcatClientBuilder;
pub use client::edit::TranscriptUpload;
pub use client::{LabbcatAdmin, LabbcatClient, LabbcatEdit, LabbcatView};
pub use config::ClientConfig;
pub use search::{Match, MatchId, Pattern, PatternBuilder};
pub use task::{TaskStatus, TaskWait};

pub use reqwest;
pub use tokio_util::sync::CancellationToken;
