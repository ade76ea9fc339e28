//! # rex
//!
//! The async half of Rex: repository client, explorer orchestration, HTTP
//! API and configuration. All graph logic lives in `rex-core`.

pub mod api;
pub mod client;
pub mod config;
pub mod explorer;
