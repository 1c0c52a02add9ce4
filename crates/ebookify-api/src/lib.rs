//! eBookify API
//!
//! Thin HTTP surface over the job lifecycle manager: upload, status
//! polling, result download, and on-demand cleanup. Everything stateful
//! lives behind [`state::AppState`]; handlers stay small and push work into
//! the service layer.

pub mod api_doc;
pub mod error;
pub mod handlers;
pub mod multipart;
pub mod setup;
pub mod state;
pub mod telemetry;
pub mod validation;
