//! Remote tutor API client layer
//!
//! Everything past this boundary is an external collaborator: payloads are
//! consumed as opaque JSON contracts, and failures come back classified so
//! handlers can recover without inspecting HTTP details.

pub mod auth;
mod client;
mod error;
pub mod types;

pub use client::{HttpTutorApi, TutorApi};
pub use error::{ApiError, ApiErrorKind};
