//! Conversation session controller
//!
//! Append-only message log, metadata-driven turn router, paced progress
//! phases, and the handlers that call the tutor API.

pub mod controller;
pub mod feedback;
pub mod message;
pub mod progress;
mod router;
mod topics;

#[cfg(test)]
mod proptests;

pub use controller::{Pacer, SessionController, SessionEvent, TokioPacer};
pub use message::{Message, MessageLog, Role, RoutingMetadata};
pub use progress::{PhaseStatus, ProgressTracker};
