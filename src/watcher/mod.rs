//! The state-change watcher: each queue message is repaired, decoded,
//! compared with the stored snapshot, alerted on, and stored.

pub mod alert;
pub mod diff;
pub mod error;
pub mod ingest;
pub mod model;
pub mod normalize;
pub mod persist;
pub mod pipeline;
pub mod snapshot;

pub use ingest::IngestionLoop;
pub use model::{ContainerSnapshot, GameStateSnapshot};
pub use pipeline::Pipeline;
