//! Batch progress state for resume

pub mod checkpoint;
pub mod manager;

pub use checkpoint::{BatchCheckpoint, CHECKPOINT_TTL_HOURS};
pub use manager::CheckpointManager;
