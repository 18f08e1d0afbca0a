//! Training module.
//!
//! This module provides:
//! - The training loop driver: epoch-bounded forward/backward passes over
//!   the training split and forward-only validation passes
//! - An explicit monitor state machine for the early-stop and
//!   best-checkpoint decisions
//!
//! Per epoch the flow is:
//! 1. Shuffle the training indices and stream batches through the prefetcher
//! 2. Update the head weights batch by batch (the backbone stays frozen)
//! 3. Evaluate on the validation split
//! 4. Feed validation accuracy to the monitor: save a checkpoint on
//!    improvement, halt once patience is exhausted

pub mod driver;
pub mod monitor;

// Re-export main types for convenience
pub use driver::{fit, FitReport};
pub use monitor::{EpochOutcome, MonitorMode, TrainingMonitor};
