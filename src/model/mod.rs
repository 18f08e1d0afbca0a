//! Model module: frozen feature extractor plus trainable classification head.
//!
//! The classifier is a composition of two independently identified parameter
//! groups:
//! - the **backbone**, a MobileNetV2 feature extractor whose weights come
//!   from a pretrained record and are excluded from gradient updates, and
//! - the **head**, a small dense stack trained from scratch for the target
//!   disease classes.

pub mod backbone;
pub mod classifier;
pub mod head;

// Re-export main types for convenience
pub use backbone::Backbone;
pub use classifier::{ModelSpec, SkinClassifier, Trainability};
pub use head::Head;
