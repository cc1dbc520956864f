//! Veil PII Detection and Reconciliation
//!
//! This crate provides the span-level redaction core:
//! - Pattern catalog of entity-type regexes with display labels
//! - Local span detector, the fallback when the shield service is unreachable
//! - Entity-label normalization and shape-based classification
//! - Reconciliation of authoritative detector output back into labeled spans
//! - Display segmentation and local masking passes

pub mod catalog;
pub mod detector;
pub mod mask;
pub mod normalize;
pub mod reconcile;
pub mod segment;

pub use catalog::{EntityPattern, PatternCatalog};
pub use detector::LocalSpanDetector;
pub use mask::Masker;
pub use normalize::{infer_label, normalize_label};
pub use reconcile::reconcile;
pub use segment::segment;
