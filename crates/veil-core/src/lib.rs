//! Veil Core Types
//!
//! This crate provides the fundamental types used throughout Veil:
//! - Labeled text spans and display segments
//! - Substitution maps from the authoritative detector
//! - Masking mode and entity filter configuration
//! - Core error types

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{
    EntityFilter, MaskingMode, Segment, SegmentKind, Span, SubstitutionMap,
};
