//! Veil Orchestration
//!
//! Per-submission sequencing of the redaction pipeline:
//! - Authoritative detection via the shield service, with transparent
//!   fallback to the local pattern detector when it is unreachable
//! - Fire-and-forget audit and downstream-forward branches that never block
//!   the detection result and never outlive their submission

pub mod orchestrator;
pub mod remote;

pub use orchestrator::{
    AuditOutcome, AuditUpdate, DetectionOutcome, DetectionSource, ForwardUpdate, Orchestrator,
    Submission, SubmissionState,
};
pub use remote::RemoteShield;
