//! Per-submission orchestration
//!
//! One detection pass per submission: remote first, local patterns when the
//! remote path is down. Audit and forward are independent spawned branches;
//! their results are tagged with the submission's generation and dropped if
//! a newer submission has started by the time they land. An audit outcome
//! never invalidates an already-produced detection result.

use crate::remote::RemoteShield;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use veil_core::{EntityFilter, MaskingMode, Result, Segment, Span};
use veil_detect::{reconcile, segment, LocalSpanDetector, Masker};
use veil_egress::{EgressError, SanitizeRequest};

/// One piece of text to redact, with its per-submission configuration
#[derive(Debug, Clone)]
pub struct Submission {
    pub text: String,
    pub mode: MaskingMode,
    pub filter: EntityFilter,
}

/// Which detector produced the spans
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionSource {
    /// Authoritative shield service, reconciled
    Remote,

    /// Local pattern fallback (shield unreachable)
    LocalFallback,
}

/// Render-ready detection result. Identical shape for both sources.
#[derive(Debug, Clone)]
pub struct DetectionOutcome {
    /// Submission generation this outcome belongs to
    pub generation: u64,

    pub source: DetectionSource,

    /// The substituted text (remote) or locally masked text (fallback)
    pub sanitized_text: String,

    /// Spans in `sanitized_text` coordinates (remote) or original-text
    /// coordinates (fallback); the segments already account for this
    pub spans: Vec<Span>,

    /// Alternating plain/redacted display sequence
    pub segments: Vec<Segment>,

    /// Masking mode the submission asked for, carried for the forward branch
    pub mode: MaskingMode,

    /// Remote-reported processing time; zero on the fallback path
    pub processing_time_ms: f64,

    /// Whether the remote path failed specifically due to rate limiting
    pub rate_limited: bool,
}

/// Lifecycle of the current submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Detecting,
    Detected {
        source: DetectionSource,
    },
    Resolved,
}

/// Audit branch outcome; never applied retroactively to detection results
#[derive(Debug, Clone, PartialEq)]
pub enum AuditOutcome {
    Passed {
        safety_score: u8,
        usability_score: u8,
        critique: String,
    },
    /// Audit service unreachable or errored; surfaced as a status, the
    /// sanitized output stays on screen
    Unavailable,
    RateLimited,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuditUpdate {
    pub generation: u64,
    pub outcome: AuditOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForwardUpdate {
    pub generation: u64,
    /// Downstream reply, `None` when forwarding failed
    pub reply: Option<String>,
}

/// Sequences detection, audit, and forwarding for one submission at a time.
///
/// Re-submission while a detection pass is in flight is the caller's
/// responsibility to prevent; the orchestrator only guarantees that results
/// from superseded submissions are discarded.
pub struct Orchestrator {
    remote: Arc<dyn RemoteShield>,
    detector: LocalSpanDetector,
    masker: Masker,
    generation: Arc<AtomicU64>,
    state_tx: watch::Sender<SubmissionState>,
    audit_tx: watch::Sender<Option<AuditUpdate>>,
    forward_tx: watch::Sender<Option<ForwardUpdate>>,
}

impl Orchestrator {
    /// Create an orchestrator over the given remote boundary. Fails only if
    /// the built-in pattern catalog does not compile.
    pub fn new(remote: Arc<dyn RemoteShield>, hmac_secret: Option<String>) -> Result<Self> {
        Ok(Self {
            remote,
            detector: LocalSpanDetector::new()?,
            masker: Masker::new(hmac_secret),
            generation: Arc::new(AtomicU64::new(0)),
            state_tx: watch::channel(SubmissionState::Idle).0,
            audit_tx: watch::channel(None).0,
            forward_tx: watch::channel(None).0,
        })
    }

    /// Watch the submission lifecycle
    pub fn subscribe_state(&self) -> watch::Receiver<SubmissionState> {
        self.state_tx.subscribe()
    }

    /// Watch audit branch updates
    pub fn subscribe_audits(&self) -> watch::Receiver<Option<AuditUpdate>> {
        self.audit_tx.subscribe()
    }

    /// Watch forward branch updates
    pub fn subscribe_forwards(&self) -> watch::Receiver<Option<ForwardUpdate>> {
        self.forward_tx.subscribe()
    }

    /// Run one detection pass. Returns as soon as a render-ready outcome
    /// exists; audit/forward branches are spawned separately and never gate
    /// this result.
    pub async fn submit(&self, submission: Submission) -> DetectionOutcome {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = self.state_tx.send(SubmissionState::Detecting);

        let request =
            SanitizeRequest::new(submission.text.as_str(), submission.mode, &submission.filter);
        let outcome = match self.remote.sanitize(&request).await {
            Ok(response) => {
                let spans = reconcile(
                    &submission.text,
                    &response.clean_text,
                    &response.items,
                    response.synthetic_map.as_ref(),
                );
                let segments = segment(&response.clean_text, &spans);
                info!(
                    generation,
                    span_count = spans.len(),
                    processing_time_ms = response.processing_time_ms,
                    "authoritative detection complete"
                );
                DetectionOutcome {
                    generation,
                    source: DetectionSource::Remote,
                    sanitized_text: response.clean_text,
                    spans,
                    segments,
                    mode: submission.mode,
                    processing_time_ms: response.processing_time_ms,
                    rate_limited: false,
                }
            }
            Err(err) => {
                let rate_limited = matches!(err, EgressError::RateLimitExceeded { .. });
                warn!(
                    generation,
                    error = %err,
                    "authoritative detection unavailable, falling back to local patterns"
                );
                let spans = self.detector.detect(&submission.text, &submission.filter);
                let sanitized_text = self.masker.apply(&submission.text, &spans, submission.mode);
                let segments = segment(&submission.text, &spans);
                DetectionOutcome {
                    generation,
                    source: DetectionSource::LocalFallback,
                    sanitized_text,
                    spans,
                    segments,
                    mode: submission.mode,
                    processing_time_ms: 0.0,
                    rate_limited,
                }
            }
        };

        let _ = self.state_tx.send(SubmissionState::Detected {
            source: outcome.source,
        });
        let _ = self.state_tx.send(SubmissionState::Resolved);
        outcome
    }

    /// Spawn the audit branch for an outcome. Fire-and-forget: the result
    /// arrives on the audit watch channel unless a newer submission has
    /// started, in which case it is dropped.
    pub fn spawn_audit(&self, outcome: &DetectionOutcome) -> JoinHandle<()> {
        let generation = outcome.generation;
        let redacted_text = outcome.sanitized_text.clone();
        let remote = Arc::clone(&self.remote);
        let current = Arc::clone(&self.generation);
        let tx = self.audit_tx.clone();

        tokio::spawn(async move {
            let result = remote.audit(&redacted_text).await;

            if current.load(Ordering::SeqCst) != generation {
                debug!(generation, "discarding stale audit result");
                return;
            }

            let audit = match result {
                Ok(response) => AuditOutcome::Passed {
                    safety_score: response.safety_score,
                    usability_score: response.usability_score,
                    critique: response.critique,
                },
                Err(EgressError::RateLimitExceeded { .. }) => AuditOutcome::RateLimited,
                Err(err) => {
                    warn!(generation, error = %err, "audit unavailable");
                    AuditOutcome::Unavailable
                }
            };
            let _ = tx.send(Some(AuditUpdate {
                generation,
                outcome: audit,
            }));
        })
    }

    /// Spawn the downstream-forward branch for an outcome. Independent of
    /// the audit branch; stale replies are dropped the same way.
    pub fn spawn_forward(&self, outcome: &DetectionOutcome) -> JoinHandle<()> {
        let generation = outcome.generation;
        let request = SanitizeRequest::new(
            outcome.sanitized_text.as_str(),
            outcome.mode,
            &EntityFilter::all(),
        );
        let remote = Arc::clone(&self.remote);
        let current = Arc::clone(&self.generation);
        let tx = self.forward_tx.clone();

        tokio::spawn(async move {
            let result = remote.chat(&request).await;

            if current.load(Ordering::SeqCst) != generation {
                debug!(generation, "discarding stale downstream reply");
                return;
            }

            let reply = match result {
                Ok(response) => Some(response.reply),
                Err(err) => {
                    warn!(generation, error = %err, "downstream forward failed");
                    None
                }
            };
            let _ = tx.send(Some(ForwardUpdate { generation, reply }));
        })
    }
}
