//! Buffered audit trail for authorization decisions.
//!
//! Flow Overview: guard and flow components emit [`AuditRecord`]s through an
//! [`AuditHandle`]; a background task drains the channel and hands each
//! record to an [`AuditSink`]. The emit path is an in-memory append and
//! never blocks a response, yet it runs on failure paths too; compliance
//! review reads the sink's output. The default sink writes structured JSON
//! to the log stream under the `audit` target.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::identity::types::now_unix_seconds;

/// Where a request came from, for compliance review.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Origin {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl Origin {
    #[must_use]
    pub fn unknown() -> Self {
        Self::default()
    }
}

/// Audited operations of this subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    ChallengeRequest,
    Exchange,
    Authorize,
    Refresh,
    Revoke,
}

impl AuditAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ChallengeRequest => "challenge_request",
            Self::Exchange => "exchange",
            Self::Authorize => "authorize",
            Self::Refresh => "refresh",
            Self::Revoke => "revoke",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Success,
    Failure,
}

/// Append-only audit entry; never mutated or deleted by this subsystem.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub timestamp: i64,
    pub identity_id: Option<Uuid>,
    pub action: AuditAction,
    pub outcome: AuditOutcome,
    pub reason: Option<String>,
    pub origin: Origin,
}

impl AuditRecord {
    #[must_use]
    pub fn success(action: AuditAction, identity_id: Option<Uuid>, origin: &Origin) -> Self {
        Self {
            timestamp: now_unix_seconds(),
            identity_id,
            action,
            outcome: AuditOutcome::Success,
            reason: None,
            origin: origin.clone(),
        }
    }

    #[must_use]
    pub fn failure(
        action: AuditAction,
        identity_id: Option<Uuid>,
        reason: impl Into<String>,
        origin: &Origin,
    ) -> Self {
        Self {
            timestamp: now_unix_seconds(),
            identity_id,
            action,
            outcome: AuditOutcome::Failure,
            reason: Some(reason.into()),
            origin: origin.clone(),
        }
    }

    fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|err| format!("{{\"error\":\"unserializable audit record: {err}\"}}"))
    }
}

/// Destination for drained audit records.
pub trait AuditSink: Send + Sync {
    fn record(&self, record: &AuditRecord);
}

/// Default sink: structured JSON on the log stream, `audit` target so the
/// records can be routed separately from application logs.
#[derive(Clone, Debug)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, record: &AuditRecord) {
        info!(
            target: "audit",
            action = record.action.as_str(),
            outcome = ?record.outcome,
            identity_id = ?record.identity_id,
            record = %record.to_json(),
            "audit record"
        );
    }
}

/// Cheap, cloneable sender side of the audit pipeline.
#[derive(Clone, Debug)]
pub struct AuditHandle {
    tx: mpsc::UnboundedSender<AuditRecord>,
}

impl AuditHandle {
    /// Append a record. The send is an unbounded in-memory enqueue; if the
    /// writer is gone the record still reaches the log stream inline so
    /// audit writing is never skipped.
    pub fn emit(&self, record: AuditRecord) {
        if let Err(err) = self.tx.send(record) {
            warn!(
                target: "audit",
                record = %err.0.to_json(),
                "audit writer unavailable; record logged inline"
            );
        }
    }
}

/// Spawn the drain task feeding `sink`.
pub fn spawn_audit_writer(sink: Arc<dyn AuditSink>) -> (AuditHandle, tokio::task::JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<AuditRecord>();
    let handle = tokio::spawn(async move {
        while let Some(record) = rx.recv().await {
            sink.record(&record);
        }
    });
    (AuditHandle { tx }, handle)
}
