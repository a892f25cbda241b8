//! Custody Audit Logging
//!
//! Records every custody-relevant decision:
//! - Deposits into the pooled treasury
//! - Release requests, signatures, and cancellations
//! - Fund releases and failed transfers
//! - Rejected calls (guard violations)

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// Audit event severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AuditSeverity {
    /// Informational - normal operation
    Info,
    /// Warning - rejected call
    Warning,
    /// Error - operation failed after admission
    Error,
}

impl std::fmt::Display for AuditSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditSeverity::Info => write!(f, "INFO"),
            AuditSeverity::Warning => write!(f, "WARN"),
            AuditSeverity::Error => write!(f, "ERROR"),
        }
    }
}

impl std::str::FromStr for AuditSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(AuditSeverity::Info),
            "warn" | "warning" => Ok(AuditSeverity::Warning),
            "error" => Ok(AuditSeverity::Error),
            other => Err(format!("unknown audit severity: {}", other)),
        }
    }
}

/// Audit event category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditCategory {
    /// Vault construction
    Setup,
    /// Treasury deposits
    Deposit,
    /// Release request lifecycle (request, cancel)
    ReleaseRequest,
    /// Board member signatures
    Signature,
    /// Fund transfers out of the treasury
    Release,
    /// Calls refused because the caller lacks the privilege
    Authorization,
}

impl std::fmt::Display for AuditCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditCategory::Setup => write!(f, "SETUP"),
            AuditCategory::Deposit => write!(f, "DEPOSIT"),
            AuditCategory::ReleaseRequest => write!(f, "REQUEST"),
            AuditCategory::Signature => write!(f, "SIGN"),
            AuditCategory::Release => write!(f, "RELEASE"),
            AuditCategory::Authorization => write!(f, "AUTHZ"),
        }
    }
}

/// Audit outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditOutcome {
    Success,
    Failure,
}

/// Audit event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID
    pub event_id: String,

    /// Timestamp (Unix millis)
    pub timestamp: i64,

    /// Event severity
    pub severity: AuditSeverity,

    /// Event category
    pub category: AuditCategory,

    /// Operation name (e.g., "deposit", "sign_release")
    pub action: String,

    /// Outcome (success/failure)
    pub outcome: AuditOutcome,

    /// Caller identity
    pub actor: Option<String>,

    /// Release cycle the event belongs to
    pub cycle_id: Option<String>,

    /// Additional details
    pub details: HashMap<String, String>,
}

impl AuditEvent {
    /// Create a new audit event
    pub fn new(category: AuditCategory, action: &str, outcome: AuditOutcome) -> Self {
        Self {
            event_id: uuid::Uuid::now_v7().to_string(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            severity: match outcome {
                AuditOutcome::Success => AuditSeverity::Info,
                AuditOutcome::Failure => AuditSeverity::Warning,
            },
            category,
            action: action.to_string(),
            outcome,
            actor: None,
            cycle_id: None,
            details: HashMap::new(),
        }
    }

    /// Set severity
    pub fn with_severity(mut self, severity: AuditSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// Set actor
    pub fn with_actor(mut self, actor: &str) -> Self {
        self.actor = Some(actor.to_string());
        self
    }

    /// Set release cycle
    pub fn with_cycle(mut self, cycle_id: &str) -> Self {
        self.cycle_id = Some(cycle_id.to_string());
        self
    }

    /// Add detail
    pub fn with_detail(mut self, key: &str, value: &str) -> Self {
        self.details.insert(key.to_string(), value.to_string());
        self
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Audit log sink
pub trait AuditSink: Send + Sync {
    /// Write an audit event
    fn write(&self, event: &AuditEvent);
}

/// Console audit sink, routed through `tracing`
pub struct ConsoleAuditSink;

impl AuditSink for ConsoleAuditSink {
    fn write(&self, event: &AuditEvent) {
        let log_line = format!(
            "[{}] {} {} {} - actor={} cycle={} outcome={:?}",
            event.severity,
            event.category,
            event.action,
            event.event_id,
            event.actor.as_deref().unwrap_or("-"),
            event.cycle_id.as_deref().unwrap_or("-"),
            event.outcome,
        );

        match event.severity {
            AuditSeverity::Info => info!("{}", log_line),
            AuditSeverity::Warning => warn!("{}", log_line),
            AuditSeverity::Error => error!("{}", log_line),
        }
    }
}

/// In-memory audit sink, retains every event it receives
#[derive(Clone, Default)]
pub struct MemoryAuditSink {
    events: Arc<RwLock<Vec<AuditEvent>>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded events
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.read().clone()
    }

    /// Events for a single operation name
    pub fn events_for(&self, action: &str) -> Vec<AuditEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.action == action)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

impl AuditSink for MemoryAuditSink {
    fn write(&self, event: &AuditEvent) {
        self.events.write().push(event.clone());
    }
}

/// Audit logger
pub struct AuditLogger {
    sinks: Vec<Box<dyn AuditSink>>,
    /// Minimum severity to log
    min_severity: AuditSeverity,
}

impl AuditLogger {
    /// Create a new audit logger writing to the console
    pub fn new() -> Self {
        Self {
            sinks: vec![Box::new(ConsoleAuditSink)],
            min_severity: AuditSeverity::Info,
        }
    }

    /// Create a logger with no sinks
    pub fn silent() -> Self {
        Self {
            sinks: vec![],
            min_severity: AuditSeverity::Info,
        }
    }

    /// Add a sink
    pub fn add_sink(&mut self, sink: Box<dyn AuditSink>) {
        self.sinks.push(sink);
    }

    /// Builder form of [`AuditLogger::add_sink`]
    pub fn with_sink(mut self, sink: Box<dyn AuditSink>) -> Self {
        self.add_sink(sink);
        self
    }

    /// Set minimum severity
    pub fn set_min_severity(&mut self, severity: AuditSeverity) {
        self.min_severity = severity;
    }

    /// Log an audit event
    pub fn log(&self, event: AuditEvent) {
        if event.severity < self.min_severity {
            return;
        }

        for sink in &self.sinks {
            sink.write(&event);
        }
    }

    /// Log an accepted operation
    pub fn log_accepted(
        &self,
        category: AuditCategory,
        action: &str,
        actor: &str,
        cycle_id: Option<&str>,
        details: &[(&str, String)],
    ) {
        let mut event = AuditEvent::new(category, action, AuditOutcome::Success).with_actor(actor);
        if let Some(cycle) = cycle_id {
            event = event.with_cycle(cycle);
        }
        for (key, value) in details {
            event = event.with_detail(key, value);
        }
        self.log(event);
    }

    /// Log a rejected operation with its error code
    pub fn log_rejected(
        &self,
        category: AuditCategory,
        action: &str,
        actor: &str,
        cycle_id: Option<&str>,
        code: &str,
    ) {
        let mut event = AuditEvent::new(category, action, AuditOutcome::Failure)
            .with_actor(actor)
            .with_detail("error", code);
        if let Some(cycle) = cycle_id {
            event = event.with_cycle(cycle);
        }
        self.log(event);
    }

    /// Log a failed transfer out of the treasury
    pub fn log_transfer_failure(
        &self,
        actor: &str,
        cycle_id: Option<&str>,
        recipient: &str,
        reason: &str,
    ) {
        let mut event = AuditEvent::new(AuditCategory::Release, "release_funds", AuditOutcome::Failure)
            .with_severity(AuditSeverity::Error)
            .with_actor(actor)
            .with_detail("error", "TransferFailed")
            .with_detail("recipient", recipient)
            .with_detail("reason", reason);
        if let Some(cycle) = cycle_id {
            event = event.with_cycle(cycle);
        }
        self.log(event);
    }
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new()
    }
}
