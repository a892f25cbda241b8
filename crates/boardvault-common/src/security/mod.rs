//! Security module for BoardVault
//!
//! - Audit logging of every custody operation, accepted or rejected

pub mod audit;

pub use audit::{AuditEvent, AuditLogger, AuditSink};
