//! # BoardVault Common
//!
//! Shared types, errors, and audit logging for the BoardVault custody system.
//!
//! ## Core Types
//!
//! - [`Identity`]: opaque caller identity (board member, initiator, depositor, recipient)
//! - [`VaultError`]: unified error type with per-component sub-errors
//!
//! ## Security
//!
//! - [`security::audit`]: audit events, sinks, and the dispatching logger

pub mod error;
pub mod security;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{BoardError, PayoutError, Result, TreasuryError, VaultError, WorkflowError};
pub use security::audit::{
    AuditCategory, AuditEvent, AuditLogger, AuditOutcome, AuditSeverity, AuditSink,
    ConsoleAuditSink, MemoryAuditSink,
};
pub use types::identity::{Identity, IdentityError};

/// BoardVault version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default board size
pub const BOARD_SIZE: usize = 20;

/// Name of the base fund unit held by the treasury
pub const FUND_UNIT: &str = "FND";
