//! Error types for BoardVault
//!
//! Provides a unified error type and component-specific error variants

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type alias using VaultError
pub type Result<T> = std::result::Result<T, VaultError>;

/// Unified error type for BoardVault operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VaultError {
    // Board construction errors
    #[error("Board error: {0}")]
    Board(#[from] BoardError),

    // Treasury errors
    #[error("Treasury error: {0}")]
    Treasury(#[from] TreasuryError),

    // Release workflow errors
    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    // Identity parsing errors
    #[error("Identity error: {0}")]
    Identity(#[from] crate::types::identity::IdentityError),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl VaultError {
    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            VaultError::Board(BoardError::InvalidBoardSize { .. }) => "InvalidBoardSize",
            VaultError::Board(BoardError::DuplicateMember(_)) => "DuplicateMember",
            VaultError::Treasury(TreasuryError::ZeroOrNegativeAmount) => "ZeroOrNegativeAmount",
            VaultError::Treasury(TreasuryError::BalanceOverflow) => "BalanceOverflow",
            VaultError::Treasury(TreasuryError::TransferFailed { .. }) => "TransferFailed",
            VaultError::Workflow(WorkflowError::NotBoardMember(_)) => "NotBoardMember",
            VaultError::Workflow(WorkflowError::NoReleasePending) => "NoReleasePending",
            VaultError::Workflow(WorkflowError::ReleaseAlreadyRequested) => {
                "ReleaseAlreadyRequested"
            }
            VaultError::Workflow(WorkflowError::SignaturesIncomplete { .. }) => {
                "SignaturesIncomplete"
            }
            VaultError::Workflow(WorkflowError::Unauthorized { .. }) => "Unauthorized",
            VaultError::Workflow(WorkflowError::CancellationDisabled) => "CancellationDisabled",
            VaultError::Identity(_) => "InvalidIdentity",
            VaultError::Serialization(_) => "Serialization",
            VaultError::Internal(_) => "Internal",
        }
    }

    /// Whether retrying the same call without further state changes can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            VaultError::Treasury(TreasuryError::TransferFailed { .. })
        )
    }
}

/// Board construction errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("Invalid board size: expected {expected} members, got {actual}")]
    InvalidBoardSize { expected: usize, actual: usize },

    #[error("Duplicate board member: {0}")]
    DuplicateMember(String),
}

/// Treasury ledger errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TreasuryError {
    #[error("Amount must be positive")]
    ZeroOrNegativeAmount,

    #[error("Treasury balance overflow")]
    BalanceOverflow,

    #[error("Transfer of {amount} to {recipient} failed: {reason}")]
    TransferFailed {
        recipient: String,
        amount: Decimal,
        reason: String,
    },
}

/// Release workflow guard violations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("Caller is not a board member: {0}")]
    NotBoardMember(String),

    #[error("No release is pending")]
    NoReleasePending,

    #[error("A release has already been requested")]
    ReleaseAlreadyRequested,

    #[error("Signatures incomplete: {signed} of {required} board members signed")]
    SignaturesIncomplete { signed: usize, required: usize },

    #[error("Caller {caller} is not authorized to {operation}")]
    Unauthorized { caller: String, operation: String },

    #[error("Cancelling a pending release is disabled by policy")]
    CancellationDisabled,
}

/// Errors raised by a payout rail when moving funds to a recipient
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PayoutError {
    #[error("Recipient rejected funds")]
    Rejected,

    #[error("Payout rail unavailable: {0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for VaultError {
    fn from(err: serde_json::Error) -> Self {
        VaultError::Serialization(err.to_string())
    }
}
