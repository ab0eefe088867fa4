use std::time::Duration;

use ledgerql_crypto::CryptoError;
use thiserror::Error;

/// Failures detected while building or signing a transaction, before any
/// request leaves the process.
#[derive(Debug, Error)]
pub enum ConstructionError {
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error("{field} must be a JSON object or null")]
    InvalidPayload { field: &'static str },
    #[error("invalid transfer source: {0}")]
    InvalidSource(String),
    #[error("{signer} is not an owner of input {index}")]
    NotOwner { signer: String, index: usize },
}

/// Errors that can occur when communicating with a ledger node.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("construction failure: {0}")]
    Construction(#[from] ConstructionError),
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("invalid request header `{0}`")]
    InvalidHeader(String),
    #[error("url error: {0}")]
    Url(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server error (status {status}): {message}")]
    ServerError { status: u16, message: String },
    #[error("parse error: {0}")]
    Parse(String),
    #[error("transaction {id} rejected: {reason}")]
    CommitRejected { id: String, reason: String },
    #[error("transaction {id} not committed after {waited:?}")]
    CommitTimeout { id: String, waited: Duration },
}

impl From<CryptoError> for LedgerError {
    fn from(err: CryptoError) -> Self {
        LedgerError::Construction(err.into())
    }
}

/// Coarse failure classes reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Bad key material, payload or transfer reference; never hit the network.
    Construction,
    /// The ledger could not be reached or answered unusably.
    Network,
    /// The ledger refused a signed transaction.
    CommitRejected,
}

impl FailureKind {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            FailureKind::Construction => "CONSTRUCTION_FAILURE",
            FailureKind::Network => "NETWORK_FAILURE",
            FailureKind::CommitRejected => "COMMIT_REJECTED",
        }
    }
}

impl LedgerError {
    pub fn kind(&self) -> FailureKind {
        match self {
            LedgerError::Construction(_) => FailureKind::Construction,
            LedgerError::CommitRejected { .. } => FailureKind::CommitRejected,
            LedgerError::InvalidBaseUrl(_)
            | LedgerError::InvalidHeader(_)
            | LedgerError::Url(_)
            | LedgerError::Http(_)
            | LedgerError::ServerError { .. }
            | LedgerError::Parse(_)
            | LedgerError::CommitTimeout { .. } => FailureKind::Network,
        }
    }

    pub(crate) fn parse_error(msg: impl Into<String>) -> Self {
        LedgerError::Parse(msg.into())
    }

    pub(crate) fn server_error(status: u16, message: impl Into<String>) -> Self {
        LedgerError::ServerError {
            status,
            message: message.into(),
        }
    }
}
