use std::fmt;
use std::io;
use std::path::PathBuf;

/// Machine-readable error codes, stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    TicketNotFound,
    ValidationFailed,
    StoreReadFailed,
    StoreWriteFailed,
    StoreCorrupt,
    NetworkFailure,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1002",
            Self::TicketNotFound => "E2001",
            Self::ValidationFailed => "E2005",
            Self::StoreCorrupt => "E3003",
            Self::StoreReadFailed => "E5001",
            Self::StoreWriteFailed => "E5002",
            Self::NetworkFailure => "E6001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::TicketNotFound => "Ticket not found",
            Self::ValidationFailed => "Invalid input",
            Self::StoreReadFailed => "Ticket store could not be read",
            Self::StoreWriteFailed => "Ticket store could not be written",
            Self::StoreCorrupt => "Ticket store is corrupt",
            Self::NetworkFailure => "Ticket service unreachable",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .kanban/config.toml and retry."),
            Self::TicketNotFound => Some("Check the ticket ID with `kb list`."),
            Self::ValidationFailed => None,
            Self::StoreReadFailed => Some("Check that the tickets file exists and is readable."),
            Self::StoreWriteFailed => Some("Check disk space and write permissions."),
            Self::StoreCorrupt => {
                Some("Restore the tickets file from backup or fix the reported line.")
            }
            Self::NetworkFailure => Some("Check that `kb serve` is running at the configured URL."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }

    /// HTTP status the service boundary reports for this code.
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::TicketNotFound => 404,
            Self::ValidationFailed => 400,
            Self::NetworkFailure => 502,
            Self::ConfigParseError
            | Self::StoreReadFailed
            | Self::StoreWriteFailed
            | Self::StoreCorrupt
            | Self::InternalUnexpected => 500,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Which direction of store I/O failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOp {
    Read,
    Write,
}

impl fmt::Display for IoOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
        }
    }
}

/// Typed failures surfaced by the store, the service and the sync client.
#[derive(Debug, thiserror::Error)]
pub enum KanbanError {
    #[error("ticket '{id}' not found")]
    NotFound { id: String },

    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("failed to {op} {}: {source}", path.display())]
    Io {
        op: IoOp,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("corrupt ticket store {} at line {line}: {reason}", path.display())]
    CorruptStore {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("network failure: {0}")]
    Network(String),

    #[error("config error: {0}")]
    Config(String),
}

impl KanbanError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::TicketNotFound,
            Self::Validation { .. } => ErrorCode::ValidationFailed,
            Self::Io {
                op: IoOp::Read, ..
            } => ErrorCode::StoreReadFailed,
            Self::Io {
                op: IoOp::Write, ..
            } => ErrorCode::StoreWriteFailed,
            Self::CorruptStore { .. } => ErrorCode::StoreCorrupt,
            Self::Network(_) => ErrorCode::NetworkFailure,
            Self::Config(_) => ErrorCode::ConfigParseError,
        }
    }

    /// True for the IOFailure family (unreadable, unwritable or corrupt store).
    #[must_use]
    pub const fn is_io_failure(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::CorruptStore { .. })
    }
}

pub type Result<T, E = KanbanError> = std::result::Result<T, E>;
