use std::fmt;

/// Machine-readable error codes shared by every revtree error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    RevisionNotFound,
    UnknownParent,
    RevisionHashMismatch,
    ContentMismatch,
    SnapshotDecodeFailed,
    UnsupportedSnapshotVersion,
    WriteConflict,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::RevisionNotFound => "E2001",
            Self::UnknownParent => "E2002",
            Self::RevisionHashMismatch => "E3001",
            Self::ContentMismatch => "E3002",
            Self::SnapshotDecodeFailed => "E3003",
            Self::UnsupportedSnapshotVersion => "E3004",
            Self::WriteConflict => "E5001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::RevisionNotFound => "Revision not found",
            Self::UnknownParent => "Parent revision unknown",
            Self::RevisionHashMismatch => "Revision hash mismatch",
            Self::ContentMismatch => "Content hash mismatch",
            Self::SnapshotDecodeFailed => "Snapshot decode failed",
            Self::UnsupportedSnapshotVersion => "Unsupported snapshot version",
            Self::WriteConflict => "Concurrent write conflict",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in the revtree TOML config and retry."),
            Self::RevisionNotFound => Some("Fetch the missing revision from a peer first."),
            Self::UnknownParent => {
                Some("Re-read the current heads and build the change on one of them.")
            }
            Self::RevisionHashMismatch => {
                Some("The record was modified after it was written; restore it from a replica.")
            }
            Self::ContentMismatch => {
                Some("A snapshot may only hold revisions of a single content hash.")
            }
            Self::SnapshotDecodeFailed => Some("Check that the file is a revtree JSON snapshot."),
            Self::UnsupportedSnapshotVersion => {
                Some("Upgrade revtree to read snapshots written by a newer version.")
            }
            Self::WriteConflict => Some("Retry after the competing writer finishes."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
