use thiserror::Error;

/// Errors from repository operations (used by trait definitions in convene-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors related to meeting and voting operations.
#[derive(Debug, Error)]
pub enum MeetingError {
    #[error("meeting not found")]
    NotFound,

    #[error("meeting title must not be empty")]
    EmptyTitle,

    #[error("voting is not open for this meeting")]
    VotingClosed,

    #[error("only the organizer may close voting")]
    NotOrganizer,

    #[error("no approved votes recorded yet")]
    NoVotes,

    #[error("storage error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Errors from the meeting-creation dialog.
#[derive(Debug, Error)]
pub enum DialogError {
    #[error("invalid time slot '{line}': {reason}")]
    InvalidTimeSlot { line: String, reason: String },

    #[error("no valid time slots given")]
    NoTimeSlots,
}

/// Errors from parsing structured callback payloads.
#[derive(Debug, Error)]
pub enum CallbackError {
    #[error("empty callback payload")]
    Empty,

    #[error("unknown action: '{0}'")]
    UnknownAction(String),

    #[error("action '{action}' expects {expected} parameters, got {got}")]
    WrongArity {
        action: String,
        expected: usize,
        got: usize,
    },

    #[error("invalid id parameter: '{0}'")]
    InvalidId(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_meeting_error_wraps_repository_error() {
        let err = MeetingError::from(RepositoryError::NotFound);
        assert!(matches!(err, MeetingError::Repository(_)));
        assert!(err.to_string().contains("entity not found"));
    }

    #[test]
    fn test_callback_error_arity_display() {
        let err = CallbackError::WrongArity {
            action: "vote".to_string(),
            expected: 2,
            got: 1,
        };
        assert_eq!(err.to_string(), "action 'vote' expects 2 parameters, got 1");
    }

    #[test]
    fn test_dialog_error_display() {
        let err = DialogError::InvalidTimeSlot {
            line: "tomorrow-ish".to_string(),
            reason: "expected YYYY-MM-DD HH:MM".to_string(),
        };
        assert!(err.to_string().contains("tomorrow-ish"));
    }
}
