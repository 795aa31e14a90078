use std::fmt;
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured runtime error with a stable internal classification.
/// Not a stable API; intended for internal use and may change without notice.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl InternalError {
    /// Construct an InternalError from a class/origin pair and a message.
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
        }
    }

    /// Construct a store-origin not-found error.
    pub(crate) fn store_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::NotFound, ErrorOrigin::Store, message)
    }

    /// Construct a store-origin conflict error (duplicate key).
    pub(crate) fn store_conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Conflict, ErrorOrigin::Store, message)
    }

    /// Construct a counter-origin invariant violation.
    pub(crate) fn counter_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Counter,
            message,
        )
    }

    /// Construct a counter-origin internal error.
    pub(crate) fn counter_internal(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Internal, ErrorOrigin::Counter, message)
    }

    /// Construct a reconcile-origin internal error.
    pub(crate) fn reconcile_internal(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Internal, ErrorOrigin::Reconcile, message)
    }

    /// Construct a validate-origin validation error.
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Validation, ErrorOrigin::Validate, message)
    }

    /// True when this error reports a failed validation rather than a bug.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self.class, ErrorClass::Validation)
    }
}

///
/// ErrorClass
///
/// Coarse classification used by callers to decide whether an error is
/// retryable, user-facing, or an engine bug.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    /// Row or ancestor not found.
    NotFound,
    /// Duplicate key or uniqueness conflict.
    Conflict,
    /// Rejected input; user-facing, never retried automatically.
    Validation,
    /// A guaranteed invariant no longer holds. Engine bug; abort everything.
    InvariantViolation,
    /// Valid request the engine does not support.
    Unsupported,
    /// Unexpected internal failure.
    Internal,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Validation => "validation",
            Self::InvariantViolation => "invariant_violation",
            Self::Unsupported => "unsupported",
            Self::Internal => "internal",
        };
        write!(f, "{s}")
    }
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Store,
    Hierarchy,
    Counter,
    StateMachine,
    Requirements,
    Reconcile,
    Validate,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Store => "store",
            Self::Hierarchy => "hierarchy",
            Self::Counter => "counter",
            Self::StateMachine => "state_machine",
            Self::Requirements => "requirements",
            Self::Reconcile => "reconcile",
            Self::Validate => "validate",
        };
        write!(f, "{s}")
    }
}
