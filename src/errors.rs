use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Failure half of a domain operation: a flat, non-empty list of
/// human-readable messages. Aggregates return this instead of panicking
/// when a rule is violated, and leave their state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{}", .messages.join("; "))]
pub struct DomainError {
    messages: Vec<String>,
}

impl DomainError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            messages: vec![message.into()],
        }
    }

    /// Builds an error from several messages. An empty list collapses to a
    /// single generic message so the error is never blank.
    pub fn from_messages(messages: Vec<String>) -> Self {
        if messages.is_empty() {
            return Self::new("Operation failed");
        }
        Self { messages }
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Case-insensitive substring match over all messages.
    pub fn contains(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.messages
            .iter()
            .any(|m| m.to_lowercase().contains(&needle))
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

/// Error returned by command and query handlers.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("{0}")]
    Domain(#[from] DomainError),

    /// Optimistic-concurrency conflict raised by a repository. This is the
    /// only variant the retry loop treats as transient.
    #[error("Concurrent modification: {0}")]
    ConcurrentModification(Uuid),

    /// An aggregate with the same unique key is already stored.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ServiceError {
    /// Flattens the error into the message list surfaced to callers.
    pub fn messages(&self) -> Vec<String> {
        match self {
            ServiceError::Domain(e) => e.messages().to_vec(),
            ServiceError::NotFound(msg)
            | ServiceError::ValidationError(msg)
            | ServiceError::InvalidOperation(msg)
            | ServiceError::AlreadyExists(msg)
            | ServiceError::Conflict(msg)
            | ServiceError::Cancelled(msg)
            | ServiceError::EventError(msg)
            | ServiceError::InternalError(msg) => vec![msg.clone()],
            ServiceError::ConcurrentModification(id) => {
                vec![format!("Concurrent modification detected for {}", id)]
            }
        }
    }

    /// Case-insensitive substring match over [`ServiceError::messages`].
    pub fn mentions(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.messages()
            .iter()
            .any(|m| m.to_lowercase().contains(&needle))
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::ConcurrentModification(_))
    }

    /// Short label used for failure metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => "not_found",
            ServiceError::ValidationError(_) => "validation_error",
            ServiceError::InvalidOperation(_) => "invalid_operation",
            ServiceError::Domain(_) => "domain_error",
            ServiceError::ConcurrentModification(_) => "concurrent_modification",
            ServiceError::AlreadyExists(_) => "already_exists",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::Cancelled(_) => "cancelled",
            ServiceError::EventError(_) => "event_error",
            ServiceError::InternalError(_) => "internal_error",
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages = Vec::new();
        collect_validation_messages(&errors, &mut messages);
        messages.sort();
        messages.dedup();
        ServiceError::ValidationError(messages.join("; "))
    }
}

fn collect_validation_messages(errors: &validator::ValidationErrors, out: &mut Vec<String>) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        match kind {
            ValidationErrorsKind::Field(errs) => {
                out.extend(errs.iter().map(|e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("{} is invalid", field),
                }));
            }
            ValidationErrorsKind::Struct(inner) => collect_validation_messages(inner, out),
            ValidationErrorsKind::List(items) => {
                for inner in items.values() {
                    collect_validation_messages(inner, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(range(min = 1, message = "Quantity must be positive"))]
        quantity: i32,
        #[validate(length(max = 3))]
        code: String,
    }

    #[test]
    fn domain_error_joins_messages_for_display() {
        let err = DomainError::from_messages(vec!["first".into(), "second".into()]);
        assert_eq!(err.to_string(), "first; second");
        assert_eq!(err.messages().len(), 2);
    }

    #[test]
    fn empty_message_list_is_never_blank() {
        let err = DomainError::from_messages(vec![]);
        assert_eq!(err.messages().to_vec(), vec!["Operation failed".to_string()]);
    }

    #[test]
    fn only_concurrent_modification_is_retryable() {
        assert!(ServiceError::ConcurrentModification(Uuid::new_v4()).is_retryable());
        assert!(!ServiceError::Conflict("x".into()).is_retryable());
        assert!(!ServiceError::Domain(DomainError::new("x")).is_retryable());
    }

    #[test]
    fn domain_messages_pass_through_unchanged() {
        let err: ServiceError = DomainError::new("Goal not found").into();
        assert_eq!(err.messages(), vec!["Goal not found".to_string()]);
        assert!(err.mentions("goal NOT found"));
    }

    #[test]
    fn validation_errors_keep_custom_messages() {
        let sample = Sample {
            quantity: 0,
            code: "toolong".into(),
        };
        let err: ServiceError = sample.validate().unwrap_err().into();
        assert!(err.mentions("Quantity must be positive"));
        assert!(err.mentions("code is invalid"));
    }
}
