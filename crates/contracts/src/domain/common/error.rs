use thiserror::Error;

/// Ошибки оркестратора жизненного цикла лицевого счёта
///
/// Все операции ядра возвращают этот тип напрямую вызывающей стороне,
/// HTTP-слой только отображает его в статус-коды.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// Malformed input fields (consumer number format, missing amount, etc.)
    #[error("validation failed: {0}")]
    Validation(String),

    /// The requested transition is not legal from the current status
    #[error("action '{action}' is not legal from status '{from}'")]
    IllegalTransition { action: String, from: String },

    /// The action is outside the permitted set for this role
    #[error("action '{action}' is not available for role '{role}'")]
    ActionNotAvailable { action: String, role: String },

    /// mark_paid invoked without a prior enable_payment
    #[error("payment must be enabled before the consumer can be marked as paid")]
    MissingPayment,

    /// Version check failed on write: another writer got there first
    #[error("consumer was modified concurrently, reload and retry")]
    ConcurrentModification,

    #[error("not found: {0}")]
    NotFound(String),

    /// Collaborator failure (storage outage, broken connection)
    #[error("store unavailable: {0}")]
    Store(String),
}

impl WorkflowError {
    pub fn validation(message: impl Into<String>) -> Self {
        WorkflowError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        WorkflowError::NotFound(message.into())
    }
}

impl From<anyhow::Error> for WorkflowError {
    fn from(err: anyhow::Error) -> Self {
        WorkflowError::Store(err.to_string())
    }
}
