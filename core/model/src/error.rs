use common::thiserror;

/// Fatal construction or precondition failures. These are programming errors - a generator that
/// emits an [`Action`](crate::Action) inconsistent with current model state, or malformed input
/// from the caller - not recoverable conditions to retry.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("region {0:?} references unknown primary {1:?}")]
    UnknownPrimary(String, String),

    #[error("server {0:?} appears more than once in the assignment")]
    DuplicateServer(String),

    #[error("region {0:?} appears on more than one server")]
    DuplicateRegion(String),

    #[error("action {0:?} violates model preconditions: region is not on the claimed server")]
    PreconditionViolation(String),
}
