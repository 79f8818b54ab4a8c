//! Error type shared by every notification service operation.
//!
//! Each variant maps to a stable, non-zero numeric code. Callers that follow
//! the `(err, data)` convention use [`result_code`] to collapse a `Result`
//! into `0` for success or the failure code otherwise.

use thiserror::Error;

/// Errors reported by the notification service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotificationError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("caller '{0}' is not a system application")]
    NotSystemApp(String),

    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    #[error("capability not supported: {0}")]
    Unsupported(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("notification service is not running")]
    ServiceUnavailable,

    #[error("notifications are disabled for bundle '{0}'")]
    NotificationDisabled(String),

    #[error("slot {0} does not exist")]
    SlotNotFound(String),

    #[error("notification does not exist: {0}")]
    NotificationNotFound(String),

    #[error("bundle '{bundle}' already holds {limit} active notifications")]
    ActiveLimitExceeded { bundle: String, limit: usize },

    #[error("notification {0} is unremovable")]
    Unremovable(String),

    #[error("bundle does not exist: {0}")]
    BundleNotFound(String),
}

impl NotificationError {
    /// The numeric code reported to callers. Never zero.
    pub fn code(&self) -> i32 {
        match self {
            Self::PermissionDenied(_) => 201,
            Self::NotSystemApp(_) => 202,
            Self::InvalidParam(_) => 401,
            Self::Unsupported(_) => 801,
            Self::Internal(_) => 1_600_001,
            Self::ServiceUnavailable => 1_600_003,
            Self::NotificationDisabled(_) => 1_600_004,
            Self::SlotNotFound(_) => 1_600_005,
            Self::NotificationNotFound(_) => 1_600_007,
            Self::ActiveLimitExceeded { .. } => 1_600_009,
            Self::Unremovable(_) => 1_600_010,
            Self::BundleNotFound(_) => 17_700_001,
        }
    }
}

pub type Result<T, E = NotificationError> = std::result::Result<T, E>;

/// Collapses an operation result into the `err.code` convention: `0` on
/// success, the error's code otherwise.
pub fn result_code<T>(result: &Result<T>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(e) => e.code(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_code_is_zero_only_on_success() {
        let ok: Result<()> = Ok(());
        assert_eq!(result_code(&ok), 0);

        let err: Result<()> = Err(NotificationError::NotificationNotFound("abc".into()));
        assert_eq!(result_code(&err), 1_600_007);
    }

    #[test]
    fn test_every_code_is_non_zero() {
        let errors = vec![
            NotificationError::PermissionDenied("x".into()),
            NotificationError::NotSystemApp("x".into()),
            NotificationError::InvalidParam("x".into()),
            NotificationError::Unsupported("x".into()),
            NotificationError::Internal("x".into()),
            NotificationError::ServiceUnavailable,
            NotificationError::NotificationDisabled("x".into()),
            NotificationError::SlotNotFound("x".into()),
            NotificationError::NotificationNotFound("x".into()),
            NotificationError::ActiveLimitExceeded {
                bundle: "x".into(),
                limit: 1,
            },
            NotificationError::Unremovable("x".into()),
            NotificationError::BundleNotFound("x".into()),
        ];
        assert!(errors.iter().all(|e| e.code() != 0));
    }
}
