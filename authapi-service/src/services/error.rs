use service_core::error::AppError;
use thiserror::Error;

/// Failures of the credential flow. Kept apart from `AppError` so logs can
/// tell a wrong password from a deactivated account.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User account is disabled")]
    UserInactive,

    #[error("Email already registered")]
    EmailAlreadyRegistered,

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error(transparent)]
    Store(AppError),
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Conflict(_) => AuthError::EmailAlreadyRegistered,
            other => AuthError::Store(other),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => AppError::Unauthorized(anyhow::anyhow!(
                "Unable to log in with provided credentials."
            )),
            AuthError::UserInactive => {
                AppError::Forbidden(anyhow::anyhow!("User account is disabled."))
            }
            AuthError::EmailAlreadyRegistered => {
                AppError::Conflict(anyhow::anyhow!("Email already registered"))
            }
            AuthError::Internal(e) => AppError::InternalError(e),
            AuthError::Store(e) => e,
        }
    }
}
