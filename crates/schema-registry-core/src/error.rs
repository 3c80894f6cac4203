//! Canonical error model (component C8).
//!
//! Every variant carries its own `error_code` per the registry's wire
//! taxonomy. The HTTP layer never re-derives a status code from a message;
//! it asks the error for `error_code()` and `http_status()` directly.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Subject not found: {0}")]
    SubjectNotFound(String),

    #[error("Version not found: {0}")]
    VersionNotFound(String),

    #[error("Schema not found: {0}")]
    SchemaNotFound(String),

    #[error("No mode is explicitly configured for subject: {0}")]
    ModeNotConfigured(String),

    #[error("Subject '{0}' is not soft-deleted")]
    SubjectNotSoftDeleted(String),

    #[error("Version {0} is not soft-deleted")]
    VersionNotSoftDeleted(i32),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Schema being registered is incompatible with an earlier schema: {0}")]
    IncompatibleSchema(String),

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    #[error("Invalid compatibility level: {0}")]
    InvalidCompatibilityLevel(String),

    #[error("Invalid mode: {0}")]
    InvalidMode(String),

    #[error("Operation not permitted: {0}")]
    OperationNotPermitted(String),

    #[error("Internal storage error: {0}")]
    Internal(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// The wire `error_code`, per SPEC_FULL.md §4.8.
    pub fn error_code(&self) -> i32 {
        match self {
            Error::SubjectNotFound(_) => 40401,
            Error::VersionNotFound(_) => 40402,
            Error::SchemaNotFound(_) => 40403,
            Error::ModeNotConfigured(_) => 40404,
            Error::SubjectNotSoftDeleted(_) => 40405,
            Error::VersionNotSoftDeleted(_) => 40407,
            Error::MethodNotAllowed => 405,
            Error::IncompatibleSchema(_) => 409,
            Error::InvalidSchema(_) => 42201,
            Error::InvalidVersion(_) => 42202,
            Error::InvalidCompatibilityLevel(_) => 42203,
            Error::InvalidMode(_) => 42204,
            Error::OperationNotPermitted(_) => 42205,
            Error::Internal(_) => 500,
            Error::Serialization(_) => 42201,
        }
    }

    /// HTTP status implied by the error code: first three digits of a
    /// 5-digit code, or the code itself when it is already a bare status.
    pub fn http_status(&self) -> u16 {
        let code = self.error_code();
        if code >= 10000 {
            (code / 100) as u16
        } else {
            code as u16
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::SubjectNotFound(_)
                | Error::VersionNotFound(_)
                | Error::SchemaNotFound(_)
                | Error::ModeNotConfigured(_)
        )
    }

    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidSchema(_)
                | Error::InvalidVersion(_)
                | Error::InvalidCompatibilityLevel(_)
                | Error::InvalidMode(_)
        )
    }

    pub fn is_policy_error(&self) -> bool {
        matches!(
            self,
            Error::IncompatibleSchema(_) | Error::OperationNotPermitted(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let err = Error::SubjectNotFound("foo".into());
        assert_eq!(err.error_code(), 40401);
        assert_eq!(err.http_status(), 404);
        assert!(err.is_not_found());
    }

    #[test]
    fn invalid_schema_maps_to_422() {
        let err = Error::InvalidSchema("bad json".into());
        assert_eq!(err.error_code(), 42201);
        assert_eq!(err.http_status(), 422);
        assert!(err.is_validation_error());
    }

    #[test]
    fn incompatible_schema_is_bare_409() {
        let err = Error::IncompatibleSchema("field removed".into());
        assert_eq!(err.error_code(), 409);
        assert_eq!(err.http_status(), 409);
        assert!(err.is_policy_error());
    }

    #[test]
    fn method_not_allowed_is_bare_405() {
        let err = Error::MethodNotAllowed;
        assert_eq!(err.error_code(), 405);
        assert_eq!(err.http_status(), 405);
    }
}
