//! # Errors
//!
//! Structured failures for every resource operation in cdn-rs.
//!
//! Every component returns a typed [`CdnError`] up to the boundary:
//! - consistent status codes + class names
//! - the underlying store error is carried as `source`, its message kept verbatim
//! - transport-agnostic: [`Failure`] is the uniform `{success, code, message}` payload
//!
//! Nothing here retries and nothing is swallowed. The only defined no-ops
//! (removing a non-member id, saving a clean folder) never produce an error.

use std::fmt;

use anyhow::Error as AnyError;
use serde::{Deserialize, Serialize};

/// A convenience result type for cdn-rs APIs.
pub type CdnResult<T> = std::result::Result<T, CdnError>;

/// Error kinds with their HTTP-style status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,       // 400
    NotAuthenticated, // 401
    Forbidden,        // 403
    NotFound,         // 404
    Conflict,         // 409
    Store,            // 500
    PartialFailure,   // 500
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::NotAuthenticated => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Store => 500,
            ErrorKind::PartialFailure => 500,
        }
    }

    /// Error `name` (e.g. "NotFound")
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "ValidationError",
            ErrorKind::NotAuthenticated => "NotAuthenticated",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::Store => "StoreError",
            ErrorKind::PartialFailure => "PartialFailure",
        }
    }

    /// Kebab-cased class name
    pub fn class_name(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation-error",
            ErrorKind::NotAuthenticated => "not-authenticated",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not-found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Store => "store-error",
            ErrorKind::PartialFailure => "partial-failure",
        }
    }
}

/// A structured cdn-rs error.
///
/// `PartialFailure` marks a two-step cross-store operation where the first
/// step committed and the second did not. Callers see it as a store error
/// (same code, same payload); the distinct kind exists so logs and tests can
/// tell the inconsistent outcome apart.
#[derive(Debug)]
pub struct CdnError {
    pub kind: ErrorKind,
    pub message: String,
    pub source: Option<AnyError>,
}

impl CdnError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: AnyError) -> Self {
        self.source = Some(source);
        self
    }

    pub fn code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn class_name(&self) -> &'static str {
        self.kind.class_name()
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    pub fn is_partial_failure(&self) -> bool {
        self.kind == ErrorKind::PartialFailure
    }

    /// Wrap any store-side error, keeping its message verbatim.
    pub fn store<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::new(ErrorKind::Store, error.to_string()).with_source(AnyError::new(error))
    }

    /// Promote an error from the second step of a two-step operation.
    pub fn partial(step: &str, cause: CdnError) -> Self {
        let message = format!("{}: {}", step, cause.message);
        let mut err = Self::new(ErrorKind::PartialFailure, message);
        err.source = Some(AnyError::new(cause));
        err
    }

    // ---- Constructors ----

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, msg)
    }
    pub fn not_authenticated(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotAuthenticated, msg)
    }
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, msg)
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, msg)
    }
    pub fn store_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Store, msg)
    }
}

impl fmt::Display for CdnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.code(), self.message)
    }
}

impl std::error::Error for CdnError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Uniform failure payload handed to the routing layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub success: bool,
    pub code: u16,
    pub message: String,
}

impl Failure {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "success": self.success,
            "code": self.code,
            "message": self.message,
        })
    }
}

impl From<&CdnError> for Failure {
    fn from(err: &CdnError) -> Self {
        Self {
            success: false,
            code: err.code(),
            message: err.message.clone(),
        }
    }
}

impl From<CdnError> for Failure {
    fn from(err: CdnError) -> Self {
        Failure::from(&err)
    }
}

/// Convenience helper for "bail with CdnError".
#[macro_export]
macro_rules! bail_cdn {
    ($ctor:ident, $msg:expr) => {
        return Err($crate::errors::CdnError::$ctor($msg));
    };
    ($ctor:ident, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::errors::CdnError::$ctor(format!($fmt, $($arg)*)));
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_kind() {
        assert_eq!(CdnError::validation("x").code(), 400);
        assert_eq!(CdnError::not_authenticated("x").code(), 401);
        assert_eq!(CdnError::forbidden("x").code(), 403);
        assert_eq!(CdnError::not_found("x").code(), 404);
        assert_eq!(CdnError::store_error("x").code(), 500);
    }

    #[test]
    fn partial_failure_serializes_as_store_failure() {
        let cause = CdnError::store_error("document write refused");
        let err = CdnError::partial("blob stored, record not created", cause);

        assert!(err.is_partial_failure());
        let failure = Failure::from(&err);
        assert!(!failure.success);
        assert_eq!(failure.code, 500);
        assert!(failure.message.contains("document write refused"));
    }

    #[test]
    fn failure_json_shape() {
        let failure = Failure::from(CdnError::not_found("File not found"));
        let json = failure.to_json();
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], 404);
        assert_eq!(json["message"], "File not found");
    }

    #[test]
    fn bail_macro_returns_typed_error() {
        fn check(name: &str) -> CdnResult<()> {
            if name.is_empty() {
                bail_cdn!(validation, "Folder name required.");
            }
            Ok(())
        }

        let err = check("").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(check("photos").is_ok());
    }
}
