use alloc::string::String;
use alloc::sync::Arc;

/// Structured error codes reported by the backend.
///
/// Editors match on the codes they understand and hand the rest back to a generic handler.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorCode {
    NotFound,
    Reject,
    ParamError,
    ParamRequired,
    ResourceNotExist,
    ResourceNotSuitable,
    AlreadyExists,
    CascadeResourceExists,
    RecursiveParent,
    ConflictingGroupMembers,
    Other(String),
}

impl ErrorCode {
    /// Maps the wire representation (`"NOT_FOUND"`, `"ALREADY_EXISTS"`, ...) to a code.
    pub fn parse(code: &str) -> Self {
        match code {
            "NOT_FOUND" => Self::NotFound,
            "REJECT" => Self::Reject,
            "PARAM_ERROR" => Self::ParamError,
            "PARAM_REQUIRED" => Self::ParamRequired,
            "NOT_EXIST" => Self::ResourceNotExist,
            "NOT_SUITABLE" => Self::ResourceNotSuitable,
            "ALREADY_EXISTS" => Self::AlreadyExists,
            "CASCADE_RESOURCE_EXISTS" => Self::CascadeResourceExists,
            "RECURSIVE_PARENT" => Self::RecursiveParent,
            "CONFLICTING_GROUP_MEMBERS" => Self::ConflictingGroupMembers,
            other => Self::Other(other.into()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Reject => "REJECT",
            Self::ParamError => "PARAM_ERROR",
            Self::ParamRequired => "PARAM_REQUIRED",
            Self::ResourceNotExist => "NOT_EXIST",
            Self::ResourceNotSuitable => "NOT_SUITABLE",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::CascadeResourceExists => "CASCADE_RESOURCE_EXISTS",
            Self::RecursiveParent => "RECURSIVE_PARENT",
            Self::ConflictingGroupMembers => "CONFLICTING_GROUP_MEMBERS",
            Self::Other(code) => code,
        }
    }
}

impl core::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A domain error returned by the backend.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[error("{code}: {}", message.as_deref().unwrap_or("no message"))]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: Option<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(message.into()),
        }
    }

    pub fn code(code: ErrorCode) -> Self {
        Self {
            code,
            message: None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.code == ErrorCode::NotFound
    }
}

/// Failure of a request against the backing collection.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// Transport failure: connection refused, timeout, broken body.
    #[error("network error: {0}")]
    Network(String),
    /// The backend answered with a structured error.
    #[error("backend error {0}")]
    Api(#[from] ApiError),
}

impl FetchError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            Self::Network(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.api().is_some_and(ApiError::is_not_found)
    }
}

/// Receives failures that data-access components swallow.
///
/// Endpoints never return expected failures to their callers; they resolve to an empty result
/// and report the cause here (typically a toast or an error banner).
pub type ErrorHandler = Arc<dyn Fn(&FetchError) + Send + Sync>;
