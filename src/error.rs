use serde::Serialize;
use thiserror::Error;

/// Stable machine-readable error codes surfaced in the JSON error envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    IndexNotFound,
    InvalidIndex,
    InvalidQuery,
    DataDirNotFound,
    InvalidPaperId,
    PaperNotFound,
    InputNotFound,
    InvalidJson,
    InvalidPackage,
    InvalidZip,
    InvalidArgument,
    InvalidContent,
    NoSummary,
    IoError,
    FetchFailed,
    UpdateFailed,
    UnknownError,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IndexNotFound => "INDEX_NOT_FOUND",
            Self::InvalidIndex => "INVALID_INDEX",
            Self::InvalidQuery => "INVALID_QUERY",
            Self::DataDirNotFound => "DATA_DIR_NOT_FOUND",
            Self::InvalidPaperId => "INVALID_PAPER_ID",
            Self::PaperNotFound => "PAPER_NOT_FOUND",
            Self::InputNotFound => "INPUT_NOT_FOUND",
            Self::InvalidJson => "INVALID_JSON",
            Self::InvalidPackage => "INVALID_PACKAGE",
            Self::InvalidZip => "INVALID_ZIP",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::InvalidContent => "INVALID_CONTENT",
            Self::NoSummary => "NO_SUMMARY",
            Self::IoError => "IO_ERROR",
            Self::FetchFailed => "FETCH_FAILED",
            Self::UpdateFailed => "UPDATE_FAILED",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }
}

/// A command failure carrying everything the stderr envelope needs.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CliError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl CliError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        code: ErrorCode,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            details: Some(details.into()),
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope<'_> {
        ErrorEnvelope {
            success: false,
            error: ErrorBody {
                code: self.code.as_str(),
                message: &self.message,
                details: self.details.as_deref(),
            },
        }
    }
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        Self::with_details(ErrorCode::IoError, err.to_string(), format!("{err:#}"))
    }
}

impl From<crate::deck::index::IndexLoadError> for CliError {
    fn from(err: crate::deck::index::IndexLoadError) -> Self {
        use crate::deck::index::IndexLoadError;
        match &err {
            IndexLoadError::NotFound(_) => Self::with_details(
                ErrorCode::IndexNotFound,
                "No papers collected yet",
                err.to_string(),
            ),
            IndexLoadError::Corrupt { .. } => Self::with_details(
                ErrorCode::InvalidIndex,
                "Paper index is corrupted",
                err.to_string(),
            ),
            IndexLoadError::Io { .. } => {
                Self::with_details(ErrorCode::IoError, "Failed to read paper index", err.to_string())
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope<'a> {
    pub success: bool,
    pub error: ErrorBody<'a>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub code: &'a str,
    pub message: &'a str,
    pub details: Option<&'a str>,
}
