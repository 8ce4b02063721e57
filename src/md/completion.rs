//! Metrics Discovery completion codes

use std::fmt;

/// Status returned by every Metrics Discovery call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompletionCode {
    /// Success
    Ok,
    /// Data is not available yet
    ReadPending,
    /// The object was already initialized
    AlreadyInitialized,
    /// The object is still initialized
    StillInitialized,
    /// The concurrent group is locked by another client
    ConcurrentGroupLocked,
    /// Waiting for reports timed out
    WaitTimeout,
    /// The call should be retried
    TryAgain,
    /// The call was interrupted
    Interrupted,
    /// Invalid parameter
    ErrorInvalidParameter,
    /// Out of memory
    ErrorNoMemory,
    /// Unspecified failure
    ErrorGeneral,
    /// A required file was not found
    ErrorFileNotFound,
    /// Not supported on this platform or driver
    ErrorNotSupported,
    /// Access denied
    ErrorAccessDenied,
    /// A value this crate does not know about
    Unknown(i32),
}

impl CompletionCode {
    /// Convert a raw `TCompletionCode` value
    pub fn from_raw(value: i32) -> Self {
        match value {
            0 => CompletionCode::Ok,
            1 => CompletionCode::ReadPending,
            2 => CompletionCode::AlreadyInitialized,
            3 => CompletionCode::StillInitialized,
            4 => CompletionCode::ConcurrentGroupLocked,
            5 => CompletionCode::WaitTimeout,
            6 => CompletionCode::TryAgain,
            7 => CompletionCode::Interrupted,
            40 => CompletionCode::ErrorInvalidParameter,
            41 => CompletionCode::ErrorNoMemory,
            42 => CompletionCode::ErrorGeneral,
            43 => CompletionCode::ErrorFileNotFound,
            44 => CompletionCode::ErrorNotSupported,
            45 => CompletionCode::ErrorAccessDenied,
            other => CompletionCode::Unknown(other),
        }
    }

    /// Returns true for `CC_OK`
    pub fn is_ok(&self) -> bool {
        *self == CompletionCode::Ok
    }

    /// Activation treats an already active set as success
    pub fn is_ok_or_already_initialized(&self) -> bool {
        matches!(
            self,
            CompletionCode::Ok | CompletionCode::AlreadyInitialized
        )
    }

    /// Symbolic name as used by the vendor headers, without the `CC_` prefix
    pub fn name(&self) -> &'static str {
        match self {
            CompletionCode::Ok => "OK",
            CompletionCode::ReadPending => "READ_PENDING",
            CompletionCode::AlreadyInitialized => "ALREADY_INITIALIZED",
            CompletionCode::StillInitialized => "STILL_INITIALIZED",
            CompletionCode::ConcurrentGroupLocked => "CONCURRENT_GROUP_LOCKED",
            CompletionCode::WaitTimeout => "WAIT_TIMEOUT",
            CompletionCode::TryAgain => "TRY_AGAIN",
            CompletionCode::Interrupted => "INTERRUPTED",
            CompletionCode::ErrorInvalidParameter => "ERROR_INVALID_PARAMETER",
            CompletionCode::ErrorNoMemory => "ERROR_NO_MEMORY",
            CompletionCode::ErrorGeneral => "ERROR_GENERAL",
            CompletionCode::ErrorFileNotFound => "ERROR_FILE_NOT_FOUND",
            CompletionCode::ErrorNotSupported => "ERROR_NOT_SUPPORTED",
            CompletionCode::ErrorAccessDenied => "ERROR_ACCESS_DENIED",
            CompletionCode::Unknown(_) => "UNKNOWN_ERROR",
        }
    }

    /// Turn the code into a `Result`, keeping failures as the error value
    pub fn into_result(self) -> std::result::Result<(), CompletionCode> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for CompletionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
