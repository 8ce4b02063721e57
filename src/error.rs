//! Error types for intel-gpu-usage

use std::path::PathBuf;
use thiserror::Error;

use crate::md::CompletionCode;

/// Result type alias for intel-gpu-usage operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading the Metrics Discovery library or sampling
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// None of the candidate paths could be opened as the vendor library
    #[error("Failed to load the Metrics Discovery library (tried: {})", display_paths(.tried))]
    LibraryNotFound {
        /// Every path that was tried, in order
        tried: Vec<PathBuf>,
    },

    /// The library was opened but an entry point could not be resolved
    #[error("Failed to find {symbol} function: {source}")]
    EntryPointMissing {
        /// The symbol that was looked up
        symbol: &'static str,
        /// The underlying loader error
        source: libloading::Error,
    },

    /// A vendor API call reported something other than success
    #[error("Failed to {operation}: {code}")]
    VendorCall {
        /// Short description of the call that failed
        operation: &'static str,
        /// The completion code returned by the vendor library
        code: CompletionCode,
    },

    /// A vendor accessor returned no parameter block
    #[error("Failed to get {what} parameters")]
    MissingParams {
        /// Which descriptor had no parameters
        what: &'static str,
    },

    /// No adapter with the Intel vendor id was exposed by the adapter group
    #[error("No Intel GPU found")]
    NoIntelAdapter,

    /// No metric set on the device carries engine utilization metrics
    #[error("No GPU utilization metric set found")]
    NoUtilizationMetricSet,

    /// Sampling was requested before a metric set was selected
    #[error("No metric set selected")]
    NoMetricSetSelected,

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error
        message: String,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// Returns true if the vendor library or its entry point could not be loaded
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Error::LibraryNotFound { .. } | Error::EntryPointMissing { .. }
        )
    }

    /// Returns true if the hardware or driver simply does not expose what we need
    pub fn is_discovery_error(&self) -> bool {
        matches!(self, Error::NoIntelAdapter | Error::NoUtilizationMetricSet)
    }

    /// Returns true if the vendor library refused access
    pub fn is_permission_error(&self) -> bool {
        matches!(
            self,
            Error::VendorCall {
                code: CompletionCode::ErrorAccessDenied,
                ..
            }
        )
    }

    pub(crate) fn vendor(operation: &'static str, code: CompletionCode) -> Self {
        Error::VendorCall { operation, code }
    }

    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Error::InvalidConfig {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_not_found_lists_paths() {
        let err = Error::LibraryNotFound {
            tried: vec!["/a/libigdmd.so".into(), "libigdmd.so".into()],
        };
        assert_eq!(
            err.to_string(),
            "Failed to load the Metrics Discovery library (tried: /a/libigdmd.so, libigdmd.so)"
        );
        assert!(err.is_load_error());
        assert!(!err.is_discovery_error());
    }

    #[test]
    fn test_vendor_call_message() {
        let err = Error::vendor("open adapter group", CompletionCode::ErrorGeneral);
        assert_eq!(err.to_string(), "Failed to open adapter group: ERROR_GENERAL");
        assert!(!err.is_permission_error());

        let denied = Error::vendor("open metrics device", CompletionCode::ErrorAccessDenied);
        assert!(denied.is_permission_error());
    }

    #[test]
    fn test_discovery_errors() {
        assert!(Error::NoIntelAdapter.is_discovery_error());
        assert!(Error::NoUtilizationMetricSet.is_discovery_error());
        assert!(!Error::NoMetricSetSelected.is_discovery_error());
    }
}
