//! Application error types using thiserror
//!
//! Error hierarchy:
//! - InputError: user or configuration mistakes, reported before any work
//! - ResultError: the run completed but its outcome must be signalled
//! - RegistryError: issues with registry or API communication
//! - NdjsonError: malformed or unreadable NDJSON collections
//! - IoError: file system operation failures

use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

/// Exit code for a result error (outdated data, no new data)
pub const EXIT_CODE_RESULT_ERROR: u8 = 1;

/// Exit code for invalid input
pub const EXIT_CODE_INVALID_INPUT: u8 = 2;

/// Exit code for anything unexpected
pub const EXIT_CODE_UNEXPECTED_ERROR: u8 = 4;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid input or configuration
    #[error(transparent)]
    Input(#[from] InputError),

    /// Result conditions signalled after an otherwise successful run
    #[error(transparent)]
    Result(#[from] ResultError),

    /// Registry communication errors
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// NDJSON parse or read errors
    #[error(transparent)]
    Ndjson(#[from] NdjsonError),

    /// IO related errors
    #[error(transparent)]
    Io(#[from] IoError),
}

impl AppError {
    /// Returns the numeric exit status for this error
    pub fn exit_status(&self) -> u8 {
        match self {
            AppError::Input(_) => EXIT_CODE_INVALID_INPUT,
            AppError::Result(_) => EXIT_CODE_RESULT_ERROR,
            _ => EXIT_CODE_UNEXPECTED_ERROR,
        }
    }

    /// Returns the process exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_status())
    }
}

/// Errors caused by invalid user input
#[derive(Error, Debug)]
pub enum InputError {
    /// A module name is required but empty
    #[error("expected a non-empty module name")]
    EmptyModuleName,

    /// Conflicting options
    #[error("conflicting options: {message}")]
    ConflictingOptions { message: String },

    /// No input source could be determined
    #[error("no input given: {message}")]
    MissingInput { message: String },

    /// An explicitly requested file does not exist
    #[error("no such file: {path}")]
    NoSuchFile { path: PathBuf },
}

/// Conditions signalled once the pipeline has otherwise completed
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultError {
    /// Discovery produced zero records
    #[error("found no new data")]
    NoNewData,

    /// Check mode found the collection to be out of date
    #[error("outdated data")]
    Outdated,
}

/// Errors related to registry and API communication
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Resource not found (HTTP 404)
    #[error("'{url}' not found")]
    NotFound { url: String },

    /// Network request failed
    #[error("failed to fetch '{url}': {message}")]
    NetworkError { url: String, message: String },

    /// Rate limit exceeded
    #[error("rate limit exceeded while fetching '{url}'")]
    RateLimitExceeded { url: String },

    /// Invalid response body
    #[error("invalid response from '{url}': {message}")]
    InvalidResponse { url: String, message: String },

    /// Timeout
    #[error("timeout while fetching '{url}'")]
    Timeout { url: String },

    /// A request URL could not be built
    #[error("invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },
}

/// Errors related to NDJSON collections
#[derive(Error, Debug)]
pub enum NdjsonError {
    /// A line could not be parsed as JSON
    #[error("failed to parse NDJSON line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// A record could not be serialized
    #[error("failed to serialize record '{name}': {source}")]
    Serialize {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// Reading or writing the underlying stream failed
    #[error("NDJSON stream error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to IO operations
#[derive(Error, Debug)]
pub enum IoError {
    /// Failed to read a file
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl InputError {
    /// Creates a new ConflictingOptions error
    pub fn conflicting(message: impl Into<String>) -> Self {
        InputError::ConflictingOptions {
            message: message.into(),
        }
    }

    /// Creates a new MissingInput error
    pub fn missing_input(message: impl Into<String>) -> Self {
        InputError::MissingInput {
            message: message.into(),
        }
    }
}

impl RegistryError {
    /// Creates a new NotFound error
    pub fn not_found(url: impl Into<String>) -> Self {
        RegistryError::NotFound { url: url.into() }
    }

    /// Creates a new NetworkError
    pub fn network_error(url: impl Into<String>, message: impl Into<String>) -> Self {
        RegistryError::NetworkError {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a new InvalidResponse error
    pub fn invalid_response(url: impl Into<String>, message: impl Into<String>) -> Self {
        RegistryError::InvalidResponse {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a new RateLimitExceeded error
    pub fn rate_limit_exceeded(url: impl Into<String>) -> Self {
        RegistryError::RateLimitExceeded { url: url.into() }
    }

    /// Creates a new Timeout error
    pub fn timeout(url: impl Into<String>) -> Self {
        RegistryError::Timeout { url: url.into() }
    }

    /// True when the response was readable but not usable as data.
    ///
    /// Paginated fetching treats these as "no more data" rather than failing.
    pub fn is_unusable_response(&self) -> bool {
        matches!(
            self,
            RegistryError::NotFound { .. } | RegistryError::InvalidResponse { .. }
        )
    }
}

impl IoError {
    /// Creates a new Read error
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IoError::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates a new Write error
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IoError::Write {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_conflicting() {
        let err = InputError::conflicting("--named is superfluous when --output has been set");
        let msg = format!("{}", err);
        assert!(msg.contains("conflicting options"));
        assert!(msg.contains("--named"));
    }

    #[test]
    fn test_input_error_no_such_file() {
        let err = InputError::NoSuchFile {
            path: PathBuf::from("/missing/list.ndjson"),
        };
        assert!(err.to_string().contains("no such file"));
        assert!(err.to_string().contains("list.ndjson"));
    }

    #[test]
    fn test_result_error_messages() {
        assert_eq!(ResultError::NoNewData.to_string(), "found no new data");
        assert_eq!(ResultError::Outdated.to_string(), "outdated data");
    }

    #[test]
    fn test_registry_error_not_found() {
        let err = RegistryError::not_found("https://registry.npmjs.org/nope/latest");
        let msg = format!("{}", err);
        assert!(msg.contains("not found"));
        assert!(msg.contains("nope"));
    }

    #[test]
    fn test_registry_error_network() {
        let err = RegistryError::network_error("https://example.com", "connection refused");
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_registry_error_unusable_response() {
        assert!(RegistryError::not_found("u").is_unusable_response());
        assert!(RegistryError::invalid_response("u", "not json").is_unusable_response());
        assert!(!RegistryError::timeout("u").is_unusable_response());
        assert!(!RegistryError::rate_limit_exceeded("u").is_unusable_response());
        assert!(!RegistryError::network_error("u", "reset").is_unusable_response());
    }

    #[test]
    fn test_ndjson_parse_error_mentions_line() {
        let source = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err = NdjsonError::Parse { line: 7, source };
        assert!(err.to_string().contains("line 7"));
    }

    #[test]
    fn test_exit_codes() {
        let input: AppError = InputError::EmptyModuleName.into();
        assert_eq!(input.exit_status(), EXIT_CODE_INVALID_INPUT);

        let result: AppError = ResultError::Outdated.into();
        assert_eq!(result.exit_status(), EXIT_CODE_RESULT_ERROR);

        let registry: AppError = RegistryError::timeout("u").into();
        assert_eq!(registry.exit_status(), EXIT_CODE_UNEXPECTED_ERROR);
    }

    #[test]
    fn test_app_error_from_io_error() {
        let io_err = IoError::write(
            "/readonly/out.ndjson",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let app_err: AppError = io_err.into();
        assert!(app_err.to_string().contains("failed to write"));
    }
}
