//! CLI error types and exit codes

use certmeta_client::{ClientError, SyncError};
use thiserror::Error;

/// Exit codes for the CLI
/// - 0: Success, including runs with skipped or partial certificates
/// - 1: Any other fatal error
/// - 2: Configuration error, including an unreadable banned-character registry
/// - 3: Banned characters need a replacement in the registry
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

impl CliError {
    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_)
            | CliError::Client(ClientError::InvalidConfig(_))
            | CliError::Sync(SyncError::Config(_) | SyncError::Core(_)) => 2,
            CliError::Sync(SyncError::BannedCharactersUnresolved { .. }) => 3,
            CliError::Client(_) | CliError::Sync(_) => 1,
        }
    }

    /// Print the error to stderr.
    pub fn print(&self, registry_path: Option<&std::path::Path>) {
        eprintln!("Error: {self}");
        if let (CliError::Sync(SyncError::BannedCharactersUnresolved { .. }), Some(path)) = (self, registry_path) {
            eprintln!(
                "\nEdit {} and replace every \"null\" replacement, then run again.",
                path.display()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certmeta_core::CoreError;
    use std::path::PathBuf;

    #[test]
    fn test_exit_code_config() {
        assert_eq!(CliError::Config("missing api key".to_string()).exit_code(), 2);
        assert_eq!(CliError::Sync(SyncError::Config("page_size".to_string())).exit_code(), 2);
        assert_eq!(
            CliError::Client(ClientError::InvalidConfig("bad url".to_string())).exit_code(),
            2
        );
    }

    #[test]
    fn test_exit_code_registry_errors_are_config() {
        let err = CliError::Sync(SyncError::Core(CoreError::RegistryIo {
            path: PathBuf::from("/etc/certmeta/banned.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        }));
        assert_eq!(err.exit_code(), 2);
        let err = CliError::Sync(SyncError::Core(CoreError::InvalidField {
            field: "date_format".to_string(),
            message: "not a valid date format".to_string(),
        }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_exit_code_banned_characters() {
        let err = CliError::Sync(SyncError::BannedCharactersUnresolved {
            characters: vec!["' '".to_string()],
        });
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_exit_code_other_failures() {
        let err = CliError::Client(ClientError::AuthError("denied".to_string()));
        assert_eq!(err.exit_code(), 1);
        let err = CliError::Sync(SyncError::Client(ClientError::Api {
            status: 500,
            detail: "boom".to_string(),
        }));
        assert_eq!(err.exit_code(), 1);
    }
}
