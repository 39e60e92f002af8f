//! CLI error surface. Every variant renders as one human-readable line.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use taskdesk_core::db::DbError;
use taskdesk_core::{
    ConfigError, IdentityError, RepoError, TaskServiceError, TranscriptionError,
};

#[derive(Debug)]
pub enum CliError {
    Config(ConfigError),
    Logging(String),
    Db(DbError),
    Repo(RepoError),
    Task(TaskServiceError),
    Identity(IdentityError),
    Transcription(TranscriptionError),
    /// Task commands need `--session` or `TASKDESK_SESSION`.
    MissingSession,
    ReadAudio { path: PathBuf, source: std::io::Error },
    Json(serde_json::Error),
}

impl CliError {
    /// Process exit status: 2 when the input was rejected, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        let rejected_input = match self {
            Self::Task(TaskServiceError::Validation(_)) => true,
            Self::Identity(err) => err.is_validation(),
            Self::Repo(RepoError::Validation(_)) => true,
            _ => false,
        };
        if rejected_input {
            2
        } else {
            1
        }
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "invalid configuration: {err}"),
            Self::Logging(message) => write!(f, "logging init failed: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Task(err) => write!(f, "{err}"),
            Self::Identity(err) => write!(f, "{err}"),
            Self::Transcription(err) => write!(f, "{err}"),
            Self::MissingSession => {
                write!(f, "not logged in; pass --session or set TASKDESK_SESSION")
            }
            Self::ReadAudio { path, source } => {
                write!(f, "cannot read audio file `{}`: {source}", path.display())
            }
            Self::Json(err) => write!(f, "failed to encode output: {err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Task(err) => Some(err),
            Self::Identity(err) => Some(err),
            Self::Transcription(err) => Some(err),
            Self::ReadAudio { source, .. } => Some(source),
            Self::Json(err) => Some(err),
            Self::Logging(_) | Self::MissingSession => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for CliError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<TaskServiceError> for CliError {
    fn from(value: TaskServiceError) -> Self {
        Self::Task(value)
    }
}

impl From<IdentityError> for CliError {
    fn from(value: IdentityError) -> Self {
        Self::Identity(value)
    }
}

impl From<TranscriptionError> for CliError {
    fn from(value: TranscriptionError) -> Self {
        Self::Transcription(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[cfg(test)]
mod tests {
    use super::CliError;
    use taskdesk_core::{IdentityError, TaskServiceError, TaskValidationError};

    #[test]
    fn rejected_input_exits_with_two() {
        let empty_title = CliError::from(TaskServiceError::Validation(
            TaskValidationError::EmptyTitle,
        ));
        assert_eq!(empty_title.exit_code(), 2);
        assert_eq!(
            CliError::from(IdentityError::PasswordMismatch).exit_code(),
            2
        );
    }

    #[test]
    fn other_failures_exit_with_one() {
        assert_eq!(
            CliError::from(IdentityError::InvalidCredentials).exit_code(),
            1
        );
        assert_eq!(CliError::MissingSession.exit_code(), 1);
        assert_eq!(
            CliError::from(TaskServiceError::NotFound(taskdesk_core::TaskId::nil())).exit_code(),
            1
        );
    }
}
