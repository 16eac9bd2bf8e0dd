//! Top-level error returned by a CLI run.

use thiserror::Error;

use crate::apply::CommandError;
use crate::config::ConfigError;
use crate::selector::SelectError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Select(#[from] SelectError),
    #[error(transparent)]
    Command(#[from] CommandError),
    /// A declared flag with no behavior behind it yet.
    #[error("{0} is not yet supported")]
    Unsupported(&'static str),
}

impl AppError {
    /// Short name of the error kind, printed after the message.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Config(err) => err.kind(),
            Self::Select(err) => err.kind(),
            Self::Command(err) => err.kind(),
            Self::Unsupported(_) => "Unsupported",
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_transparent_display() {
        let err: AppError = SelectError::EmptyList.into();
        assert_eq!(err.to_string(), "the wallpaper list is empty");
        assert_eq!(err.kind(), "EmptyList");
    }

    #[test]
    fn test_config_kinds() {
        let err: AppError = ConfigError::Missing(PathBuf::from("bdy.config")).into();
        assert_eq!(err.kind(), "ConfigMissing");
        assert!(err.to_string().contains("bdy.config"));

        let err: AppError = ConfigError::InvalidAnswer("maybe".to_string()).into();
        assert_eq!(err.kind(), "ConfigInvalidAnswer");
    }

    #[test]
    fn test_unsupported_display() {
        let err = AppError::Unsupported("--add");
        assert_eq!(err.to_string(), "--add is not yet supported");
        assert_eq!(err.kind(), "Unsupported");
    }

    #[test]
    fn test_command_kind() {
        let err: AppError = CommandError::Failed {
            command: "swaybg -i /walls/a.jpg".to_string(),
            code: Some(1),
        }
        .into();
        assert_eq!(err.kind(), "CommandFailed");
    }
}
