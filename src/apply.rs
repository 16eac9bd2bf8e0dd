use std::io;
use std::process::Command;

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("`{command}` failed with {}", describe_exit(.code))]
    Failed { command: String, code: Option<i32> },
}

impl CommandError {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Spawn { .. } => "SpawnError",
            Self::Failed { .. } => "CommandFailed",
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    code.map_or_else(
        || "no exit code (killed by a signal)".to_string(),
        |code| format!("exit code {code}"),
    )
}

/// The full shell line for a command template and its argument.
pub fn command_line(template: &str, argument: &str) -> String {
    format!("{template} {argument}")
}

/// Wraps `text` in single quotes so the shell passes it as one word.
pub fn shell_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}

/// Runs the configured apply and notifier commands.
pub trait CommandRunner {
    /// Appends `argument` to `template` and runs the result through the shell.
    fn run(&mut self, template: &str, argument: &str) -> Result<(), CommandError>;

    fn notify(&mut self, cmd: &str, message: &str) -> Result<(), CommandError> {
        self.run(cmd, &shell_quote(message))
    }
}

/// Runs commands with `sh -c`, inheriting stdio and waiting for them to exit.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&mut self, template: &str, argument: &str) -> Result<(), CommandError> {
        let command = command_line(template, argument);
        debug!("running `{command}`");

        let status = match Command::new("sh").arg("-c").arg(&command).status() {
            Ok(status) => status,
            Err(source) => return Err(CommandError::Spawn { command, source }),
        };

        if status.success() {
            Ok(())
        } else {
            Err(CommandError::Failed {
                command,
                code: status.code(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_joins_with_one_space() {
        assert_eq!(command_line("swaybg -i", "/walls/a.jpg"), "swaybg -i /walls/a.jpg");
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("Wallpaper changed"), "'Wallpaper changed'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }

    #[test]
    fn test_shell_runner_success() {
        assert!(ShellRunner.run("true", "ignored").is_ok());
    }

    #[test]
    fn test_shell_runner_reports_exit_code() {
        let err = ShellRunner.run("exit", "3").unwrap_err();
        assert!(matches!(
            err,
            CommandError::Failed { code: Some(3), ref command } if command == "exit 3"
        ));
        assert_eq!(err.kind(), "CommandFailed");
        assert!(err.to_string().contains("exit code 3"));
    }

    #[test]
    fn test_spawn_error() {
        let err = CommandError::Spawn {
            command: "swaybg -i /walls/a.jpg".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "no shell"),
        };
        assert_eq!(err.kind(), "SpawnError");
        assert_eq!(
            err.to_string(),
            "failed to run `swaybg -i /walls/a.jpg`: no shell"
        );

        let err = CommandError::Failed {
            command: "swaybg -i /walls/a.jpg".to_string(),
            code: None,
        };
        assert!(err.to_string().ends_with("no exit code (killed by a signal)"));
    }

    #[test]
    fn test_notify_passes_message_as_one_argument() {
        // `test $# -eq 1` only succeeds when the quoted message arrives as a single word.
        assert!(ShellRunner.notify("f() { test $# -eq 1; }; f", "it's a new wallpaper").is_ok());
    }
}
