//! Vision sources: where the read-back text comes from.
//!
//! The OCR pipeline itself (capture card, camera, recogniser) lives outside
//! this crate.  [`CommandVision`] runs an external command that prints the
//! currently recognised screen text to stdout; anything that can do that
//! plugs in without code changes.

pub mod mock;

use std::process::Command;

use tracing::debug;

use crate::application::read_back::{VisionError, VisionSource};

/// Runs `program args...` for every read-back and returns its stdout.
#[derive(Debug, Clone)]
pub struct CommandVision {
    program: String,
    args: Vec<String>,
}

impl CommandVision {
    /// Builds a source from an argv vector.  Returns `None` for an empty one.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    /// Argv that runs `command_line` through `sh -c`.
    pub fn shell_argv(command_line: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), command_line.to_string()]
    }

    /// Runs `command_line` through `sh -c`.
    pub fn shell(command_line: &str) -> Self {
        let mut args = Self::shell_argv(command_line);
        let program = args.remove(0);
        Self { program, args }
    }

    fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl VisionSource for CommandVision {
    fn capture_text(&self) -> Result<String, VisionError> {
        debug!(command = %self.display(), "running vision command");
        let output = Command::new(&self.program).args(&self.args).output()?;
        if !output.status.success() {
            return Err(VisionError::Command {
                command: self.display(),
                reason: format!(
                    "{}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Stand-in when no vision pipeline is configured; every read fails.
///
/// Unverified typing and shortcuts still work; verified typing reports
/// failure after its retries.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableVision;

impl VisionSource for UnavailableVision {
    fn capture_text(&self) -> Result<String, VisionError> {
        Err(VisionError::Unavailable(
            "no vision command configured".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_argv_rejects_empty() {
        assert!(CommandVision::from_argv(&[]).is_none());
    }

    #[test]
    fn test_shell_matches_argv_built_from_shell_argv() {
        // Arrange
        let argv = CommandVision::shell_argv("ocr --once | tail -n 5");

        // Act
        let from_argv = CommandVision::from_argv(&argv).unwrap();
        let shell = CommandVision::shell("ocr --once | tail -n 5");

        // Assert
        assert_eq!(argv, ["sh", "-c", "ocr --once | tail -n 5"]);
        assert_eq!(from_argv.display(), shell.display());
        assert_eq!(shell.program, "sh");
        assert_eq!(shell.args, ["-c", "ocr --once | tail -n 5"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_command_stdout_is_read_back() {
        let vision = CommandVision::shell("printf 'user@host:~$ ls'");
        assert_eq!(vision.capture_text().unwrap(), "user@host:~$ ls");
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_command_is_an_error() {
        let vision = CommandVision::shell("echo boom >&2; exit 3");
        let err = vision.capture_text().unwrap_err();
        assert!(matches!(err, VisionError::Command { .. }));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_missing_program_is_io_error() {
        let argv = vec!["definitely-not-an-ocr-binary-4711".to_string()];
        let vision = CommandVision::from_argv(&argv).unwrap();
        assert!(matches!(vision.capture_text(), Err(VisionError::Io(_))));
    }

    #[test]
    fn test_unavailable_vision_always_fails() {
        assert!(matches!(
            UnavailableVision.capture_text(),
            Err(VisionError::Unavailable(_))
        ));
    }
}
