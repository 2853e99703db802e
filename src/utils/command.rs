/// Command execution utilities shared by the kubectl client
use anyhow::Result;
use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::k8s::KubectlError;

/// Result from command execution with captured output
#[derive(Debug)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, `None` when the process was killed by a signal
    pub code: Option<i32>,
}

impl CommandOutput {
    fn from_output(output: std::process::Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            code: output.status.code(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Stdout followed by stderr, trimmed
    pub fn combined(&self) -> String {
        let stdout = self.stdout.trim();
        let stderr = self.stderr.trim();
        match (stdout.is_empty(), stderr.is_empty()) {
            (_, true) => stdout.to_string(),
            (true, false) => stderr.to_string(),
            (false, false) => format!("{}\n{}", stdout, stderr),
        }
    }

    /// Return stdout if successful, otherwise an execution failure carrying
    /// the exit code and captured output
    pub fn into_result(self) -> Result<String, KubectlError> {
        match self.code {
            Some(0) => Ok(self.stdout),
            Some(code) => Err(KubectlError::CommandFailed {
                code,
                output: self.combined(),
            }),
            None => Err(KubectlError::Terminated {
                output: self.combined(),
            }),
        }
    }
}

/// Builder for executing external commands with common patterns
pub struct CommandBuilder {
    command: Command,
    program: String,
}

impl CommandBuilder {
    /// Create a new command builder
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        let mut command = Command::new(&program);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        Self {
            command,
            program: program.as_ref().to_string_lossy().into_owned(),
        }
    }

    /// Add a single argument
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        self.command.arg(arg);
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.command.args(args);
        self
    }

    /// Set an environment variable
    pub fn env<K, V>(mut self, key: K, val: V) -> Self
    where
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        self.command.env(key, val);
        self
    }

    /// Set KUBECONFIG environment variable
    pub fn kubeconfig(self, path: &Path) -> Self {
        self.env("KUBECONFIG", path)
    }

    /// Execute and return raw output
    pub async fn output(mut self) -> Result<CommandOutput, KubectlError> {
        debug!("Running {:?}", self.command.as_std());

        let output = self
            .command
            .output()
            .await
            .map_err(|source| KubectlError::Launch {
                program: self.program.clone(),
                source,
            })?;

        Ok(CommandOutput::from_output(output))
    }

    /// Execute and return stdout on success, error on failure
    pub async fn run(self) -> Result<String, KubectlError> {
        self.output().await?.into_result()
    }
}

/// Check if a command-line tool is installed
pub async fn check_tool_installed(
    tool_name: &str,
    version_args: &[&str],
    install_url: &str,
) -> Result<()> {
    let output = CommandBuilder::new(tool_name)
        .args(version_args)
        .output()
        .await;

    match output {
        Ok(out) if out.success() => Ok(()),
        _ => anyhow::bail!(
            "{} is not installed or not in PATH. Please install from {}",
            tool_name,
            install_url
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_command_builder_basic() {
        let output = assert_ok!(CommandBuilder::new("echo").arg("test").output().await);

        assert!(output.success());
        assert!(output.stdout.contains("test"));
    }

    #[tokio::test]
    async fn test_command_builder_env() {
        let output = assert_ok!(
            CommandBuilder::new("sh")
                .arg("-c")
                .arg("echo $TEST_VAR")
                .env("TEST_VAR", "test_value")
                .output()
                .await
        );

        assert!(output.success());
        assert!(output.stdout.contains("test_value"));
    }

    #[tokio::test]
    async fn test_run_reports_exit_code_and_output() {
        let err = assert_err!(
            CommandBuilder::new("sh")
                .args(["-c", "echo partial; echo forbidden >&2; exit 3"])
                .run()
                .await
        );

        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.output(), "partial\nforbidden");
    }

    #[tokio::test]
    async fn test_missing_program_is_launch_error() {
        let err = assert_err!(
            CommandBuilder::new("precheck-definitely-not-installed")
                .output()
                .await
        );

        assert!(matches!(err, KubectlError::Launch { .. }));
        assert_eq!(err.exit_code(), 127);
    }

    #[tokio::test]
    async fn test_check_tool_installed_missing() {
        let result = check_tool_installed(
            "precheck-definitely-not-installed",
            &["--version"],
            "https://example.invalid",
        )
        .await;

        let msg = assert_err!(result).to_string();
        assert!(msg.contains("not installed"));
    }

    #[test]
    fn test_combined_output() {
        let out = CommandOutput {
            stdout: "\n".to_string(),
            stderr: "Error from server (Forbidden)\n".to_string(),
            code: Some(1),
        };
        assert_eq!(out.combined(), "Error from server (Forbidden)");
    }
}
