/// Errors raised by kubectl operations
use thiserror::Error;

/// Exit code reported when the kubectl binary could not be started
pub const LAUNCH_FAILURE_CODE: i32 = 127;

/// A failed kubectl invocation
#[derive(Debug, Error)]
pub enum KubectlError {
    /// The process ran and exited with a non-zero code
    #[error("command exited with code {code}: {output}")]
    CommandFailed { code: i32, output: String },

    /// The process could not be started at all
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process was killed by a signal
    #[error("command terminated by signal: {output}")]
    Terminated { output: String },

    /// kubectl succeeded but its output or input could not be understood
    #[error("{0}")]
    Parse(String),
}

impl KubectlError {
    /// Numeric exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            KubectlError::CommandFailed { code, .. } => *code,
            KubectlError::Launch { .. } => LAUNCH_FAILURE_CODE,
            KubectlError::Terminated { .. } => -1,
            KubectlError::Parse(_) => 1,
        }
    }

    /// Captured output (or a description when nothing was captured)
    pub fn output(&self) -> String {
        match self {
            KubectlError::CommandFailed { output, .. } | KubectlError::Terminated { output } => {
                output.clone()
            }
            KubectlError::Launch { source, .. } => source.to_string(),
            KubectlError::Parse(msg) => msg.clone(),
        }
    }
}
