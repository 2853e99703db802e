/// kubectl-backed implementation of [`KubectlInterface`]
use anyhow::Result;
use std::path::{Path, PathBuf};

use super::{ApiResources, KubectlError, KubectlInterface, ManifestAction};
use crate::config::KubectlConfig;
use crate::utils::command::{CommandBuilder, CommandOutput};

/// Kubernetes client that shells out to kubectl
#[derive(Debug, Clone)]
pub struct KubectlClient {
    executable: String,
    kubeconfig: Option<PathBuf>,
    context: Option<String>,
    namespace: Option<String>,
}

impl KubectlClient {
    /// Create a client from the kubectl section of the configuration
    pub fn new(config: &KubectlConfig) -> Self {
        Self {
            executable: config.executable.clone(),
            kubeconfig: config.kubeconfig.clone(),
            context: config.context.clone(),
            namespace: config.namespace.clone(),
        }
    }

    /// Check if kubectl is installed
    pub async fn check_kubectl_installed(&self) -> Result<()> {
        crate::utils::command::check_tool_installed(
            &self.executable,
            &["version", "--client"],
            "https://kubernetes.io/docs/tasks/tools/",
        )
        .await
    }

    /// Base command with the connection flags applied
    fn command(&self) -> CommandBuilder {
        let mut cmd = CommandBuilder::new(&self.executable);
        if let Some(path) = &self.kubeconfig {
            cmd = cmd.kubeconfig(path);
        }
        if let Some(context) = &self.context {
            cmd = cmd.args(["--context", context.as_str()]);
        }
        if let Some(namespace) = &self.namespace {
            cmd = cmd.args(["--namespace", namespace.as_str()]);
        }
        cmd
    }

    fn finish(output: CommandOutput, ignore_errors: bool) -> Result<String, KubectlError> {
        if ignore_errors && !output.success() {
            return Ok(output.combined());
        }
        output.into_result()
    }
}

impl KubectlInterface for KubectlClient {
    async fn manage_resource(
        &self,
        action: ManifestAction,
        path: &Path,
        ignore_errors: bool,
    ) -> Result<String, KubectlError> {
        let output = self
            .command()
            .arg(action.to_string())
            .arg("-f")
            .arg(path)
            .output()
            .await?;

        Self::finish(output, ignore_errors)
    }

    async fn do_cmd(&self, command: &str, ignore_errors: bool) -> Result<String, KubectlError> {
        let words: Vec<&str> = command.split_whitespace().collect();
        if words.is_empty() {
            return Err(KubectlError::Parse("empty kubectl command".to_string()));
        }

        let output = self.command().args(words).output().await?;

        Self::finish(output, ignore_errors)
    }

    async fn api_resources(&self, ignore_errors: bool) -> Result<ApiResources, KubectlError> {
        let output = self
            .command()
            .args(["api-resources", "-o", "wide"])
            .output()
            .await?;

        if ignore_errors && !output.success() {
            return Ok(ApiResources::default());
        }

        ApiResources::parse(&output.into_result()?)
    }

    async fn can_i(
        &self,
        command: &str,
        all_namespaces: bool,
        ignore_errors: bool,
    ) -> Result<bool, KubectlError> {
        let mut cmd = self
            .command()
            .args(["auth", "can-i"])
            .args(command.split_whitespace());
        if all_namespaces {
            cmd = cmd.arg("--all-namespaces");
        }

        let output = cmd.output().await?;

        if output.success() {
            return Ok(true);
        }
        // kubectl answers "no" with exit code 1
        if output.code == Some(1) && output.stdout.trim_start().starts_with("no") {
            return Ok(false);
        }
        if ignore_errors {
            return Ok(false);
        }

        output.into_result().map(|_| false)
    }
}
