/// The kubectl capabilities the pre-install checks depend on
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{ApiResources, KubectlError};

/// What to do with a manifest file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ManifestAction {
    Apply,
    Delete,
}

impl fmt::Display for ManifestAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestAction::Apply => write!(f, "apply"),
            ManifestAction::Delete => write!(f, "delete"),
        }
    }
}

/// Command execution against a cluster
///
/// With `ignore_errors` set, a non-zero exit is reported as a value instead of
/// an error: the captured output for `manage_resource` and `do_cmd`, an empty
/// set for `api_resources` and `false` for `can_i`. A process that cannot be
/// launched is always an error.
pub trait KubectlInterface {
    /// Apply or delete the manifest at `path`, returning kubectl's output
    async fn manage_resource(
        &self,
        action: ManifestAction,
        path: &Path,
        ignore_errors: bool,
    ) -> Result<String, KubectlError>;

    /// Run an arbitrary kubectl subcommand, e.g. `rollout status deployment/hello-world`
    async fn do_cmd(&self, command: &str, ignore_errors: bool) -> Result<String, KubectlError>;

    /// List the API resources the cluster serves
    async fn api_resources(&self, ignore_errors: bool) -> Result<ApiResources, KubectlError>;

    /// Ask whether the current identity may perform `command`, e.g. `create pods`
    async fn can_i(
        &self,
        command: &str,
        all_namespaces: bool,
        ignore_errors: bool,
    ) -> Result<bool, KubectlError>;
}
