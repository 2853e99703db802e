/// Facade over the kubectl collaborator used by the pre-install checks
///
/// Every operation issues exactly one kubectl call. The plain operations turn
/// failures into an exit code or `false` and log the details; the `try_`
/// variants return the [`KubectlError`] so callers can tell causes apart.
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::k8s::{ApiResources, KubectlError, KubectlInterface, ManifestAction};

/// Subdirectory of the component directory holding manifest files
pub const UTILS_DIR: &str = "utils";

/// API groups found for the RBAC kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RbacGroups {
    pub role: Option<String>,
    pub role_binding: Option<String>,
}

impl RbacGroups {
    fn from_resources(resources: &ApiResources) -> Self {
        Self {
            role: resources.get_api_group("Role").map(str::to_string),
            role_binding: resources.get_api_group("RoleBinding").map(str::to_string),
        }
    }

    /// Both Role and RoleBinding have an API group
    pub fn is_complete(&self) -> bool {
        self.role.is_some() && self.role_binding.is_some()
    }
}

/// Runs single kubectl operations on behalf of the pre-install checks
pub struct PreCheckUtils<K> {
    kubectl: K,
    component_dir: PathBuf,
    data: Option<String>,
}

/// Directory of the running executable, falling back to the working directory
fn executable_dir() -> PathBuf {
    match std::env::current_exe() {
        Ok(exe) => exe
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
        Err(e) => {
            warn!("Could not resolve executable path: {}", e);
            PathBuf::from(".")
        }
    }
}

impl<K: KubectlInterface> PreCheckUtils<K> {
    /// Create a facade resolving manifests next to the precheck executable
    pub fn new(kubectl: K) -> Self {
        Self::with_component_dir(kubectl, executable_dir())
    }

    /// Create a facade resolving manifests under `component_dir/utils`
    pub fn with_component_dir(kubectl: K, component_dir: impl Into<PathBuf>) -> Self {
        let component_dir = component_dir.into();
        info!("PreCheckUtils using {}", component_dir.display());
        Self {
            kubectl,
            component_dir,
            data: None,
        }
    }

    #[allow(dead_code)]
    pub fn kubectl(&self) -> &K {
        &self.kubectl
    }

    /// Output of the last successful manifest operation
    #[allow(dead_code)]
    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }

    /// Path of `file_name` inside the component's utils directory
    pub fn get_filepath(&self, file_name: &str) -> PathBuf {
        self.component_dir.join(UTILS_DIR).join(file_name)
    }

    /// Apply or delete a manifest, returning kubectl's output
    pub async fn try_deploy_manifest_file(
        &mut self,
        action: ManifestAction,
        file_name: &str,
    ) -> Result<String, KubectlError> {
        let file_path = self.get_filepath(file_name);
        let data = self
            .kubectl
            .manage_resource(action, &file_path, false)
            .await?;
        self.data = Some(data.clone());
        Ok(data)
    }

    /// Apply or delete a manifest, returning kubectl's exit code
    pub async fn deploy_manifest_file(&mut self, action: ManifestAction, file_name: &str) -> i32 {
        let file_path = self.get_filepath(file_name);

        match self.try_deploy_manifest_file(action, file_name).await {
            Ok(data) => {
                info!(
                    "deploy_manifest_file rc 0 action {} filepath {} data {}",
                    action,
                    file_path.display(),
                    data.trim()
                );
                0
            }
            Err(e) => {
                let rc = e.exit_code();
                error!(
                    "deploy_manifest_file rc {} action {} filepath {} error_msg {}",
                    rc,
                    action,
                    file_path.display(),
                    e.output()
                );
                rc
            }
        }
    }

    /// Run a kubectl subcommand, returning its output
    pub async fn try_do_cmd(&self, command: &str) -> Result<String, KubectlError> {
        self.kubectl.do_cmd(command, false).await
    }

    /// Run a kubectl subcommand such as `rollout status deployment/hello-world`.
    /// Returns 0 on success, otherwise kubectl's exit code.
    pub async fn do_cmd(&self, command: &str) -> i32 {
        match self.try_do_cmd(command).await {
            Ok(data) => {
                info!("do_cmd rc 0 command {} data {}", command, data.trim());
                0
            }
            Err(e) => {
                let rc = e.exit_code();
                error!("do_cmd rc {} command {} data {}", rc, command, e.output());
                rc
            }
        }
    }

    /// Look up the API groups of Role and RoleBinding
    pub async fn try_get_rbac_groups(&self) -> Result<RbacGroups, KubectlError> {
        let resources = self.kubectl.api_resources(false).await?;
        Ok(RbacGroups::from_resources(&resources))
    }

    /// True if both Role and RoleBinding have an API group
    pub async fn get_rbac_group_cmd(&self) -> bool {
        match self.try_get_rbac_groups().await {
            Ok(groups) if groups.is_complete() => {
                info!("found Role and RoleBinding api groups");
                true
            }
            Ok(groups) => {
                warn!(
                    "Role or RoleBinding api group missing (Role: {:?}, RoleBinding: {:?})",
                    groups.role, groups.role_binding
                );
                false
            }
            Err(e) => {
                error!(
                    "get_rbac_group_cmd rc {} error {}",
                    e.exit_code(),
                    e.output()
                );
                false
            }
        }
    }

    /// Ask whether `command` (e.g. `create pods`) is permitted
    pub async fn try_can_i(&self, command: &str) -> Result<bool, KubectlError> {
        self.kubectl.can_i(command, false, false).await
    }

    /// True if `command` is permitted.
    ///
    /// A probe that fails to execute also yields `false`; use [`Self::try_can_i`]
    /// to distinguish it from a denial.
    pub async fn can_i(&self, command: &str) -> bool {
        match self.try_can_i(command).await {
            Ok(allowed) => {
                info!("can-i {} {}", command, allowed);
                allowed
            }
            Err(e) => {
                error!(
                    "can-i {} return False rc {} output {}",
                    command,
                    e.exit_code(),
                    e.output()
                );
                false
            }
        }
    }
}
