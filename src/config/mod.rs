/// Configuration management for precheck
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main pre-install check configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreCheckConfig {
    /// How to reach the cluster
    #[serde(default)]
    pub kubectl: KubectlConfig,

    /// Directory whose `utils/` subdirectory holds the manifests.
    /// Defaults to the directory of the precheck executable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_dir: Option<PathBuf>,

    /// Checks run by `precheck check`
    #[serde(default)]
    pub checks: ChecksConfig,
}

/// kubectl invocation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KubectlConfig {
    /// kubectl binary name or path
    #[serde(default = "default_kubectl")]
    pub executable: String,

    /// Kubeconfig file (unset means kubectl uses KUBECONFIG or ~/.kube/config)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Namespace the checks run in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Permission checks to run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChecksConfig {
    /// `kubectl auth can-i` probes, e.g. "create deployments"
    #[serde(default)]
    pub can_i: Vec<String>,

    /// Manifests to apply, exercise and delete again
    #[serde(default)]
    pub manifests: Vec<ManifestCheck>,
}

/// A manifest deployment check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestCheck {
    /// File name under `<component_dir>/utils`
    pub file: String,

    /// kubectl subcommands run after a successful apply
    #[serde(default)]
    pub commands: Vec<String>,
}

fn default_kubectl() -> String {
    "kubectl".to_string()
}

impl Default for KubectlConfig {
    fn default() -> Self {
        Self {
            executable: default_kubectl(),
            kubeconfig: None,
            context: None,
            namespace: None,
        }
    }
}

impl PreCheckConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate YAML configuration
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: PreCheckConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.kubectl.executable.trim().is_empty() {
            anyhow::bail!("kubectl.executable cannot be empty");
        }

        if let Some(namespace) = &self.kubectl.namespace {
            if namespace.trim().is_empty() {
                anyhow::bail!("kubectl.namespace cannot be empty when set");
            }
        }

        if self.checks.can_i.iter().any(|probe| probe.trim().is_empty()) {
            anyhow::bail!("checks.can_i entries cannot be empty");
        }

        for manifest in &self.checks.manifests {
            self.validate_manifest_name(&manifest.file)?;
        }

        Ok(())
    }

    /// Manifest names are plain file names inside the utils directory
    fn validate_manifest_name(&self, file: &str) -> anyhow::Result<()> {
        if file.is_empty() || file.contains('/') || file.contains('\\') {
            anyhow::bail!("Invalid manifest file name: {:?}", file);
        }
        Ok(())
    }

    /// Generate an example configuration file
    pub fn example() -> Self {
        Self {
            kubectl: KubectlConfig {
                executable: default_kubectl(),
                kubeconfig: None,
                context: None,
                namespace: Some("default".to_string()),
            },
            component_dir: None,
            checks: ChecksConfig {
                can_i: vec![
                    "create deployments".to_string(),
                    "create roles".to_string(),
                    "create rolebindings".to_string(),
                    "get pods".to_string(),
                ],
                manifests: vec![ManifestCheck {
                    file: "hello-world.yaml".to_string(),
                    commands: vec![
                        "rollout status deployment.v1.apps/hello-world".to_string(),
                        "scale --replicas=2 deployment/hello-world".to_string(),
                    ],
                }],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        let mut config = PreCheckConfig::example();
        assert!(config.validate().is_ok());

        config.kubectl.executable = String::new();
        assert!(config.validate().is_err());

        let mut config = PreCheckConfig::example();
        config.kubectl.namespace = Some(" ".to_string());
        assert!(config.validate().is_err());

        let mut config = PreCheckConfig::example();
        config.checks.can_i.push(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_manifest_name_validation() {
        let config = PreCheckConfig::example();
        assert!(config.validate_manifest_name("hello-world.yaml").is_ok());
        assert!(config.validate_manifest_name("../secrets.yaml").is_err());
        assert!(config.validate_manifest_name("").is_err());
    }

    #[test]
    fn test_parse_defaults() {
        let config = PreCheckConfig::parse("kubectl:\n  namespace: viya\n").unwrap();
        assert_eq!(config.kubectl.executable, "kubectl");
        assert_eq!(config.kubectl.namespace.as_deref(), Some("viya"));
        assert!(config.component_dir.is_none());
        assert!(config.checks.can_i.is_empty());
        assert!(config.checks.manifests.is_empty());
    }

    #[test]
    fn test_example_roundtrips_through_yaml() {
        let yaml = serde_yaml::to_string(&PreCheckConfig::example()).unwrap();
        let config = PreCheckConfig::parse(&yaml).unwrap();
        assert_eq!(config.checks.manifests[0].file, "hello-world.yaml");
        assert_eq!(config.checks.manifests[0].commands.len(), 2);
    }
}
