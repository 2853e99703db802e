/// Runs the configured permission checks and collects a report
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::PreCheckUtils;
use crate::config::ChecksConfig;
use crate::k8s::{KubectlError, KubectlInterface, ManifestAction};

/// Which operation produced a check result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    RbacGroups,
    CanI,
    Manifest,
    Command,
}

/// Outcome of a single check
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub kind: CheckKind,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl CheckResult {
    fn passed(kind: CheckKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            passed: true,
            detail: None,
        }
    }

    fn failed(kind: CheckKind, name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            passed: false,
            detail: Some(detail.into()),
        }
    }

    fn from_error(kind: CheckKind, name: impl Into<String>, err: &KubectlError) -> Self {
        Self::failed(
            kind,
            name,
            format!("rc {}: {}", err.exit_code(), err.output()),
        )
    }
}

/// All results of a `precheck check` run
#[derive(Debug, Clone, Serialize)]
pub struct PermissionReport {
    pub generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub results: Vec<CheckResult>,
}

impl PermissionReport {
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(|r| !r.passed)
    }
}

/// Permission check runner
pub struct PermissionChecker {
    checks: ChecksConfig,
    namespace: Option<String>,
}

impl PermissionChecker {
    pub fn new(checks: ChecksConfig, namespace: Option<String>) -> Self {
        Self { checks, namespace }
    }

    /// Run every configured check in order.
    ///
    /// A manifest whose apply fails skips its follow-up commands but is still
    /// deleted, so a partially created deployment does not linger.
    pub async fn run<K: KubectlInterface>(&self, utils: &mut PreCheckUtils<K>) -> PermissionReport {
        let mut results = Vec::new();

        results.push(Self::check_rbac_groups(utils).await);

        for probe in &self.checks.can_i {
            let result = match utils.try_can_i(probe).await {
                Ok(true) => CheckResult::passed(CheckKind::CanI, probe.as_str()),
                Ok(false) => CheckResult::failed(CheckKind::CanI, probe.as_str(), "not permitted"),
                Err(e) => CheckResult::from_error(CheckKind::CanI, probe.as_str(), &e),
            };
            Self::log(&result);
            results.push(result);
        }

        for manifest in &self.checks.manifests {
            let applied = Self::deploy(utils, ManifestAction::Apply, &manifest.file).await;
            let apply_ok = applied.passed;
            results.push(applied);

            if apply_ok {
                for command in &manifest.commands {
                    let result = match utils.try_do_cmd(command).await {
                        Ok(_) => CheckResult::passed(CheckKind::Command, command.as_str()),
                        Err(e) => CheckResult::from_error(CheckKind::Command, command.as_str(), &e),
                    };
                    Self::log(&result);
                    results.push(result);
                }
            }

            results.push(Self::deploy(utils, ManifestAction::Delete, &manifest.file).await);
        }

        let report = PermissionReport {
            generated_at: Utc::now(),
            namespace: self.namespace.clone(),
            results,
        };

        info!(
            "Permission checks finished: {} passed, {} failed",
            report.results.len() - report.failures().count(),
            report.failures().count()
        );

        report
    }

    async fn check_rbac_groups<K: KubectlInterface>(utils: &PreCheckUtils<K>) -> CheckResult {
        let name = "Role and RoleBinding api groups";
        let result = match utils.try_get_rbac_groups().await {
            Ok(groups) if groups.is_complete() => CheckResult::passed(CheckKind::RbacGroups, name),
            Ok(groups) => CheckResult::failed(
                CheckKind::RbacGroups,
                name,
                format!(
                    "Role: {}, RoleBinding: {}",
                    groups.role.as_deref().unwrap_or("missing"),
                    groups.role_binding.as_deref().unwrap_or("missing")
                ),
            ),
            Err(e) => CheckResult::from_error(CheckKind::RbacGroups, name, &e),
        };
        Self::log(&result);
        result
    }

    async fn deploy<K: KubectlInterface>(
        utils: &mut PreCheckUtils<K>,
        action: ManifestAction,
        file: &str,
    ) -> CheckResult {
        let name = format!("{} {}", action, file);
        let result = match utils.try_deploy_manifest_file(action, file).await {
            Ok(_) => CheckResult::passed(CheckKind::Manifest, name),
            Err(e) => CheckResult::from_error(CheckKind::Manifest, name, &e),
        };
        Self::log(&result);
        result
    }

    fn log(result: &CheckResult) {
        if result.passed {
            info!("✓ {}", result.name);
        } else {
            warn!(
                "✗ {}: {}",
                result.name,
                result.detail.as_deref().unwrap_or_default()
            );
        }
    }
}
