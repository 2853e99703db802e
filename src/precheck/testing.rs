/// Test doubles shared by the precheck tests
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::MakeWriter;

use crate::k8s::resources::ApiResource;
use crate::k8s::{ApiResources, KubectlError, KubectlInterface, ManifestAction};

/// Scripted kubectl collaborator that records every call
#[derive(Default)]
pub struct FakeKubectl {
    failures: Vec<(String, i32, String)>,
    denied: Vec<String>,
    missing_kinds: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeKubectl {
    /// Fail any call whose description contains `pattern`
    pub fn fail_on(mut self, pattern: &str, code: i32, output: &str) -> Self {
        self.failures
            .push((pattern.to_string(), code, output.to_string()));
        self
    }

    /// Answer "no" to this can-i probe
    pub fn deny(mut self, command: &str) -> Self {
        self.denied.push(command.to_string());
        self
    }

    /// Leave `kind` out of the api-resources listing
    pub fn without_kind(mut self, kind: &str) -> Self {
        self.missing_kinds.push(kind.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<(), KubectlError> {
        let failure = self
            .failures
            .iter()
            .find(|(pattern, _, _)| call.contains(pattern.as_str()));
        self.calls.lock().unwrap().push(call);

        match failure {
            Some((_, code, output)) => Err(KubectlError::CommandFailed {
                code: *code,
                output: output.clone(),
            }),
            None => Ok(()),
        }
    }
}

fn resource(name: &str, kind: &str, group: Option<&str>) -> ApiResource {
    ApiResource {
        name: name.to_string(),
        short_names: vec![],
        api_version: Some(match group {
            Some(group) => format!("{}/v1", group),
            None => "v1".to_string(),
        }),
        group: group.map(str::to_string),
        namespaced: true,
        kind: kind.to_string(),
        verbs: vec!["create".to_string(), "get".to_string()],
    }
}

impl KubectlInterface for FakeKubectl {
    async fn manage_resource(
        &self,
        action: ManifestAction,
        path: &Path,
        _ignore_errors: bool,
    ) -> Result<String, KubectlError> {
        self.record(format!("{} {}", action, path.display()))?;
        Ok(match action {
            ManifestAction::Apply => "deployment.apps/hello-world configured\n".to_string(),
            ManifestAction::Delete => "deployment.apps \"hello-world\" deleted\n".to_string(),
        })
    }

    async fn do_cmd(&self, command: &str, _ignore_errors: bool) -> Result<String, KubectlError> {
        self.record(format!("do {}", command))?;
        Ok("ok\n".to_string())
    }

    async fn api_resources(&self, _ignore_errors: bool) -> Result<ApiResources, KubectlError> {
        self.record("api-resources".to_string())?;
        let resources = vec![
            resource("pods", "Pod", None),
            resource("roles", "Role", Some("rbac.authorization.k8s.io")),
            resource("rolebindings", "RoleBinding", Some("rbac.authorization.k8s.io")),
        ];
        Ok(ApiResources::new(
            resources
                .into_iter()
                .filter(|r| !self.missing_kinds.contains(&r.kind))
                .collect(),
        ))
    }

    async fn can_i(
        &self,
        command: &str,
        _all_namespaces: bool,
        _ignore_errors: bool,
    ) -> Result<bool, KubectlError> {
        self.record(format!("can-i {}", command))?;
        Ok(!self.denied.iter().any(|d| d == command))
    }
}

/// In-memory sink for formatted log lines
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    /// Captured lines emitted at `level` ("INFO", "ERROR", ...)
    pub fn lines_at(&self, level: &str) -> Vec<String> {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes)
            .lines()
            .filter(|line| line.trim_start().starts_with(level))
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Route this thread's log output into a buffer until the guard drops
pub fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .without_time()
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (buffer, guard)
}
