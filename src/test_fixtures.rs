//! Test fixtures and doubles for the host and blob storage seams.
//!
//! - [`FakeHost`] answers host queries from a script and records every
//!   mutating call, so tests can assert ordering and inject failures.
//! - [`FakeBlobStore`] serves objects from a local directory and counts
//!   transfers.
//! - [`Harness`] wires both to a sandboxed host layout with a published
//!   artifact bundle.
//!
//! # Usage
//!
//! ```ignore
//! let harness = Harness::new();
//! let host = FakeHost::healthy();
//! let outcome = harness.run(&context, &host);
//! assert_eq!(harness.workspaces(), 0);
//! ```

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;

use crate::components::StepEnv;
use crate::components::fleet::FLEET_SERVICE;
use crate::components::management::MANAGEMENT_SERVICE;
use crate::components::runtime::{ARTIFACT_RUNTIME_DIR, RUNTIME_SERVICE};
use crate::components::tooling::ARTIFACT_MODULE_DIR;
use crate::config::{HostLayout, RemoteLayout, Settings};
use crate::context::InstallationContext;
use crate::error::Result;
use crate::error::component::host_failed;
use crate::fetch::{BlobStore, Fetcher};
use crate::fetch::archive::pack_tar_gz;
use crate::hash::hash_file;
use crate::health::{HealthMonitor, HealthPolicy};
use crate::host::{FeatureState, Host, Invocation, ModuleCommand, ServiceState};
use crate::orchestrator::{Provisioner, RunOutcome};
use crate::temp::TempWorkspace;

/// Region every fixture publishes into
pub const REGION: &str = "us-west-2";

/// Files shipped in the fixture bundle's tooling module
pub const MODULE_FILES: [&str; 3] = ["ECSTools.psd1", "ECSTools.psm1", "ECSTools.format.ps1xml"];

/// Scripted observations of one service; the last state repeats forever
#[derive(Debug)]
struct ServiceScript {
    states: VecDeque<ServiceState>,
}

impl ServiceScript {
    fn next(&mut self) -> ServiceState {
        if self.states.len() > 1 {
            self.states.pop_front().unwrap_or(ServiceState::Unknown)
        } else {
            self.states.front().copied().unwrap_or(ServiceState::Unknown)
        }
    }

    fn set(&mut self, state: ServiceState) {
        self.states = VecDeque::from([state]);
    }
}

/// Scripted host that records what the provisioner asks of it
#[derive(Debug)]
pub struct FakeHost {
    build: String,
    feature: FeatureState,
    services: RefCell<HashMap<String, ServiceScript>>,
    observations: RefCell<HashMap<String, u32>>,
    calls: RefCell<Vec<String>>,
    tools: HashSet<String>,
    module_loaded: Cell<bool>,
    discoverable: bool,
    fail_on: Option<String>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeHost {
    /// Supported OS, feature already enabled, no services
    pub fn new() -> Self {
        Self {
            build: "17763".to_string(),
            feature: FeatureState::Enabled,
            services: RefCell::new(HashMap::new()),
            observations: RefCell::new(HashMap::new()),
            calls: RefCell::new(Vec::new()),
            tools: HashSet::from(["powershell".to_string()]),
            module_loaded: Cell::new(false),
            discoverable: true,
            fail_on: None,
        }
    }

    /// Host on which every agent service comes up Running
    pub fn healthy() -> Self {
        Self::new()
            .with_service(MANAGEMENT_SERVICE, ServiceState::Running)
            .with_service(FLEET_SERVICE, ServiceState::Running)
    }

    pub fn with_build(mut self, build: &str) -> Self {
        self.build = build.to_string();
        self
    }

    pub fn with_feature(mut self, feature: FeatureState) -> Self {
        self.feature = feature;
        self
    }

    pub fn with_service(self, name: &str, state: ServiceState) -> Self {
        self.with_service_script(name, vec![state])
    }

    /// Service answering `states` in order, repeating the last one
    pub fn with_service_script(self, name: &str, states: Vec<ServiceState>) -> Self {
        self.services.borrow_mut().insert(
            name.to_string(),
            ServiceScript {
                states: states.into(),
            },
        );
        self
    }

    pub fn without_tool(mut self, tool: &str) -> Self {
        self.tools.remove(tool);
        self
    }

    pub fn with_loaded_module(self) -> Self {
        self.module_loaded.set(true);
        self
    }

    /// Module registry never finds any module
    pub fn undiscoverable(mut self) -> Self {
        self.discoverable = false;
        self
    }

    /// Fail every call whose label starts with `prefix`
    pub fn fail_on(mut self, prefix: &str) -> Self {
        self.fail_on = Some(prefix.to_string());
        self
    }

    /// Number of state queries made for `service`
    pub fn observations(&self, service: &str) -> u32 {
        self.observations
            .borrow()
            .get(service)
            .copied()
            .unwrap_or(0)
    }

    /// Mutating calls in the order they were made
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Position of the first call starting with `prefix`
    pub fn call_index(&self, prefix: &str) -> Option<usize> {
        self.calls.borrow().iter().position(|c| c.starts_with(prefix))
    }

    pub fn has_service(&self, name: &str) -> bool {
        self.services.borrow().contains_key(name)
    }

    pub fn is_module_loaded(&self) -> bool {
        self.module_loaded.get()
    }

    fn record(&self, label: String) -> Result<()> {
        let failing = self
            .fail_on
            .as_deref()
            .is_some_and(|prefix| label.starts_with(prefix));
        self.calls.borrow_mut().push(label.clone());
        if failing {
            return Err(host_failed(label, "injected failure"));
        }
        Ok(())
    }
}

impl Host for FakeHost {
    fn os_build_number(&self) -> Result<String> {
        self.record("os_build_number".to_string())?;
        Ok(self.build.clone())
    }

    fn enable_container_feature(&self) -> Result<FeatureState> {
        self.record("enable_container_feature".to_string())?;
        Ok(self.feature)
    }

    fn service_state(&self, name: &str) -> Result<Option<ServiceState>> {
        *self
            .observations
            .borrow_mut()
            .entry(name.to_string())
            .or_insert(0) += 1;
        Ok(self.services.borrow_mut().get_mut(name).map(ServiceScript::next))
    }

    fn start_service(&self, name: &str) -> Result<()> {
        self.record(format!("start_service {name}"))?;
        self.services
            .borrow_mut()
            .entry(name.to_string())
            .or_insert_with(|| ServiceScript {
                states: VecDeque::new(),
            })
            .set(ServiceState::Running);
        Ok(())
    }

    fn stop_service(&self, name: &str) -> Result<()> {
        self.record(format!("stop_service {name}"))?;
        match self.services.borrow_mut().get_mut(name) {
            Some(script) => {
                script.set(ServiceState::Stopped);
                Ok(())
            }
            None => Err(host_failed(format!("stop_service {name}"), "no such service")),
        }
    }

    fn delete_service(&self, name: &str) -> Result<()> {
        self.record(format!("delete_service {name}"))?;
        match self.services.borrow_mut().remove(name) {
            Some(_) => Ok(()),
            None => Err(host_failed(format!("delete_service {name}"), "no such service")),
        }
    }

    fn run(&self, invocation: &Invocation) -> Result<()> {
        let program = invocation
            .program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mut label = format!("run {program}");
        for arg in &invocation.args {
            label.push(' ');
            label.push_str(arg);
        }
        self.record(label)?;

        if !invocation.program.is_file() {
            return Err(host_failed(invocation.display(), "program not found"));
        }
        Ok(())
    }

    fn module_loaded(&self, module: &str) -> Result<bool> {
        self.record(format!("module_loaded {module}"))?;
        Ok(self.module_loaded.get())
    }

    fn unload_module(&self, module: &str) -> Result<()> {
        self.record(format!("unload_module {module}"))?;
        self.module_loaded.set(false);
        Ok(())
    }

    fn module_discoverable(&self, module: &str) -> Result<bool> {
        self.record(format!("module_discoverable {module}"))?;
        Ok(self.discoverable)
    }

    fn invoke_module_command(&self, module: &str, command: &ModuleCommand) -> Result<()> {
        self.record(format!("invoke {module} {}", command.render()))?;
        self.module_loaded.set(true);
        Ok(())
    }

    fn tool_available(&self, tool: &str) -> bool {
        self.tools.contains(tool)
    }
}

/// Blob store serving `<root>/<bucket>/<key>`
#[derive(Debug)]
pub struct FakeBlobStore {
    root: PathBuf,
    calls: Cell<u32>,
}

impl FakeBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            calls: Cell::new(0),
        }
    }

    pub fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        self.root.join(bucket).join(key)
    }

    /// Publish an object
    pub fn put(&self, bucket: &str, key: &str, content: &[u8]) {
        let path = self.object_path(bucket, key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    /// Number of transfers attempted
    pub fn calls(&self) -> u32 {
        self.calls.get()
    }
}

impl BlobStore for FakeBlobStore {
    fn download(&self, bucket: &str, key: &str, dest: &Path) -> Result<()> {
        self.calls.set(self.calls.get() + 1);
        let source = self.object_path(bucket, key);
        if !source.is_file() {
            return Err(host_failed(format!("GET {bucket}/{key}"), "404 Not Found"));
        }
        std::fs::copy(&source, dest)?;
        Ok(())
    }
}

/// Build an artifact bundle with runtime binaries and the tooling module and
/// publish it with a matching sidecar.
pub fn write_artifact_bundle(store: &FakeBlobStore, bucket: &str, archive_key: &str, sidecar_key: &str) {
    let staging = TempDir::new().unwrap();
    let tree = staging.path().join("tree");

    let runtime = tree.join(ARTIFACT_RUNTIME_DIR);
    std::fs::create_dir_all(&runtime).unwrap();
    for binary in ["dockerd.exe", "docker.exe"] {
        std::fs::write(runtime.join(binary), format!("{binary} payload")).unwrap();
        let digest = hash_file(&runtime.join(binary)).unwrap();
        std::fs::write(runtime.join(format!("{binary}.sha256")), digest).unwrap();
    }

    let module = tree.join(ARTIFACT_MODULE_DIR);
    std::fs::create_dir_all(&module).unwrap();
    for file in MODULE_FILES {
        std::fs::write(module.join(file), format!("# {file}")).unwrap();
    }

    let archive = staging.path().join("bundle.tar.gz");
    pack_tar_gz(&tree, &archive).unwrap();
    let digest = hash_file(&archive).unwrap();

    store.put(bucket, archive_key, &std::fs::read(&archive).unwrap());
    store.put(
        bucket,
        sidecar_key,
        format!("{digest}  bundle.tar.gz\n").as_bytes(),
    );
}

/// Sandboxed host layout, blob store and temp root for end-to-end runs
pub struct Harness {
    pub root: TempDir,
    pub settings: Settings,
    pub store: FakeBlobStore,
    pub temp_base: PathBuf,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    /// Publish the artifact bundle and management installer for [`REGION`]
    /// and lay out an installed management agent to package.
    pub fn new() -> Self {
        let root = TempDir::new().unwrap();
        let settings = Settings {
            layout: HostLayout::rooted(&root.path().join("host")),
            remote: RemoteLayout::default(),
        };
        let store = FakeBlobStore::new(root.path().join("blobs"));
        let temp_base = root.path().join("tmp");
        std::fs::create_dir_all(&temp_base).unwrap();

        let remote = &settings.remote;
        let context = InstallationContext::builder(REGION).build();
        write_artifact_bundle(
            &store,
            &remote.artifact_bucket_for(&context),
            &remote.artifact_key,
            &remote.artifact_hash_key,
        );
        store.put(
            &remote.management_bucket_for(REGION),
            &remote.management_installer_key,
            b"management agent installer",
        );

        let agent_dir = &settings.layout.management_agent_dir;
        std::fs::create_dir_all(agent_dir).unwrap();
        std::fs::write(agent_dir.join("amazon-ssm-agent.exe"), b"agent").unwrap();

        Self {
            root,
            settings,
            store,
            temp_base,
        }
    }

    pub fn layout(&self) -> &HostLayout {
        &self.settings.layout
    }

    /// Run the provisioner with a zero-interval health policy
    pub fn run(&self, context: &InstallationContext, host: &FakeHost) -> RunOutcome {
        Provisioner::new(context, &self.settings, host, &self.store)
            .with_health_policy(HealthPolicy::new(10, Duration::ZERO))
            .with_temp_base(&self.temp_base)
            .run()
    }

    /// Run `f` against a fresh workspace holding the extracted bundle, with a
    /// three-attempt zero-interval health policy
    pub fn with_env<R>(
        &self,
        context: &InstallationContext,
        host: &FakeHost,
        f: impl FnOnce(&StepEnv<'_>) -> R,
    ) -> R {
        let workspace = TempWorkspace::create_in(&self.temp_base).unwrap();
        let fetcher = Fetcher::new(&self.store);
        let monitor = HealthMonitor::new(host, HealthPolicy::new(3, Duration::ZERO));

        let remote = &self.settings.remote;
        fetcher
            .fetch_and_verify(
                &remote.artifact_bucket_for(context),
                &remote.artifact_key,
                &remote.artifact_hash_key,
                &workspace.downloads_dir(),
                &workspace.artifacts_dir(),
            )
            .unwrap();

        let env = StepEnv {
            context,
            settings: &self.settings,
            host,
            fetcher: &fetcher,
            monitor: &monitor,
            workspace: &workspace,
        };
        f(&env)
    }

    /// Number of workspaces left under the temp root
    pub fn workspaces(&self) -> usize {
        std::fs::read_dir(&self.temp_base).unwrap().count()
    }

    /// Lay out a previous installation of the runtime and fleet agent
    pub fn seed_previous_install(&self) {
        let layout = self.layout();
        for dir in [
            &layout.runtime_dir,
            &layout.fleet_agent_dir,
            &layout.fleet_cache_dir,
            &layout.module_dir,
        ] {
            std::fs::create_dir_all(dir).unwrap();
            std::fs::write(dir.join("stale.txt"), b"previous install").unwrap();
        }
    }
}

/// Context for an install with activation credentials
pub fn install_context() -> InstallationContext {
    InstallationContext::builder(REGION)
        .activation("activation-id", "activation-code")
        .cluster("ecs-anywhere")
        .build()
}

/// In-memory sink for the log lines emitted while a closure runs
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Run `f` with a plain fmt subscriber writing into this capture
    pub fn capture<R>(&self, f: impl FnOnce() -> R) -> R {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::INFO)
            .with_target(false)
            .with_ansi(false)
            .without_time()
            .finish();
        tracing::subscriber::with_default(subscriber, f)
    }

    pub fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes)
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Lines logged at ERROR level
    pub fn errors(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|line| line.trim_start().starts_with("ERROR"))
            .collect()
    }
}

impl Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

mod tests {
    use super::*;

    #[test]
    fn test_fake_host_records_calls_in_order() {
        let host = FakeHost::healthy();
        host.start_service(RUNTIME_SERVICE).unwrap();
        host.stop_service(RUNTIME_SERVICE).unwrap();
        assert_eq!(
            host.calls(),
            vec!["start_service docker".to_string(), "stop_service docker".to_string()]
        );
        assert_eq!(host.service_state(RUNTIME_SERVICE).unwrap(), Some(ServiceState::Stopped));
    }

    #[test]
    fn test_fake_host_injected_failure() {
        let host = FakeHost::new().fail_on("enable_container_feature");
        assert!(host.enable_container_feature().is_err());
        assert_eq!(host.call_index("enable_container_feature"), Some(0));
    }

    #[test]
    fn test_harness_publishes_bundle() {
        let harness = Harness::new();
        let remote = &harness.settings.remote;
        assert!(
            harness
                .store
                .object_path("amazon-ecs-agent-us-west-2", &remote.artifact_key)
                .is_file()
        );
        assert_eq!(harness.workspaces(), 0);
    }
}
