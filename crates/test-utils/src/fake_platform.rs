use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use svctest::exec::ExecSession;
use svctest::manifest::Manifest;
use svctest::platform::{
    BoxFuture, BuildOptions, Platform, ProcessHandle, ProcessRunOptions, ProcessStatus,
};
use svctest::types::ReleaseRef;

/// Every call the orchestrator made, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Build { app: String, source_dir: PathBuf },
    Manifest { app: String, release: String },
    Run { service: String, command: String, release: String },
    Get { id: String },
    Exec { id: String, command: String, session: ExecSession },
    Stop { id: String },
}

/// A scripted platform that:
/// - records every call,
/// - reports processes as running (optionally after some pending polls),
/// - returns a per-service exit code from exec (default 0),
/// - can be told to fail specific steps for specific services.
pub struct FakePlatform {
    manifest: Manifest,
    build_release: String,
    build_error: Option<String>,
    exit_codes: HashMap<String, i32>,
    spawn_failures: HashSet<String>,
    never_ready: HashSet<String>,
    exec_failures: HashSet<String>,
    hanging_exec: HashSet<String>,
    pending_polls: usize,
    stop_fails: bool,
    calls: Arc<Mutex<Vec<Call>>>,
    processes: Mutex<HashMap<String, String>>,
    spawned: Mutex<Vec<String>>,
    polls: Mutex<HashMap<String, usize>>,
    seq: AtomicU64,
}

impl FakePlatform {
    pub fn new(manifest: Manifest) -> Self {
        Self {
            manifest,
            build_release: "RBUILT".to_string(),
            build_error: None,
            exit_codes: HashMap::new(),
            spawn_failures: HashSet::new(),
            never_ready: HashSet::new(),
            exec_failures: HashSet::new(),
            hanging_exec: HashSet::new(),
            pending_polls: 0,
            stop_fails: false,
            calls: Arc::new(Mutex::new(Vec::new())),
            processes: Mutex::new(HashMap::new()),
            spawned: Mutex::new(Vec::new()),
            polls: Mutex::new(HashMap::new()),
            seq: AtomicU64::new(1),
        }
    }

    pub fn with_exit_code(mut self, service: &str, code: i32) -> Self {
        self.exit_codes.insert(service.to_string(), code);
        self
    }

    pub fn with_build_release(mut self, release: &str) -> Self {
        self.build_release = release.to_string();
        self
    }

    pub fn failing_build(mut self, message: &str) -> Self {
        self.build_error = Some(message.to_string());
        self
    }

    pub fn failing_spawn(mut self, service: &str) -> Self {
        self.spawn_failures.insert(service.to_string());
        self
    }

    pub fn never_ready(mut self, service: &str) -> Self {
        self.never_ready.insert(service.to_string());
        self
    }

    pub fn failing_exec(mut self, service: &str) -> Self {
        self.exec_failures.insert(service.to_string());
        self
    }

    /// Exec for `service` never completes.
    pub fn hanging_exec(mut self, service: &str) -> Self {
        self.hanging_exec.insert(service.to_string());
        self
    }

    /// Report `Pending` this many times before `Running`.
    pub fn pending_polls(mut self, polls: usize) -> Self {
        self.pending_polls = polls;
        self
    }

    pub fn failing_stop(mut self) -> Self {
        self.stop_fails = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn build_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Build { .. }))
            .count()
    }

    /// Services a process was spawned for, in order.
    pub fn spawned_services(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Run { service, .. } => Some(service),
                _ => None,
            })
            .collect()
    }

    pub fn spawn_commands(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Run { command, .. } => Some(command),
                _ => None,
            })
            .collect()
    }

    pub fn exec_commands(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Exec { command, .. } => Some(command),
                _ => None,
            })
            .collect()
    }

    pub fn exec_sessions(&self) -> Vec<ExecSession> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Exec { session, .. } => Some(session),
                _ => None,
            })
            .collect()
    }

    pub fn stopped_ids(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Stop { id } => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Ids of every process that was successfully spawned, in spawn order.
    pub fn spawned_ids(&self) -> Vec<String> {
        self.spawned.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn service_of(&self, id: &str) -> Result<String> {
        self.processes
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow!("process {} not found", id))
    }
}

impl Platform for FakePlatform {
    fn build<'a>(
        &'a self,
        app: &'a str,
        source_dir: &'a Path,
        _opts: &'a BuildOptions,
    ) -> BoxFuture<'a, Result<ReleaseRef>> {
        Box::pin(async move {
            self.record(Call::Build {
                app: app.to_string(),
                source_dir: source_dir.to_path_buf(),
            });
            match &self.build_error {
                Some(msg) => Err(anyhow!("{}", msg)),
                None => Ok(ReleaseRef::new(self.build_release.clone())),
            }
        })
    }

    fn release_manifest<'a>(
        &'a self,
        app: &'a str,
        release: &'a ReleaseRef,
    ) -> BoxFuture<'a, Result<Manifest>> {
        Box::pin(async move {
            self.record(Call::Manifest {
                app: app.to_string(),
                release: release.to_string(),
            });
            Ok(self.manifest.clone())
        })
    }

    fn process_run<'a>(
        &'a self,
        _app: &'a str,
        service: &'a str,
        opts: ProcessRunOptions,
    ) -> BoxFuture<'a, Result<ProcessHandle>> {
        Box::pin(async move {
            self.record(Call::Run {
                service: service.to_string(),
                command: opts.command.clone(),
                release: opts.release.to_string(),
            });
            if self.spawn_failures.contains(service) {
                return Err(anyhow!("no capacity for service {}", service));
            }

            let id = format!("{}-{}", service, self.seq.fetch_add(1, Ordering::Relaxed));
            self.processes
                .lock()
                .unwrap()
                .insert(id.clone(), service.to_string());
            self.spawned.lock().unwrap().push(id.clone());

            Ok(ProcessHandle {
                id,
                release: opts.release,
                service: service.to_string(),
            })
        })
    }

    fn process_get<'a>(&'a self, _app: &'a str, id: &'a str) -> BoxFuture<'a, Result<ProcessStatus>> {
        Box::pin(async move {
            self.record(Call::Get { id: id.to_string() });
            let service = self.service_of(id)?;
            if self.never_ready.contains(&service) {
                return Ok(ProcessStatus::Pending);
            }

            let mut polls = self.polls.lock().unwrap();
            let seen = polls.entry(id.to_string()).or_insert(0);
            *seen += 1;
            if *seen > self.pending_polls {
                Ok(ProcessStatus::Running)
            } else {
                Ok(ProcessStatus::Pending)
            }
        })
    }

    fn process_exec<'a>(
        &'a self,
        _app: &'a str,
        id: &'a str,
        command: &'a str,
        session: &'a ExecSession,
    ) -> BoxFuture<'a, Result<i32>> {
        Box::pin(async move {
            self.record(Call::Exec {
                id: id.to_string(),
                command: command.to_string(),
                session: *session,
            });
            let service = self.service_of(id)?;
            if self.hanging_exec.contains(&service) {
                std::future::pending::<()>().await;
            }
            if self.exec_failures.contains(&service) {
                return Err(anyhow!("exec channel closed"));
            }
            Ok(self.exit_codes.get(&service).copied().unwrap_or(0))
        })
    }

    fn process_stop<'a>(&'a self, _app: &'a str, id: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.record(Call::Stop { id: id.to_string() });
            if self.stop_fails {
                return Err(anyhow!("stop rejected"));
            }
            Ok(())
        })
    }
}
