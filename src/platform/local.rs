// src/platform/local.rs

//! A [`Platform`] that runs everything on this host.
//!
//! - `build` snapshots `svctest-manifest.toml` from the source directory into
//!   a release record under `<state_dir>/apps/<app>/releases/<id>.toml`.
//! - Processes are `sh -c` children started in the release's source
//!   directory and tracked in an in-memory table.
//! - `process_exec` runs the command as a sibling child with the same
//!   working directory and environment, inheriting this process's stdio.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result, anyhow, bail};
use blake3::Hasher;
use serde::{Deserialize, Serialize};
use tokio::process::{Child, Command};
use tracing::{debug, info};

use crate::exec::ExecSession;
use crate::manifest::{MANIFEST_FILE_NAME, Manifest, is_valid_name};
use crate::types::ReleaseRef;

use super::{BoxFuture, BuildOptions, Platform, ProcessHandle, ProcessRunOptions, ProcessStatus};

/// What `build` persists for each release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseRecord {
    pub id: ReleaseRef,
    pub app: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub source: PathBuf,
    pub manifest: Manifest,
}

#[derive(Debug)]
struct LocalProcess {
    app: String,
    child: Child,
    cwd: PathBuf,
    env: Vec<(String, String)>,
}

#[derive(Debug)]
pub struct LocalPlatform {
    state_dir: PathBuf,
    processes: Mutex<HashMap<String, LocalProcess>>,
    next_seq: AtomicU64,
}

impl LocalPlatform {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
            processes: Mutex::new(HashMap::new()),
            next_seq: AtomicU64::new(1),
        }
    }

    /// Release ids and app names become path components, so they must not
    /// be able to leave `<state_dir>/apps/<app>/releases`.
    fn release_path(&self, app: &str, release: &ReleaseRef) -> Result<PathBuf> {
        if !is_valid_name(app) {
            bail!("invalid app name '{}'", app);
        }
        let id = release.as_str();
        if id.is_empty() || id.starts_with('.') || id.contains(['/', '\\']) {
            bail!("invalid release id '{}'", id);
        }

        Ok(self
            .state_dir
            .join("apps")
            .join(app)
            .join("releases")
            .join(format!("{id}.toml")))
    }

    /// Load a stored release record.
    pub async fn load_release(&self, app: &str, release: &ReleaseRef) -> Result<ReleaseRecord> {
        let path = self.release_path(app, release)?;
        let contents = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("release {} not found for app '{}'", release, app))?;
        let record: ReleaseRecord = toml::from_str(&contents)
            .with_context(|| format!("parsing release record {:?}", path))?;
        Ok(record)
    }

    async fn build_release(
        &self,
        app: &str,
        source_dir: &Path,
        opts: &BuildOptions,
    ) -> Result<ReleaseRef> {
        let source = tokio::fs::canonicalize(source_dir)
            .await
            .with_context(|| format!("resolving source directory {:?}", source_dir))?;
        let manifest_path = source.join(MANIFEST_FILE_NAME);
        let contents = tokio::fs::read_to_string(&manifest_path)
            .await
            .with_context(|| format!("reading {:?}", manifest_path))?;
        let manifest = Manifest::parse(&contents)
            .with_context(|| format!("invalid manifest {:?}", manifest_path))?;

        let id = release_id(&contents, &source, opts.description.as_deref());
        let record = ReleaseRecord {
            id: id.clone(),
            app: app.to_string(),
            description: opts.description.clone(),
            source,
            manifest,
        };

        let path = self.release_path(app, &id)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating dir {:?}", parent))?;
        }
        let serialized = toml::to_string(&record).context("serializing release record")?;
        tokio::fs::write(&path, serialized)
            .await
            .with_context(|| format!("writing release record {:?}", path))?;

        info!(app, release = %id, services = record.manifest.services.len(), "built release");
        Ok(id)
    }

    async fn run_process(
        &self,
        app: &str,
        service: &str,
        opts: ProcessRunOptions,
    ) -> Result<ProcessHandle> {
        let record = self.load_release(app, &opts.release).await?;
        if record.manifest.service(service).is_none() {
            bail!("service '{}' not found in release {}", service, opts.release);
        }

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let id = format!("{service}-{seq}");
        let env = vec![
            ("SVCTEST_APP".to_string(), app.to_string()),
            ("SVCTEST_SERVICE".to_string(), service.to_string()),
            ("SVCTEST_RELEASE".to_string(), opts.release.to_string()),
            ("SVCTEST_PROCESS".to_string(), id.clone()),
        ];

        let child = shell(&opts.command)
            .current_dir(&record.source)
            .envs(env.iter().cloned())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("spawning process for service '{}'", service))?;

        debug!(process = %id, command = %opts.command, "local process started");

        let entry = LocalProcess {
            app: app.to_string(),
            child,
            cwd: record.source,
            env,
        };
        self.lock_processes()?.insert(id.clone(), entry);

        Ok(ProcessHandle {
            id,
            release: opts.release,
            service: service.to_string(),
        })
    }

    fn status(&self, app: &str, id: &str) -> Result<ProcessStatus> {
        let mut processes = self.lock_processes()?;
        let process = lookup(&mut processes, app, id)?;
        match process.child.try_wait()? {
            None => Ok(ProcessStatus::Running),
            Some(status) => Ok(ProcessStatus::Exited(status.code().unwrap_or(-1))),
        }
    }

    async fn exec(
        &self,
        app: &str,
        id: &str,
        command: &str,
        session: &ExecSession,
    ) -> Result<i32> {
        // Copy what we need out of the table; the lock is not held while the
        // command runs.
        let (cwd, mut env) = {
            let mut processes = self.lock_processes()?;
            let process = lookup(&mut processes, app, id)?;
            if let Some(status) = process.child.try_wait()? {
                bail!("process {} is not running (exited with {})", id, status);
            }
            (process.cwd.clone(), process.env.clone())
        };

        if let Some(width) = session.width {
            env.push(("COLUMNS".to_string(), width.to_string()));
        }
        if let Some(height) = session.height {
            env.push(("LINES".to_string(), height.to_string()));
        }
        if session.tty == Some(false) {
            env.push(("SVCTEST_TTY".to_string(), "false".to_string()));
        }

        debug!(process = %id, command, ?session, "exec in local process");

        let status = shell(command)
            .current_dir(&cwd)
            .envs(env)
            .kill_on_drop(true)
            .status()
            .await
            .with_context(|| format!("running command in process {}", id))?;

        Ok(status.code().unwrap_or(-1))
    }

    async fn stop(&self, app: &str, id: &str) -> Result<()> {
        let mut process = {
            let mut processes = self.lock_processes()?;
            lookup(&mut processes, app, id)?;
            processes
                .remove(id)
                .ok_or_else(|| anyhow!("process {} not found", id))?
        };

        // Already reaped by a status query; tokio refuses to kill it again.
        if let Some(status) = process.child.try_wait()? {
            debug!(process = %id, %status, "local process had already exited");
            return Ok(());
        }

        process
            .child
            .kill()
            .await
            .with_context(|| format!("killing process {}", id))?;
        debug!(process = %id, "local process stopped");
        Ok(())
    }

    fn lock_processes(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, LocalProcess>>> {
        self.processes
            .lock()
            .map_err(|_| anyhow!("process table lock poisoned"))
    }
}

impl Platform for LocalPlatform {
    fn build<'a>(
        &'a self,
        app: &'a str,
        source_dir: &'a Path,
        opts: &'a BuildOptions,
    ) -> BoxFuture<'a, Result<ReleaseRef>> {
        Box::pin(self.build_release(app, source_dir, opts))
    }

    fn release_manifest<'a>(
        &'a self,
        app: &'a str,
        release: &'a ReleaseRef,
    ) -> BoxFuture<'a, Result<Manifest>> {
        Box::pin(async move { Ok(self.load_release(app, release).await?.manifest) })
    }

    fn process_run<'a>(
        &'a self,
        app: &'a str,
        service: &'a str,
        opts: ProcessRunOptions,
    ) -> BoxFuture<'a, Result<ProcessHandle>> {
        Box::pin(self.run_process(app, service, opts))
    }

    fn process_get<'a>(&'a self, app: &'a str, id: &'a str) -> BoxFuture<'a, Result<ProcessStatus>> {
        Box::pin(async move { self.status(app, id) })
    }

    fn process_exec<'a>(
        &'a self,
        app: &'a str,
        id: &'a str,
        command: &'a str,
        session: &'a ExecSession,
    ) -> BoxFuture<'a, Result<i32>> {
        Box::pin(self.exec(app, id, command, session))
    }

    fn process_stop<'a>(&'a self, app: &'a str, id: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.stop(app, id))
    }
}

fn lookup<'m>(
    processes: &'m mut HashMap<String, LocalProcess>,
    app: &str,
    id: &str,
) -> Result<&'m mut LocalProcess> {
    match processes.get_mut(id) {
        Some(process) if process.app == app => Ok(process),
        _ => Err(anyhow!("process {} not found for app '{}'", id, app)),
    }
}

/// Build a shell command appropriate for the platform.
fn shell(command: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command);
        c
    }
}

/// `R` + 12 uppercase hex chars of a blake3 digest over the release inputs.
fn release_id(manifest: &str, source: &Path, description: Option<&str>) -> ReleaseRef {
    let mut hasher = Hasher::new();
    hasher.update(manifest.as_bytes());
    hasher.update(source.to_string_lossy().as_bytes());
    hasher.update(description.unwrap_or_default().as_bytes());
    let hex = hasher.finalize().to_hex().to_string();
    ReleaseRef::new(format!("R{}", hex[..12].to_uppercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_id_is_stable_and_input_sensitive() {
        let src = Path::new("/srv/app");
        let a = release_id("[[service]]\nname = \"web\"\n", src, None);
        let b = release_id("[[service]]\nname = \"web\"\n", src, None);
        let c = release_id("[[service]]\nname = \"web\"\n", src, Some("nightly"));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str().len(), 13);
        assert!(a.as_str().starts_with('R'));
    }

    #[test]
    fn release_path_stays_inside_the_app_release_dir() {
        let platform = LocalPlatform::new("/var/svctest");

        let path = platform
            .release_path("shop", &ReleaseRef::new("RABC123"))
            .unwrap();
        assert_eq!(path, Path::new("/var/svctest/apps/shop/releases/RABC123.toml"));

        for bad in ["../../x", "a/b", "..", "", "a\\b"] {
            assert!(
                platform.release_path("shop", &ReleaseRef::new(bad)).is_err(),
                "release id {bad:?} should be rejected"
            );
        }
        assert!(platform
            .release_path("../shop", &ReleaseRef::new("RABC123"))
            .is_err());
    }
}
