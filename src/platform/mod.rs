// src/platform/mod.rs

//! Capability interface to the application platform.
//!
//! The orchestrator only ever talks to a [`Platform`]. Production uses
//! [`LocalPlatform`], which emulates releases and processes on this host;
//! tests provide a scripted fake.
//!
//! Methods return boxed futures so the trait stays object-safe and callers
//! can hold an `Arc<dyn Platform>`.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use anyhow::Result;

use crate::exec::ExecSession;
use crate::manifest::Manifest;
use crate::types::ReleaseRef;

pub mod local;

pub use local::LocalPlatform;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Options for [`Platform::build`].
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub description: Option<String>,
}

/// Options for [`Platform::process_run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRunOptions {
    pub command: String,
    pub release: ReleaseRef,
}

/// A process started by [`Platform::process_run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessHandle {
    pub id: String,
    pub release: ReleaseRef,
    pub service: String,
}

/// Observed state of a platform process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    Pending,
    Running,
    Exited(i32),
}

pub trait Platform: Send + Sync {
    /// Build `source_dir` into a new release of `app`.
    fn build<'a>(
        &'a self,
        app: &'a str,
        source_dir: &'a Path,
        opts: &'a BuildOptions,
    ) -> BoxFuture<'a, Result<ReleaseRef>>;

    fn release_manifest<'a>(
        &'a self,
        app: &'a str,
        release: &'a ReleaseRef,
    ) -> BoxFuture<'a, Result<Manifest>>;

    /// Start `opts.command` in a new process of `service`, pinned to `opts.release`.
    fn process_run<'a>(
        &'a self,
        app: &'a str,
        service: &'a str,
        opts: ProcessRunOptions,
    ) -> BoxFuture<'a, Result<ProcessHandle>>;

    fn process_get<'a>(&'a self, app: &'a str, id: &'a str) -> BoxFuture<'a, Result<ProcessStatus>>;

    /// Run `command` inside a running process and return its exit code.
    ///
    /// An `Err` means the exec channel itself failed; a command that ran and
    /// failed is an `Ok` with a non-zero code.
    fn process_exec<'a>(
        &'a self,
        app: &'a str,
        id: &'a str,
        command: &'a str,
        session: &'a ExecSession,
    ) -> BoxFuture<'a, Result<i32>>;

    fn process_stop<'a>(&'a self, app: &'a str, id: &'a str) -> BoxFuture<'a, Result<()>>;
}
