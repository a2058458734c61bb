use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use buildgate::app::PathSet;
use buildgate::errors::{BuildgateError, Result};
use buildgate::exec::{BackendFuture, BuildBackend, RunReport};
use buildgate::fs::FileSystem;

/// What the fake build tool does once its build "finishes".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeBehaviour {
    /// Remove the lock file and exit 0.
    Succeed,
    /// Write the error file (leaving the lock) and exit with `exit_code`.
    Fail { message: String, exit_code: i32 },
    /// Exit non-zero without touching either file.
    ExitWithoutErrorFile(i32),
    /// Never finish (watch mode only).
    Hang,
}

#[derive(Debug)]
struct Inner {
    fs: Arc<dyn FileSystem>,
    lockfile: PathBuf,
    error_file: PathBuf,
    behaviour: Mutex<FakeBehaviour>,
    delay: Duration,
    installed: AtomicBool,
    running: AtomicBool,
    calls: Mutex<Vec<&'static str>>,
}

/// A `BuildBackend` that plays the build tool by editing the lock/error
/// files directly.
///
/// Clones share state: keep one in the test and hand another to the app.
#[derive(Debug, Clone)]
pub struct FakeBuildTool {
    inner: Arc<Inner>,
}

impl FakeBuildTool {
    pub fn new(fs: Arc<dyn FileSystem>, paths: &PathSet, behaviour: FakeBehaviour) -> Self {
        Self {
            inner: Arc::new(Inner {
                fs,
                lockfile: paths.lockfile(),
                error_file: paths.build_error_file(),
                behaviour: Mutex::new(behaviour),
                delay: Duration::from_millis(50),
                installed: AtomicBool::new(true),
                running: AtomicBool::new(false),
                calls: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Simulate a missing toolchain: `validate` fails.
    pub fn uninstalled(self) -> Self {
        self.inner.installed.store(false, Ordering::SeqCst);
        self
    }

    pub fn set_behaviour(&self, behaviour: FakeBehaviour) {
        *self.inner.behaviour.lock().unwrap() = behaviour;
    }

    /// Backend calls in order: "validate", "run_once", "spawn_watch", "stop".
    pub fn calls(&self) -> Vec<&'static str> {
        self.inner.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.inner.calls.lock().unwrap().push(call);
    }

    /// Apply the configured behaviour to the filesystem; returns the exit
    /// code the tool would report.
    fn finish_build(inner: &Inner) -> Option<i32> {
        let behaviour = inner.behaviour.lock().unwrap().clone();
        match behaviour {
            FakeBehaviour::Succeed => {
                inner.fs.remove_if_exists(&inner.lockfile).unwrap();
                Some(0)
            }
            FakeBehaviour::Fail { message, exit_code } => {
                inner.fs.write(&inner.error_file, message.as_bytes()).unwrap();
                Some(exit_code)
            }
            FakeBehaviour::ExitWithoutErrorFile(code) => Some(code),
            FakeBehaviour::Hang => None,
        }
    }
}

impl BuildBackend for FakeBuildTool {
    fn validate(&self) -> Result<()> {
        self.record("validate");
        if self.inner.installed.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BuildgateError::Dependency(
                "fake build tool is not installed".to_string(),
            ))
        }
    }

    fn run_once(&self) -> BackendFuture<'_, RunReport> {
        self.record("run_once");
        Box::pin(async move {
            tokio::time::sleep(self.inner.delay).await;
            match Self::finish_build(&self.inner) {
                Some(0) => Ok(RunReport::success()),
                Some(code) => Ok(RunReport::failed(code)),
                None => std::future::pending().await,
            }
        })
    }

    fn spawn_watch(&self) -> BackendFuture<'_, ()> {
        self.record("spawn_watch");
        self.inner.running.store(true, Ordering::SeqCst);
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            tokio::spawn(async move {
                tokio::time::sleep(inner.delay).await;
                Self::finish_build(&inner);
            });
            Ok(())
        })
    }

    fn stop(&self) -> BackendFuture<'_, ()> {
        self.record("stop");
        self.inner.running.store(false, Ordering::SeqCst);
        Box::pin(async { Ok(()) })
    }

    fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }
}

/// An app named `name` from `cfg`, driven by a fake tool on `fs`.
///
/// Returns the tool too, so the test can inspect calls or change its
/// behaviour after handing the app over.
pub fn fake_app(
    name: &str,
    cfg: &buildgate::config::ConfigFile,
    fs: Arc<dyn FileSystem>,
    behaviour: FakeBehaviour,
) -> (FakeBuildTool, buildgate::App) {
    let app_cfg = cfg.app.get(name).expect("app must be configured");
    let paths = PathSet::from_config(name, app_cfg, cfg);
    let tool = FakeBuildTool::new(Arc::clone(&fs), &paths, behaviour);
    let app = buildgate::App::with_backend(name, app_cfg, cfg, fs, Box::new(tool.clone()));
    (tool, app)
}
