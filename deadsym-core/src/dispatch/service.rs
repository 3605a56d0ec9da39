//! External analysis service for languages the native engine does not parse.
//!
//! The service is opaque: requests and responses are JSON strings. The
//! [`ServiceHandle`] owns one service instance, initializes it lazily on
//! first use and bounds every call with a timeout.
//!
//! Handle states:
//!
//! ```text
//! Uninitialized ──first use──► Initializing ──ok──► Ready
//!                                   │
//!                                   └──error/timeout──► Failed (until reset)
//! ```

use std::fmt;
use std::io::{Read, Write};
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, error, warn};

use crate::config::DEFAULT_SERVICE_TIMEOUT_MS;
use crate::error::{DeadsymError, DeadsymResult};
use crate::logging::log_info;

/// Contract of the external analyzer.
pub trait AnalysisService: Send + Sync {
    /// One-time setup. Called once by the handle before any other call.
    fn initialize(&self) -> DeadsymResult<()>;

    /// Analyze one file. Request is a [`CodeRequest`], response a single
    /// result document.
    fn analyze_code(&self, request: &str) -> DeadsymResult<String>;

    /// Analyze several files together. Request is a [`WorkspaceRequest`],
    /// response is `{ "results": { filename: result } }`.
    fn analyze_workspace(&self, request: &str) -> DeadsymResult<String>;

    /// Language label for a filename.
    fn detect_language(&self, filename: &str) -> DeadsymResult<String>;
}

/// Single-file request.
#[derive(Debug, Clone, Serialize)]
pub struct CodeRequest<'a> {
    pub content: &'a str,
    pub filename: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<&'a str>,
}

/// One file of a workspace request.
#[derive(Debug, Clone, Serialize)]
pub struct WorkspaceFileRequest<'a> {
    pub content: &'a str,
    pub filename: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

/// Multi-file request.
#[derive(Debug, Clone, Serialize)]
pub struct WorkspaceRequest<'a> {
    pub files: Vec<WorkspaceFileRequest<'a>>,
}

/// Initialization state of a [`ServiceHandle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceState {
    Uninitialized,
    Initializing,
    Ready,
    Failed(String),
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => f.write_str("uninitialized"),
            Self::Initializing => f.write_str("initializing"),
            Self::Ready => f.write_str("ready"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owned, lazily initialized access to an [`AnalysisService`].
pub struct ServiceHandle {
    service: Arc<dyn AnalysisService>,
    state: Mutex<ServiceState>,
    timeout: Duration,
}

impl fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceHandle")
            .field("state", &self.state())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ServiceHandle {
    pub fn new(service: Arc<dyn AnalysisService>, timeout: Duration) -> Self {
        Self {
            service,
            state: Mutex::new(ServiceState::Uninitialized),
            timeout,
        }
    }

    pub fn state(&self) -> ServiceState {
        lock(&self.state).clone()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == ServiceState::Ready
    }

    /// Forget a failure so the next call initializes again.
    pub fn reset(&self) {
        *lock(&self.state) = ServiceState::Uninitialized;
    }

    /// Initialize if needed.
    ///
    /// Only the first caller runs initialization; callers arriving while it
    /// runs, or after it failed, get `ServiceUnavailable`.
    pub fn ensure_ready(&self) -> DeadsymResult<()> {
        {
            let mut state = lock(&self.state);
            match *state {
                ServiceState::Ready => return Ok(()),
                ServiceState::Uninitialized => {}
                ref other => return Err(DeadsymError::unavailable(other.to_string())),
            }
            *state = ServiceState::Initializing;
        }

        log_info("initializing analysis service");
        let outcome = self.run_with_timeout("service initialization", |svc| svc.initialize());

        let mut state = lock(&self.state);
        match outcome {
            Ok(()) => {
                *state = ServiceState::Ready;
                log_info("analysis service ready");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "analysis service initialization failed");
                *state = ServiceState::Failed(e.to_string());
                Err(DeadsymError::unavailable(state.to_string()))
            }
        }
    }

    pub fn analyze_code(&self, request: String) -> DeadsymResult<String> {
        self.ensure_ready()?;
        self.run_with_timeout("analyzeCode", move |svc| svc.analyze_code(&request))
    }

    pub fn analyze_workspace(&self, request: String) -> DeadsymResult<String> {
        self.ensure_ready()?;
        self.run_with_timeout("analyzeWorkspace", move |svc| {
            svc.analyze_workspace(&request)
        })
    }

    pub fn detect_language(&self, filename: &str) -> DeadsymResult<String> {
        self.ensure_ready()?;
        let filename = filename.to_string();
        self.run_with_timeout("detectLanguage", move |svc| svc.detect_language(&filename))
    }

    /// Run `f` on a worker thread and wait at most the configured timeout.
    ///
    /// A call that overruns is abandoned here; its result is dropped.
    /// [`ProcessService`] bounds its own processes with the same timeout.
    fn run_with_timeout<T, F>(&self, operation: &str, f: F) -> DeadsymResult<T>
    where
        T: Send + 'static,
        F: FnOnce(Arc<dyn AnalysisService>) -> DeadsymResult<T> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let service = Arc::clone(&self.service);
        thread::Builder::new()
            .name("deadsym-service".to_string())
            .spawn(move || {
                let _ = tx.send(f(service));
            })
            .map_err(|e| DeadsymError::Internal {
                message: format!("failed to spawn service worker: {e}"),
            })?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                warn!(operation, millis = self.timeout.as_millis() as u64, "service call timed out");
                Err(DeadsymError::timeout(operation, self.timeout.as_millis() as u64))
            }
            Err(RecvTimeoutError::Disconnected) => Err(DeadsymError::service(format!(
                "{operation}: worker exited without a result"
            ))),
        }
    }
}

/// Poll interval while waiting for a service process.
const POLL_INTERVAL_MS: u64 = 10;

/// Service backed by an external command.
///
/// Each call spawns `command... <operation>`, writes the request as one
/// line on stdin and reads the whole of stdout as the response. Operations
/// are `initialize`, `analyze`, `analyze-workspace` and `detect-language`.
///
/// A process still running after the timeout is killed and reaped.
#[derive(Debug, Clone)]
pub struct ProcessService {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl ProcessService {
    pub fn new(command: &[String]) -> DeadsymResult<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| DeadsymError::invalid_argument("service command is empty"))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            timeout: Duration::from_millis(DEFAULT_SERVICE_TIMEOUT_MS),
        })
    }

    /// Bound on each spawned process.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn call(&self, operation: &str, payload: &str) -> DeadsymResult<String> {
        debug!(program = %self.program, operation, "calling analysis service");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(operation)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| DeadsymError::service(format!("failed to start {}: {e}", self.program)))?;

        // Writer and readers run concurrently so neither pipe can fill up
        // while the other side waits.
        let writer = child.stdin.take().map(|mut stdin| {
            let request = format!("{payload}\n");
            thread::spawn(move || stdin.write_all(request.as_bytes()))
        });
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    warn!(program = %self.program, operation, "service process killed after timeout");
                    return Err(DeadsymError::timeout(operation, self.timeout.as_millis() as u64));
                }
                Ok(None) => thread::sleep(Duration::from_millis(POLL_INTERVAL_MS)),
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(DeadsymError::service(format!("service did not finish: {e}")));
                }
            }
        };

        if let Some(Ok(Err(e))) = writer.map(|w| w.join()) {
            debug!(operation, error = %e, "service closed stdin early");
        }
        let stdout = collect(stdout);
        let stderr = collect(stderr);

        if !status.success() {
            return Err(DeadsymError::service(format!(
                "{operation} exited with {}: {}",
                status,
                String::from_utf8_lossy(&stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

/// Read a pipe to the end on its own thread.
fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn collect(reader: Option<thread::JoinHandle<Vec<u8>>>) -> Vec<u8> {
    reader.and_then(|r| r.join().ok()).unwrap_or_default()
}

impl AnalysisService for ProcessService {
    fn initialize(&self) -> DeadsymResult<()> {
        self.call("initialize", "{}").map(|_| ())
    }

    fn analyze_code(&self, request: &str) -> DeadsymResult<String> {
        self.call("analyze", request)
    }

    fn analyze_workspace(&self, request: &str) -> DeadsymResult<String> {
        self.call("analyze-workspace", request)
    }

    fn detect_language(&self, filename: &str) -> DeadsymResult<String> {
        let payload = serde_json::json!({ "filename": filename }).to_string();
        self.call("detect-language", &payload)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-process fake service.

    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub struct FakeService {
        pub init_fails: bool,
        pub init_delay: Duration,
        pub code_response: String,
        pub workspace_response: String,
        pub language: String,
        pub init_calls: AtomicUsize,
        pub requests: Mutex<Vec<String>>,
    }

    impl Default for FakeService {
        fn default() -> Self {
            Self {
                init_fails: false,
                init_delay: Duration::ZERO,
                code_response: "{}".to_string(),
                workspace_response: r#"{"results":{}}"#.to_string(),
                language: "python".to_string(),
                init_calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl FakeService {
        pub fn init_count(&self) -> usize {
            self.init_calls.load(Ordering::SeqCst)
        }

        pub fn recorded(&self) -> Vec<String> {
            lock(&self.requests).clone()
        }
    }

    impl AnalysisService for FakeService {
        fn initialize(&self) -> DeadsymResult<()> {
            self.init_calls.fetch_add(1, Ordering::SeqCst);
            if !self.init_delay.is_zero() {
                thread::sleep(self.init_delay);
            }
            if self.init_fails {
                return Err(DeadsymError::service("backend missing"));
            }
            Ok(())
        }

        fn analyze_code(&self, request: &str) -> DeadsymResult<String> {
            lock(&self.requests).push(request.to_string());
            Ok(self.code_response.clone())
        }

        fn analyze_workspace(&self, request: &str) -> DeadsymResult<String> {
            lock(&self.requests).push(request.to_string());
            Ok(self.workspace_response.clone())
        }

        fn detect_language(&self, _filename: &str) -> DeadsymResult<String> {
            Ok(self.language.clone())
        }
    }
}
