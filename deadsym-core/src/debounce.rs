//! Debounced per-file re-analysis.
//!
//! Every [`DebounceQueue::schedule`] call for a filename cancels whatever is
//! pending for it and arms a fresh timer. When a timer survives its whole
//! window, the latest content is analyzed once on the blocking pool and the
//! result is delivered on the queue's channel. Filenames debounce
//! independently.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use crate::config::DeadsymConfig;
use crate::engine::Engine;
use crate::result::AnalysisResult;

/// A delivered analysis: filename and its result.
pub type Delivery = (String, AnalysisResult);

type Analyze = dyn Fn(&str, &str) -> AnalysisResult + Send + Sync;

/// Generation-tagged pending task per filename.
type Pending = Arc<Mutex<HashMap<String, (u64, AbortHandle)>>>;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Timer-driven work queue keyed by filename.
///
/// Must be used from within a tokio runtime.
pub struct DebounceQueue {
    delay: Duration,
    analyze: Arc<Analyze>,
    pending: Pending,
    generation: AtomicU64,
    tx: mpsc::UnboundedSender<Delivery>,
}

impl DebounceQueue {
    /// Queue running `analyze(filename, content)` after `delay` of quiet.
    pub fn new<F>(delay: Duration, analyze: F) -> (Self, mpsc::UnboundedReceiver<Delivery>)
    where
        F: Fn(&str, &str) -> AnalysisResult + Send + Sync + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let queue = Self {
            delay,
            analyze: Arc::new(analyze),
            pending: Arc::new(Mutex::new(HashMap::new())),
            generation: AtomicU64::new(0),
            tx,
        };
        (queue, rx)
    }

    /// Queue backed by the engine, so unchanged content is a cache hit.
    pub fn for_engine(delay: Duration, engine: Engine) -> (Self, mpsc::UnboundedReceiver<Delivery>) {
        Self::new(delay, move |filename, content| {
            engine.analyze_file(filename, content)
        })
    }

    /// Engine-backed queue using the configured `auto_analyze_delay_ms`.
    pub fn from_config(
        config: &DeadsymConfig,
        engine: Engine,
    ) -> (Self, mpsc::UnboundedReceiver<Delivery>) {
        Self::for_engine(config.auto_analyze_delay(), engine)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// (Re)arm the timer for `filename` with the latest `content`.
    pub fn schedule(&self, filename: impl Into<String>, content: impl Into<String>) {
        let filename = filename.into();
        let content = content.into();
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;

        let delay = self.delay;
        let analyze = Arc::clone(&self.analyze);
        let pending = Arc::clone(&self.pending);
        let tx = self.tx.clone();
        let key = filename.clone();

        let mut guard = lock(&self.pending);
        if let Some((_, previous)) = guard.remove(&filename) {
            previous.abort();
            debug!(file = %filename, "debounce re-armed");
        }

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            debug!(file = %key, "debounce fired");

            let name = key.clone();
            let result = match tokio::task::spawn_blocking(move || analyze(&content, &name)).await
            {
                Ok(result) => result,
                Err(e) => {
                    warn!(file = %key, error = %e, "debounced analysis failed");
                    AnalysisResult::empty()
                }
            };

            {
                let mut pending = lock(&pending);
                if pending.get(&key).map(|(g, _)| *g) == Some(generation) {
                    pending.remove(&key);
                }
            }
            let _ = tx.send((key, result));
        });

        guard.insert(filename, (generation, task.abort_handle()));
    }

    /// Drop the pending run for `filename`. Returns whether one existed.
    pub fn cancel(&self, filename: &str) -> bool {
        match lock(&self.pending).remove(filename) {
            Some((_, handle)) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Number of filenames with an armed timer.
    pub fn pending(&self) -> usize {
        lock(&self.pending).len()
    }
}

impl Drop for DebounceQueue {
    fn drop(&mut self) {
        for (_, (_, handle)) in lock(&self.pending).drain() {
            handle.abort();
        }
    }
}
