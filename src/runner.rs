//! Driving a search to completion one paced step at a time, and sharing an engine between
//! threads without ever letting two steps overlap.
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::thread;

use grid_util::point::Point;
use log::{info, warn};

use crate::engine::{SearchEngine, StepResult};
use crate::error::{Result, VisualizerError};

/// Runs the search step by step. After every step `observer` gets a view of the engine (the
/// rendering pass) and may stop the run early with [ControlFlow::Break]. Between steps the
/// thread sleeps for the configured step delay.
pub fn run_paced<F>(engine: &mut SearchEngine, mut observer: F) -> Result<StepResult>
where
    F: FnMut(&SearchEngine, StepResult) -> ControlFlow<()>,
{
    loop {
        let result = engine.step()?;
        if observer(&*engine, result).is_break() || result.is_terminal() {
            return Ok(result);
        }
        let delay = engine.config().step_delay();
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }
}

struct Shared {
    engine: Mutex<SearchEngine>,
    running: AtomicBool,
    reset_pending: AtomicBool,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SearchEngine> {
        self.engine.lock().unwrap_or_else(|poisoned| self.recover(poisoned))
    }

    /// A panic may have interrupted a step halfway, so the session is discarded.
    fn recover<'a>(
        &'a self,
        poisoned: PoisonError<MutexGuard<'a, SearchEngine>>,
    ) -> MutexGuard<'a, SearchEngine> {
        warn!("Engine lock poisoned by a panicked caller, resetting the grid");
        let mut engine = poisoned.into_inner();
        engine.reset();
        self.engine.clear_poison();
        engine
    }

    /// Applies a reset that was handed over while a paced run held the engine.
    fn apply_pending_reset(&self, engine: &mut SearchEngine) -> bool {
        if self.reset_pending.swap(false, Ordering::SeqCst) {
            engine.reset();
            true
        } else {
            false
        }
    }
}

/// A [SearchEngine] that can be handed to several threads. Steps, runs and selections are
/// rejected with [VisualizerError::EngineBusy] while another one is in flight; they are never
/// queued or interleaved. [reset](Self::reset) always goes through and cancels a paced run
/// between two of its steps.
///
/// Closures given to [with](Self::with) or to [run_paced](Self::run_paced) must not call
/// [with](Self::with) on the same [SharedEngine].
#[derive(Clone)]
pub struct SharedEngine {
    inner: Arc<Shared>,
}

/// Clears the running flag however the paced run ends, then applies a reset that arrived too
/// late for the run to see it.
struct RunningGuard<'a>(&'a Shared);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.running.store(false, Ordering::SeqCst);
        if self.0.reset_pending.load(Ordering::SeqCst) {
            let mut engine = self.0.lock();
            self.0.apply_pending_reset(&mut *engine);
        }
    }
}

impl SharedEngine {
    pub fn new(engine: SearchEngine) -> SharedEngine {
        SharedEngine {
            inner: Arc::new(Shared {
                engine: Mutex::new(engine),
                running: AtomicBool::new(false),
                reset_pending: AtomicBool::new(false),
            }),
        }
    }

    fn try_engine(&self) -> Result<MutexGuard<'_, SearchEngine>> {
        if self.inner.running.load(Ordering::SeqCst) {
            warn!("Rejected call: a paced run is in progress");
            return Err(VisualizerError::EngineBusy);
        }
        match self.inner.engine.try_lock() {
            Ok(engine) => Ok(engine),
            Err(TryLockError::Poisoned(poisoned)) => Ok(self.inner.recover(poisoned)),
            Err(TryLockError::WouldBlock) => {
                warn!("Rejected call: engine is busy");
                Err(VisualizerError::EngineBusy)
            }
        }
    }

    pub fn select_cell(&self, point: Point) -> Result<()> {
        self.try_engine()?.select_cell(point)
    }

    pub fn step(&self) -> Result<StepResult> {
        self.try_engine()?.step()
    }

    pub fn run(&self) -> Result<StepResult> {
        self.try_engine()?.run()
    }

    /// Paced run that only holds the engine during each step and its observation, so readers
    /// and [reset](Self::reset) get through between steps. The observer sees the engine itself,
    /// still locked, right after the step. Returns `Ok(None)` if a reset cancelled the run.
    pub fn run_paced<F>(&self, mut observer: F) -> Result<Option<StepResult>>
    where
        F: FnMut(&SearchEngine, StepResult) -> ControlFlow<()>,
    {
        if self
            .inner
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Rejected paced run: another run is in progress");
            return Err(VisualizerError::EngineBusy);
        }
        let _guard = RunningGuard(&self.inner);
        let generation = self.inner.lock().generation();
        loop {
            let mut engine = self.inner.lock();
            if engine.generation() != generation || self.inner.apply_pending_reset(&mut *engine) {
                info!("Paced run cancelled by reset");
                return Ok(None);
            }
            let result = engine.step()?;
            let flow = observer(&*engine, result);
            if self.inner.apply_pending_reset(&mut *engine) {
                info!("Paced run cancelled by reset");
                return Ok(None);
            }
            if flow.is_break() || result.is_terminal() {
                return Ok(Some(result));
            }
            let delay = engine.config().step_delay();
            drop(engine);
            if !delay.is_zero() {
                thread::sleep(delay);
            }
        }
    }

    /// Discards the grid and session. Waits for an in-flight step to finish, never for a whole
    /// paced run. While a paced run is observing its step the reset is left to that run, which
    /// applies it before releasing the engine.
    pub fn reset(&self) {
        match self.inner.engine.try_lock() {
            Ok(mut engine) => engine.reset(),
            Err(TryLockError::Poisoned(poisoned)) => {
                // Recovery already resets
                drop(self.inner.recover(poisoned));
            }
            Err(TryLockError::WouldBlock) if self.is_running() => {
                self.inner.reset_pending.store(true, Ordering::SeqCst);
                // The run may have finished before it could see the request
                if !self.is_running() {
                    let mut engine = self.inner.lock();
                    self.inner.apply_pending_reset(&mut *engine);
                }
            }
            Err(TryLockError::WouldBlock) => self.inner.lock().reset(),
        }
    }

    /// Read access for rendering.
    pub fn with<R>(&self, f: impl FnOnce(&SearchEngine) -> R) -> R {
        f(&*self.inner.lock())
    }

    /// Whether a paced run currently owns the engine.
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }
}
