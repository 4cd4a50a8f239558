use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use log::warn;

/// Callback invoked on every trigger firing.
pub type TriggerCallback = Box<dyn FnMut() + Send + 'static>;

/// Coarse periodic trigger that drives the look-ahead scheduler.
///
/// The period is a hint: firings may come late or bunch up, and the
/// scheduler copes with both. After `cancel` returns the callback must not be
/// invoked again.
pub trait TriggerSource: Send {
    /// Begin invoking `callback` roughly every `period`, replacing any
    /// previously registered callback.
    fn start(&mut self, period: Duration, callback: TriggerCallback);

    fn cancel(&mut self);
}

type Slot = Arc<Mutex<Option<TriggerCallback>>>;

/// Trigger that only fires when told to.
///
/// Keep a [`ManualTriggerHandle`] to step the scheduler deterministically.
#[derive(Default)]
pub struct ManualTrigger {
    slot: Slot,
    period: Option<Duration>,
}

/// Fires a [`ManualTrigger`] from outside.
#[derive(Clone)]
pub struct ManualTriggerHandle {
    slot: Slot,
}

impl ManualTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> ManualTriggerHandle {
        ManualTriggerHandle {
            slot: Arc::clone(&self.slot),
        }
    }

    /// Period passed to the last `start`, if still active.
    pub fn period(&self) -> Option<Duration> {
        self.period
    }
}

impl TriggerSource for ManualTrigger {
    fn start(&mut self, period: Duration, callback: TriggerCallback) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(callback);
        self.period = Some(period);
    }

    fn cancel(&mut self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.period = None;
    }
}

impl ManualTriggerHandle {
    /// Run the registered callback once. Returns `false` if nothing is registered.
    pub fn fire(&self) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.as_mut() {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

/// Fires from a background thread on a fixed period.
///
/// Deadlines advance by whole periods so sleep overshoot does not stretch
/// the cadence; if the thread falls behind by more than a period it skips
/// ahead instead of firing a burst.
#[derive(Default)]
pub struct IntervalTrigger {
    worker: Option<Worker>,
}

struct Worker {
    cancelled: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl IntervalTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.worker.is_some()
    }
}

impl TriggerSource for IntervalTrigger {
    fn start(&mut self, period: Duration, mut callback: TriggerCallback) {
        self.cancel();

        let period = period.max(Duration::from_millis(1));
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);

        let spawned = thread::Builder::new()
            .name("saavy-click-trigger".into())
            .spawn(move || {
                let mut deadline = Instant::now();
                while !flag.load(Ordering::Acquire) {
                    callback();

                    deadline += period;
                    let now = Instant::now();
                    if deadline < now {
                        deadline = now + period;
                    }
                    while !flag.load(Ordering::Acquire) {
                        let now = Instant::now();
                        if now >= deadline {
                            break;
                        }
                        thread::park_timeout(deadline - now);
                    }
                }
            });

        match spawned {
            Ok(thread) => self.worker = Some(Worker { cancelled, thread }),
            Err(e) => warn!("failed to spawn trigger thread: {e}"),
        }
    }

    fn cancel(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.cancelled.store(true, Ordering::Release);
            worker.thread.thread().unpark();
            if worker.thread.thread().id() != thread::current().id() {
                let _ = worker.thread.join();
            }
        }
    }
}

impl Drop for IntervalTrigger {
    fn drop(&mut self) {
        self.cancel();
    }
}
