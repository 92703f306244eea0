//! Runs a `FocusTimer` in the background, one tick per second.

use std::sync::Arc;
use std::time::Duration;

use flow_core::{FlowResult, FocusSnapshot, FocusTimer, Preferences};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub const TICK: Duration = Duration::from_secs(1);

/// A live focus countdown. Controls take effect immediately and every change
/// is published as a `FocusSnapshot`. The ticking task is aborted when the
/// session is stopped or dropped.
pub struct FocusSession {
    timer: Arc<Mutex<FocusTimer>>,
    tx: Arc<watch::Sender<FocusSnapshot>>,
    snapshots: watch::Receiver<FocusSnapshot>,
    handle: JoinHandle<()>,
}

impl FocusSession {
    pub fn spawn(prefs: &Preferences) -> FlowResult<Self> {
        Self::with_tick(prefs, TICK)
    }

    pub fn with_tick(prefs: &Preferences, tick: Duration) -> FlowResult<Self> {
        let timer = FocusTimer::new(prefs)?;
        let (tx, snapshots) = watch::channel(timer.snapshot());
        let timer = Arc::new(Mutex::new(timer));
        let tx = Arc::new(tx);
        let handle = tokio::spawn(run_ticks(timer.clone(), tx.clone(), tick));
        Ok(Self {
            timer,
            tx,
            snapshots,
            handle,
        })
    }

    async fn control<R>(&self, f: impl FnOnce(&mut FocusTimer) -> R) -> R {
        let mut timer = self.timer.lock().await;
        let out = f(&mut timer);
        self.tx.send_replace(timer.snapshot());
        out
    }

    pub async fn start(&self) {
        self.control(FocusTimer::start).await
    }

    pub async fn pause(&self) {
        self.control(FocusTimer::pause).await
    }

    pub async fn toggle(&self) {
        self.control(FocusTimer::toggle).await
    }

    pub async fn reset(&self) {
        self.control(FocusTimer::reset).await
    }

    pub async fn extend(&self, secs: u32) {
        self.control(|t| t.extend(secs)).await
    }

    pub async fn reconfigure(&self, prefs: &Preferences) -> FlowResult<()> {
        self.control(|t| t.reconfigure(prefs)).await
    }

    pub fn snapshot(&self) -> FocusSnapshot {
        *self.snapshots.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<FocusSnapshot> {
        self.snapshots.clone()
    }

    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for FocusSession {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn run_ticks(timer: Arc<Mutex<FocusTimer>>, tx: Arc<watch::Sender<FocusSnapshot>>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let mut guard = timer.lock().await;
        if !guard.is_running() {
            continue;
        }
        let change = guard.tick();
        let snapshot = guard.snapshot();
        drop(guard);
        tx.send_replace(snapshot);

        if let Some(change) = change {
            tracing::info!(
                finished = ?change.finished,
                next = ?change.next,
                secs = change.next_duration_secs,
                "{}",
                change.next.headline()
            );
        }
    }
}
