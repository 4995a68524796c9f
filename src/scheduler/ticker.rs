//! Tick Scheduler
//!
//! A single tokio task owns the [`GameSession`] and is the only code that
//! mutates it. The task multiplexes the tick timer with a control channel
//! and publishes a [`SessionSnapshot`] on a watch channel after every change,
//! so snapshot `n` always reflects ticks `1..=n` in order.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info};

use super::session::{Control, GameSession, SessionSnapshot};

pub struct TickScheduler;

impl TickScheduler {
    /// Spawn the tick loop for `session`, firing every `period`.
    ///
    /// Must be called inside a tokio runtime. The first tick fires one full
    /// period after spawning.
    pub fn spawn(session: GameSession, period: Duration) -> SchedulerHandle {
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(session.snapshot());

        info!(period_ms = period.as_millis() as u64, "tick scheduler started");
        let task = tokio::spawn(run_loop(session, period, control_rx, shutdown_rx, snapshot_tx));

        SchedulerHandle {
            control: control_tx,
            snapshots: snapshot_rx,
            shutdown: Some(shutdown_tx),
            task,
        }
    }
}

/// Handle to a running tick loop. Dropping it stops the loop.
pub struct SchedulerHandle {
    control: mpsc::UnboundedSender<Control>,
    snapshots: watch::Receiver<SessionSnapshot>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<GameSession>,
}

impl SchedulerHandle {
    /// Queue a control message. Returns false if the loop has stopped.
    pub fn send(&self, control: Control) -> bool {
        self.control.send(control).is_ok()
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that is notified on every publish
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Stop ticking and hand the session back, so a new scheduler can be
    /// started on it later. Any in-flight policy decision is cancelled.
    pub async fn stop(mut self) -> Result<GameSession, JoinError> {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        (&mut self.task).await
    }
}

async fn run_loop(
    mut session: GameSession,
    period: Duration,
    mut control_rx: mpsc::UnboundedReceiver<Control>,
    mut shutdown_rx: oneshot::Receiver<()>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
) -> GameSession {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            // controls queued before a stop request are still applied
            maybe_control = control_rx.recv() => {
                let Some(control) = maybe_control else { break };
                if session.handle_control(control) {
                    // a new game gets a full period before its first step
                    ticker.reset();
                }
                snapshot_tx.send_replace(session.snapshot());
            }

            _ = &mut shutdown_rx => break,

            _ = ticker.tick() => {
                if let Some(report) = session.tick() {
                    debug!(
                        tick = report.tick,
                        direction = ?report.resolution.direction,
                        source = ?report.resolution.source,
                        outcome = ?report.outcome,
                        "tick"
                    );
                    snapshot_tx.send_replace(session.snapshot());
                }
            }
        }
    }

    session.cancel_pending();
    info!("tick scheduler stopped");
    session
}
