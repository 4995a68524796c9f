//! One game plus its decision pipeline.
//!
//! Each tick runs in two stages. The commit stage collects whatever the
//! policy has answered so far (without waiting), arbitrates it against
//! manual input and steps the engine. It then starts a background decision
//! for the new state, which the next tick will collect. A decision still
//! running at that point is cancelled and counted as stale.

use tracing::{debug, warn};

use crate::game::{Direction, GamePhase, GameSnapshot, SimulationEngine, StepOutcome};
use crate::input::{DirectionSource, Resolution, arbitrate, arbitrate_opening};
use crate::policy::{DecisionOutcome, PendingDecision, PolicyAdapter, build_features};

/// Commands accepted by a running session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Manual direction for the next tick
    Steer(Direction),
    /// Start when not started, restart when over
    Activate,
    Start,
    Restart,
}

/// Running tally of where applied directions came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecisionStats {
    pub manual: u64,
    pub policy: u64,
    pub previous: u64,
    /// Policy calls that errored, timed out or returned malformed output
    pub failures: u64,
    /// Policy calls still running at the next tick boundary
    pub stale: u64,
}

impl DecisionStats {
    fn record(&mut self, source: DirectionSource) {
        match source {
            DirectionSource::Manual => self.manual += 1,
            DirectionSource::Policy => self.policy += 1,
            DirectionSource::Previous => self.previous += 1,
        }
    }
}

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub resolution: Resolution,
    pub outcome: StepOutcome,
}

/// Everything observers need after a tick
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub game: GameSnapshot,
    pub decisions: DecisionStats,
    pub last_source: Option<DirectionSource>,
    pub tick: u64,
    pub policy_name: String,
}

/// Owns the engine and the in-flight policy decision
pub struct GameSession {
    engine: SimulationEngine,
    adapter: PolicyAdapter,
    pending: Option<PendingDecision>,
    manual: Option<Direction>,
    tick: u64,
    stats: DecisionStats,
    last_source: Option<DirectionSource>,
}

impl GameSession {
    pub fn new(engine: SimulationEngine, adapter: PolicyAdapter) -> Self {
        Self {
            engine,
            adapter,
            pending: None,
            manual: None,
            tick: 0,
            stats: DecisionStats::default(),
            last_source: None,
        }
    }

    pub fn engine(&self) -> &SimulationEngine {
        &self.engine
    }

    pub fn phase(&self) -> GamePhase {
        self.engine.phase()
    }

    pub fn stats(&self) -> DecisionStats {
        self.stats
    }

    pub fn has_pending_decision(&self) -> bool {
        self.pending.is_some()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            game: self.engine.snapshot(),
            decisions: self.stats,
            last_source: self.last_source,
            tick: self.tick,
            policy_name: self.adapter.policy_name().to_string(),
        }
    }

    /// Apply a control message. Returns true if a new game began.
    pub fn handle_control(&mut self, control: Control) -> bool {
        match control {
            Control::Steer(direction) => {
                self.steer(direction);
                false
            }
            Control::Activate => match self.engine.phase() {
                GamePhase::NotStarted => self.start(),
                GamePhase::GameOver => self.restart(),
                GamePhase::Running => false,
            },
            Control::Start => self.start(),
            Control::Restart => self.restart(),
        }
    }

    /// Record manual input for the next tick; the latest one wins
    pub fn steer(&mut self, direction: Direction) {
        if self.engine.phase() != GamePhase::Running {
            debug!(?direction, "manual input ignored outside a running game");
            return;
        }
        self.manual = Some(direction);
    }

    pub fn start(&mut self) -> bool {
        if !self.engine.start() {
            return false;
        }
        self.begin_game();
        true
    }

    pub fn restart(&mut self) -> bool {
        if !self.engine.restart() {
            return false;
        }
        self.begin_game();
        true
    }

    /// Run one tick. Returns `None` when the game is not running.
    ///
    /// Must be called inside a tokio runtime, since it spawns the next
    /// policy request.
    pub fn tick(&mut self) -> Option<TickReport> {
        if self.engine.phase() != GamePhase::Running {
            return None;
        }
        self.tick += 1;

        let suggestion = self.collect_suggestion();
        let manual = self.manual.take();
        let state = self.engine.state();
        let resolution = if state.steps == 0 {
            arbitrate_opening(state.direction, manual, suggestion)
        } else {
            arbitrate(state.direction, manual, suggestion)
        };
        self.stats.record(resolution.source);
        self.last_source = Some(resolution.source);

        let outcome = self.engine.step(resolution.direction);

        if self.engine.phase() == GamePhase::Running {
            self.request_decision();
        }

        Some(TickReport {
            tick: self.tick,
            resolution,
            outcome,
        })
    }

    /// Drop any in-flight decision; it can no longer be applied
    pub fn cancel_pending(&mut self) {
        if self.pending.take().is_some() {
            debug!(tick = self.tick, "pending policy decision cancelled");
        }
    }

    fn begin_game(&mut self) {
        self.cancel_pending();
        self.manual = None;
        self.last_source = None;
        self.request_decision();
    }

    fn request_decision(&mut self) {
        let features = build_features(self.engine.state());
        self.pending = Some(self.adapter.request(self.tick, features));
    }

    fn collect_suggestion(&mut self) -> Option<Direction> {
        let pending = self.pending.take()?;
        let issued_at = pending.issued_at();

        match pending.collect() {
            DecisionOutcome::Ready(direction) => Some(direction),
            DecisionOutcome::Failed(err) => {
                self.stats.failures += 1;
                if err.is_malformed() {
                    warn!(tick = self.tick, %err, "malformed policy output ignored");
                } else {
                    debug!(tick = self.tick, %err, "policy decision failed");
                }
                None
            }
            DecisionOutcome::Stale => {
                self.stats.stale += 1;
                debug!(tick = self.tick, issued_at, "stale policy decision discarded");
                None
            }
        }
    }
}
