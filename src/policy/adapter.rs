//! Policy Adapter
//!
//! Wraps the external decision function: feeds it a [`FeatureVector`], bounds
//! the call with a timeout and decodes the returned action scores into a
//! [`Direction`]. Every failure comes back as a [`PolicyError`] value; nothing
//! here panics into the tick loop.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::task::JoinHandle;
use tracing::trace;

use super::error::PolicyError;
use super::features::FeatureVector;
use crate::game::Direction;

/// Number of action scores the policy must return
pub const ACTION_COUNT: usize = 4;

/// An external decision function.
///
/// Implementations return one score per action, in the order
/// Up, Right, Down, Left. The call may be slow and may fail.
pub trait Policy: Send + Sync {
    /// Score the four actions for the given features
    fn evaluate(
        &self,
        features: FeatureVector,
    ) -> BoxFuture<'static, Result<Vec<f32>, PolicyError>>;

    /// Short human-readable name for status displays
    fn name(&self) -> &str;
}

/// Decode raw action scores into a direction.
///
/// Takes the argmax over exactly [`ACTION_COUNT`] finite scores; ties go to
/// the lowest index.
pub fn decode_scores(scores: &[f32]) -> Result<Direction, PolicyError> {
    if scores.len() != ACTION_COUNT {
        return Err(PolicyError::WrongShape {
            expected: ACTION_COUNT,
            actual: scores.len(),
        });
    }

    if let Some((index, &value)) = scores.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(PolicyError::NonFinite { index, value });
    }

    let mut best = 0;
    for (index, &score) in scores.iter().enumerate().skip(1) {
        if score > scores[best] {
            best = index;
        }
    }

    Direction::from_action_index(best).ok_or(PolicyError::WrongShape {
        expected: ACTION_COUNT,
        actual: scores.len(),
    })
}

/// Result of collecting a [`PendingDecision`] at a tick boundary
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionOutcome {
    /// The policy answered in time
    Ready(Direction),
    /// The policy answered with an error, or the task died
    Failed(PolicyError),
    /// The policy had not answered by the tick boundary; the call was cancelled
    Stale,
}

/// A policy call running in the background for a given tick.
///
/// Dropping it cancels the call, so a decision can never be applied after
/// its owner has moved on.
#[derive(Debug)]
pub struct PendingDecision {
    issued_at: u64,
    handle: JoinHandle<Result<Direction, PolicyError>>,
}

impl PendingDecision {
    /// Tick counter value at which the request was issued
    pub fn issued_at(&self) -> u64 {
        self.issued_at
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Take the decision without waiting for it
    pub fn collect(mut self) -> DecisionOutcome {
        match (&mut self.handle).now_or_never() {
            Some(Ok(Ok(direction))) => DecisionOutcome::Ready(direction),
            Some(Ok(Err(err))) => DecisionOutcome::Failed(err),
            Some(Err(join_err)) => DecisionOutcome::Failed(PolicyError::Unavailable(format!(
                "policy task failed: {join_err}"
            ))),
            None => {
                self.handle.abort();
                DecisionOutcome::Stale
            }
        }
    }

    /// Wait for the decision
    pub async fn wait(mut self) -> Result<Direction, PolicyError> {
        match (&mut self.handle).await {
            Ok(result) => result,
            Err(join_err) => Err(PolicyError::Unavailable(format!(
                "policy task failed: {join_err}"
            ))),
        }
    }
}

impl Drop for PendingDecision {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Invokes a [`Policy`] under a time budget and decodes its answer
#[derive(Clone)]
pub struct PolicyAdapter {
    policy: Arc<dyn Policy>,
    timeout: Duration,
}

impl PolicyAdapter {
    pub fn new(policy: Arc<dyn Policy>, timeout: Duration) -> Self {
        Self { policy, timeout }
    }

    pub fn policy_name(&self) -> &str {
        self.policy.name()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Ask the policy for a direction and wait for it, up to the timeout
    pub async fn decide(&self, features: FeatureVector) -> Result<Direction, PolicyError> {
        decide_with(Arc::clone(&self.policy), self.timeout, features).await
    }

    /// Start a background decision for `tick`; collect it later with
    /// [`PendingDecision::collect`]. Must be called inside a tokio runtime.
    pub fn request(&self, tick: u64, features: FeatureVector) -> PendingDecision {
        let policy = Arc::clone(&self.policy);
        let timeout = self.timeout;
        trace!(tick, ?features, "policy decision requested");
        PendingDecision {
            issued_at: tick,
            handle: tokio::spawn(decide_with(policy, timeout, features)),
        }
    }
}

async fn decide_with(
    policy: Arc<dyn Policy>,
    timeout: Duration,
    features: FeatureVector,
) -> Result<Direction, PolicyError> {
    let scores = tokio::time::timeout(timeout, policy.evaluate(features))
        .await
        .map_err(|_| PolicyError::Timeout(timeout))??;
    decode_scores(&scores)
}
