//! Tick Scheduler and the per-tick decision loop it drives

pub mod session;
pub mod ticker;

pub use session::{Control, DecisionStats, GameSession, SessionSnapshot, TickReport};
pub use ticker::{SchedulerHandle, TickScheduler};
