//! Core game logic module for Snake
//!
//! This module contains the simulation without any I/O, policy or rendering
//! dependencies. The [`SimulationEngine`] owns the authoritative state; every
//! other component works from a [`GameSnapshot`].

pub mod action;
pub mod board;
pub mod config;
pub mod engine;
pub mod state;

// Re-export commonly used types
pub use action::Direction;
pub use board::Board;
pub use config::GameConfig;
pub use engine::{SimulationEngine, StepOutcome};
pub use state::{CollisionType, GamePhase, GameSnapshot, GameState, Position, Snake};
