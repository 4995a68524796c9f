//! Policy Snake - a Snake game steered by a trained policy network
//!
//! This library provides:
//! - Core simulation: board, snake, food, scoring (game module)
//! - The policy adapter around the trained model (policy module)
//! - Arbitration between keyboard input and the policy (input module)
//! - The fixed-cadence tick loop (scheduler module)
//! - TUI rendering and the interactive front end (render, modes modules)

pub mod game;
pub mod input;
pub mod logging;
pub mod metrics;
pub mod modes;
pub mod policy;
pub mod render;
pub mod scheduler;
