use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::action::Direction;
use super::state::Position;

/// Configuration for the game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Width of the game grid
    pub grid_width: usize,
    /// Height of the game grid
    pub grid_height: usize,
    /// The snake's single starting cell
    pub initial_head: Position,
    /// Direction before the first tick
    pub initial_direction: Direction,
    /// Food cell of the very first game; restarts always resample
    pub initial_food: Option<Position>,
    /// Score added for each food eaten
    pub food_reward: u32,
    /// Period of the simulation tick
    pub tick_interval_ms: u64,
    /// Budget for a single policy call, defaults to the tick period
    pub policy_timeout_ms: Option<u64>,
    /// Seed for food placement; entropy when absent
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_width: 20,
            grid_height: 20,
            initial_head: Position::new(10, 10),
            initial_direction: Direction::Down,
            initial_food: Some(Position::new(15, 15)),
            food_reward: 10,
            tick_interval_ms: 150,
            policy_timeout_ms: None,
            seed: None,
        }
    }
}

impl GameConfig {
    /// Create a new configuration with custom grid size.
    ///
    /// The starting cell is moved to the middle of the grid and the fixed
    /// first food cell is dropped if it no longer fits.
    pub fn new(width: usize, height: usize) -> Self {
        let defaults = Self::default();
        let initial_head = Position::new((width / 2) as i32, (height / 2) as i32);
        let initial_food = defaults.initial_food.filter(|food| {
            (food.x as usize) < width && (food.y as usize) < height && *food != initial_head
        });
        Self {
            grid_width: width,
            grid_height: height,
            initial_head,
            initial_food,
            ..defaults
        }
    }

    /// Change the grid size, keeping every other setting.
    ///
    /// The starting cell is only moved to the middle when it falls off the
    /// new grid, and the fixed first food cell is dropped when it no longer
    /// fits or lands on the starting cell.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.grid_width = width;
        self.grid_height = height;

        if !self.contains(self.initial_head) {
            self.initial_head = Position::new((width / 2) as i32, (height / 2) as i32);
        }

        let head = self.initial_head;
        self.initial_food = self
            .initial_food
            .filter(|food| *food != head && self.contains(*food));
    }

    /// Create a small grid for testing
    pub fn small() -> Self {
        Self::new(10, 10)
    }

    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let config: GameConfig = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        Ok(config)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn policy_timeout(&self) -> Duration {
        Duration::from_millis(self.policy_timeout_ms.unwrap_or(self.tick_interval_ms))
    }

    /// Validate configuration parameters
    ///
    /// # Returns
    ///
    /// `Ok(())` if all parameters are valid, `Err(String)` with an error message otherwise.
    pub fn validate(&self) -> Result<(), String> {
        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(format!(
                "grid must be at least 1x1, got {}x{}",
                self.grid_width, self.grid_height
            ));
        }

        let max_side = i32::MAX as usize;
        if self.grid_width > max_side || self.grid_height > max_side {
            return Err(format!(
                "grid sides must not exceed {}, got {}x{}",
                max_side, self.grid_width, self.grid_height
            ));
        }

        match self.grid_width.checked_mul(self.grid_height) {
            Some(cells) if cells >= 2 => {}
            Some(_) => {
                return Err("grid needs room for the snake and one food cell".to_string());
            }
            None => {
                return Err(format!(
                    "grid of {}x{} cells is too large",
                    self.grid_width, self.grid_height
                ));
            }
        }

        if !self.contains(self.initial_head) {
            return Err(format!(
                "initial_head ({}, {}) is outside the {}x{} grid",
                self.initial_head.x, self.initial_head.y, self.grid_width, self.grid_height
            ));
        }

        if let Some(food) = self.initial_food {
            if !self.contains(food) {
                return Err(format!(
                    "initial_food ({}, {}) is outside the {}x{} grid",
                    food.x, food.y, self.grid_width, self.grid_height
                ));
            }
            if food == self.initial_head {
                return Err("initial_food must not overlap initial_head".to_string());
            }
        }

        if self.tick_interval_ms == 0 {
            return Err("tick_interval_ms must be at least 1".to_string());
        }

        if self.policy_timeout_ms == Some(0) {
            return Err("policy_timeout_ms must be at least 1".to_string());
        }

        Ok(())
    }

    fn contains(&self, pos: Position) -> bool {
        pos.x >= 0
            && (pos.x as usize) < self.grid_width
            && pos.y >= 0
            && (pos.y as usize) < self.grid_height
    }
}
