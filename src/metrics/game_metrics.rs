use std::time::{Duration, Instant};

use crate::game::GamePhase;

/// Wall-clock and score bookkeeping for the front end. Held in memory only.
pub struct GameMetrics {
    pub start_time: Instant,
    pub elapsed_time: Duration,
    pub high_score: u32,
    pub games_played: u32,
    last_phase: GamePhase,
}

impl GameMetrics {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            elapsed_time: Duration::ZERO,
            high_score: 0,
            games_played: 0,
            last_phase: GamePhase::NotStarted,
        }
    }

    /// Advance the clock while a game is running
    pub fn update(&mut self) {
        if self.last_phase == GamePhase::Running {
            self.elapsed_time = self.start_time.elapsed();
        }
    }

    /// Feed the latest published phase and score; transitions drive the counters
    pub fn observe(&mut self, phase: GamePhase, score: u32) {
        if phase == self.last_phase {
            return;
        }
        match phase {
            GamePhase::Running => self.on_game_start(),
            GamePhase::GameOver => self.on_game_over(score),
            GamePhase::NotStarted => {}
        }
        self.last_phase = phase;
    }

    pub fn on_game_start(&mut self) {
        self.start_time = Instant::now();
        self.elapsed_time = Duration::ZERO;
    }

    pub fn on_game_over(&mut self, final_score: u32) {
        self.games_played += 1;
        if final_score > self.high_score {
            self.high_score = final_score;
        }
    }

    pub fn format_time(&self) -> String {
        let total_secs = self.elapsed_time.as_secs();
        let minutes = total_secs / 60;
        let seconds = total_secs % 60;
        format!("{:02}:{:02}", minutes, seconds)
    }
}

impl Default for GameMetrics {
    fn default() -> Self {
        Self::new()
    }
}
