use std::collections::HashSet;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use super::{
    action::Direction,
    board::Board,
    config::GameConfig,
    state::{CollisionType, GamePhase, GameSnapshot, GameState, Position, Snake},
};

/// What a call to [`SimulationEngine::step`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The snake moved one cell without growing
    Moved,
    /// The snake moved onto the food, grew and scored
    AteFood,
    /// The move was blocked; the game is over and nothing else changed
    Collided(CollisionType),
    /// The snake ate the last free cell, so no food could be placed
    BoardFilled,
    /// The game was not running; nothing changed
    Ignored,
}

impl StepOutcome {
    /// Whether this step ended the game
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepOutcome::Collided(_) | StepOutcome::BoardFilled)
    }

    pub fn ate_food(&self) -> bool {
        matches!(self, StepOutcome::AteFood | StepOutcome::BoardFilled)
    }
}

/// Owns the authoritative game state and is its only writer
pub struct SimulationEngine {
    config: GameConfig,
    board: Board,
    state: GameState,
    rng: StdRng,
}

impl SimulationEngine {
    /// Create a new engine in the `NotStarted` phase
    pub fn new(config: GameConfig) -> Self {
        let board = Board::new(config.grid_width, config.grid_height);
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let placeholder = GameState::new(
            Snake::new(config.initial_head),
            config.initial_head,
            config.initial_direction,
        );

        let mut engine = Self {
            config,
            board,
            state: placeholder,
            rng,
        };
        let fixed_food = engine.config.initial_food;
        engine.state = engine.fresh_state(fixed_food);
        engine
    }

    /// Create an engine around an existing state, e.g. to replay a position
    pub fn with_state(config: GameConfig, state: GameState) -> Self {
        let mut engine = Self::new(config);
        engine.state = state;
        engine
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    /// NotStarted → Running. Returns false (and changes nothing) in any other phase.
    pub fn start(&mut self) -> bool {
        if self.state.phase != GamePhase::NotStarted {
            debug!(phase = ?self.state.phase, "start ignored");
            return false;
        }
        self.state.phase = GamePhase::Running;
        info!("game started");
        true
    }

    /// GameOver → Running with a fresh snake, freshly sampled food and zero score.
    /// Returns false (and changes nothing) in any other phase.
    pub fn restart(&mut self) -> bool {
        if self.state.phase != GamePhase::GameOver {
            debug!(phase = ?self.state.phase, "restart ignored");
            return false;
        }
        self.state = self.fresh_state(None);
        self.state.phase = GamePhase::Running;
        info!("game restarted");
        true
    }

    /// Advance the snake one cell in `direction`.
    ///
    /// The collision check sees the whole current body, tail included, so
    /// moving into the cell the tail is about to vacate ends the game.
    pub fn step(&mut self, direction: Direction) -> StepOutcome {
        if self.state.phase != GamePhase::Running {
            debug!(phase = ?self.state.phase, "step ignored");
            return StepOutcome::Ignored;
        }

        let new_head = self.state.snake.head().moved_in_direction(direction);

        if let Some(collision) = self.check_collision(new_head) {
            self.state.phase = GamePhase::GameOver;
            info!(
                ?collision,
                score = self.state.score,
                length = self.state.snake.len(),
                "game over"
            );
            return StepOutcome::Collided(collision);
        }

        self.state.direction = direction;
        self.state.snake.push_head(new_head);
        self.state.steps += 1;

        if new_head != self.state.food {
            self.state.snake.drop_tail();
            return StepOutcome::Moved;
        }

        self.state.score += self.config.food_reward;
        debug!(score = self.state.score, length = self.state.snake.len(), "food eaten");

        match self.spawn_food() {
            Some(food) => {
                self.state.food = food;
                StepOutcome::AteFood
            }
            None => {
                self.state.phase = GamePhase::GameOver;
                info!(score = self.state.score, "board filled");
                StepOutcome::BoardFilled
            }
        }
    }

    /// Copy of the current state for observers
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            snake: self.state.snake.cells().to_vec(),
            food: self.state.food,
            score: self.state.score,
            phase: self.state.phase,
            direction: self.state.direction,
            steps: self.state.steps,
            grid_width: self.board.width(),
            grid_height: self.board.height(),
        }
    }

    /// Check if the new head position causes a collision
    fn check_collision(&self, pos: Position) -> Option<CollisionType> {
        if !self.board.is_inside(pos) {
            return Some(CollisionType::Wall);
        }

        if self.state.snake.occupies(pos) {
            return Some(CollisionType::SelfCollision);
        }

        None
    }

    fn spawn_food(&mut self) -> Option<Position> {
        let occupied: HashSet<Position> = self.state.snake.cells().iter().copied().collect();
        self.board.random_free_cell(&occupied, &mut self.rng)
    }

    fn fresh_state(&mut self, fixed_food: Option<Position>) -> GameState {
        let snake = Snake::new(self.config.initial_head);
        let food = fixed_food
            .filter(|food| self.board.is_inside(*food) && !snake.occupies(*food))
            .or_else(|| {
                let occupied: HashSet<Position> = snake.cells().iter().copied().collect();
                self.board.random_free_cell(&occupied, &mut self.rng)
            })
            // only reachable on a single-cell board, which config validation rejects
            .unwrap_or(self.config.initial_head);

        GameState::new(snake, food, self.config.initial_direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(mut config: GameConfig) -> GameConfig {
        config.seed = Some(11);
        config
    }

    fn running_engine(
        config: GameConfig,
        body: Vec<Position>,
        food: Position,
        dir: Direction,
    ) -> SimulationEngine {
        let mut state = GameState::new(Snake::from_body(body).unwrap(), food, dir);
        state.phase = GamePhase::Running;
        SimulationEngine::with_state(seeded(config), state)
    }

    #[test]
    fn test_initial_state() {
        let engine = SimulationEngine::new(seeded(GameConfig::default()));
        let state = engine.state();

        assert_eq!(state.phase, GamePhase::NotStarted);
        assert_eq!(state.score, 0);
        assert_eq!(state.steps, 0);
        assert_eq!(state.snake.cells(), &[Position::new(10, 10)]);
        assert_eq!(state.food, Position::new(15, 15));
        assert_eq!(state.direction, Direction::Down);
    }

    #[test]
    fn test_start_transitions() {
        let mut engine = SimulationEngine::new(seeded(GameConfig::default()));

        assert!(engine.start());
        assert_eq!(engine.phase(), GamePhase::Running);

        // only valid from NotStarted
        assert!(!engine.start());
        assert!(!engine.restart());
        assert_eq!(engine.phase(), GamePhase::Running);
    }

    #[test]
    fn test_step_ignored_unless_running() {
        let mut engine = SimulationEngine::new(seeded(GameConfig::default()));
        let before = engine.snapshot();

        assert_eq!(engine.step(Direction::Down), StepOutcome::Ignored);
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn test_basic_movement() {
        let mut engine = SimulationEngine::new(seeded(GameConfig::default()));
        engine.start();

        let outcome = engine.step(Direction::Up);

        assert_eq!(outcome, StepOutcome::Moved);
        assert_eq!(engine.state().snake.cells(), &[Position::new(10, 9)]);
        assert_eq!(engine.state().food, Position::new(15, 15));
        assert_eq!(engine.state().score, 0);
        assert_eq!(engine.state().direction, Direction::Up);
        assert_eq!(engine.state().steps, 1);
    }

    #[test]
    fn test_food_consumption() {
        let mut engine = running_engine(
            GameConfig::small(),
            vec![Position::new(5, 5), Position::new(4, 5)],
            Position::new(6, 5),
            Direction::Right,
        );

        let outcome = engine.step(Direction::Right);

        assert_eq!(outcome, StepOutcome::AteFood);
        assert!(outcome.ate_food());
        assert_eq!(engine.state().score, 10);
        assert_eq!(engine.state().snake.len(), 3);
        assert_eq!(engine.state().snake.head(), Position::new(6, 5));
        assert_eq!(engine.state().snake.tail(), Position::new(4, 5));
        assert!(!engine.state().is_occupied_by_snake(engine.state().food));
        assert!(engine.board().is_inside(engine.state().food));
    }

    #[test]
    fn test_wall_collision_leaves_state_untouched() {
        let mut engine = running_engine(
            GameConfig::small(),
            vec![Position::new(0, 5), Position::new(1, 5)],
            Position::new(5, 5),
            Direction::Left,
        );
        let before = engine.state().clone();

        let outcome = engine.step(Direction::Left);

        assert_eq!(outcome, StepOutcome::Collided(CollisionType::Wall));
        assert!(outcome.is_terminal());
        assert_eq!(engine.phase(), GamePhase::GameOver);
        assert_eq!(engine.state().snake, before.snake);
        assert_eq!(engine.state().food, before.food);
        assert_eq!(engine.state().score, before.score);
        assert_eq!(engine.state().steps, before.steps);
    }

    #[test]
    fn test_self_collision() {
        // U-shape: head at (5,5), body curls down and back up to (4,5)
        let mut engine = running_engine(
            GameConfig::small(),
            vec![
                Position::new(5, 5),
                Position::new(5, 6),
                Position::new(4, 6),
                Position::new(4, 5),
                Position::new(4, 4),
            ],
            Position::new(8, 8),
            Direction::Up,
        );

        let outcome = engine.step(Direction::Left);

        assert_eq!(outcome, StepOutcome::Collided(CollisionType::SelfCollision));
        assert_eq!(engine.phase(), GamePhase::GameOver);
    }

    #[test]
    fn test_moving_into_vacating_tail_collides() {
        // 2x2 loop: the head's next cell is the current tail
        let mut engine = running_engine(
            GameConfig::small(),
            vec![
                Position::new(5, 5),
                Position::new(5, 6),
                Position::new(4, 6),
                Position::new(4, 5),
            ],
            Position::new(8, 8),
            Direction::Up,
        );

        let outcome = engine.step(Direction::Left);

        assert_eq!(outcome, StepOutcome::Collided(CollisionType::SelfCollision));
    }

    #[test]
    fn test_restart_resets_everything() {
        let mut engine = running_engine(
            GameConfig::default(),
            vec![Position::new(0, 3), Position::new(1, 3), Position::new(2, 3)],
            Position::new(9, 9),
            Direction::Left,
        );
        engine.state.score = 40;
        engine.step(Direction::Left);
        assert_eq!(engine.phase(), GamePhase::GameOver);

        assert!(engine.restart());

        let state = engine.state();
        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.snake.cells(), &[Position::new(10, 10)]);
        assert_eq!(state.score, 0);
        assert_eq!(state.steps, 0);
        assert_eq!(state.direction, Direction::Down);
        assert_ne!(state.food, Position::new(10, 10));
        assert!(engine.board().is_inside(state.food));
    }

    #[test]
    fn test_board_filled_ends_game() {
        let mut config = GameConfig::new(2, 2);
        config.initial_head = Position::new(0, 0);
        let mut engine = running_engine(
            config,
            vec![Position::new(0, 0), Position::new(0, 1), Position::new(1, 1)],
            Position::new(1, 0),
            Direction::Up,
        );

        let outcome = engine.step(Direction::Right);

        assert_eq!(outcome, StepOutcome::BoardFilled);
        assert_eq!(engine.phase(), GamePhase::GameOver);
        assert_eq!(engine.state().score, 10);
        assert_eq!(engine.state().snake.len(), 4);
    }

    #[test]
    fn test_snapshot_mirrors_state() {
        let mut engine = SimulationEngine::new(seeded(GameConfig::default()));
        engine.start();
        engine.step(Direction::Right);

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.snake, vec![Position::new(11, 10)]);
        assert_eq!(snapshot.head(), Some(Position::new(11, 10)));
        assert_eq!(snapshot.food, Position::new(15, 15));
        assert_eq!(snapshot.phase, GamePhase::Running);
        assert_eq!(snapshot.direction, Direction::Right);
        assert_eq!((snapshot.grid_width, snapshot.grid_height), (20, 20));
    }

    #[test]
    fn test_long_random_walk_keeps_invariants() {
        let mut engine = SimulationEngine::new(seeded(GameConfig::small()));
        engine.start();
        let turns = [Direction::Right, Direction::Down, Direction::Left, Direction::Up];

        for i in 0..500 {
            if engine.phase() == GamePhase::GameOver {
                engine.restart();
            }
            let before_len = engine.state().snake.len();
            let before_score = engine.state().score;
            let outcome = engine.step(turns[(i / 3) % 4]);

            let state = engine.state();
            assert!(state.snake.cells().iter().all(|c| engine.board().is_inside(*c)));
            let unique: HashSet<_> = state.snake.cells().iter().collect();
            assert_eq!(unique.len(), state.snake.len());
            if state.phase == GamePhase::Running {
                assert!(!state.is_occupied_by_snake(state.food));
            }
            match outcome {
                StepOutcome::AteFood => {
                    assert_eq!(state.snake.len(), before_len + 1);
                    assert_eq!(state.score, before_score + 10);
                }
                StepOutcome::Moved | StepOutcome::Collided(_) => {
                    assert_eq!(state.snake.len(), before_len);
                    assert_eq!(state.score, before_score);
                }
                _ => {}
            }
        }
    }
}
