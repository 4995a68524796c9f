use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{Stderr, stderr};
use std::time::Duration;
use tokio::time::interval;
use tracing::info;

use crate::game::{GameConfig, SimulationEngine};
use crate::input::{InputHandler, KeyAction};
use crate::metrics::GameMetrics;
use crate::policy::PolicyAdapter;
use crate::render::Renderer;
use crate::scheduler::{Control, GameSession, SchedulerHandle, TickScheduler};

/// Interactive terminal front end: the policy drives, the keyboard overrides
pub struct PlayMode {
    config: GameConfig,
    adapter: PolicyAdapter,
    metrics: GameMetrics,
    renderer: Renderer,
    input_handler: InputHandler,
    should_quit: bool,
}

impl PlayMode {
    pub fn new(config: GameConfig, adapter: PolicyAdapter) -> Self {
        Self {
            config,
            adapter,
            metrics: GameMetrics::new(),
            renderer: Renderer::new(),
            input_handler: InputHandler::new(),
            should_quit: false,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stderr = stderr();
        execute!(stderr, EnterAlternateScreen).context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stderr);
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
        terminal.hide_cursor().context("Failed to hide cursor")?;
        terminal.clear().context("Failed to clear terminal")?;

        let session = GameSession::new(
            SimulationEngine::new(self.config.clone()),
            self.adapter.clone(),
        );
        let scheduler = TickScheduler::spawn(session, self.config.tick_interval());

        // Run game loop with cleanup
        let result = self.run_game_loop(&mut terminal, &scheduler).await;

        let stopped = scheduler.stop().await;

        // Cleanup terminal
        self.cleanup_terminal(&mut terminal)?;

        let session = stopped.context("Tick scheduler terminated abnormally")?;
        info!(
            games = self.metrics.games_played,
            high_score = self.metrics.high_score,
            decisions = ?session.stats(),
            "session finished"
        );

        result
    }

    async fn run_game_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
        scheduler: &SchedulerHandle,
    ) -> Result<()> {
        let mut event_stream = EventStream::new();

        // Render at 30 FPS (33ms per frame); ticking happens in the scheduler task
        let mut render_timer = interval(Duration::from_millis(33));

        loop {
            tokio::select! {
                // Handle terminal events
                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        self.handle_event(event, scheduler);
                    }
                }

                // Render frame
                _ = render_timer.tick() => {
                    let snapshot = scheduler.snapshot();
                    self.metrics.observe(snapshot.game.phase, snapshot.game.score);
                    self.metrics.update();
                    terminal.draw(|frame| {
                        self.renderer.render(frame, &snapshot, &self.metrics);
                    }).context("Failed to draw frame")?;
                }

                // Handle Ctrl+C
                _ = tokio::signal::ctrl_c() => {
                    self.should_quit = true;
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event, scheduler: &SchedulerHandle) {
        let Event::Key(key) = event else {
            return;
        };
        // Only process key press events, not release
        if key.kind != KeyEventKind::Press {
            return;
        }

        let control = match self.input_handler.handle_key_event(key) {
            KeyAction::Steer(direction) => Control::Steer(direction),
            KeyAction::Activate => Control::Activate,
            KeyAction::Restart => Control::Restart,
            KeyAction::Quit => {
                self.should_quit = true;
                return;
            }
            KeyAction::None => return,
        };

        if !scheduler.send(control) {
            self.should_quit = true;
        }
    }

    fn cleanup_terminal(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)
            .context("Failed to leave alternate screen")?;
        terminal.show_cursor().context("Failed to show cursor")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Direction, GamePhase};
    use crate::policy::UnavailablePolicy;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::sync::Arc;

    fn mode() -> PlayMode {
        let config = GameConfig::default();
        let adapter = PolicyAdapter::new(
            Arc::new(UnavailablePolicy::new("offline")),
            config.policy_timeout(),
        );
        PlayMode::new(config, adapter)
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[tokio::test]
    async fn test_keys_reach_scheduler() {
        let mut mode = mode();
        let session = GameSession::new(
            SimulationEngine::new(mode.config.clone()),
            mode.adapter.clone(),
        );
        let scheduler = TickScheduler::spawn(session, Duration::from_secs(60));

        mode.handle_event(key(KeyCode::Char(' ')), &scheduler);
        mode.handle_event(key(KeyCode::Left), &scheduler);

        let mut session = scheduler.stop().await.unwrap();
        assert_eq!(session.phase(), GamePhase::Running);
        let report = session.tick().unwrap();
        assert_eq!(report.resolution.direction, Direction::Left);
        assert!(!mode.should_quit);
    }

    #[tokio::test]
    async fn test_quit_key() {
        let mut mode = mode();
        let session = GameSession::new(
            SimulationEngine::new(mode.config.clone()),
            mode.adapter.clone(),
        );
        let scheduler = TickScheduler::spawn(session, Duration::from_secs(60));

        mode.handle_event(key(KeyCode::Char('q')), &scheduler);
        assert!(mode.should_quit);

        scheduler.stop().await.unwrap();
    }
}
