//! App: terminal init, main loop, tick and key handling.

use crate::GameConfig;
use crate::dealer::Dealer;
use crate::input::{Action, key_to_action};
use crate::session::GameState;
use crate::theme::Theme;
use crate::ui::{self, Hud};
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};

/// DAS (Delayed Auto-Shift): delay before movement starts repeating when you hold a key.
const REPEAT_DELAY_MS: u64 = 170;
/// ARR (Auto-Repeat Rate): time between repeated moves while holding.
const REPEAT_INTERVAL_MS: u64 = 50;
/// Frame budget for event polling (~60 FPS).
const FRAME_MS: u64 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    GameOver,
    LevelCleared,
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    dealer: Dealer,
    state: GameState,
    screen: Screen,
    paused: bool,
    /// Viruses placed when the level was dealt.
    viruses_start: usize,
    /// Fallers spawned this level.
    capsules: u32,
    last_tick: Instant,
    tick_interval: Duration,
    repeat_state: Option<(Action, Instant)>,
    last_repeat_fire: Option<Instant>,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme) -> Result<Self> {
        let rate = if config.tick_rate > 0.0 {
            config.tick_rate
        } else {
            1.0
        };
        let state = GameState::new(config.rows, config.columns).context("invalid field size")?;
        let mut app = Self {
            dealer: Dealer::new(config.seed),
            config,
            theme,
            state,
            screen: Screen::Playing,
            paused: false,
            viruses_start: 0,
            capsules: 0,
            last_tick: Instant::now(),
            tick_interval: Duration::from_secs_f64(1.0 / rate),
            repeat_state: None,
            last_repeat_fire: None,
        };
        app.deal()?;
        Ok(app)
    }

    /// Fresh field with viruses from the dealer and the first faller.
    fn deal(&mut self) -> Result<()> {
        self.state = GameState::new(self.config.rows, self.config.columns)
            .context("invalid field size")?;
        self.viruses_start = self.dealer.seed_viruses(&mut self.state, self.config.viruses);
        self.capsules = 0;
        self.screen = Screen::Playing;
        self.paused = false;
        self.repeat_state = None;
        self.last_repeat_fire = None;
        self.last_tick = Instant::now();
        self.spawn()
    }

    fn spawn(&mut self) -> Result<()> {
        let (left, right) = self.dealer.next_pair();
        self.state.create_faller(left, right)?;
        if self.state.faller().is_some() {
            self.capsules += 1;
        }
        self.update_screen();
        Ok(())
    }

    fn update_screen(&mut self) {
        if self.state.is_game_over() {
            self.screen = Screen::GameOver;
        } else if self.viruses_start > 0
            && self.state.is_level_cleared()
            && self.state.is_settled()
        {
            self.screen = Screen::LevelCleared;
        }
    }

    /// One unit of time: a new faller once the field has settled, otherwise a tick.
    fn advance(&mut self) -> Result<()> {
        if self.screen != Screen::Playing {
            return Ok(());
        }
        if self.state.is_settled() {
            self.update_screen();
            if self.screen == Screen::Playing {
                self.spawn()?;
            }
        } else {
            self.state.tick()?;
            self.update_screen();
        }
        Ok(())
    }

    fn apply_action(&mut self, action: Action) -> Result<()> {
        match action {
            Action::MoveLeft => self.state.move_left()?,
            Action::MoveRight => self.state.move_right()?,
            Action::RotateCw => self.state.rotate_clockwise()?,
            Action::RotateCcw => self.state.rotate_counterclockwise()?,
            Action::Tick => {
                self.advance()?;
                self.last_tick = Instant::now();
            }
            Action::Pause | Action::Restart | Action::Quit | Action::None => {}
        }
        Ok(())
    }

    /// Handle one key press. Returns `false` when the app should exit.
    fn handle(&mut self, action: Action) -> Result<bool> {
        if action == Action::Quit {
            return Ok(false);
        }
        match self.screen {
            Screen::Playing if self.paused => {
                if action == Action::Pause {
                    self.paused = false;
                    self.last_tick = Instant::now();
                }
            }
            Screen::Playing => {
                if action == Action::Pause {
                    self.paused = true;
                    self.repeat_state = None;
                } else {
                    self.apply_action(action)?;
                    if matches!(action, Action::MoveLeft | Action::MoveRight | Action::Tick) {
                        self.repeat_state = Some((action, Instant::now()));
                        self.last_repeat_fire = None;
                    }
                }
            }
            Screen::GameOver | Screen::LevelCleared => {
                if action == Action::Restart {
                    self.deal()?;
                }
            }
        }
        Ok(true)
    }

    fn tick_repeat(&mut self) -> Result<()> {
        let now = Instant::now();
        let Some((action, first)) = self.repeat_state else {
            return Ok(());
        };
        if now.duration_since(first) < Duration::from_millis(REPEAT_DELAY_MS) {
            return Ok(());
        }
        let next =
            self.last_repeat_fire.unwrap_or(first) + Duration::from_millis(REPEAT_INTERVAL_MS);
        if now >= next {
            self.apply_action(action)?;
            self.last_repeat_fire = Some(now);
        }
        Ok(())
    }

    fn hud(&self) -> Hud {
        Hud {
            screen: self.screen,
            paused: self.paused,
            next: self.dealer.peek(),
            viruses_start: self.viruses_start,
            capsules: self.capsules,
            seed: self.config.seed,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        // Release events end key repeat; not every terminal supports them.
        let _ = execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        );

        let mut terminal =
            DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;
        let result = self.run_loop(&mut terminal);

        // Restore
        let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            let hud = self.hud();
            terminal.draw(|f| ui::draw(f, &self.state, &self.theme, &hud))?;

            let timeout = Duration::from_millis(FRAME_MS).saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    let Event::Key(key) = event::read()? else {
                        continue;
                    };
                    let action = key_to_action(key);
                    if key.kind != KeyEventKind::Press {
                        if key.kind == KeyEventKind::Release
                            && self.repeat_state.map(|(a, _)| a) == Some(action)
                        {
                            self.repeat_state = None;
                            self.last_repeat_fire = None;
                        }
                        continue;
                    }
                    // Held key already repeating on our own timer.
                    if self.repeat_state.map(|(a, _)| a) == Some(action) {
                        continue;
                    }
                    if !self.handle(action)? {
                        return Ok(());
                    }
                }
            }

            if self.screen == Screen::Playing && !self.paused {
                self.tick_repeat()?;
                if self.last_tick.elapsed() >= self.tick_interval {
                    self.last_tick = Instant::now();
                    self.advance()?;
                }
            }
            if self.screen != Screen::Playing {
                self.repeat_state = None;
            }
        }
    }
}
