//! App: terminal init, main loop, fixed-rate ticks and event routing.

use crate::game::GameState;
use crate::input::{Action, InputTracker, PointerEvent, pointer_ndc};
use crate::theme::Theme;
use crate::ui::{self, ClearFlash};
use crate::{Args, GameConfig};
use anyhow::{Result, ensure};
use crossterm::event::{self, Event, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Upper bound on time between redraws.
const FRAME_DURATION: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    Paused,
    QuitMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitOption {
    Resume,
    Exit,
}

impl QuitOption {
    pub const ALL: [Self; 2] = [Self::Resume, Self::Exit];

    pub fn label(self) -> &'static str {
        match self {
            Self::Resume => " Resume ",
            Self::Exit => " Exit ",
        }
    }

    fn toggled(self) -> Self {
        match self {
            Self::Resume => Self::Exit,
            Self::Exit => Self::Resume,
        }
    }
}

/// What the loop should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

pub struct App {
    theme: Theme,
    state: GameState,
    input: InputTracker,
    screen: Screen,
    quit_selected: QuitOption,
    flash: ClearFlash,
    tick_interval: Duration,
    last_tick: Instant,
    /// Where the board was last drawn; pointer events map against it.
    board_rect: Rect,
}

impl App {
    pub fn new(args: &Args, config: &GameConfig, theme: Theme) -> Result<Self> {
        ensure!(
            args.tick_rate.is_finite() && args.tick_rate > 0.0,
            "tick rate must be a positive number, got {}",
            args.tick_rate
        );
        Ok(Self {
            theme,
            state: GameState::new(config),
            input: InputTracker::new(false),
            screen: Screen::Playing,
            quit_selected: QuitOption::Resume,
            flash: ClearFlash::default(),
            tick_interval: Duration::from_secs_f64(1.0 / args.tick_rate),
            last_tick: Instant::now(),
            board_rect: Rect::default(),
        })
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{
                DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
                KeyboardEnhancementFlags,
                PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
            },
            execute,
            terminal::{
                EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
                supports_keyboard_enhancement,
            },
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableFocusChange)?;

        // Release events let held keys (bomb, quake, rotate) stay held across ticks.
        let enhanced = supports_keyboard_enhancement().unwrap_or(false)
            && execute!(
                stdout,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )
            .is_ok();
        self.input = InputTracker::new(enhanced);
        info!(key_release = enhanced, "terminal ready");

        let mut terminal = DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;
        let result = self.run_loop(&mut terminal);

        if enhanced {
            let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
        }
        execute!(
            std::io::stdout(),
            DisableFocusChange,
            DisableMouseCapture,
            LeaveAlternateScreen
        )?;
        disable_raw_mode()?;
        info!(score = self.state.stats.score, ticks = self.state.tick_count, "game over");

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let size = terminal.size()?;
            self.board_rect = ui::board_area(Rect::new(0, 0, size.width, size.height), self.state.config());
            let now = Instant::now();
            terminal.draw(|f| {
                ui::draw(
                    f,
                    self.screen,
                    &self.state,
                    &self.theme,
                    &mut self.flash,
                    self.quit_selected,
                    now,
                );
            })?;

            let until_tick = self.tick_interval.saturating_sub(self.last_tick.elapsed());
            if event::poll(until_tick.min(FRAME_DURATION))? {
                while event::poll(Duration::ZERO)? {
                    let flow = match event::read()? {
                        Event::Key(key) => self.on_key(key),
                        Event::Mouse(mouse) => {
                            self.on_mouse(mouse);
                            Flow::Continue
                        }
                        Event::FocusLost => {
                            self.input.release_all();
                            Flow::Continue
                        }
                        _ => Flow::Continue,
                    };
                    if flow == Flow::Exit {
                        return Ok(());
                    }
                }
            }

            if self.last_tick.elapsed() >= self.tick_interval {
                self.last_tick = Instant::now();
                if self.screen == Screen::Playing {
                    let frame = self.input.frame();
                    self.state.update(&frame);
                }
            }
        }
    }

    fn on_key(&mut self, key: KeyEvent) -> Flow {
        let action = self.input.on_key(key);
        if action == Action::None {
            return Flow::Continue;
        }
        match self.screen {
            Screen::Playing => match action {
                Action::Pause => self.set_screen(Screen::Paused),
                Action::Quit => self.open_quit_menu(),
                _ => {}
            },
            Screen::Paused => match action {
                Action::Pause | Action::Confirm => self.set_screen(Screen::Playing),
                Action::Quit => self.open_quit_menu(),
                _ => {}
            },
            Screen::QuitMenu => match action {
                Action::MenuUp | Action::MenuDown | Action::RotateLeft | Action::RotateRight => {
                    self.quit_selected = self.quit_selected.toggled();
                }
                Action::Confirm => match self.quit_selected {
                    QuitOption::Resume => self.set_screen(Screen::Playing),
                    QuitOption::Exit => return Flow::Exit,
                },
                Action::Pause | Action::Quit => self.set_screen(Screen::Playing),
                _ => {}
            },
        }
        Flow::Continue
    }

    fn on_mouse(&mut self, mouse: MouseEvent) {
        if self.screen != Screen::Playing {
            return;
        }
        let event = match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => PointerEvent::Down,
            MouseEventKind::Drag(MouseButton::Left) => PointerEvent::Drag,
            MouseEventKind::Up(MouseButton::Left) => PointerEvent::Up,
            _ => return,
        };
        if let Some(ndc) = pointer_ndc(mouse.column, mouse.row, self.board_rect) {
            self.input.on_pointer(event, ndc);
        }
    }

    fn open_quit_menu(&mut self) {
        self.quit_selected = QuitOption::Resume;
        self.set_screen(Screen::QuitMenu);
    }

    /// Switching screens drops held keys and any half-finished drag.
    fn set_screen(&mut self, screen: Screen) {
        debug!(from = ?self.screen, to = ?screen, "screen");
        self.screen = screen;
        self.input.release_all();
    }
}
