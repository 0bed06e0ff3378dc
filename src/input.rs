//! Input: key bindings and the per-tick input frame built from terminal events.

use crate::board::Vec2;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::layout::Rect;

/// Action from a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Bomb,
    Shake,
    RotateLeft,
    RotateRight,
    Pause,
    Quit,
    Confirm,
    MenuUp,
    MenuDown,
    None,
}

/// Map a key to an action: `b` bomb, `x` shake, `a`/`d` (or arrows) rotate the camera.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p' | 'P') => Action::Pause,
        KeyCode::Char('b' | 'B') => Action::Bomb,
        KeyCode::Char('x' | 'X') => Action::Shake,
        KeyCode::Char('a' | 'A') | KeyCode::Left => Action::RotateLeft,
        KeyCode::Char('d' | 'D') | KeyCode::Right => Action::RotateRight,
        KeyCode::Up | KeyCode::Char('k') => Action::MenuUp,
        KeyCode::Down | KeyCode::Char('j') => Action::MenuDown,
        KeyCode::Enter | KeyCode::Char(' ') => Action::Confirm,
        _ => Action::None,
    }
}

/// Pointer transitions reported by the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Down,
    Drag,
    Up,
}

/// Everything the game reads from input in one tick. Pointer positions are
/// normalized device coordinates over the board area.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InputFrame {
    /// Level: button currently held.
    pub pointer_down: bool,
    pub pointer_pos: Vec2,
    /// Edge: set on the tick the button went down.
    pub pointer_down_pos: Option<Vec2>,
    /// Motion accumulated this tick while the button was held.
    pub pointer_drag_delta: Vec2,
    /// Edge: set on the tick the button came up.
    pub pointer_up_pos: Option<Vec2>,
    pub bomb_held: bool,
    pub shake_held: bool,
    pub rotate_left_held: bool,
    pub rotate_right_held: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct HeldKeys {
    bomb: bool,
    shake: bool,
    rotate_left: bool,
    rotate_right: bool,
}

impl HeldKeys {
    fn slot(&mut self, action: Action) -> Option<&mut bool> {
        match action {
            Action::Bomb => Some(&mut self.bomb),
            Action::Shake => Some(&mut self.shake),
            Action::RotateLeft => Some(&mut self.rotate_left),
            Action::RotateRight => Some(&mut self.rotate_right),
            _ => None,
        }
    }
}

/// Collects terminal events between ticks and hands out one `InputFrame` per tick.
///
/// Terminals without release reporting only send presses (and OS repeats);
/// there a press counts as held for the next frame only.
#[derive(Debug, Clone, Default)]
pub struct InputTracker {
    reports_release: bool,
    held: HeldKeys,
    pointer_down: bool,
    pointer_pos: Vec2,
    down_pos: Option<Vec2>,
    up_pos: Option<Vec2>,
    drag: Vec2,
}

impl InputTracker {
    pub fn new(reports_release: bool) -> Self {
        Self {
            reports_release,
            ..Self::default()
        }
    }

    /// Track held keys. Returns the action on a fresh press, `Action::None` otherwise.
    pub fn on_key(&mut self, key: KeyEvent) -> Action {
        let action = key_to_action(key);
        match key.kind {
            KeyEventKind::Press => {
                if let Some(slot) = self.held.slot(action) {
                    *slot = true;
                }
                action
            }
            KeyEventKind::Repeat => {
                if let Some(slot) = self.held.slot(action) {
                    *slot = true;
                }
                Action::None
            }
            KeyEventKind::Release => {
                if let Some(slot) = self.held.slot(action) {
                    *slot = false;
                }
                Action::None
            }
        }
    }

    pub fn on_pointer(&mut self, event: PointerEvent, ndc: Vec2) {
        match event {
            PointerEvent::Down => {
                self.pointer_down = true;
                self.down_pos = Some(ndc);
                self.up_pos = None;
                self.drag = Vec2::ZERO;
            }
            PointerEvent::Drag => {
                if self.pointer_down {
                    self.drag += ndc - self.pointer_pos;
                }
            }
            PointerEvent::Up => {
                self.pointer_down = false;
                self.up_pos = Some(ndc);
            }
        }
        self.pointer_pos = ndc;
    }

    /// Sample the current state and clear edge-triggered fields.
    pub fn frame(&mut self) -> InputFrame {
        let frame = InputFrame {
            pointer_down: self.pointer_down,
            pointer_pos: self.pointer_pos,
            pointer_down_pos: self.down_pos.take(),
            pointer_drag_delta: std::mem::take(&mut self.drag),
            pointer_up_pos: self.up_pos.take(),
            bomb_held: self.held.bomb,
            shake_held: self.held.shake,
            rotate_left_held: self.held.rotate_left,
            rotate_right_held: self.held.rotate_right,
        };
        if !self.reports_release {
            self.held = HeldKeys::default();
        }
        frame
    }

    /// Drop all held keys and pointer state (focus loss, pause).
    pub fn release_all(&mut self) {
        *self = Self::new(self.reports_release);
    }
}

/// Terminal cell `(column, row)` to normalized device coordinates over `area`
/// (x right, y up). Cells inside the area map into -1..1; cells outside map
/// beyond it so a release off the board still reports where it happened.
pub fn pointer_ndc(column: u16, row: u16, area: Rect) -> Option<Vec2> {
    if area.width == 0 || area.height == 0 {
        return None;
    }
    let fx = (f32::from(column) - f32::from(area.x) + 0.5) / f32::from(area.width);
    let fy = (f32::from(row) - f32::from(area.y) + 0.5) / f32::from(area.height);
    Some(Vec2::new(2.0 * (fx - 0.5), -2.0 * (fy - 0.5)))
}
