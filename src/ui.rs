//! Renderer: board projected through the camera, sidebar, pause and quit overlays.

use crate::GameConfig;
use crate::app::{QuitOption, Screen};
use crate::board::{DISPLAY_SCALE, Kind, Vec2};
use crate::camera::Camera;
use crate::game::{GameState, Phase};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count};

pub const SIDEBAR_WIDTH: u16 = 26;

/// Terminal columns and rows one board cell takes at zero rotation.
const CELL_COLS: u16 = 3;
const CELL_ROWS: u16 = 1;

/// Share of the viewport the board spans along x and y (see `BoardLayout`).
const BOARD_SPAN_X: f32 = 0.4;
const BOARD_SPAN_Y: f32 = 0.8;

const CLEAR_FLASH_MS: u32 = 250;

const GLYPHS: [&str; 6] = ["●", "◆", "■", "▲", "★", "♥"];
const DEAD_GLYPH: &str = "·";

fn glyph(kind: Kind) -> &'static str {
    GLYPHS[kind.index() % GLYPHS.len()]
}

/// Full glyph down to half size, a dot below that.
fn glyph_at_scale(kind: Kind, scale: f32) -> &'static str {
    if scale > 0.5 { glyph(kind) } else { DEAD_GLYPH }
}

/// Viewport (inside the board border) sized so each cell gets `CELL_COLS x CELL_ROWS`,
/// clamped to what the terminal leaves next to the sidebar. Pointer events are
/// mapped against this rect.
pub fn board_area(area: Rect, config: &GameConfig) -> Rect {
    let want_w = ((config.cols as f32 * f32::from(CELL_COLS)) / BOARD_SPAN_X).ceil() as u16;
    let want_h = ((config.rows as f32 * f32::from(CELL_ROWS)) / BOARD_SPAN_Y).ceil() as u16;
    let avail_w = area.width.saturating_sub(SIDEBAR_WIDTH + 2);
    let avail_h = area.height.saturating_sub(2);
    let w = want_w.min(avail_w);
    let h = want_h.min(avail_h);
    let total_w = w + 2 + SIDEBAR_WIDTH;
    Rect {
        x: area.x + area.width.saturating_sub(total_w) / 2 + 1,
        y: area.y + area.height.saturating_sub(h + 2) / 2 + 1,
        width: w,
        height: h,
    }
}

/// World point to the terminal cell it lands in, or None when it falls outside `area`.
/// Inverse of `input::pointer_ndc`.
pub fn world_to_cell(camera: &Camera, world: Vec2, area: Rect) -> Option<(u16, u16)> {
    let ndc = camera.world_to_ndc(world);
    let fx = (ndc.x / 2.0 + 0.5) * f32::from(area.width);
    let fy = (0.5 - ndc.y / 2.0) * f32::from(area.height);
    if !(0.0..f32::from(area.width)).contains(&fx) || !(0.0..f32::from(area.height)).contains(&fy) {
        return None;
    }
    Some((area.x + fx as u16, area.y + fy as u16))
}

/// Fade over the cells a swap just cleared. Restarted whenever
/// `Stats::clear_events` moves.
#[derive(Default)]
pub struct ClearFlash {
    effect: Option<Effect>,
    last_process: Option<Instant>,
    seen: u64,
}

impl ClearFlash {
    fn apply(&mut self, frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect, now: Instant) {
        if state.stats.clear_events != self.seen {
            self.seen = state.stats.clear_events;
            let targets: HashSet<(u16, u16)> = state
                .grid()
                .map(|grid| {
                    state
                        .last_cleared
                        .iter()
                        .filter_map(|c| grid.cell_at(c.row, c.col).ok())
                        .filter_map(|cell| world_to_cell(&state.camera, cell.original_position, area))
                        .collect()
                })
                .unwrap_or_default();
            let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
                targets.contains(&(pos.x, pos.y))
            }));
            self.effect = Some(
                fx::fade_to(theme.title, theme.bg, (CLEAR_FLASH_MS, Interpolation::QuadOut))
                    .with_filter(filter)
                    .with_area(area),
            );
            self.last_process = None;
        }

        let delta = self
            .last_process
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or(std::time::Duration::ZERO);
        let delta_ms = delta.as_millis().min(u128::from(u32::MAX)) as u32;
        self.last_process = Some(now);

        let done = match &mut self.effect {
            Some(effect) => {
                frame.render_effect(effect, area, TfxDuration::from_millis(delta_ms));
                effect.done()
            }
            None => false,
        };
        if done {
            self.effect = None;
        }
    }
}

pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    state: &GameState,
    theme: &Theme,
    flash: &mut ClearFlash,
    quit_selected: QuitOption,
    now: Instant,
) {
    let area = frame.area();
    let board = board_area(area, state.config());
    let outer = Rect {
        x: board.x.saturating_sub(1),
        y: board.y.saturating_sub(1),
        width: board.width + 2,
        height: board.height + 2,
    };
    let sidebar = Rect {
        x: outer.x + outer.width,
        y: outer.y,
        width: SIDEBAR_WIDTH.min(area.width.saturating_sub(outer.x + outer.width - area.x)),
        height: outer.height.max(22).min(area.height.saturating_sub(outer.y - area.y)),
    };

    draw_board(frame, state, theme, outer, board);
    if state.config().animate {
        flash.apply(frame, state, theme, board, now);
    }
    draw_sidebar(frame, state, theme, sidebar);

    match screen {
        Screen::Playing => {}
        Screen::Paused => draw_pause_overlay(frame, theme, area),
        Screen::QuitMenu => draw_quit_menu(frame, theme, quit_selected),
    }
}

fn draw_board(frame: &mut Frame, state: &GameState, theme: &Theme, outer: Rect, inner: Rect) {
    let title = match (state.quake().is_shaking(), state.phase()) {
        (true, _) => " Quake! ",
        (false, Phase::Idle) => " Skyfall ",
        (false, Phase::Selected) => " Swap? ",
    };
    Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(title, Style::default().fg(theme.title)))
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .render(outer, frame.buffer_mut());
    for y in inner.y..inner.y + inner.height {
        for x in inner.x..inner.x + inner.width {
            frame.buffer_mut()[(x, y)].set_symbol(" ").set_style(Style::default().bg(theme.bg));
        }
    }

    let Some(grid) = state.grid() else {
        return;
    };
    let selected = state.selection().cell();
    let neighbors: Vec<_> = state.selection().neighbors().iter().map(|(_, c)| c).collect();

    for fx in &state.exits {
        if let Some(pos) = world_to_cell(&state.camera, fx.position, inner) {
            let symbol = glyph_at_scale(fx.kind, fx.scale());
            let style = Style::default()
                .fg(theme.piece_color(fx.kind))
                .bg(theme.bg)
                .add_modifier(Modifier::DIM);
            draw_cell(frame, inner, pos, symbol, style, None);
        }
    }

    for (coord, cell) in grid.iter() {
        let Some(pos) = world_to_cell(&state.camera, cell.position, inner) else {
            continue;
        };
        let (symbol, mut style) = if cell.alive {
            (
                glyph_at_scale(cell.kind, cell.scale.x / DISPLAY_SCALE),
                Style::default().fg(theme.piece_color(cell.kind)).bg(theme.bg),
            )
        } else {
            (DEAD_GLYPH, Style::default().fg(theme.inactive_fg).bg(theme.bg))
        };
        let pad = if selected == Some(coord) {
            style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
            Some(theme.title)
        } else if state.drop_target() == Some(coord) {
            style = style.add_modifier(Modifier::BOLD);
            Some(theme.main_fg)
        } else if neighbors.contains(&coord) {
            Some(theme.div_line)
        } else {
            None
        };
        draw_cell(frame, inner, pos, symbol, style, pad);
    }
}

/// One piece glyph at `pos`, with the columns either side tinted `pad` when set.
fn draw_cell(frame: &mut Frame, area: Rect, pos: (u16, u16), symbol: &str, style: Style, pad: Option<Color>) {
    let (x, y) = pos;
    let buf = frame.buffer_mut();
    if let Some(bg) = pad {
        let half = CELL_COLS / 2;
        let from = x.saturating_sub(half).max(area.x);
        let to = (x + half).min(area.x + area.width.saturating_sub(1));
        for px in from..=to {
            buf[(px, y)].set_style(Style::default().bg(bg));
        }
    }
    buf[(x, y)].set_symbol(symbol).set_style(style);
}

fn draw_sidebar(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8), // Stats
            Constraint::Length(3), // Pieces
            Constraint::Length(3), // Quake gauge
            Constraint::Min(0),    // Controls
        ])
        .split(area);

    let stat = |label: &'static str, value: String| {
        Line::from(vec![Span::styled(label, title_style), Span::styled(value, fg_style)])
    };
    let stats = &state.stats;
    let lines = vec![
        stat("Score: ", stats.score.to_string()),
        stat("Swaps: ", stats.swaps.to_string()),
        stat("Refused: ", stats.rejected.to_string()),
        stat("Bombs: ", stats.bombs.to_string()),
        stat("Quaked: ", stats.quake_clears.to_string()),
        stat("Seed: ", state.seed().to_string()),
    ];
    let block = Block::default().borders(Borders::ALL).border_style(border_style);
    let inner = block.inner(chunks[0]);
    block.render(chunks[0], frame.buffer_mut());
    Paragraph::new(Text::from(lines)).render(inner, frame.buffer_mut());

    let block = Block::default().borders(Borders::ALL).border_style(border_style);
    let inner = block.inner(chunks[1]);
    block.render(chunks[1], frame.buffer_mut());
    let strip: Vec<Span> = (0..state.config().kinds)
        .map(|k| {
            let kind = Kind(k);
            Span::styled(format!("{} ", glyph(kind)), Style::default().fg(theme.piece_color(kind)))
        })
        .collect();
    Paragraph::new(Line::from(strip)).render(inner, frame.buffer_mut());

    let quake = state.quake();
    let limit = state.config().quake_frame_limit.max(1);
    let ratio = if quake.limit_reached {
        1.0
    } else {
        (f64::from(quake.ticks) / f64::from(limit)).min(1.0)
    };
    let bar_color = if quake.limit_reached {
        Color::Red
    } else if ratio > 0.6 {
        Color::Yellow
    } else {
        Color::Green
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(" Quake ", title_style));
    let inner = block.inner(chunks[2]);
    block.render(chunks[2], frame.buffer_mut());
    Gauge::default()
        .ratio(ratio)
        .label("")
        .gauge_style(Style::default().fg(bar_color))
        .render(inner, frame.buffer_mut());

    let help = [
        "drag  swap",
        "b     bomb",
        "x     quake",
        "a/d   rotate",
        "p     pause",
        "q     quit",
    ];
    let lines: Vec<Line> = help.iter().map(|h| Line::from(Span::styled(*h, fg_style))).collect();
    Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).border_style(border_style))
        .render(chunks[3], frame.buffer_mut());
}

fn centered(area: Rect, w: u16, h: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(w) / 2,
        y: area.y + area.height.saturating_sub(h) / 2,
        width: w.min(area.width),
        height: h.min(area.height),
    }
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = centered(area, 28, 5);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(" P  Resume    Q  Quit ", Style::default().fg(theme.main_fg))),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}

pub fn draw_quit_menu(frame: &mut Frame, theme: &Theme, selected: QuitOption) {
    let quit_rect = centered(frame.area(), 24, 6);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.title))
        .title(" Quit? ");

    for y in quit_rect.y..quit_rect.y + quit_rect.height {
        for x in quit_rect.x..quit_rect.x + quit_rect.width {
            frame.buffer_mut()[(x, y)].set_symbol(" ").set_style(Style::default().bg(theme.bg));
        }
    }
    let inner = block.inner(quit_rect);
    block.render(quit_rect, frame.buffer_mut());

    for (i, opt) in QuitOption::ALL.iter().enumerate() {
        let label = opt.label();
        let style = if *opt == selected {
            Style::default().fg(theme.bg).bg(theme.title).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.title)
        };
        let rx = inner.x + inner.width.saturating_sub(label.len() as u16) / 2;
        let ry = inner.y + 1 + i as u16 * 2;
        if ry < inner.y + inner.height {
            frame.buffer_mut().set_string(rx, ry, label, style);
        }
    }
}
