//! Game controller: owns the board, selection and camera, and advances them one
//! tick at a time from an `InputFrame`.

use crate::GameConfig;
use crate::board::{BoardLayout, Coord, Grid, Kind, Vec2};
use crate::camera::Camera;
use crate::input::InputFrame;
use crate::kinds::{KindSource, RandomKinds};
use crate::mutator::{SwapOutcome, clear_cell, collapse, try_swap};
use crate::selection::Selection;
use tracing::{debug, info};

/// Camera jitter per quake tick, in world units.
const QUAKE_AMPLITUDE: f32 = 0.02;

/// Camera turn per tick while a rotate key is held (radians).
const ROTATE_STEP: f32 = 0.02;

/// Share of the remaining distance a cell covers per tick when easing home.
const SETTLE_RATE: f32 = 0.3;

/// Closer than this, a cell snaps to its slot.
const SETTLE_EPSILON: f32 = 1e-3;

/// Ticks an exit effect lives.
pub const EXIT_TICKS: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Selected,
}

/// A cleared piece shrinking away where it used to be.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitFx {
    pub position: Vec2,
    pub kind: Kind,
    pub ticks_left: u32,
}

impl ExitFx {
    /// 1.0 when spawned, 0.0 when gone.
    pub fn scale(&self) -> f32 {
        self.ticks_left as f32 / EXIT_TICKS as f32
    }
}

/// Shake trigger bookkeeping. `limit_reached` stays set until the key is
/// released so holding it never re-arms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Quake {
    pub ticks: u32,
    pub limit_reached: bool,
}

impl Quake {
    pub fn is_shaking(&self) -> bool {
        self.ticks > 0 && !self.limit_reached
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub score: u32,
    pub swaps: u32,
    pub rejected: u32,
    pub bombs: u32,
    pub quake_clears: u32,
    /// Bumped every time a swap clears cells; the renderer restarts its flash on change.
    pub clear_events: u64,
}

#[derive(Debug)]
pub struct GameState {
    config: GameConfig,
    pub camera: Camera,
    grid: Option<Grid>,
    selection: Selection,
    kinds: RandomKinds,
    quake: Quake,
    /// Selected cell is following the pointer.
    dragging: bool,
    /// Neighbour currently under the held pointer.
    drop_target: Option<Coord>,
    pub exits: Vec<ExitFx>,
    pub stats: Stats,
    /// Cells cleared by the most recent accepted swap.
    pub last_cleared: Vec<Coord>,
    pub tick_count: u64,
}

impl GameState {
    pub fn new(config: &GameConfig) -> Self {
        let kinds = RandomKinds::new(config.kinds, config.seed);
        info!(
            seed = kinds.seed(),
            rows = config.rows,
            cols = config.cols,
            kinds = kinds.num_kinds(),
            "new game"
        );
        Self {
            config: config.clone(),
            camera: Camera::default(),
            grid: None,
            selection: Selection::default(),
            kinds,
            quake: Quake::default(),
            dragging: false,
            drop_target: None,
            exits: Vec::new(),
            stats: Stats::default(),
            last_cleared: Vec::new(),
            tick_count: 0,
        }
    }

    pub fn grid(&self) -> Option<&Grid> {
        self.grid.as_ref()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn quake(&self) -> Quake {
        self.quake
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Neighbour the selection would swap with if the pointer came up now.
    pub fn drop_target(&self) -> Option<Coord> {
        self.drop_target
    }

    pub fn seed(&self) -> u64 {
        self.kinds.seed()
    }

    pub fn phase(&self) -> Phase {
        if self.selection.is_active() {
            Phase::Selected
        } else {
            Phase::Idle
        }
    }

    /// Advance one tick.
    pub fn update(&mut self, input: &InputFrame) {
        self.tick_count += 1;
        let mut grid = match self.grid.take() {
            Some(g) => g,
            None => self.build_board(),
        };

        if input.rotate_left_held {
            self.camera.rotate(ROTATE_STEP);
        }
        if input.rotate_right_held {
            self.camera.rotate(-ROTATE_STEP);
        }

        self.handle_pointer(&mut grid, input);

        let quaking = self.config.shake_enabled && input.shake_held;
        self.tick_quake(&mut grid, quaking);
        if !quaking {
            collapse(&mut grid, &mut self.kinds);
        }

        self.settle(&mut grid);
        self.grid = Some(grid);
    }

    fn build_board(&mut self) -> Grid {
        let (rows, cols) = (self.config.rows, self.config.cols);
        let layout = BoardLayout::for_window(self.camera.viewport_size(), rows, cols);
        debug!(?layout, "board initialised");
        Grid::new(rows, cols, layout, &mut self.kinds)
    }

    fn handle_pointer(&mut self, grid: &mut Grid, input: &InputFrame) {
        if let Some(down) = input.pointer_down_pos {
            if !self.selection.is_active() {
                if let Some(hit) = grid
                    .hit_test(self.camera.ndc_to_world(down))
                    .filter(|&hit| grid[hit].alive)
                {
                    self.selection.select(hit, grid.rows(), grid.cols());
                    self.dragging = self.config.drag_enabled;
                    debug!(?hit, "selected");
                }
            }
        }

        let Some(selected) = self.selection.cell() else {
            return;
        };

        if input.bomb_held {
            if let Some(kind) = clear_cell(grid, selected, &mut self.kinds) {
                self.push_exit(grid[selected].position, kind);
                self.stats.bombs += 1;
                debug!(?selected, "bomb");
            }
            self.release_selection();
            return;
        }

        if self.dragging && input.pointer_down {
            let delta = self.camera.ndc_delta_to_world(input.pointer_drag_delta);
            grid[selected].position += delta;
        }
        self.drop_target = if input.pointer_down {
            grid.hit_test(self.camera.ndc_to_world(input.pointer_pos))
                .filter(|&t| self.selection.direction_to(t).is_some())
        } else {
            None
        };

        let Some(up) = input.pointer_up_pos else {
            return;
        };
        let direction = grid
            .hit_test(self.camera.ndc_to_world(up))
            .and_then(|target| self.selection.direction_to(target));
        let Some(direction) = direction else {
            debug!(?selected, "selection cancelled");
            self.release_selection();
            return;
        };

        match try_swap(grid, &mut self.selection, direction, &mut self.kinds) {
            SwapOutcome::Cleared { matches, cleared } => {
                debug!(anchors = matches.len(), "cleared by swap");
                self.stats.swaps += 1;
                self.stats.score += cleared.len() as u32;
                self.stats.clear_events += 1;
                for cl in &cleared {
                    self.push_exit(grid[cl.coord].position, cl.kind);
                }
                self.last_cleared = cleared.iter().map(|cl| cl.coord).collect();
            }
            SwapOutcome::Rejected => self.stats.rejected += 1,
            SwapOutcome::Ignored => {}
        }
        self.release_selection();
    }

    fn release_selection(&mut self) {
        self.selection.reset();
        self.dragging = false;
        self.drop_target = None;
    }

    /// One quake tick: jitter the camera and knock out random cells, up to the limit.
    fn tick_quake(&mut self, grid: &mut Grid, held: bool) {
        if !held {
            if self.quake != Quake::default() {
                info!(ticks = self.quake.ticks, "quake released");
                self.quake = Quake::default();
                self.camera.offset = Vec2::ZERO;
            }
            return;
        }
        if self.quake.limit_reached {
            return;
        }
        if self.quake.ticks == 0 {
            info!("quake started");
        }

        self.quake.ticks += 1;
        self.camera.offset = Vec2::new(
            self.kinds.jitter(QUAKE_AMPLITUDE),
            self.kinds.jitter(QUAKE_AMPLITUDE),
        );
        for c in grid.coords() {
            if grid[c].alive && self.kinds.chance(self.config.quake_clear_chance) {
                if let Some(kind) = clear_cell(grid, c, &mut self.kinds) {
                    self.push_exit(grid[c].position, kind);
                    self.stats.quake_clears += 1;
                }
            }
        }

        if self.quake.ticks >= self.config.quake_frame_limit {
            self.quake.limit_reached = true;
            self.camera.offset = Vec2::ZERO;
            info!(limit = self.config.quake_frame_limit, "quake limit reached");
        }
    }

    /// Ease every cell towards its slot and age exit effects. A dragged cell
    /// stays under the pointer.
    fn settle(&mut self, grid: &mut Grid) {
        let held = if self.dragging { self.selection.cell() } else { None };
        for c in grid.coords() {
            if held == Some(c) {
                continue;
            }
            let cell = &mut grid[c];
            let next = if self.config.animate {
                cell.position.lerp(cell.original_position, SETTLE_RATE)
            } else {
                cell.original_position
            };
            cell.position = if (next - cell.original_position).length() < SETTLE_EPSILON {
                cell.original_position
            } else {
                next
            };
        }

        for fx in &mut self.exits {
            fx.ticks_left = fx.ticks_left.saturating_sub(1);
        }
        self.exits.retain(|fx| fx.ticks_left > 0);
    }

    fn push_exit(&mut self, position: Vec2, kind: Kind) {
        if self.config.animate {
            self.exits.push(ExitFx {
                position,
                kind,
                ticks_left: EXIT_TICKS,
            });
        }
    }
}

#[cfg(test)]
impl GameState {
    fn with_grid(config: &GameConfig, grid: Grid) -> Self {
        let mut state = Self::new(config);
        state.grid = Some(grid);
        state
    }
}
