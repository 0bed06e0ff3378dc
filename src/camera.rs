//! Orthographic camera: maps normalized device coordinates to board world space.

use crate::board::Vec2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Half-extents of the visible world at zero rotation.
    window_size: Vec2,
    /// World-space shift; the quake shakes this.
    pub offset: Vec2,
    /// Radians, counter-clockwise.
    pub rotation: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec2::new(1.0, 1.0))
    }
}

impl Camera {
    pub fn new(window_size: Vec2) -> Self {
        Self {
            window_size,
            offset: Vec2::ZERO,
            rotation: 0.0,
        }
    }

    #[inline]
    pub fn viewport_size(&self) -> Vec2 {
        self.window_size
    }

    pub fn ndc_to_world(&self, ndc: Vec2) -> Vec2 {
        self.ndc_delta_to_world(ndc) + self.offset
    }

    /// Same as `ndc_to_world` without the offset, for pointer drag deltas.
    pub fn ndc_delta_to_world(&self, d: Vec2) -> Vec2 {
        Vec2::new(d.x * self.window_size.x, d.y * self.window_size.y).rotated(self.rotation)
    }

    pub fn world_to_ndc(&self, world: Vec2) -> Vec2 {
        let local = (world - self.offset).rotated(-self.rotation);
        Vec2::new(local.x / self.window_size.x, local.y / self.window_size.y)
    }

    pub fn rotate(&mut self, delta: f32) {
        self.rotation = (self.rotation + delta) % std::f32::consts::TAU;
    }
}
