// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Uniform pan + zoom mapping between world and screen coordinates.

use kurbo::{Point, Rect, Vec2};

/// World → screen transform: `screen = world · scale + offset`.
///
/// The scale is uniform and clamped to `[1e-3, 1e3]`. Box selection and
/// pointer-driven interaction use the inverse mapping to carry screen-space
/// gestures into world space.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    offset: Vec2,
    scale: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera {
    const MIN_SCALE: f64 = 1e-3;
    const MAX_SCALE: f64 = 1e3;

    /// Identity camera: world and screen coincide.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
        }
    }

    /// Current screen-space offset.
    #[must_use]
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Current uniform zoom factor.
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Set the offset outright.
    pub fn set_offset(&mut self, offset: Vec2) {
        self.offset = offset;
    }

    /// Set the zoom factor, clamped into the supported range.
    pub fn set_scale(&mut self, scale: f64) {
        self.scale = scale.clamp(Self::MIN_SCALE, Self::MAX_SCALE);
    }

    /// Pan by a screen-space delta.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Zoom by `factor` around a screen-space anchor, keeping the world point
    /// under the anchor fixed.
    pub fn zoom_about(&mut self, anchor: Point, factor: f64) {
        if factor <= 0.0 {
            return;
        }
        let new_scale = (self.scale * factor).clamp(Self::MIN_SCALE, Self::MAX_SCALE);
        if (new_scale - self.scale).abs() < f64::EPSILON {
            return;
        }
        let world = self.screen_to_world_point(anchor);
        self.scale = new_scale;
        self.offset = anchor - Point::new(world.x * new_scale, world.y * new_scale);
    }

    /// Map a world point to screen coordinates.
    #[must_use]
    pub fn world_to_screen_point(&self, world: Point) -> Point {
        Point::new(
            world.x * self.scale + self.offset.x,
            world.y * self.scale + self.offset.y,
        )
    }

    /// Map a screen point to world coordinates.
    #[must_use]
    pub fn screen_to_world_point(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.offset.x) / self.scale,
            (screen.y - self.offset.y) / self.scale,
        )
    }

    /// Map a screen rect to world coordinates.
    #[must_use]
    pub fn screen_to_world_rect(&self, screen: Rect) -> Rect {
        let p0 = self.screen_to_world_point(Point::new(screen.x0, screen.y0));
        let p1 = self.screen_to_world_point(Point::new(screen.x1, screen.y1));
        Rect::new(p0.x, p0.y, p1.x, p1.y)
    }

    /// Map a world rect to screen coordinates.
    #[must_use]
    pub fn world_to_screen_rect(&self, world: Rect) -> Rect {
        let p0 = self.world_to_screen_point(Point::new(world.x0, world.y0));
        let p1 = self.world_to_screen_point(Point::new(world.x1, world.y1));
        Rect::new(p0.x, p0.y, p1.x, p1.y)
    }
}
