//! # robosim-geom
//!
//! Spatial primitives for the robosim arena.
//!
//! The arena works in a pre-scaled pixel space: map files place entities on a
//! coarse grid, and the engine multiplies grid coordinates by [`GRID_SCALE`]
//! on load. Every occupant is anchored at the top-left corner of its cell, so
//! an agent's body circle is centered half a cell away from its [`Position`].
//!
//! ## Quick Start
//!
//! ```
//! use robosim_geom::{Circle, Position, Rect, BODY_RADIUS, HULL_RADIUS, OBSTACLE_SIZE};
//!
//! let agent = Position::new(0.0, 0.0);
//! let obstacle = Rect::square(Position::new(30.0, 0.0), OBSTACLE_SIZE);
//!
//! // The hull touches the obstacle edge: solid boundaries count as contact.
//! assert!(Circle::hull(agent).overlaps_rect(&obstacle));
//!
//! // Two bodies one cell apart do not overlap.
//! let other = Position::new(30.0, 0.0);
//! assert!(!Circle::body(agent).overlaps_circle(&Circle::body(other)));
//! # let _ = (BODY_RADIUS, HULL_RADIUS);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Arena width in pixel space.
pub const ARENA_WIDTH: f64 = 1110.0;

/// Arena height in pixel space.
pub const ARENA_HEIGHT: f64 = 630.0;

/// Side of one placement cell in pixel space.
pub const CELL_SIZE: f64 = 30.0;

/// Factor between map grid units and pixel space.
pub const GRID_SCALE: f64 = 30.0;

/// Radius of an agent body, used for agent-vs-agent contact.
pub const BODY_RADIUS: f64 = 14.0;

/// Radius of an agent hull, used for agent-vs-obstacle contact.
pub const HULL_RADIUS: f64 = 15.0;

/// Side of an obstacle's square footprint.
pub const OBSTACLE_SIZE: f64 = 29.0;

// =============================================================================
// Position
// =============================================================================

/// A point in arena pixel space.
///
/// Positions are plain values: two positions are the same occupant cell
/// exactly when both coordinates compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate (grows downward).
    pub y: f64,
}

impl Position {
    /// The arena origin.
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    /// Creates a position from raw coordinates.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns the position as a `DVec2`.
    #[must_use]
    pub fn as_dvec2(self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    /// Returns the center of the cell anchored at this position.
    #[must_use]
    pub fn cell_center(self) -> DVec2 {
        self.as_dvec2() + DVec2::splat(CELL_SIZE / 2.0)
    }

    /// Returns the position one unit further along `heading_degrees`.
    ///
    /// Zero degrees points along +x and angles grow clockwise on screen,
    /// since +y points down.
    #[must_use]
    pub fn advanced(self, heading_degrees: f64) -> Self {
        let radians = heading_degrees.to_radians();
        Self::from(self.as_dvec2() + DVec2::new(radians.cos(), radians.sin()))
    }

    /// Multiplies both coordinates by `factor`.
    #[must_use]
    pub fn scaled(self, factor: f64) -> Self {
        Self::from(self.as_dvec2() * factor)
    }
}

impl From<DVec2> for Position {
    fn from(v: DVec2) -> Self {
        Self::new(v.x, v.y)
    }
}

// =============================================================================
// Bounds
// =============================================================================

/// Rectangular extent of the arena, anchored at the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Exclusive upper limit for x.
    pub width: f64,
    /// Exclusive upper limit for y.
    pub height: f64,
}

impl Bounds {
    /// Create bounds from dimensions.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Check if a position lies inside the bounds.
    ///
    /// The lower edges are inclusive and the upper edges exclusive.
    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        position.x >= 0.0
            && position.x < self.width
            && position.y >= 0.0
            && position.y < self.height
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(ARENA_WIDTH, ARENA_HEIGHT)
    }
}

// =============================================================================
// Shapes
// =============================================================================

/// A circle in pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    /// Circle center.
    pub center: DVec2,
    /// Circle radius.
    pub radius: f64,
}

impl Circle {
    /// Creates a circle.
    #[must_use]
    pub const fn new(center: DVec2, radius: f64) -> Self {
        Self { center, radius }
    }

    /// The body circle of an agent standing at `position`.
    #[must_use]
    pub fn body(position: Position) -> Self {
        Self::new(position.cell_center(), BODY_RADIUS)
    }

    /// The hull circle of an agent standing at `position`.
    #[must_use]
    pub fn hull(position: Position) -> Self {
        Self::new(position.cell_center(), HULL_RADIUS)
    }

    /// Strict overlap: centers closer than the sum of the radii.
    #[must_use]
    pub fn overlaps_circle(&self, other: &Circle) -> bool {
        circles_overlap(self.center, self.radius, other.center, other.radius)
    }

    /// Closed overlap with a rectangle: touching the edge counts.
    #[must_use]
    pub fn overlaps_rect(&self, rect: &Rect) -> bool {
        circle_rect_overlap(self, rect)
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Top-left corner.
    pub min: DVec2,
    /// Width and height.
    pub size: DVec2,
}

impl Rect {
    /// Creates a rectangle from its top-left corner and size.
    #[must_use]
    pub const fn new(min: DVec2, size: DVec2) -> Self {
        Self { min, size }
    }

    /// A square of side `side` anchored at `position`.
    #[must_use]
    pub fn square(position: Position, side: f64) -> Self {
        Self::new(position.as_dvec2(), DVec2::splat(side))
    }

    /// The footprint of an obstacle at `position`.
    #[must_use]
    pub fn obstacle(position: Position) -> Self {
        Self::square(position, OBSTACLE_SIZE)
    }

    /// Bottom-right corner.
    #[must_use]
    pub fn max(&self) -> DVec2 {
        self.min + self.size
    }

    /// The point of the rectangle closest to `point`.
    #[must_use]
    pub fn closest_point(&self, point: DVec2) -> DVec2 {
        point.clamp(self.min, self.max())
    }
}

// =============================================================================
// Free-standing tests
// =============================================================================

/// True iff `(x, y)` lies inside the default arena bounds.
#[must_use]
pub fn within_bounds(x: f64, y: f64) -> bool {
    Bounds::default().contains(Position::new(x, y))
}

/// True iff the center distance is strictly less than `r1 + r2`.
#[must_use]
pub fn circles_overlap(c1: DVec2, r1: f64, c2: DVec2, r2: f64) -> bool {
    let reach = r1 + r2;
    c1.distance_squared(c2) < reach * reach
}

/// True iff the rectangle point closest to the circle center lies within the
/// radius (inclusive).
#[must_use]
pub fn circle_rect_overlap(circle: &Circle, rect: &Rect) -> bool {
    let closest = rect.closest_point(circle.center);
    circle.center.distance_squared(closest) <= circle.radius * circle.radius
}
