//! Static level geometry

use crate::geometry::{Rect, Vec2};
use crate::{WORLD_HEIGHT, WORLD_WIDTH};

/// Immutable, solid rectangle the local player collides with
pub type Platform = Rect;

#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    pub platforms: Vec<Platform>,
    pub start: Vec2,
    /// Reaching this region advances to the next level
    pub goal: Option<Rect>,
    pub width: f32,
    pub height: f32,
}

impl Level {
    pub fn new(platforms: Vec<Platform>, start: Vec2, goal: Option<Rect>) -> Self {
        Self {
            platforms,
            start,
            goal,
            width: WORLD_WIDTH,
            height: WORLD_HEIGHT,
        }
    }

    /// True when `bounds` has dropped below the level or left it horizontally
    pub fn is_out_of_bounds(&self, bounds: &Rect) -> bool {
        bounds.top() > self.height || bounds.right() < 0.0 || bounds.left() > self.width
    }

    pub fn reached_goal(&self, bounds: &Rect) -> bool {
        self.goal.is_some_and(|goal| goal.intersects(bounds))
    }
}

/// Ground spanning the full width of the world
fn ground() -> Platform {
    Rect::new(0.0, WORLD_HEIGHT - 50.0, WORLD_WIDTH, 50.0)
}

/// Built-in levels, selected by index
pub fn builtin_levels() -> Vec<Level> {
    vec![
        Level::new(
            vec![
                ground(),
                Rect::new(100.0, 400.0, 200.0, 20.0),
                Rect::new(400.0, 300.0, 200.0, 20.0),
                Rect::new(250.0, 200.0, 150.0, 20.0),
            ],
            Vec2::new(50.0, WORLD_HEIGHT - 100.0),
            Some(Rect::new(300.0, 130.0, 40.0, 70.0)),
        ),
        Level::new(
            vec![
                Rect::new(0.0, WORLD_HEIGHT - 50.0, 300.0, 50.0),
                Rect::new(450.0, WORLD_HEIGHT - 50.0, 350.0, 50.0),
                Rect::new(320.0, 440.0, 110.0, 20.0),
                Rect::new(600.0, 350.0, 150.0, 20.0),
                Rect::new(380.0, 260.0, 160.0, 20.0),
                Rect::new(120.0, 180.0, 180.0, 20.0),
            ],
            Vec2::new(50.0, WORLD_HEIGHT - 100.0),
            Some(Rect::new(180.0, 110.0, 40.0, 70.0)),
        ),
        Level::new(
            vec![
                Rect::new(0.0, WORLD_HEIGHT - 50.0, 150.0, 50.0),
                Rect::new(220.0, 470.0, 100.0, 20.0),
                Rect::new(390.0, 400.0, 100.0, 20.0),
                Rect::new(560.0, 330.0, 100.0, 20.0),
                Rect::new(390.0, 240.0, 100.0, 20.0),
                Rect::new(560.0, 150.0, 200.0, 20.0),
            ],
            Vec2::new(50.0, WORLD_HEIGHT - 100.0),
            Some(Rect::new(690.0, 80.0, 40.0, 70.0)),
        ),
    ]
}
