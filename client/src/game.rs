//! Deterministic local simulation of the player-controlled entity

use crate::input::InputState;
use log::debug;
use shared::{builtin_levels, Level, Platform, Rect, Vec2, PLAYER_SIZE};

/// Maximum overlap from the top of a remote box that still counts as landing on it
pub const STOMP_DEPTH: f32 = 10.0;
/// Fraction of the jump impulse applied when bouncing off a remote player
pub const STOMP_BOUNCE: f32 = 0.75;

/// Per-tick movement constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsTuning {
    pub speed: f32,
    /// Negative: y grows downward
    pub jump_impulse: f32,
    pub gravity: f32,
    pub terminal_velocity: f32,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            speed: 5.0,
            jump_impulse: -15.0,
            gravity: 1.0,
            terminal_velocity: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalPlayer {
    pub position: Vec2,
    pub velocity: Vec2,
    pub width: f32,
    pub height: f32,
    pub grounded: bool,
    pub tuning: PhysicsTuning,
}

impl LocalPlayer {
    pub fn new(start: Vec2, tuning: PhysicsTuning) -> Self {
        Self {
            position: start,
            velocity: Vec2::default(),
            width: PLAYER_SIZE,
            height: PLAYER_SIZE,
            grounded: false,
            tuning,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::at(self.position, self.width, self.height)
    }

    /// Sets horizontal velocity from the held keys and starts a jump when grounded.
    /// Right is applied after left, so it wins when both are held.
    pub fn apply_input(&mut self, input: &InputState) {
        self.velocity.x = 0.0;
        if input.left {
            self.velocity.x = -self.tuning.speed;
        }
        if input.right {
            self.velocity.x = self.tuning.speed;
        }

        if input.jump && self.grounded {
            self.velocity.y = self.tuning.jump_impulse;
            self.grounded = false;
        }
    }

    /// Gravity, then horizontal move-and-resolve, then vertical move-and-resolve
    pub fn step(&mut self, platforms: &[Platform]) {
        self.velocity.y =
            (self.velocity.y + self.tuning.gravity).min(self.tuning.terminal_velocity);

        self.position.x += self.velocity.x;
        for platform in platforms {
            if self.bounds().intersects(platform) {
                if self.velocity.x > 0.0 {
                    self.position.x = platform.left() - self.width;
                } else if self.velocity.x < 0.0 {
                    self.position.x = platform.right();
                }
                self.velocity.x = 0.0;
            }
        }

        self.position.y += self.velocity.y;
        self.grounded = false;
        for platform in platforms {
            if self.bounds().intersects(platform) {
                if self.velocity.y > 0.0 {
                    self.position.y = platform.top() - self.height;
                    self.velocity.y = 0.0;
                    self.grounded = true;
                } else if self.velocity.y < 0.0 {
                    self.position.y = platform.bottom();
                    self.velocity.y = 0.0;
                }
            }
        }
    }

    pub fn respawn(&mut self, start: Vec2) {
        self.position = start;
        self.velocity = Vec2::default();
        self.grounded = false;
    }

    /// Bounces off `other` when falling onto its top edge. Purely local; the other
    /// player's client never learns about it.
    pub fn try_stomp(&mut self, other: &Rect) -> bool {
        let bounds = self.bounds();
        if self.velocity.y > 0.0
            && bounds.intersects(other)
            && bounds.bottom() - other.top() < STOMP_DEPTH
        {
            self.velocity.y = self.tuning.jump_impulse * STOMP_BOUNCE;
            self.grounded = false;
            return true;
        }
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Running,
    Respawned,
    ReachedGoal,
}

/// Local player plus the active level
#[derive(Debug, Clone)]
pub struct World {
    levels: Vec<Level>,
    level_index: usize,
    pub player: LocalPlayer,
}

impl World {
    pub fn new(levels: Vec<Level>, tuning: PhysicsTuning) -> Self {
        let levels = if levels.is_empty() {
            builtin_levels()
        } else {
            levels
        };
        let player = LocalPlayer::new(levels[0].start, tuning);
        Self {
            levels,
            level_index: 0,
            player,
        }
    }

    pub fn level(&self) -> &Level {
        &self.levels[self.level_index]
    }

    pub fn level_index(&self) -> usize {
        self.level_index
    }

    pub fn tick(&mut self, input: &InputState) -> TickOutcome {
        self.player.apply_input(input);
        self.player.step(&self.levels[self.level_index].platforms);

        let bounds = self.player.bounds();
        let level = self.level();
        if level.is_out_of_bounds(&bounds) {
            let start = level.start;
            debug!("Player left the level at {:?}, respawning", self.player.position);
            self.player.respawn(start);
            return TickOutcome::Respawned;
        }

        if level.reached_goal(&bounds) {
            self.advance_level();
            return TickOutcome::ReachedGoal;
        }

        TickOutcome::Running
    }

    /// Switches to the next level, wrapping after the last, and moves the player to its start
    pub fn advance_level(&mut self) {
        self.level_index = (self.level_index + 1) % self.levels.len();
        let start = self.levels[self.level_index].start;
        self.player.respawn(start);
        debug!("Advanced to level {}", self.level_index);
    }
}
