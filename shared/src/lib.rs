//! Types shared between the platformer client and anything speaking its wire protocol:
//! world constants, axis-aligned geometry, level tables and the JSON message contract.

pub mod geometry;
pub mod level;
pub mod protocol;

pub use geometry::{lerp, Rect, Vec2};
pub use level::{builtin_levels, Level, Platform};
pub use protocol::{
    ClientMessage, LeaderboardEntry, PeerId, PeerState, ProtocolError, RosterSnapshot,
    ServerMessage,
};

pub const WORLD_WIDTH: f32 = 800.0;
pub const WORLD_HEIGHT: f32 = 600.0;

/// Edge length of every player box, local and remote
pub const PLAYER_SIZE: f32 = 50.0;
