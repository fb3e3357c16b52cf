//! Client tunables

use crate::game::PhysicsTuning;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    Singleplayer,
    Multiplayer,
}

impl GameMode {
    pub fn title(&self) -> &'static str {
        match self {
            GameMode::Singleplayer => "Singleplayer",
            GameMode::Multiplayer => "Multiplayer",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Relay server WebSocket URL
    pub server_url: String,
    /// Display name sent with every outbound update
    pub username: String,
    /// Fraction of the remaining distance a remote entity closes per tick
    pub smoothing_factor: f32,
    /// Minimum spacing between outbound `player_update` messages
    pub update_interval: Duration,
    /// Fixed delay between reconnection attempts
    pub reconnect_delay: Duration,
    pub heartbeat_interval: Duration,
    /// Silence after which the link is considered dead
    pub heartbeat_timeout: Duration,
    /// Capacity of the inbound event queue drained by the main loop
    pub event_queue_capacity: usize,
    pub physics: PhysicsTuning,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://127.0.0.1:8080".to_string(),
            username: "player".to_string(),
            smoothing_factor: 0.1,
            update_interval: Duration::from_millis(50),
            reconnect_delay: Duration::from_secs(1),
            heartbeat_interval: Duration::from_secs(30),
            heartbeat_timeout: Duration::from_secs(90),
            event_queue_capacity: 256,
            physics: PhysicsTuning::default(),
        }
    }
}

/// Parses a smoothing factor, accepting only finite values in `(0, 1]`
pub fn parse_smoothing_factor(text: &str) -> Result<f32, String> {
    let factor: f32 = text
        .trim()
        .parse()
        .map_err(|e| format!("`{}` is not a number: {}", text, e))?;
    if factor.is_finite() && factor > 0.0 && factor <= 1.0 {
        Ok(factor)
    } else {
        Err(format!("smoothing factor must be in (0, 1], got {}", text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_smoothing_factor() {
        assert_eq!(parse_smoothing_factor("0.25"), Ok(0.25));
        assert_eq!(parse_smoothing_factor("1"), Ok(1.0));
        for bad in ["NaN", "inf", "-inf", "0", "-0.5", "1.5", "fast"] {
            assert!(parse_smoothing_factor(bad).is_err(), "{} was accepted", bad);
        }
    }

    #[test]
    fn test_default_timings() {
        let config = ClientConfig::default();
        assert_eq!(config.update_interval, Duration::from_millis(50));
        assert_eq!(config.reconnect_delay, Duration::from_secs(1));
        assert_eq!(config.heartbeat_interval, Duration::from_secs(30));
        assert_eq!(config.heartbeat_timeout, Duration::from_secs(90));
        assert_eq!(config.smoothing_factor, 0.1);
    }
}
