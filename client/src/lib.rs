//! # Platformer Client Library
//!
//! Client-side implementation of the multiplayer platformer: a deterministic local
//! simulation of one player and a smoothed, best-effort view of every other connected
//! player, kept in sync through full-roster broadcasts from a relay server.
//!
//! ## Architecture Overview
//!
//! ### Local Simulation
//! The local player is simulated entirely on this client at a fixed tick rate. Input,
//! gravity and axis-separated platform collision are applied in the same order every
//! tick, so the same inputs always produce the same trajectory.
//!
//! ### Roster Reconciliation
//! The relay periodically broadcasts the complete set of connected peers. Each snapshot
//! replaces the previous view: unknown peers are inserted at their reported position,
//! known peers get a new target, and peers missing from the snapshot are dropped.
//! Displayed positions then glide toward their targets with exponential smoothing.
//!
//! ### Throttled Updates
//! The local state is sent at most once per update interval regardless of the frame
//! rate. Skipped intervals are not made up later.
//!
//! ## Module Organization
//!
//! - `game`: local player kinematics, level progression, stomp detection
//! - `reconciler`: remote roster diffing and smoothing
//! - `network`: the `Connection` trait with WebSocket and offline implementations
//! - `throttle`: outbound rate limiting
//! - `session`: the per-tick orchestration of all of the above
//! - `input`: keyboard sampling into an explicit input state
//! - `rendering`: macroquad drawing and the mode selection menu
//! - `config`: every tunable in one place
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::config::ClientConfig;
//! use client::input::InputState;
//! use client::network::OfflineConnection;
//! use client::session::Session;
//! use std::time::Instant;
//!
//! let mut session = Session::new(ClientConfig::default(), Box::new(OfflineConnection::new()));
//! session.start();
//!
//! loop {
//!     session.tick(&InputState::idle(), Instant::now());
//!     // draw session.player(), session.remote_entities(), ...
//! }
//! ```
//!
//! ## Concurrency
//!
//! All game state lives on the main loop. The WebSocket connection runs on a tokio
//! task and only communicates through channels: inbound events are queued and drained
//! at the start of every tick, so a snapshot is never applied while the simulation is
//! reading the roster.

pub mod config;
pub mod error;
pub mod game;
pub mod input;
pub mod network;
pub mod reconciler;
pub mod rendering;
pub mod session;
pub mod throttle;
