//! Session orchestration: one fixed-timestep tick ties the connection, the local
//! simulation, the reconciler and the throttler together.

use crate::config::ClientConfig;
use crate::game::{LocalPlayer, TickOutcome, World};
use crate::input::InputState;
use crate::network::{Connection, ConnectionState, NetworkEvent};
use crate::reconciler::{Reconciler, RemoteEntity};
use crate::throttle::UpdateThrottler;
use log::{debug, info};
use shared::{builtin_levels, ClientMessage, LeaderboardEntry, Level, PeerId, PeerState};
use std::time::{Duration, Instant};

pub const TICK_RATE: u32 = 60;

/// Upper bound on catch-up ticks after a long frame
const MAX_TICKS_PER_FRAME: u32 = 5;

/// Converts variable frame times into a whole number of fixed simulation ticks
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    step: Duration,
    accumulator: Duration,
}

impl FixedTimestep {
    pub fn new(tick_rate: u32) -> Self {
        Self {
            step: Duration::from_secs(1) / tick_rate.max(1),
            accumulator: Duration::ZERO,
        }
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    /// Adds `elapsed` and returns how many ticks are due. Backlog beyond the
    /// per-frame cap is discarded rather than simulated.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.accumulator += elapsed;
        let mut ticks = 0;
        while self.accumulator >= self.step {
            self.accumulator -= self.step;
            ticks += 1;
        }
        if ticks > MAX_TICKS_PER_FRAME {
            debug!("Dropping {} simulation ticks", ticks - MAX_TICKS_PER_FRAME);
            ticks = MAX_TICKS_PER_FRAME;
        }
        ticks
    }
}

/// What happened during one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub outcome: TickOutcome,
    pub stomped: bool,
}

pub struct Session {
    config: ClientConfig,
    connection: Box<dyn Connection>,
    world: World,
    reconciler: Reconciler,
    throttler: UpdateThrottler,
    score: i64,
    leaderboard: Vec<LeaderboardEntry>,
}

impl Session {
    pub fn new(config: ClientConfig, connection: Box<dyn Connection>) -> Self {
        Self::with_levels(config, connection, builtin_levels())
    }

    pub fn with_levels(
        config: ClientConfig,
        connection: Box<dyn Connection>,
        levels: Vec<Level>,
    ) -> Self {
        let world = World::new(levels, config.physics);
        let throttler = UpdateThrottler::new(config.update_interval);
        Self {
            config,
            connection,
            world,
            reconciler: Reconciler::new(),
            throttler,
            score: 0,
            leaderboard: Vec::new(),
        }
    }

    pub fn start(&mut self) {
        self.connection.connect();
    }

    pub fn shutdown(&mut self) {
        self.connection.disconnect();
    }

    /// Runs one fixed simulation step
    pub fn tick(&mut self, input: &InputState, now: Instant) -> TickReport {
        for event in self.connection.drain_events() {
            self.handle_event(event);
        }

        let outcome = self.world.tick(input);
        if outcome == TickOutcome::ReachedGoal {
            self.score += 1;
            info!(
                "Reached the goal, now on level {} (score {})",
                self.world.level_index(),
                self.score
            );
            self.connection.send(ClientMessage::AdvanceLevel);
        }

        let mut stomped = false;
        for entity in self.reconciler.entities() {
            if self.world.player.try_stomp(&entity.bounds()) {
                debug!("Stomped on {}", entity.id);
                stomped = true;
                break;
            }
        }

        if self.throttler.poll(now) {
            let position = self.world.player.position;
            self.connection.send(ClientMessage::PlayerUpdate(PeerState {
                x: position.x,
                y: position.y,
                username: self.config.username.clone(),
                score: self.score,
            }));
        }

        self.reconciler.advance(self.config.smoothing_factor);

        TickReport { outcome, stomped }
    }

    fn handle_event(&mut self, event: NetworkEvent) {
        match event {
            NetworkEvent::Connected => {
                info!("Session connected");
                self.throttler.reset();
            }
            NetworkEvent::Disconnected => {
                info!("Session disconnected, clearing {} remote players", self.reconciler.len());
                self.reconciler.clear();
                self.reconciler.clear_local_id();
            }
            NetworkEvent::IdentityAssigned(id) => {
                self.reconciler.set_local_id(id);
            }
            NetworkEvent::RosterSnapshot(snapshot) => {
                let summary = self.reconciler.apply_snapshot(&snapshot);
                if summary.inserted + summary.removed + summary.skipped > 0 {
                    debug!("Roster changed: {:?}", summary);
                }
            }
            NetworkEvent::LevelAdvance => {
                self.world.advance_level();
                info!("Peer reached the goal, now on level {}", self.world.level_index());
            }
            NetworkEvent::Leaderboard(entries) => {
                self.leaderboard = entries;
            }
        }
    }

    pub fn player(&self) -> &LocalPlayer {
        &self.world.player
    }

    pub fn level(&self) -> &Level {
        self.world.level()
    }

    pub fn level_index(&self) -> usize {
        self.world.level_index()
    }

    pub fn remote_entities(&self) -> impl Iterator<Item = &RemoteEntity> {
        self.reconciler.entities()
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn local_id(&self) -> Option<&PeerId> {
        self.reconciler.local_id()
    }

    pub fn leaderboard(&self) -> &[LeaderboardEntry] {
        &self.leaderboard
    }

    pub fn score(&self) -> i64 {
        self.score
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.connection.disconnect();
    }
}
