//! Remote entity reconciliation
//!
//! Every `player_update` from the relay is a complete roster: peers present in it are
//! inserted or retargeted, peers missing from it are evicted on the spot. Displayed
//! positions are never taken from the wire after insertion; they only chase their
//! targets through first-order exponential smoothing in [`Reconciler::advance`].

use log::{debug, warn};
use shared::{PeerId, Rect, RosterSnapshot, Vec2, PLAYER_SIZE};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteEntity {
    pub id: PeerId,
    pub name: String,
    pub score: i64,
    /// Smoothed position used for rendering and stomp checks
    pub current: Vec2,
    /// Last position reported by the server
    pub target: Vec2,
}

impl RemoteEntity {
    fn new(id: PeerId, name: String, score: i64, position: Vec2) -> Self {
        Self {
            id,
            name,
            score,
            current: position,
            target: position,
        }
    }

    /// Box at the displayed position
    pub fn bounds(&self) -> Rect {
        Rect::at(self.current, PLAYER_SIZE, PLAYER_SIZE)
    }
}

/// Counts from one snapshot application
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotSummary {
    pub inserted: usize,
    pub updated: usize,
    pub removed: usize,
    pub skipped: usize,
}

#[derive(Debug, Default)]
pub struct Reconciler {
    roster: HashMap<PeerId, RemoteEntity>,
    local_id: Option<PeerId>,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn local_id(&self) -> Option<&PeerId> {
        self.local_id.as_ref()
    }

    /// Records this session's own identity and drops any entity already shown for it
    pub fn set_local_id(&mut self, id: PeerId) {
        self.roster.remove(&id);
        self.local_id = Some(id);
    }

    pub fn clear_local_id(&mut self) {
        self.local_id = None;
    }

    fn is_local(&self, id: &PeerId) -> bool {
        self.local_id.as_ref() == Some(id)
    }

    /// Merges a full roster snapshot: insert new peers, retarget known ones, evict absent ones.
    ///
    /// A malformed entry is skipped on its own. If it belongs to a peer already in the
    /// roster that peer is kept unchanged, since the snapshot still lists it.
    pub fn apply_snapshot(&mut self, snapshot: &RosterSnapshot) -> SnapshotSummary {
        let mut summary = SnapshotSummary::default();

        for (id, entry) in snapshot.entries() {
            if self.is_local(&id) {
                continue;
            }

            let state = match entry {
                Ok(state) => state,
                Err(e) => {
                    warn!("Skipping roster entry: {}", e);
                    summary.skipped += 1;
                    continue;
                }
            };
            let position = Vec2::new(state.x, state.y);

            match self.roster.get_mut(&id) {
                Some(entity) => {
                    entity.target = position;
                    entity.name = state.username;
                    entity.score = state.score;
                    summary.updated += 1;
                }
                None => {
                    debug!("Peer {} joined at ({:.1}, {:.1})", id, state.x, state.y);
                    self.roster.insert(
                        id.clone(),
                        RemoteEntity::new(id, state.username, state.score, position),
                    );
                    summary.inserted += 1;
                }
            }
        }

        let before = self.roster.len();
        self.roster.retain(|id, _| {
            let keep = snapshot.contains(id);
            if !keep {
                debug!("Peer {} left", id);
            }
            keep
        });
        summary.removed = before - self.roster.len();

        summary
    }

    /// Moves every displayed position `factor` of the way toward its target
    pub fn advance(&mut self, factor: f32) {
        for entity in self.roster.values_mut() {
            entity.current = entity.current.lerp_toward(entity.target, factor);
        }
    }

    /// Forgets every remote entity, e.g. after losing the connection
    pub fn clear(&mut self) {
        self.roster.clear();
    }

    pub fn get(&self, id: &PeerId) -> Option<&RemoteEntity> {
        self.roster.get(id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &RemoteEntity> {
        self.roster.values()
    }

    pub fn len(&self) -> usize {
        self.roster.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roster.is_empty()
    }
}
