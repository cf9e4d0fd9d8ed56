//! Live ball bookkeeping and identifier allocation.

use std::collections::BTreeMap;

use calm_rally_core::{BallId, BallSnapshot};

/// Handle the session keeps for a ball it launched.
#[derive(Clone, Debug)]
pub(crate) struct BallHandle {
    /// Identifier allocated by the session for the ball.
    pub(crate) id: BallId,
    /// Speed the ball was launched with.
    pub(crate) assigned_speed: f32,
    /// Whether the trajectory guide is shown.
    pub(crate) trajectory_assist: bool,
    /// Whether the ball glows.
    pub(crate) glowing: bool,
    /// Set once the physics collaborator reported the ball gone.
    destroyed: bool,
}

/// Registry of balls in play, bounded by a capacity.
///
/// Destroyed handles linger until the next mutating access prunes them.
#[derive(Debug)]
pub(crate) struct BallRegistry {
    entries: BTreeMap<BallId, BallHandle>,
    next_ball_id: BallId,
    capacity: usize,
}

impl BallRegistry {
    /// Creates an empty registry that holds at most `capacity` balls.
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            next_ball_id: BallId::new(0),
            capacity: capacity.max(1),
        }
    }

    /// Registers a new ball, evicting the oldest one when the registry is full.
    pub(crate) fn insert(
        &mut self,
        assigned_speed: f32,
        trajectory_assist: bool,
    ) -> (BallId, Option<BallId>) {
        self.prune();

        let evicted = if self.entries.len() >= self.capacity {
            self.entries.pop_first().map(|(id, _)| id)
        } else {
            None
        };

        let id = self.next_ball_id;
        self.next_ball_id = BallId::new(id.get().wrapping_add(1));
        let _ = self.entries.insert(
            id,
            BallHandle {
                id,
                assigned_speed,
                trajectory_assist,
                glowing: false,
                destroyed: false,
            },
        );
        (id, evicted)
    }

    /// Reports whether `id` refers to a ball still in play.
    pub(crate) fn is_live(&self, id: BallId) -> bool {
        self.entries.get(&id).is_some_and(|handle| !handle.destroyed)
    }

    /// Removes a live ball, returning its handle.
    pub(crate) fn remove(&mut self, id: BallId) -> Option<BallHandle> {
        if !self.is_live(id) {
            return None;
        }
        self.entries.remove(&id)
    }

    /// Marks a ball as gone, returning whether it was known and live.
    pub(crate) fn mark_destroyed(&mut self, id: BallId) -> bool {
        match self.entries.get_mut(&id) {
            Some(handle) if !handle.destroyed => {
                handle.destroyed = true;
                true
            }
            _ => false,
        }
    }

    /// Enables the trajectory guide on every live ball, returning their ids.
    pub(crate) fn assist_all(&mut self) -> Vec<BallId> {
        self.prune();
        self.entries
            .values_mut()
            .map(|handle| {
                handle.trajectory_assist = true;
                handle.id
            })
            .collect()
    }

    /// Makes every live ball glow, returning their ids.
    pub(crate) fn glow_all(&mut self) -> Vec<BallId> {
        self.prune();
        self.entries
            .values_mut()
            .map(|handle| {
                handle.glowing = true;
                handle.id
            })
            .collect()
    }

    /// Removes every ball, returning the ids of those still in play.
    pub(crate) fn drain(&mut self) -> Vec<BallId> {
        self.prune();
        std::mem::take(&mut self.entries).into_keys().collect()
    }

    /// Snapshots of the live balls ordered by identifier.
    pub(crate) fn snapshots(&self) -> Vec<BallSnapshot> {
        self.entries
            .values()
            .filter(|handle| !handle.destroyed)
            .map(|handle| BallSnapshot {
                id: handle.id,
                assigned_speed: handle.assigned_speed,
                trajectory_assist: handle.trajectory_assist,
                glowing: handle.glowing,
            })
            .collect()
    }

    /// Number of live balls.
    pub(crate) fn live_count(&self) -> usize {
        self.entries
            .values()
            .filter(|handle| !handle.destroyed)
            .count()
    }

    fn prune(&mut self) {
        self.entries.retain(|_, handle| !handle.destroyed);
    }
}
