//! Deferred Commands
//!
//! Work that must not happen while the scene is walking its entities:
//! - Deferred calls: closures run at the start of the next update
//! - Deletions: entities flagged with `die()`, removed after the update pass
//!
//! Both queues are FIFO and drained once per frame.

use std::collections::HashSet;
use std::fmt;

use crate::ecs::Identifier;

use super::error::SceneError;
use super::Scene;

/// A queued closure with full access to the scene.
pub type DeferredCall = Box<dyn FnOnce(&mut Scene) -> Result<(), SceneError>>;

#[derive(Default)]
pub struct Commands {
    deferred: Vec<DeferredCall>,
    deletions: Vec<Identifier>,
    /// Mirrors `deletions` for constant-time lookups
    queued: HashSet<Identifier>,
    close_requested: bool,
}

impl Commands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `call` to run before the next update pass.
    pub fn defer<F>(&mut self, call: F)
    where
        F: FnOnce(&mut Scene) -> Result<(), SceneError> + 'static,
    {
        self.deferred.push(Box::new(call));
    }

    /// Flag `id` for removal at the end of the current update.
    pub fn queue_deletion(&mut self, id: Identifier) {
        if self.queued.insert(id) {
            self.deletions.push(id);
        }
    }

    pub fn is_queued_for_deletion(&self, id: Identifier) -> bool {
        self.queued.contains(&id)
    }

    pub fn request_close(&mut self) {
        self.close_requested = true;
    }

    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    pub fn deletion_len(&self) -> usize {
        self.deletions.len()
    }

    pub(crate) fn take_deferred(&mut self) -> Vec<DeferredCall> {
        std::mem::take(&mut self.deferred)
    }

    /// Put unrun calls back ahead of anything queued since.
    pub(crate) fn requeue_deferred(&mut self, calls: impl IntoIterator<Item = DeferredCall>) {
        let newer = std::mem::take(&mut self.deferred);
        self.deferred.extend(calls);
        self.deferred.extend(newer);
    }

    pub(crate) fn take_deletions(&mut self) -> Vec<Identifier> {
        self.queued.clear();
        std::mem::take(&mut self.deletions)
    }

    pub(crate) fn take_close_request(&mut self) -> bool {
        std::mem::take(&mut self.close_requested)
    }
}

impl fmt::Debug for Commands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Commands")
            .field("deferred", &self.deferred.len())
            .field("deletions", &self.deletions)
            .field("close_requested", &self.close_requested)
            .finish()
    }
}
