//! Forward buffer: fetched-but-unvisited scenes from the active feed.
//!
//! Consumed from the front as the viewer moves forward, refilled at the back
//! from page `next_page`. The counter only moves forward until `reset`.

use std::collections::VecDeque;

use crate::scene::SceneId;

#[derive(Debug, Default)]
pub struct ForwardBuffer {
    queue: VecDeque<SceneId>,
    next_page: u32,
}

impl ForwardBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Index of the next page to request from the feed
    pub fn next_page(&self) -> u32 {
        self.next_page
    }

    pub fn advance_page(&mut self) {
        self.next_page += 1;
    }

    pub fn contains(&self, id: &SceneId) -> bool {
        self.queue.contains(id)
    }

    /// Queue `id` at the back. Ids already queued are skipped; returns whether
    /// the id was added.
    pub fn push(&mut self, id: SceneId) -> bool {
        if self.contains(&id) {
            return false;
        }
        self.queue.push_back(id);
        true
    }

    pub fn pop_front(&mut self) -> Option<SceneId> {
        self.queue.pop_front()
    }

    /// Drop `id` from the queue if present.
    pub fn remove(&mut self, id: &SceneId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|queued| queued != id);
        self.queue.len() != before
    }

    pub fn ids(&self) -> impl Iterator<Item = &SceneId> {
        self.queue.iter()
    }

    /// Empty the queue and rewind the page counter.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.next_page = 0;
    }
}
