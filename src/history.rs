//! Navigable history of visited scenes.
//!
//! Nodes live in an arena and are linked by index. Nodes are only ever
//! appended at the tail, so a node's arena index is also its position from
//! the head. Link fields are private: appending and moving the cursor are
//! the only mutations.

use serde::Serialize;

use crate::scene::SceneId;

/// Handle to a node in the history arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node counted from the head.
    pub fn position(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Node {
    scene: SceneId,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

/// Snapshot of the cursor for presentation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CursorState {
    pub position: Option<usize>,
    pub len: usize,
    pub has_previous: bool,
    pub has_next: bool,
}

#[derive(Debug, Default)]
pub struct History {
    nodes: Vec<Node>,
    tail: Option<NodeId>,
    cursor: Option<NodeId>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn cursor(&self) -> Option<NodeId> {
        self.cursor
    }

    pub fn scene(&self, node: NodeId) -> Option<&SceneId> {
        self.nodes.get(node.0).map(|n| &n.scene)
    }

    /// Scene under the cursor
    pub fn current(&self) -> Option<&SceneId> {
        self.cursor.and_then(|c| self.scene(c))
    }

    /// Scene one link behind the cursor, without moving.
    pub fn previous(&self) -> Option<&SceneId> {
        self.link(|n| n.prev).and_then(|p| self.scene(p))
    }

    /// Scene one link ahead of the cursor, without moving.
    pub fn peek_next(&self) -> Option<&SceneId> {
        self.link(|n| n.next).and_then(|p| self.scene(p))
    }

    pub fn has_previous(&self) -> bool {
        self.link(|n| n.prev).is_some()
    }

    pub fn has_next(&self) -> bool {
        self.link(|n| n.next).is_some()
    }

    pub fn cursor_state(&self) -> CursorState {
        CursorState {
            position: self.cursor.map(NodeId::position),
            len: self.len(),
            has_previous: self.has_previous(),
            has_next: self.has_next(),
        }
    }

    /// Append `scene` as the new tail and put the cursor on it.
    pub fn push_and_select(&mut self, scene: SceneId) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            scene,
            prev: self.tail,
            next: None,
        });
        if let Some(old_tail) = self.tail {
            self.nodes[old_tail.0].next = Some(id);
        }
        self.tail = Some(id);
        self.cursor = Some(id);
        id
    }

    /// Move the cursor back up to `count` links, stopping at the head.
    /// Returns how many links were actually moved.
    pub fn step_back(&mut self, count: usize) -> usize {
        let mut moved = 0;
        while moved < count {
            match self.link(|n| n.prev) {
                Some(prev) => {
                    self.cursor = Some(prev);
                    moved += 1;
                }
                None => break,
            }
        }
        moved
    }

    /// Advance the cursor onto an existing next node. Returns `None` at the
    /// tail, where the caller has to extend the history instead.
    pub fn step_forward(&mut self) -> Option<NodeId> {
        let next = self.link(|n| n.next)?;
        self.cursor = Some(next);
        Some(next)
    }

    pub fn contains(&self, scene: &SceneId) -> bool {
        self.nodes.iter().any(|n| &n.scene == scene)
    }

    /// Scene ids from head to tail.
    pub fn ids(&self) -> impl Iterator<Item = &SceneId> {
        self.nodes.iter().map(|n| &n.scene)
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.tail = None;
        self.cursor = None;
    }

    fn link(&self, pick: impl Fn(&Node) -> Option<NodeId>) -> Option<NodeId> {
        self.cursor.and_then(|c| pick(&self.nodes[c.0]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_of(ids: &[&str]) -> History {
        let mut history = History::new();
        for id in ids {
            history.push_and_select(SceneId::from(*id));
        }
        history
    }

    fn current(history: &History) -> Option<&str> {
        history.current().map(SceneId::as_str)
    }

    #[test]
    fn empty_history_has_no_cursor() {
        let mut history = History::new();
        assert_eq!(history.current(), None);
        assert_eq!(history.previous(), None);
        assert_eq!(history.step_back(3), 0);
        assert_eq!(history.step_forward(), None);
        assert_eq!(history.cursor_state(), CursorState::default());
    }

    #[test]
    fn push_selects_new_tail() {
        let history = history_of(&["a", "b", "c"]);
        assert_eq!(current(&history), Some("c"));
        assert_eq!(history.previous().map(SceneId::as_str), Some("b"));
        assert!(!history.has_next());
        assert_eq!(history.cursor().map(NodeId::position), Some(2));
    }

    #[test]
    fn step_back_clamps_at_head() {
        let mut history = history_of(&["a", "b", "c"]);
        assert_eq!(history.step_back(5), 2);
        assert_eq!(current(&history), Some("a"));
        assert_eq!(history.step_back(1), 0);
        assert_eq!(current(&history), Some("a"));
    }

    #[test]
    fn step_forward_replays_existing_nodes() {
        let mut history = history_of(&["a", "b", "c"]);
        history.step_back(2);

        assert!(history.step_forward().is_some());
        assert_eq!(current(&history), Some("b"));
        assert!(history.step_forward().is_some());
        assert_eq!(current(&history), Some("c"));
        assert!(history.step_forward().is_none());
        assert_eq!(current(&history), Some("c"));
    }

    #[test]
    fn push_after_stepping_back_appends_at_tail() {
        let mut history = history_of(&["a", "b"]);
        history.step_back(1);
        history.push_and_select(SceneId::from("z"));

        let all: Vec<_> = history.ids().map(SceneId::as_str).collect();
        assert_eq!(all, vec!["a", "b", "z"]);
        assert_eq!(current(&history), Some("z"));
        assert_eq!(history.previous().map(SceneId::as_str), Some("b"));
    }

    #[test]
    fn cursor_state_reports_neighbours() {
        let mut history = history_of(&["a", "b", "c"]);
        history.step_back(1);
        assert_eq!(
            history.cursor_state(),
            CursorState {
                position: Some(1),
                len: 3,
                has_previous: true,
                has_next: true,
            }
        );
    }

    #[test]
    fn clear_forgets_everything() {
        let mut history = history_of(&["a", "b"]);
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.current(), None);
        assert!(!history.contains(&SceneId::from("a")));
    }
}
