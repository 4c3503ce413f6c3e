//! Scene cache: single owner of every scene record seen this session.
//!
//! Grows monotonically until `clear` (logout). There is no eviction.

use std::collections::HashMap;
use std::sync::Arc;

use crate::scene::{Scene, SceneId};

#[derive(Debug, Default)]
pub struct SceneCache {
    scenes: HashMap<SceneId, Arc<Scene>>,
}

impl SceneCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &SceneId) -> Option<Arc<Scene>> {
        self.scenes.get(id).cloned()
    }

    pub fn contains(&self, id: &SceneId) -> bool {
        self.scenes.contains_key(id)
    }

    /// Insert or replace a scene by id. Returns the id for chaining into
    /// history or buffer insertion.
    pub fn put(&mut self, scene: Scene) -> SceneId {
        let id = scene.id.clone();
        self.scenes.insert(id.clone(), Arc::new(scene));
        id
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn clear(&mut self) {
        self.scenes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::fixtures::scene;

    #[test]
    fn put_then_get() {
        let mut cache = SceneCache::new();
        let id = cache.put(scene("a"));
        assert_eq!(id.as_str(), "a");
        assert_eq!(cache.get(&id).unwrap().text, "scene a");
        assert!(cache.get(&SceneId::from("b")).is_none());
    }

    #[test]
    fn put_replaces_existing_record() {
        let mut cache = SceneCache::new();
        cache.put(scene("a"));

        let mut updated = scene("a");
        updated.likes = 10;
        cache.put(updated);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&SceneId::from("a")).unwrap().likes, 10);
    }

    #[test]
    fn replaced_record_does_not_disturb_outstanding_handles() {
        let mut cache = SceneCache::new();
        cache.put(scene("a"));
        let held = cache.get(&SceneId::from("a")).unwrap();

        let mut updated = scene("a");
        updated.likes = 3;
        cache.put(updated);

        assert_eq!(held.likes, 0);
        assert_eq!(Arc::strong_count(&held), 1);
    }
}
