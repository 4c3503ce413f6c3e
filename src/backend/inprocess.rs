//! In-memory SceneBackend serving fixed pages.
//!
//! Used for offline runs of the feed walker (`--fixture`) and as the base of
//! test doubles. Failures can be injected with [`InProcessBackend::fail_next`].

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde::Deserialize;

use super::SceneBackend;
use crate::error::{NavError, Result};
use crate::scene::{Scene, SceneId};

/// On-disk fixture layout
#[derive(Debug, Default, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub home: Vec<Vec<Scene>>,
    #[serde(default)]
    pub handles: HashMap<String, Vec<Vec<Scene>>>,
    #[serde(default)]
    pub nearby: HashMap<SceneId, Vec<Scene>>,
    /// Scenes reachable by id only
    #[serde(default)]
    pub scenes: Vec<Scene>,
}

#[derive(Debug, Default)]
pub struct InProcessBackend {
    home: Vec<Vec<Scene>>,
    handles: HashMap<String, Vec<Vec<Scene>>>,
    nearby: HashMap<SceneId, Vec<Scene>>,
    scenes: HashMap<SceneId, Scene>,
    pending_failures: AtomicUsize,
    requests: Mutex<Vec<String>>,
}

impl InProcessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: Fixture) -> Self {
        let mut backend = Self::new();
        for page in fixture.home {
            backend = backend.with_home_page(page);
        }
        for (handle, pages) in fixture.handles {
            for page in pages {
                backend = backend.with_handle_page(&handle, page);
            }
        }
        for (base, scenes) in fixture.nearby {
            backend = backend.with_nearby(base.as_str(), scenes);
        }
        for scene in fixture.scenes {
            backend = backend.with_scene(scene);
        }
        backend
    }

    /// Load a JSON fixture file.
    pub fn from_fixture_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| NavError::Config(format!("cannot read fixture {}: {e}", path.display())))?;
        let fixture: Fixture = serde_json::from_str(&text)
            .map_err(|e| NavError::schema(format!("fixture {}", path.display()), e))?;
        Ok(Self::from_fixture(fixture))
    }

    pub fn with_home_page(mut self, page: Vec<Scene>) -> Self {
        self.register(&page);
        self.home.push(page);
        self
    }

    pub fn with_handle_page(mut self, handle: &str, page: Vec<Scene>) -> Self {
        self.register(&page);
        self.handles.entry(handle.to_string()).or_default().push(page);
        self
    }

    pub fn with_nearby(mut self, base: &str, scenes: Vec<Scene>) -> Self {
        self.register(&scenes);
        self.nearby.insert(SceneId::from(base), scenes);
        self
    }

    pub fn with_scene(mut self, scene: Scene) -> Self {
        self.scenes.insert(scene.id.clone(), scene);
        self
    }

    /// Make the next `count` requests fail with HTTP 503.
    pub fn fail_next(&self, count: usize) {
        self.pending_failures.store(count, Ordering::SeqCst);
    }

    /// Number of requests served (including injected failures)
    pub fn request_count(&self) -> usize {
        self.log().len()
    }

    /// Request log, e.g. `"home:0"`, `"handle:alice:1"`, `"scene:x"`
    pub fn requests(&self) -> Vec<String> {
        self.log().clone()
    }

    fn log(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(&mut self, scenes: &[Scene]) {
        for scene in scenes {
            self.scenes.insert(scene.id.clone(), scene.clone());
        }
    }

    fn record(&self, request: String, endpoint: &str) -> Result<()> {
        self.log().push(request);
        let failing = self
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(NavError::Status {
                endpoint: endpoint.to_string(),
                status: 503,
            });
        }
        Ok(())
    }

    fn page(pages: Option<&Vec<Vec<Scene>>>, page: u32) -> Vec<Scene> {
        pages
            .and_then(|p| p.get(page as usize))
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl SceneBackend for InProcessBackend {
    async fn home_timeline(&self, page: u32) -> Result<Vec<Scene>> {
        self.record(format!("home:{page}"), "GET /scenes/home-timeline")?;
        Ok(Self::page(Some(&self.home), page))
    }

    async fn handle_timeline(&self, handle: &str, page: u32) -> Result<Vec<Scene>> {
        self.record(
            format!("handle:{handle}:{page}"),
            "GET /handle/:handle/timeline",
        )?;
        Ok(Self::page(self.handles.get(handle), page))
    }

    async fn nearby_timeline(&self, base: &SceneId, size: u32) -> Result<Vec<Scene>> {
        self.record(format!("nearby:{base}"), "GET /scene/:id/nearby-global")?;
        Ok(self
            .nearby
            .get(base)
            .map(|scenes| scenes.iter().take(size as usize).cloned().collect())
            .unwrap_or_default())
    }

    async fn scene(&self, id: &SceneId) -> Result<Option<Scene>> {
        self.record(format!("scene:{id}"), "GET /scene/:id")?;
        Ok(self.scenes.get(id).cloned())
    }
}
