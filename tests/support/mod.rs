//! Shared test doubles for the navigation integration tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use constellations_nav::scene::{HandleSummary, PlaceDetails, SceneContent, ScenePreviews};
use constellations_nav::{InProcessBackend, Result, Scene, SceneBackend, SceneId};

pub fn scene(id: &str) -> Scene {
    Scene {
        id: SceneId::from(id),
        handle_id: "h-1".to_string(),
        handle: HandleSummary {
            handle: "astro".to_string(),
            display_name: "Astro Club".to_string(),
        },
        creation_date: "2023-06-01T12:00:00Z".parse().unwrap(),
        likes: 0,
        impressions: 0,
        clicks: 0,
        shares: 0,
        place: PlaceDetails {
            ra_rad: id.len() as f64,
            dec_rad: 0.1,
            roll_rad: None,
            roi_height_deg: 1.0,
            roi_aspect_ratio: 1.0,
        },
        content: SceneContent::default(),
        text: format!("scene {id}"),
        liked: false,
        outgoing_url: None,
        previews: ScenePreviews::default(),
        published: true,
    }
}

pub fn scenes(ids: &[&str]) -> Vec<Scene> {
    ids.iter().map(|id| scene(id)).collect()
}

pub fn ids(ids: Vec<SceneId>) -> Vec<String> {
    ids.into_iter().map(|id| id.to_string()).collect()
}

/// Holds one request key until released.
pub struct Gate {
    started: Semaphore,
    release: Semaphore,
}

impl Gate {
    fn new() -> Self {
        Self {
            started: Semaphore::new(0),
            release: Semaphore::new(0),
        }
    }

    /// Wait until a request has reached the gate.
    pub async fn wait_started(&self) {
        self.started.acquire().await.unwrap().forget();
    }

    /// Let `n` held requests through.
    pub fn release(&self, n: usize) {
        self.release.add_permits(n);
    }
}

/// Wraps an in-process backend; requests with a registered gate block until
/// the test releases them. Keys follow the in-process request log format.
pub struct GatedBackend {
    inner: InProcessBackend,
    gates: Mutex<HashMap<String, Arc<Gate>>>,
}

impl GatedBackend {
    pub fn new(inner: InProcessBackend) -> Self {
        Self {
            inner,
            gates: Mutex::new(HashMap::new()),
        }
    }

    pub fn gate(&self, key: &str) -> Arc<Gate> {
        self.gates
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Gate::new()))
            .clone()
    }

    pub fn inner(&self) -> &InProcessBackend {
        &self.inner
    }

    async fn pass(&self, key: String) {
        let gate = self.gates.lock().unwrap().get(&key).cloned();
        if let Some(gate) = gate {
            gate.started.add_permits(1);
            gate.release.acquire().await.unwrap().forget();
        }
    }
}

#[async_trait]
impl SceneBackend for GatedBackend {
    async fn home_timeline(&self, page: u32) -> Result<Vec<Scene>> {
        self.pass(format!("home:{page}")).await;
        self.inner.home_timeline(page).await
    }

    async fn handle_timeline(&self, handle: &str, page: u32) -> Result<Vec<Scene>> {
        self.pass(format!("handle:{handle}:{page}")).await;
        self.inner.handle_timeline(handle, page).await
    }

    async fn nearby_timeline(&self, base: &SceneId, size: u32) -> Result<Vec<Scene>> {
        self.pass(format!("nearby:{base}")).await;
        self.inner.nearby_timeline(base, size).await
    }

    async fn scene(&self, id: &SceneId) -> Result<Option<Scene>> {
        self.pass(format!("scene:{id}")).await;
        self.inner.scene(id).await
    }
}
