//! SceneBackend trait: the only boundary between the navigation engine and
//! the Constellations API.
//!
//! - `http::HttpSceneBackend` talks to the real API over reqwest
//! - `inprocess::InProcessBackend` serves scenes from memory (fixtures, tests)

pub mod http;
pub mod inprocess;

use async_trait::async_trait;

use crate::error::Result;
use crate::scene::{Scene, SceneId};

pub use http::HttpSceneBackend;
pub use inprocess::InProcessBackend;

#[async_trait]
pub trait SceneBackend: Send + Sync {
    /// `GET /scenes/home-timeline?page=N`
    async fn home_timeline(&self, page: u32) -> Result<Vec<Scene>>;

    /// `GET /handle/:handle/timeline?page=N`
    async fn handle_timeline(&self, handle: &str, page: u32) -> Result<Vec<Scene>>;

    /// `GET /scene/:id/nearby-global?size=N`
    ///
    /// Not paginated; callers get the full neighbour set in one response.
    async fn nearby_timeline(&self, base: &SceneId, size: u32) -> Result<Vec<Scene>>;

    /// `GET /scene/:id`. A missing scene is `Ok(None)`, not an error.
    async fn scene(&self, id: &SceneId) -> Result<Option<Scene>>;
}
