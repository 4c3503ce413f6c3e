//! Constellations scene navigation engine
//!
//! Decides which scene the sky view shows next and how to fetch it. The
//! viewer steps backward and forward through a history of visited scenes;
//! stepping past the end pulls from a lazily paged, swappable remote feed.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Presentation: watch channels (displayed scene, camera target)  │
//! └─────────────────────────────────────────────────────────────────┘
//!                               ▲
//!                               │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Navigator                               │
//! │   move_back / move_forward / move_history_to_scene / use_*      │
//! └─────────────────────────────────────────────────────────────────┘
//!          │                    │                      │
//!          ▼                    ▼                      ▼
//! ┌────────────────┐  ┌──────────────────┐  ┌──────────────────────┐
//! │    History     │  │  ForwardBuffer   │  │  FeedSelector        │
//! │ arena + cursor │  │ ids + next page  │  │ descriptor + epoch   │
//! └────────────────┘  └──────────────────┘  └──────────────────────┘
//!          │                    │                      │
//!          └──────────┬─────────┘                      ▼
//!                     ▼                     ┌──────────────────────┐
//!            ┌────────────────┐             │    SceneBackend      │
//!            │   SceneCache   │◄────────────│  (HTTP / in-process) │
//!            └────────────────┘             └──────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use constellations_nav::{HttpSceneBackend, Navigator, NavigatorConfig};
//!
//! let config = NavigatorConfig::from_env()?;
//! let backend = Arc::new(HttpSceneBackend::new(&config)?);
//! let nav = Navigator::new(backend, config);
//!
//! nav.use_handle_timeline("nasa").await?;
//! nav.move_forward(1).await?;
//! let shown = nav.current_scene();
//! ```

pub mod backend;
pub mod buffer;
pub mod cache;
pub mod config;
pub mod error;
pub mod feed;
pub mod history;
pub mod navigator;
pub mod scene;

pub use backend::{HttpSceneBackend, InProcessBackend, SceneBackend};
pub use config::NavigatorConfig;
pub use error::{NavError, Result};
pub use feed::{Epoch, FeedDescriptor};
pub use history::CursorState;
pub use navigator::{CameraTarget, Navigator};
pub use scene::{Scene, SceneDisplayInfo, SceneId};
