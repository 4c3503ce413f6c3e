//! Feed source selection
//!
//! A feed is described by a [`FeedDescriptor`]. The descriptor is mapped to a
//! page fetch fresh on every call ([`FeedDescriptor::fetch_page`]); nothing
//! stores a fetch closure. Every actual change of descriptor mints a new
//! [`Epoch`], which is how in-flight fetches learn that their results are
//! stale.

use std::fmt;

use crate::backend::SceneBackend;
use crate::buffer::ForwardBuffer;
use crate::error::Result;
use crate::scene::{Scene, SceneId};

/// Which remote feed the forward buffer pages from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FeedDescriptor {
    /// The global home timeline
    #[default]
    Global,
    /// One account's timeline
    Handle(String),
    /// Scenes spatially adjacent to a base scene (one page only)
    Nearby(SceneId),
    /// Viewer is pinned to one scene; the feed yields nothing
    SingleScene,
}

impl FeedDescriptor {
    /// Fetch page `page` of this feed.
    ///
    /// `Nearby` is not really paginated: page 0 is the whole neighbour set and
    /// every later page is empty. `SingleScene` is always empty. Neither makes
    /// a backend call for an empty page.
    pub async fn fetch_page(
        &self,
        backend: &dyn SceneBackend,
        page: u32,
        nearby_size: u32,
    ) -> Result<Vec<Scene>> {
        match self {
            FeedDescriptor::Global => backend.home_timeline(page).await,
            FeedDescriptor::Handle(handle) => backend.handle_timeline(handle, page).await,
            FeedDescriptor::Nearby(base) if page == 0 => {
                backend.nearby_timeline(base, nearby_size).await
            }
            FeedDescriptor::Nearby(_) | FeedDescriptor::SingleScene => Ok(Vec::new()),
        }
    }
}

impl fmt::Display for FeedDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedDescriptor::Global => f.write_str("global"),
            FeedDescriptor::Handle(handle) => write!(f, "handle:{handle}"),
            FeedDescriptor::Nearby(base) => write!(f, "nearby:{base}"),
            FeedDescriptor::SingleScene => f.write_str("single-scene"),
        }
    }
}

/// Source token minted on every feed change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Epoch(u64);

impl Epoch {
    pub fn next(self) -> Self {
        Epoch(self.0.wrapping_add(1))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Holds the active feed descriptor and its epoch.
#[derive(Debug, Default)]
pub struct FeedSelector {
    descriptor: FeedDescriptor,
    epoch: Epoch,
}

impl FeedSelector {
    pub fn new(descriptor: FeedDescriptor) -> Self {
        Self {
            descriptor,
            epoch: Epoch::default(),
        }
    }

    pub fn descriptor(&self) -> &FeedDescriptor {
        &self.descriptor
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Switch to `descriptor`.
    ///
    /// Returns `false` and touches nothing when the descriptor equals the
    /// current one. Otherwise the buffer is emptied, its page counter reset
    /// and a new epoch minted.
    pub fn set_source(&mut self, descriptor: FeedDescriptor, buffer: &mut ForwardBuffer) -> bool {
        if self.descriptor == descriptor {
            return false;
        }
        self.descriptor = descriptor;
        self.invalidate(buffer);
        true
    }

    /// Mint a new epoch and reset the buffer without changing the descriptor.
    pub(crate) fn invalidate(&mut self, buffer: &mut ForwardBuffer) {
        buffer.reset();
        self.epoch = self.epoch.next();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::inprocess::InProcessBackend;
    use crate::scene::fixtures::scene;

    fn backend() -> InProcessBackend {
        InProcessBackend::new()
            .with_home_page(vec![scene("g1"), scene("g2")])
            .with_handle_page("alice", vec![scene("a1")])
            .with_nearby("g1", vec![scene("n1"), scene("n2"), scene("n3")])
    }

    fn ids(scenes: &[Scene]) -> Vec<&str> {
        scenes.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn descriptor_equality_requires_equal_parameters() {
        assert_eq!(FeedDescriptor::Global, FeedDescriptor::Global);
        assert_eq!(
            FeedDescriptor::Handle("alice".into()),
            FeedDescriptor::Handle("alice".into())
        );
        assert_ne!(
            FeedDescriptor::Handle("alice".into()),
            FeedDescriptor::Handle("bob".into())
        );
        assert_ne!(
            FeedDescriptor::Nearby("a".into()),
            FeedDescriptor::Nearby("b".into())
        );
        assert_ne!(FeedDescriptor::Global, FeedDescriptor::SingleScene);
    }

    #[test]
    fn set_source_same_descriptor_is_noop() {
        let mut selector = FeedSelector::new(FeedDescriptor::Global);
        let mut buffer = ForwardBuffer::new();
        buffer.push(SceneId::from("x"));
        buffer.advance_page();

        assert!(!selector.set_source(FeedDescriptor::Global, &mut buffer));
        assert_eq!(selector.epoch(), Epoch::default());
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.next_page(), 1);
    }

    #[test]
    fn set_source_change_resets_buffer_and_mints_epoch() {
        let mut selector = FeedSelector::new(FeedDescriptor::Global);
        let mut buffer = ForwardBuffer::new();
        buffer.push(SceneId::from("x"));
        buffer.advance_page();
        let before = selector.epoch();

        assert!(selector.set_source(FeedDescriptor::Handle("alice".into()), &mut buffer));
        assert_ne!(selector.epoch(), before);
        assert!(buffer.is_empty());
        assert_eq!(buffer.next_page(), 0);
        assert_eq!(selector.descriptor(), &FeedDescriptor::Handle("alice".into()));
    }

    #[tokio::test]
    async fn global_and_handle_page_through_backend() {
        let backend = backend();
        let page = FeedDescriptor::Global.fetch_page(&backend, 0, 30).await.unwrap();
        assert_eq!(ids(&page), vec!["g1", "g2"]);

        let page = FeedDescriptor::Handle("alice".into())
            .fetch_page(&backend, 0, 30)
            .await
            .unwrap();
        assert_eq!(ids(&page), vec!["a1"]);

        let page = FeedDescriptor::Global.fetch_page(&backend, 1, 30).await.unwrap();
        assert!(page.is_empty());
    }

    #[tokio::test]
    async fn nearby_is_empty_after_first_page() {
        let backend = backend();
        let nearby = FeedDescriptor::Nearby("g1".into());

        let first = nearby.fetch_page(&backend, 0, 2).await.unwrap();
        assert_eq!(ids(&first), vec!["n1", "n2"]);

        let second = nearby.fetch_page(&backend, 1, 2).await.unwrap();
        assert!(second.is_empty());
        assert_eq!(backend.request_count(), 1);
    }

    #[tokio::test]
    async fn single_scene_never_calls_backend() {
        let backend = backend();
        for page in 0..3 {
            let result = FeedDescriptor::SingleScene
                .fetch_page(&backend, page, 30)
                .await
                .unwrap();
            assert!(result.is_empty());
        }
        assert_eq!(backend.request_count(), 0);
    }

    #[test]
    fn descriptor_display() {
        assert_eq!(FeedDescriptor::Global.to_string(), "global");
        assert_eq!(FeedDescriptor::Handle("bob".into()).to_string(), "handle:bob");
        assert_eq!(FeedDescriptor::Nearby("s1".into()).to_string(), "nearby:s1");
    }
}
