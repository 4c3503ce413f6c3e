//! Navigator: the public face of the scene navigation engine.
//!
//! Owns the scene cache, feed selector, forward buffer and history behind one
//! lock. The lock is only held in the synchronous stretches between fetches;
//! every resumption after a fetch re-checks the epoch (and, for paging, the
//! page counter) before touching shared state. Operations take `&self` so
//! several of them can be in flight at once and interleave at fetch points.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::backend::SceneBackend;
use crate::buffer::ForwardBuffer;
use crate::cache::SceneCache;
use crate::config::NavigatorConfig;
use crate::error::Result;
use crate::feed::{Epoch, FeedDescriptor, FeedSelector};
use crate::history::{CursorState, History};
use crate::scene::{Scene, SceneDisplayInfo, SceneId};

/// Where the sky view should point.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraTarget {
    pub display: SceneDisplayInfo,
    /// Jump straight to the target instead of slewing. Only set for the first
    /// target after construction or reset.
    pub warp: bool,
}

pub type DisplayedSceneWatcher = watch::Receiver<Option<Arc<Scene>>>;
pub type CameraTargetWatcher = watch::Receiver<Option<CameraTarget>>;

struct NavState {
    cache: SceneCache,
    selector: FeedSelector,
    buffer: ForwardBuffer,
    history: History,
    view_needs_initialization: bool,
    /// Bumped by `reset`; fetches that started under an older session
    /// must not write into the cache.
    session: u64,
}

impl NavState {
    fn new() -> Self {
        Self {
            cache: SceneCache::new(),
            selector: FeedSelector::new(FeedDescriptor::Global),
            buffer: ForwardBuffer::new(),
            history: History::new(),
            view_needs_initialization: true,
            session: 0,
        }
    }

    /// Cache a fetched page and queue its scenes. Scenes already in history
    /// are never queued again.
    fn merge_page(&mut self, scenes: Vec<Scene>) -> usize {
        let mut queued = 0;
        for scene in scenes {
            let id = self.cache.put(scene);
            if self.history.contains(&id) {
                continue;
            }
            if self.buffer.push(id) {
                queued += 1;
            }
        }
        queued
    }

    fn extend_from_buffer(&mut self) -> bool {
        match self.buffer.pop_front() {
            Some(id) => {
                self.history.push_and_select(id);
                true
            }
            None => false,
        }
    }

    fn current_scene(&self) -> Option<Arc<Scene>> {
        self.history.current().and_then(|id| self.cache.get(id))
    }
}

/// Counts a move-to-scene operation for as long as it is alive, including
/// when its future is dropped mid-fetch.
struct MoveGuard<'a>(&'a AtomicUsize);

impl<'a> MoveGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for MoveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct Navigator {
    backend: Arc<dyn SceneBackend>,
    config: NavigatorConfig,
    state: Mutex<NavState>,
    displayed: watch::Sender<Option<Arc<Scene>>>,
    camera: watch::Sender<Option<CameraTarget>>,
    moves_in_flight: AtomicUsize,
    jump_ticket: AtomicU64,
}

impl Navigator {
    /// Start on the global feed with empty cache, buffer and history.
    pub fn new(backend: Arc<dyn SceneBackend>, config: NavigatorConfig) -> Self {
        Self {
            backend,
            config,
            state: Mutex::new(NavState::new()),
            displayed: watch::channel(None).0,
            camera: watch::channel(None).0,
            moves_in_flight: AtomicUsize::new(0),
            jump_ticket: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    fn state(&self) -> MutexGuard<'_, NavState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Feed source ────────────────────────────────────────────

    /// Switch the active feed. Returns `false`, changing nothing, when
    /// `descriptor` equals the current one.
    pub fn set_source(&self, descriptor: FeedDescriptor) -> bool {
        let mut guard = self.state();
        let state = &mut *guard;
        let changed = state.selector.set_source(descriptor, &mut state.buffer);
        if changed {
            debug!(
                feed = %state.selector.descriptor(),
                epoch = %state.selector.epoch(),
                "feed source switched"
            );
        }
        changed
    }

    pub fn feed(&self) -> FeedDescriptor {
        self.state().selector.descriptor().clone()
    }

    pub fn epoch(&self) -> Epoch {
        self.state().selector.epoch()
    }

    // ── Paging ─────────────────────────────────────────────────

    /// Try to grow the forward buffer to at least `n` scenes.
    ///
    /// Makes at most `max_fetch_attempts` page fetches. Transient failures and
    /// short pages are tolerated, so the buffer may end up short of `n`; that
    /// is not an error. Gives up at once if the feed source changes. Only a
    /// schema violation from a current fetch is returned as an error.
    ///
    /// Returns the buffer length afterwards.
    pub async fn ensure_forward_coverage(&self, n: usize) -> Result<usize> {
        let (epoch, descriptor) = {
            let state = self.state();
            (state.selector.epoch(), state.selector.descriptor().clone())
        };

        for attempt in 0..self.config.max_fetch_attempts {
            let page = {
                let state = self.state();
                if state.selector.epoch() != epoch {
                    debug!(feed = %descriptor, %epoch, "feed changed, coverage abandoned");
                    return Ok(state.buffer.len());
                }
                if state.buffer.len() >= n {
                    break;
                }
                state.buffer.next_page()
            };

            let fetched = descriptor
                .fetch_page(self.backend.as_ref(), page, self.config.nearby_page_size)
                .await;

            let mut state = self.state();
            if state.selector.epoch() != epoch {
                debug!(feed = %descriptor, page, %epoch, "discarding stale page");
                return Ok(state.buffer.len());
            }

            let scenes = match fetched {
                Ok(scenes) => scenes,
                Err(e) if e.is_transient() => {
                    warn!(feed = %descriptor, page, attempt, error = %e, "page fetch failed");
                    continue;
                }
                Err(e) => return Err(e),
            };

            if state.buffer.next_page() != page {
                debug!(feed = %descriptor, page, "page already merged by a concurrent fetch");
                continue;
            }

            let fetched_count = scenes.len();
            let queued = state.merge_page(scenes);
            state.buffer.advance_page();
            debug!(
                feed = %descriptor,
                page,
                fetched = fetched_count,
                queued,
                buffered = state.buffer.len(),
                "page merged"
            );
        }

        Ok(self.state().buffer.len())
    }

    pub fn next_page(&self) -> u32 {
        self.state().buffer.next_page()
    }

    pub fn buffered_ids(&self) -> Vec<SceneId> {
        self.state().buffer.ids().cloned().collect()
    }

    // ── History ────────────────────────────────────────────────

    /// Move the cursor back up to `count` scenes, stopping at the head.
    /// Never fetches. Returns how many steps were taken.
    pub fn move_back(&self, count: usize) -> usize {
        let mut state = self.state();
        let moved = state.history.step_back(count);
        if moved > 0 {
            debug!(moved, position = ?state.history.cursor().map(|c| c.position()), "moved back");
            self.publish(&mut state);
        }
        moved
    }

    /// Move forward `count` scenes.
    ///
    /// Each step replays an existing history node when there is one and
    /// otherwise extends the history with the next buffered scene, paging the
    /// feed when the buffer is empty. Stops early at the end of the feed or if
    /// the feed source changes while paging. Returns how many steps were
    /// taken.
    ///
    /// A schema violation while paging is returned as `Err` even when some
    /// steps were already taken; those steps stay applied and published, so
    /// read `cursor_state` to learn where the cursor ended up.
    pub async fn move_forward(&self, count: usize) -> Result<usize> {
        let epoch = self.epoch();
        let mut advanced = 0;

        while advanced < count {
            {
                let mut state = self.state();
                if state.history.step_forward().is_some() || state.extend_from_buffer() {
                    advanced += 1;
                    self.publish(&mut state);
                    continue;
                }
            }

            self.ensure_forward_coverage(count - advanced).await?;

            let state = self.state();
            if state.selector.epoch() != epoch {
                debug!(advanced, "feed changed during forward move");
                break;
            }
            if state.buffer.is_empty() {
                debug!(advanced, feed = %state.selector.descriptor(), "no more scenes available");
                break;
            }
        }

        Ok(advanced)
    }

    /// Jump to scene `id`: append it as the new tail and put the cursor there.
    ///
    /// Uses the cache, fetching the scene when it is not cached. Returns
    /// `Ok(false)` without touching history when the scene does not exist or
    /// when a newer jump started while this one was fetching. A scene fetched
    /// across a `reset` is not cached. The scene is
    /// dropped from the forward buffer so it is not served again as new.
    pub async fn move_history_to_scene(&self, id: &SceneId) -> Result<bool> {
        let _moving = MoveGuard::enter(&self.moves_in_flight);
        let ticket = self.jump_ticket.fetch_add(1, Ordering::SeqCst) + 1;

        let (cached, session) = {
            let state = self.state();
            (state.cache.contains(id), state.session)
        };
        let target = if cached {
            id.clone()
        } else {
            let fetched = self.backend.scene(id).await?;
            let mut state = self.state();
            if state.session != session {
                debug!(scene_id = %id, "session reset during jump, scene dropped");
                return Ok(false);
            }
            match fetched {
                Some(scene) => state.cache.put(scene),
                None => {
                    debug!(scene_id = %id, "scene not found, history unchanged");
                    return Ok(false);
                }
            }
        };

        let mut state = self.state();
        if self.jump_ticket.load(Ordering::SeqCst) != ticket {
            debug!(scene_id = %target, "jump superseded by a newer one");
            return Ok(false);
        }

        state.buffer.remove(&target);
        let node = state.history.push_and_select(target);
        debug!(scene_id = %id, position = node.position(), "jumped to scene");
        self.publish(&mut state);
        Ok(true)
    }

    /// Scene one step behind the cursor, without moving.
    pub fn previous_scene(&self) -> Option<Arc<Scene>> {
        let state = self.state();
        state.history.previous().and_then(|id| state.cache.get(id))
    }

    pub fn current_scene(&self) -> Option<Arc<Scene>> {
        self.state().current_scene()
    }

    pub fn cursor_state(&self) -> CursorState {
        self.state().history.cursor_state()
    }

    pub fn history_ids(&self) -> Vec<SceneId> {
        self.state().history.ids().cloned().collect()
    }

    // ── Cache ──────────────────────────────────────────────────

    pub fn cached_scene(&self, id: &SceneId) -> Option<Arc<Scene>> {
        self.state().cache.get(id)
    }

    pub fn cache_len(&self) -> usize {
        self.state().cache.len()
    }

    // ── Timelines ──────────────────────────────────────────────

    pub async fn use_global_timeline(&self) -> Result<bool> {
        self.switch_and_prefetch(FeedDescriptor::Global).await
    }

    pub async fn use_handle_timeline(&self, handle: &str) -> Result<bool> {
        self.switch_and_prefetch(FeedDescriptor::Handle(handle.to_string()))
            .await
    }

    pub async fn use_nearby_timeline(&self, base: &SceneId) -> Result<bool> {
        self.switch_and_prefetch(FeedDescriptor::Nearby(base.clone()))
            .await
    }

    /// Pin the viewer to `scene`. The scene is cached, the feed switches to
    /// `SingleScene`, and history jumps to the scene unless the cursor is
    /// already on it.
    pub async fn setup_for_single_scene(&self, scene: Scene) -> Result<bool> {
        let id = self.state().cache.put(scene);
        let changed = self.set_source(FeedDescriptor::SingleScene);
        let on_scene = self.state().history.current() == Some(&id);
        if changed || !on_scene {
            self.move_history_to_scene(&id).await?;
        }
        Ok(changed)
    }

    async fn switch_and_prefetch(&self, descriptor: FeedDescriptor) -> Result<bool> {
        if !self.set_source(descriptor) {
            return Ok(false);
        }
        self.ensure_forward_coverage(self.config.prefetch).await?;
        Ok(true)
    }

    /// Forget the session (logout): cache, history and buffer are cleared and
    /// the feed returns to global under a fresh epoch.
    pub fn reset(&self) {
        let mut guard = self.state();
        let state = &mut *guard;
        if !state
            .selector
            .set_source(FeedDescriptor::Global, &mut state.buffer)
        {
            state.selector.invalidate(&mut state.buffer);
        }
        state.cache.clear();
        state.history.clear();
        state.view_needs_initialization = true;
        state.session += 1;
        self.jump_ticket.fetch_add(1, Ordering::SeqCst);
        debug!(epoch = %state.selector.epoch(), "navigation state reset");
        self.publish(state);
    }

    // ── Reactive outputs ───────────────────────────────────────

    pub fn is_moving_to_scene(&self) -> bool {
        self.moves_in_flight() > 0
    }

    pub fn moves_in_flight(&self) -> usize {
        self.moves_in_flight.load(Ordering::SeqCst)
    }

    pub fn subscribe_displayed(&self) -> DisplayedSceneWatcher {
        self.displayed.subscribe()
    }

    pub fn subscribe_camera_target(&self) -> CameraTargetWatcher {
        self.camera.subscribe()
    }

    pub fn displayed_scene(&self) -> Option<Arc<Scene>> {
        self.displayed.borrow().clone()
    }

    pub fn camera_target(&self) -> Option<CameraTarget> {
        self.camera.borrow().clone()
    }

    /// Push the scene under the cursor to the watchers, notifying only when
    /// the value actually changes.
    fn publish(&self, state: &mut NavState) {
        let Some(scene) = state.current_scene() else {
            self.displayed.send_if_modified(|shown| shown.take().is_some());
            self.camera.send_if_modified(|target| target.take().is_some());
            return;
        };

        let display = scene.display_info();
        self.displayed.send_if_modified(|shown| {
            if shown.as_deref() == Some(scene.as_ref()) {
                return false;
            }
            *shown = Some(scene);
            true
        });

        self.camera.send_if_modified(|target| {
            if target.as_ref().map(|t| &t.display) == Some(&display) {
                return false;
            }
            *target = Some(CameraTarget {
                display,
                warp: state.view_needs_initialization,
            });
            state.view_needs_initialization = false;
            true
        });
    }
}
