//! Lifecycle of fetched image bytes.
//!
//! An [`ImageResourceLoader`] resolves an image path to a decoded
//! [`ResourceHandle`] through an [`ImageSource`]. Each loader holds at most one
//! live handle. Switching paths releases the previous handle before the new
//! fetch is issued, and dropping the loader releases whatever it holds.
//! Late fetch results for a superseded path or a dropped loader are discarded.

use crate::models::resource_key;
use bytes::Bytes;
use image::RgbaImage;
use providers::ImageSource;
use std::fmt;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Placeholder text shown in place of an image that could not be loaded.
pub const LOAD_FAILED: &str = "Failed to load image";

pub type PendingLoad = Pin<Box<dyn Future<Output = LoadOutcome> + Send + 'static>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The result was installed as the loader's current state.
    Applied,
    /// The path was already current; nothing was fetched.
    Unchanged,
    /// The loader moved on (new path or teardown) before the result arrived.
    Stale,
}

/// Hands out handle ids and counts handles that have not been released yet.
#[derive(Clone, Default)]
pub struct HandleTracker {
    inner: Arc<TrackerInner>,
}

#[derive(Default)]
struct TrackerInner {
    next_id: AtomicU64,
    live: AtomicUsize,
}

impl HandleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handles currently alive.
    pub fn live(&self) -> usize {
        self.inner.live.load(Ordering::SeqCst)
    }

    fn allocate(&self, key: &str, image: RgbaImage) -> ResourceHandle {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.live.fetch_add(1, Ordering::SeqCst);
        debug!(handle = id, key, "allocated image handle");
        ResourceHandle {
            id,
            key: key.to_string(),
            image,
            tracker: self.clone(),
        }
    }
}

impl fmt::Debug for HandleTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleTracker")
            .field("live", &self.live())
            .finish()
    }
}

/// A decoded image ready to hand to a rendering surface. Released on drop.
pub struct ResourceHandle {
    id: u64,
    key: String,
    image: RgbaImage,
    tracker: HandleTracker,
}

impl ResourceHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Stable display reference for this handle, e.g. `blob:7`.
    pub fn url(&self) -> String {
        format!("blob:{}", self.id)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn save_png(&self, path: &Path) -> image::ImageResult<()> {
        self.image.save_with_format(path, image::ImageFormat::Png)
    }
}

impl Drop for ResourceHandle {
    fn drop(&mut self) {
        self.tracker.inner.live.fetch_sub(1, Ordering::SeqCst);
        debug!(handle = self.id, key = %self.key, "released image handle");
    }
}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

/// What a rendering surface needs to draw a loader's current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceStatus {
    /// No load has been requested yet.
    Idle,
    Pending,
    Ready {
        url: String,
        width: u32,
        height: u32,
    },
    Failed {
        reason: String,
    },
}

impl ResourceStatus {
    pub fn is_settled(&self) -> bool {
        matches!(self, ResourceStatus::Ready { .. } | ResourceStatus::Failed { .. })
    }
}

enum Slot {
    Idle,
    Pending,
    Ready(ResourceHandle),
    Failed(String),
}

struct LoaderState {
    generation: u64,
    image_path: Option<String>,
    slot: Slot,
    torn_down: bool,
}

fn lock(state: &Mutex<LoaderState>) -> MutexGuard<'_, LoaderState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns the binary resource for one presentation element (a grid cell or the
/// viewer).
pub struct ImageResourceLoader {
    source: Arc<dyn ImageSource>,
    tracker: HandleTracker,
    state: Arc<Mutex<LoaderState>>,
}

impl ImageResourceLoader {
    pub fn new(source: Arc<dyn ImageSource>, tracker: HandleTracker) -> Self {
        Self {
            source,
            tracker,
            state: Arc::new(Mutex::new(LoaderState {
                generation: 0,
                image_path: None,
                slot: Slot::Idle,
                torn_down: false,
            })),
        }
    }

    /// Starts resolving `image_path`.
    ///
    /// The loader switches to pending before this returns, releasing any
    /// handle it held. The returned future performs the fetch and settles the
    /// loader; it resolves to [`LoadOutcome::Stale`] if another `load` or a
    /// teardown happened in the meantime. Dropping it unsettled returns the
    /// loader to idle.
    pub fn load(&self, image_path: &str) -> PendingLoad {
        let (generation, key) = {
            let mut state = lock(&self.state);
            let same_path = state.image_path.as_deref() == Some(image_path);
            if same_path && matches!(state.slot, Slot::Pending | Slot::Ready(_)) {
                return Box::pin(async { LoadOutcome::Unchanged });
            }
            state.generation += 1;
            let previous = std::mem::replace(&mut state.slot, Slot::Pending);
            drop(previous);
            state.image_path = Some(image_path.to_string());
            (state.generation, resource_key(image_path).map(str::to_string))
        };

        let source = Arc::clone(&self.source);
        let tracker = self.tracker.clone();
        let flight = InFlightLoad {
            state: Arc::clone(&self.state),
            generation,
        };
        let image_path = image_path.to_string();
        Box::pin(async move {
            let state = &flight.state;
            let Some(key) = key else {
                let reason = format!("no resource key in image path {:?}", image_path);
                return settle(state, &tracker, generation, "", Err(reason));
            };
            let fetched = source.fetch(&key).await.map_err(|e| e.to_string());
            if is_stale(state, generation) {
                debug!(key = %key, "discarding stale image response");
                return LoadOutcome::Stale;
            }
            let decoded = fetched.and_then(|bytes| decode(&bytes));
            settle(state, &tracker, generation, &key, decoded)
        })
    }

    pub fn image_path(&self) -> Option<String> {
        lock(&self.state).image_path.clone()
    }

    pub fn status(&self) -> ResourceStatus {
        match &lock(&self.state).slot {
            Slot::Idle => ResourceStatus::Idle,
            Slot::Pending => ResourceStatus::Pending,
            Slot::Ready(handle) => ResourceStatus::Ready {
                url: handle.url(),
                width: handle.width(),
                height: handle.height(),
            },
            Slot::Failed(reason) => ResourceStatus::Failed {
                reason: reason.clone(),
            },
        }
    }

    /// Runs `f` against the live handle, if the loader is ready.
    pub fn with_handle<R>(&self, f: impl FnOnce(&ResourceHandle) -> R) -> Option<R> {
        match &lock(&self.state).slot {
            Slot::Ready(handle) => Some(f(handle)),
            _ => None,
        }
    }
}

impl Drop for ImageResourceLoader {
    fn drop(&mut self) {
        let mut state = lock(&self.state);
        state.torn_down = true;
        state.generation += 1;
        state.slot = Slot::Idle;
    }
}

impl fmt::Debug for ImageResourceLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageResourceLoader")
            .field("image_path", &self.image_path())
            .field("status", &self.status())
            .finish()
    }
}

/// Returns the loader to idle when a load future is dropped while its fetch
/// is still the current one, so the next `load` of that path fetches again.
struct InFlightLoad {
    state: Arc<Mutex<LoaderState>>,
    generation: u64,
}

impl Drop for InFlightLoad {
    fn drop(&mut self) {
        let mut state = lock(&self.state);
        if !state.torn_down
            && state.generation == self.generation
            && matches!(state.slot, Slot::Pending)
        {
            debug!(path = ?state.image_path, "image load cancelled before it settled");
            state.slot = Slot::Idle;
        }
    }
}

fn is_stale(state: &Mutex<LoaderState>, generation: u64) -> bool {
    let state = lock(state);
    state.torn_down || state.generation != generation
}

fn decode(bytes: &Bytes) -> Result<RgbaImage, String> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(|e| format!("decode error: {}", e))
}

fn settle(
    state: &Mutex<LoaderState>,
    tracker: &HandleTracker,
    generation: u64,
    key: &str,
    result: Result<RgbaImage, String>,
) -> LoadOutcome {
    let mut state = lock(state);
    if state.torn_down || state.generation != generation {
        debug!(key, "discarding stale image result");
        return LoadOutcome::Stale;
    }
    state.slot = match result {
        Ok(image) => Slot::Ready(tracker.allocate(key, image)),
        Err(reason) => {
            warn!(key, %reason, "image load failed");
            Slot::Failed(reason)
        }
    };
    LoadOutcome::Applied
}
