//! The result set, the loading/error flags, and the viewer session, owned by
//! one controller that any rendering surface can drive and observe.

use crate::error::PresentationError;
use crate::models::{MatchRecord, ResultSet};
use crate::navigator::{ViewerNavigator, ViewerState};
use crate::resource::{
    HandleTracker, ImageResourceLoader, PendingLoad, ResourceHandle, ResourceStatus,
};
use providers::{ImageSource, SearchService};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

pub const SEARCH_FAILED: &str = "An error occurred while fetching results. Please try again.";
pub const EMPTY_QUERY: &str = "Please enter a search query.";
pub const NO_RESULTS: &str = "No results found. Please try a different search query.";

pub type PendingSearch = Pin<Box<dyn Future<Output = SubmitOutcome> + Send + 'static>>;

#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    Applied(Arc<ResultSet>),
    Failed(String),
    /// A newer submission was made before this one answered.
    Superseded,
}

/// Lowers the loading flag when a search future is dropped before it settles,
/// unless a newer submission owns the flag by then.
struct InFlightSearch {
    ctl: ResultSetController,
    generation: u64,
}

impl Drop for InFlightSearch {
    fn drop(&mut self) {
        let cleared = {
            let mut state = lock(&self.ctl.state);
            let unsettled = state.generation == self.generation && state.loading;
            if unsettled {
                state.loading = false;
            }
            unsettled
        };
        if cleared {
            debug!(generation = self.generation, "search cancelled before it settled");
            self.ctl.notify();
        }
    }
}

/// Read-only view of everything a surface renders.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub loading: bool,
    pub error: Option<String>,
    pub results: Option<Arc<ResultSet>>,
    pub viewer: Option<ViewerState>,
}

struct ViewerSession {
    navigator: ViewerNavigator,
    loader: ImageResourceLoader,
}

impl ViewerSession {
    fn show_current(&self) -> PendingLoad {
        self.loader.load(self.navigator.current())
    }
}

#[derive(Default)]
struct ControllerState {
    generation: u64,
    loading: bool,
    error: Option<String>,
    results: Option<Arc<ResultSet>>,
    viewer: Option<ViewerSession>,
}

fn lock(state: &Mutex<ControllerState>) -> MutexGuard<'_, ControllerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone)]
pub struct ResultSetController {
    search: Arc<dyn SearchService>,
    images: Arc<dyn ImageSource>,
    tracker: HandleTracker,
    state: Arc<Mutex<ControllerState>>,
    changes: Arc<watch::Sender<u64>>,
}

impl ResultSetController {
    pub fn new(search: Arc<dyn SearchService>, images: Arc<dyn ImageSource>) -> Self {
        Self::with_tracker(search, images, HandleTracker::new())
    }

    pub fn with_tracker(
        search: Arc<dyn SearchService>,
        images: Arc<dyn ImageSource>,
        tracker: HandleTracker,
    ) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            search,
            images,
            tracker,
            state: Arc::new(Mutex::new(ControllerState::default())),
            changes: Arc::new(changes),
        }
    }

    /// Receives a new revision number after every state change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    pub fn tracker(&self) -> &HandleTracker {
        &self.tracker
    }

    fn notify(&self) {
        self.changes.send_modify(|rev| *rev += 1);
    }

    /// Starts a search and closes the viewer.
    ///
    /// The loading flag is raised before this returns. The returned future
    /// performs the call and replaces the result set (or records the error) in
    /// one step. A newer submission supersedes this one: its answer is
    /// dropped and the loading flag stays raised for the newer call. Dropping
    /// the future unsettled lowers the flag again.
    pub fn submit_query(&self, text: &str) -> PendingSearch {
        let query = text.trim().to_string();
        let generation = {
            let mut state = lock(&self.state);
            state.generation += 1;
            state.viewer = None;
            state.error = None;
            if query.is_empty() {
                state.loading = false;
                state.results = None;
                state.error = Some(EMPTY_QUERY.to_string());
                drop(state);
                self.notify();
                return Box::pin(async { SubmitOutcome::Failed(EMPTY_QUERY.to_string()) });
            }
            state.loading = true;
            state.generation
        };
        self.notify();
        info!(query = %query, "submitting search");

        let flight = InFlightSearch {
            ctl: self.clone(),
            generation,
        };
        Box::pin(async move {
            let this = &flight.ctl;
            let result = this.search.search(&query).await;
            let outcome = {
                let mut state = lock(&this.state);
                if state.generation != generation {
                    debug!(query = %query, "discarding superseded search response");
                    return SubmitOutcome::Superseded;
                }
                state.loading = false;
                state.viewer = None;
                match result {
                    Ok(resp) => {
                        let results = Arc::new(ResultSet::from(resp));
                        info!(query = %query, matches = results.len(), "search complete");
                        state.results = Some(Arc::clone(&results));
                        state.error = None;
                        SubmitOutcome::Applied(results)
                    }
                    Err(e) => {
                        warn!(query = %query, error = %e, "search failed");
                        state.results = None;
                        state.error = Some(SEARCH_FAILED.to_string());
                        SubmitOutcome::Failed(SEARCH_FAILED.to_string())
                    }
                }
            };
            this.notify();
            outcome
        })
    }

    /// Opens the viewer on `index` of the current result set and starts
    /// loading that image.
    pub fn select_for_viewing(&self, index: usize) -> Result<PendingLoad, PresentationError> {
        let load = {
            let mut state = lock(&self.state);
            let results = state.results.as_ref().ok_or_else(|| {
                error!(index, "select_for_viewing without a result set");
                PresentationError::NoResults
            })?;
            let navigator = ViewerNavigator::open(results.image_paths(), index).map_err(|e| {
                error!(error = %e, "select_for_viewing precondition violated");
                e
            })?;
            let session = ViewerSession {
                navigator,
                loader: ImageResourceLoader::new(Arc::clone(&self.images), self.tracker.clone()),
            };
            let load = session.show_current();
            state.viewer = Some(session);
            load
        };
        debug!(index, "viewer opened");
        self.notify();
        Ok(load)
    }

    pub fn close_viewer(&self) {
        let closed = lock(&self.state).viewer.take();
        if let Some(ViewerSession { navigator, loader }) = closed {
            drop(loader);
            navigator.close();
            debug!("viewer closed");
            self.notify();
        }
    }

    pub fn next(&self) -> Result<PendingLoad, PresentationError> {
        self.step(|nav| {
            nav.next();
        })
    }

    pub fn previous(&self) -> Result<PendingLoad, PresentationError> {
        self.step(|nav| {
            nav.previous();
        })
    }

    fn step(
        &self,
        f: impl FnOnce(&mut ViewerNavigator),
    ) -> Result<PendingLoad, PresentationError> {
        let load = {
            let mut state = lock(&self.state);
            let session = state.viewer.as_mut().ok_or_else(|| {
                error!("viewer navigation while closed");
                PresentationError::ViewerClosed
            })?;
            f(&mut session.navigator);
            session.show_current()
        };
        self.notify();
        Ok(load)
    }

    pub fn loading(&self) -> bool {
        lock(&self.state).loading
    }

    pub fn error(&self) -> Option<String> {
        lock(&self.state).error.clone()
    }

    pub fn result_set(&self) -> Option<Arc<ResultSet>> {
        lock(&self.state).results.clone()
    }

    pub fn viewer_state(&self) -> Option<ViewerState> {
        lock(&self.state).viewer.as_ref().map(|s| s.navigator.state())
    }

    /// Alt text for the image the viewer is showing.
    pub fn viewer_label(&self) -> Option<String> {
        lock(&self.state).viewer.as_ref().map(|s| s.navigator.label())
    }

    pub fn viewer_image(&self) -> Option<ResourceStatus> {
        lock(&self.state).viewer.as_ref().map(|s| s.loader.status())
    }

    pub fn with_viewer_handle<R>(&self, f: impl FnOnce(&ResourceHandle) -> R) -> Option<R> {
        lock(&self.state)
            .viewer
            .as_ref()
            .and_then(|s| s.loader.with_handle(f))
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = lock(&self.state);
        Snapshot {
            loading: state.loading,
            error: state.error.clone(),
            results: state.results.clone(),
            viewer: state.viewer.as_ref().map(|s| s.navigator.state()),
        }
    }

    /// Builds the grid for the current result set, one loader per cell.
    /// Returns `None` when there is no result set to show.
    pub fn grid(&self) -> Option<GridView> {
        let results = self.result_set()?;
        if results.is_empty() {
            return Some(GridView::Empty {
                message: NO_RESULTS,
            });
        }
        let cells = results
            .matches()
            .iter()
            .enumerate()
            .map(|(index, record)| GridCell {
                index,
                record: record.clone(),
                loader: ImageResourceLoader::new(Arc::clone(&self.images), self.tracker.clone()),
            })
            .collect();
        Some(GridView::Cells(cells))
    }
}

/// Rendering of a result set: an explicit empty state, or one cell per match
/// in display order. Dropping the grid releases every cell's image.
#[derive(Debug)]
pub enum GridView {
    Empty { message: &'static str },
    Cells(Vec<GridCell>),
}

impl GridView {
    pub fn cells(&self) -> &[GridCell] {
        match self {
            GridView::Empty { .. } => &[],
            GridView::Cells(cells) => cells,
        }
    }

    /// Starts loading every thumbnail; the futures may settle in any order.
    pub fn load_all(&self) -> Vec<PendingLoad> {
        self.cells().iter().map(GridCell::load).collect()
    }
}

#[derive(Debug)]
pub struct GridCell {
    pub index: usize,
    pub record: MatchRecord,
    loader: ImageResourceLoader,
}

impl GridCell {
    pub fn load(&self) -> PendingLoad {
        self.loader.load(&self.record.image_path)
    }

    pub fn status(&self) -> ResourceStatus {
        self.loader.status()
    }

    pub fn with_handle<R>(&self, f: impl FnOnce(&ResourceHandle) -> R) -> Option<R> {
        self.loader.with_handle(f)
    }
}
