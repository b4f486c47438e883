use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use tracing::debug;

use crate::loader::{ComponentLoader, LoadRequest, LoadResult};

struct SlotState<C> {
  request: Option<LoadRequest>,
  result: LoadResult<C>,
}

/// Holds the latest load result for one mount point (layout, step, widget).
///
/// Every load takes a ticket. A result is only committed if its ticket is
/// still the newest when the load finishes, so a slow stale load can never
/// overwrite the result of a newer request.
pub struct ComponentSlot<C> {
  generation: AtomicU64,
  state: RwLock<SlotState<C>>,
}

impl<C: Clone + Send + Sync + 'static> ComponentSlot<C> {
  pub fn new() -> Self {
    Self {
      generation: AtomicU64::new(0),
      state: RwLock::new(SlotState {
        request: None,
        result: LoadResult::idle(),
      }),
    }
  }

  /// Current result (may be loading).
  pub fn snapshot(&self) -> LoadResult<C> {
    self
      .state
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .result
      .clone()
  }

  /// Request most recently issued to this slot.
  pub fn request(&self) -> Option<LoadRequest> {
    self
      .state
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .request
      .clone()
  }

  /// Load `request` into the slot. Returns `true` if the result was
  /// committed, `false` if a newer request superseded it.
  pub async fn load(&self, loader: &ComponentLoader<C>, request: LoadRequest) -> bool {
    let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
    {
      let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
      state.request = Some(request.clone());
      state.result = LoadResult::loading();
    }

    let result = loader.load_request(&request).await;

    let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
    if self.generation.load(Ordering::SeqCst) != ticket {
      debug!(
        component_id = %request.component_id,
        kind = %request.kind,
        "discarding stale component load"
      );
      return false;
    }
    state.result = result;
    true
  }

  /// Load only if `request` differs from the last one issued.
  pub async fn ensure(&self, loader: &ComponentLoader<C>, request: LoadRequest) -> LoadResult<C> {
    if self.request().as_ref() != Some(&request) {
      self.load(loader, request).await;
    }
    self.snapshot()
  }

  /// Drop the current result and invalidate any in-flight load.
  pub fn clear(&self) {
    self.generation.fetch_add(1, Ordering::SeqCst);
    let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
    state.request = None;
    state.result = LoadResult::idle();
  }
}

impl<C: Clone + Send + Sync + 'static> Default for ComponentSlot<C> {
  fn default() -> Self {
    Self::new()
  }
}
