use mosaic::{Direction, ItemId, Mosaic, MosaicOptions, Result, Viewport};

/// A framework-neutral controller that wraps a [`mosaic::Mosaic`] and runs
/// the host loop workflow.
///
/// This type does not hold any UI objects. Adapters drive it by calling:
/// - `attach` once the viewport element exists
/// - `on_scroll` / `on_resize` when UI events occur
/// - `tick(now_ms)` each frame/timer tick (growth, settle debouncing, and
///   deferred renders all advance here)
pub struct Controller<K> {
    engine: Mosaic<K>,
}

impl<K: Clone> Controller<K> {
    pub fn new(options: MosaicOptions<K>) -> Self {
        Self {
            engine: Mosaic::new(options),
        }
    }

    pub fn from_engine(engine: Mosaic<K>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Mosaic<K> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Mosaic<K> {
        &mut self.engine
    }

    pub fn into_engine(self) -> Mosaic<K> {
        self.engine
    }

    /// Attaches the engine to the viewport and performs the initial fill.
    pub fn attach(&mut self, viewport: Viewport) -> Result<()> {
        self.engine.attach(viewport)
    }

    /// Call this when the UI reports a scroll offset change (wheel/drag).
    pub fn on_scroll(&mut self, offset: f64, now_ms: u64) -> Result<()> {
        self.engine.apply_scroll(offset, now_ms)
    }

    /// Call this when the UI reports new viewport geometry. The engine
    /// re-tiles once the viewport stops changing.
    pub fn on_resize(&mut self, viewport: Viewport, now_ms: u64) -> Result<()> {
        self.engine.apply_resize(viewport, now_ms)
    }

    /// Advances the engine: settles fast-scroll state, applies settled
    /// resizes, and drains deferred growth and renders.
    pub fn tick(&mut self, now_ms: u64) -> Result<()> {
        self.engine.tick(now_ms)
    }

    /// Requests one page of growth below the viewport; `Ok(false)` means
    /// there is nothing left in that direction.
    pub fn next(&mut self) -> Result<bool> {
        self.engine.next()
    }

    /// Requests one page of growth above the viewport; `Ok(false)` means
    /// there is nothing left in that direction.
    pub fn previous(&mut self) -> Result<bool> {
        self.engine.previous()
    }

    /// Navigates to an item identity and anchors the viewport at its row.
    pub fn scroll_to(&mut self, id: &ItemId) -> Result<()> {
        self.engine.scroll_to(id)
    }

    /// Whether more content can still be paginated in `direction`.
    pub fn can_grow(&self, direction: Direction) -> bool {
        self.engine.can_grow(direction)
    }

    /// Detaches every shown item and tears the engine down.
    pub fn destroy(&mut self) -> Result<()> {
        self.engine.destroy()
    }
}
