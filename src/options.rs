use std::sync::Arc;

use crate::error::PageError;
use crate::types::{Event, ItemId, Page, ShowItemRequest};

/// Fetches one page for a host-defined cursor.
///
/// Must be idempotent for identical keys within one engine lifetime. The
/// engine never retries a failure; the error propagates to whoever drove the
/// growth.
pub type PageFetch<K> =
    Arc<dyn Fn(&K) -> std::result::Result<Page<K>, PageError> + Send + Sync>;

/// Renders an item at the given geometry.
///
/// The return value is the item's estimated size in bytes, feeding the
/// memory-budget heuristic. Return `None` when the estimate is not yet known
/// and report it later through `Mosaic::size_change`.
pub type ShowItemFn = Arc<dyn Fn(&ShowItemRequest) -> Option<f64> + Send + Sync>;

/// Host teardown hook (hide or detach), called once per corresponding show or
/// attach.
pub type ItemHook = Arc<dyn Fn(&ItemId) + Send + Sync>;

/// Target row aspect ratio for a given viewport width. Must return at least 1;
/// narrower viewports typically want smaller thresholds.
pub type ThresholdFn = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// Callback fired for engine lifecycle events.
pub type OnEvent<K> = Arc<dyn Fn(&Event<K>) + Send + Sync>;

/// Configuration for [`crate::Mosaic`].
///
/// This type is designed to be cheap to clone: heavy fields are stored in
/// `Arc`s so hosts can tweak a few fields and rebuild an engine without
/// reallocating closures.
pub struct MosaicOptions<K> {
    /// The pivot page key: the first page fetched after `attach`.
    pub key: K,
    pub get_page: PageFetch<K>,
    pub show_item: ShowItemFn,
    pub hide_item: ItemHook,
    pub detach_item: ItemHook,
    pub row_threshold: ThresholdFn,
    /// Optional callback fired for `Loaded`/`RowChange`/`ThresholdRejected`.
    pub on_event: Option<OnEvent<K>>,

    /// Space between items and between rows, in pixels.
    pub spacing: f64,
    /// Extra margin rendered beyond the viewport edges, in pixels.
    pub offset: f64,
    /// Byte budget for materialized items; the rejection heuristic arms at
    /// half of it. Infinite by default (disabled).
    pub max_items_size_bytes: f64,
    /// Gutter reserved for a host scrollbar, subtracted from the row width.
    pub scrollbar_width: f64,

    /// Quiet period after which a fast fling counts as settled.
    pub fast_scroll_reset_delay_ms: u64,
    /// Quiet period after which a resize is applied.
    pub resize_settle_delay_ms: u64,
}

impl<K> MosaicOptions<K> {
    pub fn new(
        key: K,
        get_page: impl Fn(&K) -> std::result::Result<Page<K>, PageError> + Send + Sync + 'static,
        show_item: impl Fn(&ShowItemRequest) -> Option<f64> + Send + Sync + 'static,
    ) -> Self {
        Self {
            key,
            get_page: Arc::new(get_page),
            show_item: Arc::new(show_item),
            hide_item: Arc::new(|_| {}),
            detach_item: Arc::new(|_| {}),
            row_threshold: Arc::new(|_| 2.0),
            on_event: None,
            spacing: 8.0,
            offset: 0.0,
            max_items_size_bytes: f64::INFINITY,
            scrollbar_width: 0.0,
            fast_scroll_reset_delay_ms: 150,
            resize_settle_delay_ms: 200,
        }
    }

    pub fn with_hide_item(mut self, f: impl Fn(&ItemId) + Send + Sync + 'static) -> Self {
        self.hide_item = Arc::new(f);
        self
    }

    pub fn with_detach_item(mut self, f: impl Fn(&ItemId) + Send + Sync + 'static) -> Self {
        self.detach_item = Arc::new(f);
        self
    }

    pub fn with_row_threshold(mut self, f: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
        self.row_threshold = Arc::new(f);
        self
    }

    pub fn with_on_event(
        mut self,
        f: Option<impl Fn(&Event<K>) + Send + Sync + 'static>,
    ) -> Self {
        self.on_event = f.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_spacing(mut self, spacing: f64) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_max_items_size_bytes(mut self, bytes: f64) -> Self {
        self.max_items_size_bytes = bytes;
        self
    }

    pub fn with_scrollbar_width(mut self, width: f64) -> Self {
        self.scrollbar_width = width;
        self
    }

    pub fn with_fast_scroll_reset_delay_ms(mut self, delay_ms: u64) -> Self {
        self.fast_scroll_reset_delay_ms = delay_ms;
        self
    }

    pub fn with_resize_settle_delay_ms(mut self, delay_ms: u64) -> Self {
        self.resize_settle_delay_ms = delay_ms;
        self
    }
}

impl<K: Clone> Clone for MosaicOptions<K> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            get_page: Arc::clone(&self.get_page),
            show_item: Arc::clone(&self.show_item),
            hide_item: Arc::clone(&self.hide_item),
            detach_item: Arc::clone(&self.detach_item),
            row_threshold: Arc::clone(&self.row_threshold),
            on_event: self.on_event.clone(),
            spacing: self.spacing,
            offset: self.offset,
            max_items_size_bytes: self.max_items_size_bytes,
            scrollbar_width: self.scrollbar_width,
            fast_scroll_reset_delay_ms: self.fast_scroll_reset_delay_ms,
            resize_settle_delay_ms: self.resize_settle_delay_ms,
        }
    }
}

impl<K: core::fmt::Debug> core::fmt::Debug for MosaicOptions<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MosaicOptions")
            .field("key", &self.key)
            .field("spacing", &self.spacing)
            .field("offset", &self.offset)
            .field("max_items_size_bytes", &self.max_items_size_bytes)
            .field("scrollbar_width", &self.scrollbar_width)
            .field(
                "fast_scroll_reset_delay_ms",
                &self.fast_scroll_reset_delay_ms,
            )
            .field("resize_settle_delay_ms", &self.resize_settle_delay_ms)
            .finish_non_exhaustive()
    }
}
