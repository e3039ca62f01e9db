use std::fmt;
use std::sync::Arc;

/// Stable identity of a content item.
///
/// Identities are host-assigned, opaque to the engine, and cheap to clone.
/// They are the unit of equality for adjacency maps, focus tracking, and the
/// identity → page-key table; the engine never looks inside them.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemId(Arc<str>);

impl ItemId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId({})", self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An item as supplied by the host's pager: identity plus aspect ratio.
///
/// The host keeps ownership of the item's actual content; the engine only
/// ever hands the identity back through its hooks.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageItem {
    pub id: ItemId,
    /// width / height. Must be positive; the engine does not sanitize it.
    pub aspect_ratio: f64,
}

impl PageItem {
    pub fn new(id: impl Into<ItemId>, aspect_ratio: f64) -> Self {
        Self {
            id: id.into(),
            aspect_ratio,
        }
    }
}

/// One unit of pagination, fetched through the host's page fetcher.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Page<K> {
    pub items: Vec<PageItem>,
    /// Cursor of the page after this one, `None` at the end of the data set.
    pub next: Option<K>,
    /// Cursor of the page before this one, `None` at the start.
    pub previous: Option<K>,
}

/// Viewport geometry in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn aspect_ratio(&self) -> f64 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            0.0
        }
    }
}

/// Growth direction of a section relative to the pivot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    Backward,
    Forward,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Self::Backward => Self::Forward,
            Self::Forward => Self::Backward,
        }
    }
}

/// Lifecycle events emitted through `MosaicOptions::on_event`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Event<K> {
    /// The initial fill completed; carries the pivot page key.
    Loaded { key: K },
    /// The visible anchor crossed into another row.
    RowChange {
        item: ItemId,
        /// The page key the anchor item originated from, when still known.
        key: Option<K>,
        /// Signed distance from the anchor target to the matched row.
        delta: f64,
    },
    /// Memory pressure wants a coarser layout. Fired at most once per engine.
    ThresholdRejected { proposed: f64 },
}

/// Geometry handed to the host when an item becomes (or stays) visible.
///
/// Coordinates are absolute within the scrollable content, `top` along the
/// scroll axis.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShowItemRequest {
    pub id: ItemId,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    /// True while the viewport is in a fast fling; hosts may render a cheap
    /// placeholder and wait for the settled re-render.
    pub fast: bool,
}
