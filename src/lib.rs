//! A headless justified-layout windowing engine.
//!
//! For adapter-level utilities (a reference host loop), see the `mosaic-adapter` crate.
//!
//! This crate renders an effectively unbounded, lazily paginated sequence of
//! variable-aspect-ratio items into a scrollable viewport, materializing only
//! the rows near the current scroll position: justified row tiling, nearest-row
//! binary search, bidirectional page growth around a pivot, and a memory-budget
//! feedback loop.
//!
//! It is UI-agnostic. A TUI/GUI layer is expected to provide:
//! - viewport geometry and scroll offsets (with timestamps)
//! - a page fetcher for the host's pagination cursors
//! - show/hide/detach hooks that do the actual item rendering
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod closest;
mod error;
mod iter;
mod mosaic;
mod options;
mod reader;
mod row;
mod section;
mod tile;
mod types;

#[cfg(test)]
mod tests;

pub use closest::{Closest, closest};
pub use error::{Error, PageError, Result};
pub use iter::ItemIter;
pub use mosaic::Mosaic;
pub use options::{ItemHook, MosaicOptions, OnEvent, PageFetch, ShowItemFn, ThresholdFn};
pub use reader::{ResizeReader, ScrollReader};
pub use tile::tile;
pub use types::{Direction, Event, ItemId, Page, PageItem, ShowItemRequest, Viewport};
