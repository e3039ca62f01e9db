//! Cross-section item cursor.

use crate::error::Result;
use crate::mosaic::Mosaic;
use crate::types::ItemId;

/// A stateful cursor for programmatic next/previous item navigation.
///
/// Steps resolve through the sections' adjacency maps and can cross the
/// pivot, fetching more pages on demand. Committing a step updates the
/// engine's focus and triggers a navigation render; soft (exploratory) steps
/// leave both untouched, which makes them suitable for prefetch-style checks
/// like "is there an item twenty ahead?".
pub struct ItemIter<'a, K> {
    engine: &'a mut Mosaic<K>,
}

impl<'a, K: Clone> ItemIter<'a, K> {
    pub(crate) fn new(engine: &'a mut Mosaic<K>) -> Self {
        Self { engine }
    }

    /// Advances `|from|` steps in the sign's direction, committing the new
    /// focus and anchoring the viewport at it.
    ///
    /// Returns `None` when the walk runs past either end of the data set.
    pub fn advance(&mut self, from: i64) -> Result<Option<ItemId>> {
        self.engine.advance_focus(from, false)
    }

    /// Exploratory advance: resolves the identity `|from|` steps away
    /// without committing focus or triggering a render. Pages may still be
    /// fetched to answer the question.
    pub fn peek(&mut self, from: i64) -> Result<Option<ItemId>> {
        self.engine.advance_focus(from, true)
    }

    pub fn next(&mut self) -> Result<Option<ItemId>> {
        self.advance(1)
    }

    pub fn previous(&mut self) -> Result<Option<ItemId>> {
        self.advance(-1)
    }
}
