//! One scroll-direction's run of rows, grown lazily from its pagination edge.

use std::collections::{HashMap, HashSet};

use crate::closest::{Closest, closest};
use crate::error::{Error, PageError, Result};
use crate::row::Row;
use crate::tile::tile;
use crate::types::{Direction, ItemId, Page, PageItem, ShowItemRequest};

/// Rows a section accumulates before it splits.
pub(crate) const ROW_LIMIT: usize = 40;

/// A section's pagination edge: the continuation cursor plus items fetched
/// but not yet tiled into a row.
#[derive(Clone, Debug)]
pub(crate) struct Edge<K> {
    pub key: Option<K>,
    pub remainder: Vec<PageItem>,
}

impl<K> Default for Edge<K> {
    fn default() -> Self {
        Self {
            key: None,
            remainder: Vec::new(),
        }
    }
}

/// Outcome of a growth request.
#[derive(Debug)]
pub(crate) enum Grown {
    /// Nothing left to fetch or tile in this direction.
    Exhausted,
    /// The cursor advanced; rows may have been appended.
    Grew,
}

/// Outcome of one adjacency-map step.
#[derive(Debug)]
pub(crate) enum IterStep {
    Found(ItemId),
    /// The step leads across the pivot; retry against the sibling section.
    CrossSection,
    Exhausted,
}

pub(crate) struct RenderOutcome {
    /// The remaining rows plus the edge could not cover the requested band;
    /// the caller should request another page.
    pub more: bool,
    pub matched: Option<Closest>,
}

/// Host hooks threaded through a render pass.
pub(crate) struct ShowHooks<'a> {
    pub show_item: &'a dyn Fn(&ShowItemRequest) -> Option<f64>,
    pub hide_item: &'a dyn Fn(&ItemId),
    pub measure: &'a mut dyn FnMut(&ItemId, f64, Option<f64>),
}

/// An ordered run of rows on one side of the pivot.
///
/// Rows are kept in outward order: index 0 is nearest the pivot, growth
/// appends away from it. Item adjacency is tracked in global (pagination)
/// order regardless of direction, so the maps survive a split reversal
/// unchanged.
pub(crate) struct Section<K> {
    direction: Direction,
    width: f64,
    spacing: f64,
    rows: Vec<Row>,
    start: Edge<K>,
    end: Edge<K>,
    next_ids: HashMap<ItemId, ItemId>,
    prev_ids: HashMap<ItemId, ItemId>,
    members: HashSet<ItemId>,
    /// Outward-first and outward-last chained identities.
    chain_head: Option<ItemId>,
    chain_tail: Option<ItemId>,
    height: f64,
    /// Inclusive row range currently shown, if any.
    shown: Option<(usize, usize)>,
    fetched: bool,
}

impl<K: Clone> Section<K> {
    pub fn new(direction: Direction, width: f64, spacing: f64, key: Option<K>) -> Self {
        Self {
            direction,
            width,
            spacing,
            rows: Vec::new(),
            start: Edge::default(),
            end: Edge { key, remainder: Vec::new() },
            next_ids: HashMap::new(),
            prev_ids: HashMap::new(),
            members: HashSet::new(),
            chain_head: None,
            chain_tail: None,
            height: 0.0,
            shown: None,
            fetched: false,
        }
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn rows_len(&self) -> usize {
        self.rows.len()
    }

    pub fn shown(&self) -> Option<(usize, usize)> {
        self.shown
    }

    pub fn can_grow(&self) -> bool {
        self.end.key.is_some() || !self.end.remainder.is_empty()
    }

    /// The cursor on the pivot side, resolved by the first successful fetch.
    pub fn start_key(&self) -> Option<&K> {
        self.start.key.as_ref()
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.members.contains(id)
    }

    pub fn member_ids(&self) -> impl Iterator<Item = &ItemId> {
        self.members.iter()
    }

    /// Outward-local offset and height of the row holding `id`.
    pub fn row_span_of(&self, id: &ItemId) -> Option<(f64, f64)> {
        self.rows
            .iter()
            .find(|row| row.has(id))
            .map(|row| (row.from(), row.height()))
    }

    pub fn row_first_id(&self, index: usize) -> Option<&ItemId> {
        self.rows.get(index).and_then(Row::first_id)
    }

    /// Fetches one page (or flushes the final remainder) and tiles it into
    /// rows.
    ///
    /// The edge key is taken out before the fetch and restored on failure, so
    /// a failed page can be retried and a concurrent observer sees the
    /// request as in flight. The first successful fetch resolves the start
    /// edge with the page's counter-direction cursor.
    pub fn next(
        &mut self,
        threshold: f64,
        fetch: &dyn Fn(&K) -> std::result::Result<Page<K>, PageError>,
        register: &mut dyn FnMut(&ItemId, &K),
    ) -> Result<Grown> {
        let mut onward: Option<K> = None;
        let mut incoming: Vec<PageItem> = Vec::new();

        match self.end.key.take() {
            Some(key) => {
                let page = match fetch(&key) {
                    Ok(page) => page,
                    Err(source) => {
                        self.end.key = Some(key);
                        return Err(Error::Page(source));
                    }
                };
                for item in &page.items {
                    debug_assert!(item.aspect_ratio > 0.0, "aspect ratio must be positive");
                    register(&item.id, &key);
                }
                let (ahead, counter) = match self.direction {
                    Direction::Forward => (page.next, page.previous),
                    Direction::Backward => (page.previous, page.next),
                };
                if !self.fetched {
                    self.fetched = true;
                    self.start.key = counter;
                }
                onward = ahead;
                incoming = page.items;
                if self.direction == Direction::Backward {
                    incoming.reverse();
                }
            }
            None => {
                if self.end.remainder.is_empty() {
                    return Ok(Grown::Exhausted);
                }
                // exhausted cursor: flush the leftover as the final rows
            }
        }

        let mut pending = std::mem::take(&mut self.end.remainder);
        pending.extend(incoming);
        self.end.key = onward;

        if pending.is_empty() {
            return Ok(if self.can_grow() {
                Grown::Grew
            } else {
                Grown::Exhausted
            });
        }

        let finished = self.end.key.is_none();
        let ratios: Vec<f64> = pending.iter().map(|item| item.aspect_ratio).collect();
        let breaks = tile(&ratios, threshold, finished)?;

        let tiled = breaks.last().copied().unwrap_or(0);
        self.end.remainder = pending.split_off(tiled);
        if tiled == 0 {
            // nothing reached the threshold yet; wait for the next page
            return Ok(Grown::Grew);
        }

        self.chain(&pending);
        self.append_rows(&pending, &breaks, threshold, finished);
        mdebug!(
            direction = ?self.direction,
            rows = self.rows.len(),
            remainder = self.end.remainder.len(),
            "section grew"
        );
        Ok(Grown::Grew)
    }

    /// Links a freshly tiled outward-ordered span onto the chained tail.
    fn chain(&mut self, span: &[PageItem]) {
        for item in span {
            if let Some(tail) = self.chain_tail.clone() {
                match self.direction {
                    Direction::Forward => {
                        self.next_ids.insert(tail.clone(), item.id.clone());
                        self.prev_ids.insert(item.id.clone(), tail);
                    }
                    Direction::Backward => {
                        self.next_ids.insert(item.id.clone(), tail.clone());
                        self.prev_ids.insert(tail, item.id.clone());
                    }
                }
            }
            if self.chain_head.is_none() {
                self.chain_head = Some(item.id.clone());
            }
            self.chain_tail = Some(item.id.clone());
            self.members.insert(item.id.clone());
        }
    }

    /// Appends one row per breakpoint. `span` is in outward order; row items
    /// are stored in natural (pagination) order.
    fn append_rows(&mut self, span: &[PageItem], breaks: &[usize], threshold: f64, finished: bool) {
        let mut at = 0usize;
        for (i, &b) in breaks.iter().enumerate() {
            let mut items: Vec<PageItem> = span[at..b].to_vec();
            if self.direction == Direction::Backward {
                items.reverse();
            }
            let dangling = finished && i + 1 == breaks.len();
            let from = if self.rows.is_empty() {
                0.0
            } else {
                self.height + self.spacing
            };
            let row = Row::new(items, from, self.width, self.spacing, threshold, dangling);
            self.height = row.from() + row.height();
            self.rows.push(row);
            at = b;
        }
    }

    pub fn should_split(&self) -> bool {
        self.rows.len() > ROW_LIMIT
    }

    /// Splits off growth: the returned sibling takes this section's end edge
    /// and keeps growing the same way, while `self` is reversed in place to
    /// face the other way across the new pivot. The old start edge becomes
    /// the reversed section's growth edge, so the region dropped by the
    /// caller stays reachable through pagination.
    pub fn split(&mut self) -> Section<K> {
        let sibling = Section {
            direction: self.direction,
            width: self.width,
            spacing: self.spacing,
            rows: Vec::new(),
            start: Edge::default(),
            end: std::mem::take(&mut self.end),
            next_ids: HashMap::new(),
            prev_ids: HashMap::new(),
            members: HashSet::new(),
            chain_head: None,
            chain_tail: None,
            height: 0.0,
            shown: None,
            fetched: false,
        };

        self.direction = self.direction.opposite();
        self.rows.reverse();
        let count = self.rows.len();
        let mut from = 0.0;
        for row in &mut self.rows {
            row.set_from(from);
            from += row.height() + self.spacing;
        }
        self.height = (from - self.spacing).max(0.0);
        if let Some((lo, hi)) = self.shown {
            self.shown = Some((count - 1 - hi, count - 1 - lo));
        }
        std::mem::swap(&mut self.start, &mut self.end);
        std::mem::swap(&mut self.chain_head, &mut self.chain_tail);
        mdebug!(direction = ?self.direction, rows = count, "section split");
        sibling
    }

    /// Shows the rows intersecting the outward-local band `[lo, hi]`,
    /// anchored by the row nearest `target`, hiding rows that left the band.
    ///
    /// `top_of(from, height)` maps a row into the host's absolute
    /// coordinates.
    pub fn render(
        &mut self,
        target: f64,
        lo: f64,
        hi: f64,
        top_of: &dyn Fn(f64, f64) -> f64,
        fast: bool,
        hooks: &mut ShowHooks<'_>,
    ) -> RenderOutcome {
        let Some(anchor) = closest(self.rows.len(), target, |i| self.rows[i].from()) else {
            return RenderOutcome {
                more: self.can_grow() && hi >= 0.0,
                matched: None,
            };
        };

        let visible =
            |row: &Row| row.from() <= hi && row.from() + row.height() >= lo;

        let new_shown = if visible(&self.rows[anchor.index]) {
            let mut first = anchor.index;
            while first > 0 && visible(&self.rows[first - 1]) {
                first -= 1;
            }
            let mut last = anchor.index;
            while last + 1 < self.rows.len() && visible(&self.rows[last + 1]) {
                last += 1;
            }
            Some((first, last))
        } else {
            None
        };

        if let Some((prev_lo, prev_hi)) = self.shown {
            for i in prev_lo..=prev_hi {
                let keep = matches!(new_shown, Some((lo_i, hi_i)) if i >= lo_i && i <= hi_i);
                if !keep {
                    self.rows[i].hide(hooks.hide_item);
                }
            }
        }

        if let Some((lo_i, hi_i)) = new_shown {
            for i in lo_i..=hi_i {
                let top = top_of(self.rows[i].from(), self.rows[i].height());
                self.rows[i].show(top, fast, hooks.show_item, hooks.measure);
            }
        }
        self.shown = new_shown;

        let more = match new_shown {
            Some((_, hi_i)) => {
                hi_i + 1 == self.rows.len() && hi >= self.height && self.can_grow()
            }
            None => self.rows.is_empty() && self.can_grow() && hi >= 0.0,
        };

        RenderOutcome {
            more,
            matched: Some(anchor),
        }
    }

    /// One adjacency step from `id`. A miss in the outward direction grows
    /// the section once and retries; a miss toward the pivot means the
    /// neighbor lives in the sibling section.
    pub fn step(
        &mut self,
        id: &ItemId,
        step_forward: bool,
        threshold: f64,
        fetch: &dyn Fn(&K) -> std::result::Result<Page<K>, PageError>,
        register: &mut dyn FnMut(&ItemId, &K),
    ) -> Result<IterStep> {
        let lookup = |s: &Self| {
            let map = if step_forward { &s.next_ids } else { &s.prev_ids };
            map.get(id).cloned()
        };

        if let Some(found) = lookup(self) {
            return Ok(IterStep::Found(found));
        }
        let outward = step_forward == (self.direction == Direction::Forward);
        if !outward {
            return Ok(IterStep::CrossSection);
        }
        match self.next(threshold, fetch, register)? {
            Grown::Exhausted => Ok(IterStep::Exhausted),
            Grown::Grew => Ok(lookup(self)
                .map(IterStep::Found)
                .unwrap_or(IterStep::Exhausted)),
        }
    }

    /// Outward-first identity (the pivot-adjacent item), growing once if the
    /// section has no rows yet.
    pub fn first(
        &mut self,
        threshold: f64,
        fetch: &dyn Fn(&K) -> std::result::Result<Page<K>, PageError>,
        register: &mut dyn FnMut(&ItemId, &K),
    ) -> Result<Option<ItemId>> {
        if self.rows.is_empty() {
            self.next(threshold, fetch, register)?;
        }
        let Some(row) = self.rows.first() else {
            return Ok(None);
        };
        Ok(match self.direction {
            Direction::Forward => row.first_id().cloned(),
            Direction::Backward => row.last_id().cloned(),
        })
    }

    /// Re-tiles every row for a new width and threshold.
    ///
    /// Shown rows are disposed first (the following render re-shows what is
    /// visible); adjacency maps, membership, and both edges survive.
    pub fn relayout(
        &mut self,
        width: f64,
        threshold: f64,
        hide_item: &dyn Fn(&ItemId),
        detach_item: &dyn Fn(&ItemId),
    ) -> Result<()> {
        self.width = width;
        if self.rows.is_empty() {
            return Ok(());
        }

        let mut outward: Vec<PageItem> = Vec::new();
        for row in &mut self.rows {
            row.dispose(hide_item, detach_item);
        }
        for row in &self.rows {
            let mut items: Vec<PageItem> = row
                .items()
                .iter()
                .map(|item| PageItem {
                    id: item.id.clone(),
                    aspect_ratio: item.aspect_ratio,
                })
                .collect();
            if self.direction == Direction::Backward {
                items.reverse();
            }
            outward.extend(items);
        }

        let ratios: Vec<f64> = outward.iter().map(|item| item.aspect_ratio).collect();
        let breaks = tile(&ratios, threshold, true)?;

        self.rows.clear();
        self.height = 0.0;
        self.shown = None;
        // Everything must re-tile (the items are already chained), so the
        // trailing row always gets the dangling guard against overstretch.
        self.append_rows(&outward, &breaks, threshold, true);
        Ok(())
    }

    /// Applies `f` to every item of every currently shown row.
    pub fn update_items(&self, f: &mut dyn FnMut(&ItemId)) {
        if let Some((lo, hi)) = self.shown {
            for i in lo..=hi {
                self.rows[i].update_items(f);
            }
        }
    }

    /// Tears down every row; hide/detach hooks fire once per shown item.
    pub fn dispose(&mut self, hide_item: &dyn Fn(&ItemId), detach_item: &dyn Fn(&ItemId)) {
        for row in &mut self.rows {
            row.dispose(hide_item, detach_item);
        }
        self.shown = None;
    }
}
