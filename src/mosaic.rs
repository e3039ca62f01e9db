//! The orchestrator: two sections pivoted around an anchor offset, a render
//! loop, and a memory-budget feedback channel.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::iter::ItemIter;
use crate::options::MosaicOptions;
use crate::reader::{ResizeReader, ScrollReader};
use crate::section::{IterStep, Section, ShowHooks};
use crate::tile::tile;
use crate::types::{Direction, Event, ItemId, ShowItemRequest, Viewport};

/// Floor for the memory-rejection threshold search.
const MIN_THRESHOLD: f64 = 1.5;

/// A headless justified-layout windowing engine.
///
/// Owns one backward and one forward [`Section`] pivoted at an anchor
/// offset, materializing only the rows near the current scroll position.
/// All mutation happens synchronously inside host-driven entry points:
/// scroll and resize events, the per-frame `tick`, and explicit navigation.
/// The only suspending collaborator is the host's page fetcher, and it is
/// invoked synchronously from inside growth.
pub struct Mosaic<K> {
    options: MosaicOptions<K>,
    viewport: Viewport,
    scroll_offset: f64,
    threshold: f64,
    attached: bool,
    destroyed: bool,
    loaded: bool,

    backward: Option<Section<K>>,
    forward: Option<Section<K>>,

    /// Last explicitly navigated-to identity.
    focused: Option<ItemId>,
    /// Identity → originating page key, for row-change reporting.
    item_keys: HashMap<ItemId, K>,
    /// Last reported row anchor.
    anchor: Option<ItemId>,

    scroll_reader: ScrollReader,
    resize_reader: ResizeReader,

    /// Deferred work, drained by `tick` once the viewport settles. Growth is
    /// queued at most once per direction; concurrent requests coalesce.
    pending_forward: bool,
    pending_backward: bool,
    render_queued: bool,

    /// Measured bytes per shown item, plus first-shown order for re-tiling.
    measured: HashMap<ItemId, f64>,
    measured_order: Vec<(ItemId, f64)>,
    measured_total: f64,
    /// Latch: the rejection event fires at most once per engine lifetime.
    rejected: bool,
}

impl<K: Clone> Mosaic<K> {
    pub fn new(options: MosaicOptions<K>) -> Self {
        mdebug!(
            spacing = options.spacing,
            offset = options.offset,
            "Mosaic::new"
        );
        let scroll_reader = ScrollReader::new(options.fast_scroll_reset_delay_ms);
        let resize_reader = ResizeReader::new(options.resize_settle_delay_ms);
        Self {
            options,
            viewport: Viewport::default(),
            scroll_offset: 0.0,
            threshold: 1.0,
            attached: false,
            destroyed: false,
            loaded: false,
            backward: None,
            forward: None,
            focused: None,
            item_keys: HashMap::new(),
            anchor: None,
            scroll_reader,
            resize_reader,
            pending_forward: false,
            pending_backward: false,
            render_queued: false,
            measured: HashMap::new(),
            measured_order: Vec::new(),
            measured_total: 0.0,
            rejected: false,
        }
    }

    pub fn options(&self) -> &MosaicOptions<K> {
        &self.options
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn scroll_offset(&self) -> f64 {
        self.scroll_offset
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn focused(&self) -> Option<&ItemId> {
        self.focused.as_ref()
    }

    /// The scroll offset separating the backward section (above) from the
    /// forward section (below). Always the backward section's total extent.
    pub fn pivot(&self) -> f64 {
        let backward = self.backward.as_ref().map_or(0.0, Section::height);
        if backward > 0.0 {
            backward + self.options.spacing
        } else {
            0.0
        }
    }

    /// Total extent of the materialized content along the scroll axis.
    pub fn total_height(&self) -> f64 {
        self.pivot() + self.forward.as_ref().map_or(0.0, Section::height)
    }

    /// Number of currently shown rows across both sections.
    pub fn shown_rows(&self) -> usize {
        let count = |section: &Option<Section<K>>| {
            section
                .as_ref()
                .and_then(Section::shown)
                .map_or(0, |(lo, hi)| hi - lo + 1)
        };
        count(&self.backward) + count(&self.forward)
    }

    /// Attaches the engine to a viewport and performs the initial fill:
    /// forward from the pivot page until the viewport is covered, then
    /// symmetrically backward, then one render pass.
    ///
    /// Emits [`Event::Loaded`] once, when the fill found any content at all;
    /// an empty data set leaves the engine in a valid empty-steady state.
    pub fn attach(&mut self, viewport: Viewport) -> Result<()> {
        self.ensure_live()?;
        if self.attached {
            return Err(Error::AlreadyAttached);
        }
        let threshold = (self.options.row_threshold)(viewport.width);
        if threshold < 1.0 {
            return Err(Error::Threshold(threshold));
        }
        mdebug!(
            width = viewport.width,
            height = viewport.height,
            threshold,
            "attach"
        );
        self.threshold = threshold;
        self.viewport = viewport;
        self.attached = true;

        let row_width = self.row_width();
        self.forward = Some(Section::new(
            Direction::Forward,
            row_width,
            self.options.spacing,
            Some(self.options.key.clone()),
        ));
        self.fill(Direction::Forward)?;

        // A fill large enough to split has already produced a backward
        // section; otherwise seed one from the pivot page's counter cursor.
        if self.backward.is_none() {
            let back_key = self
                .forward
                .as_ref()
                .and_then(|section| section.start_key().cloned());
            self.backward = Some(Section::new(
                Direction::Backward,
                row_width,
                self.options.spacing,
                back_key,
            ));
            self.fill(Direction::Backward)?;
        }

        self.scroll_offset = self.pivot();
        self.render_pass(None, false)?;
        while self.pending_forward || self.pending_backward {
            if std::mem::take(&mut self.pending_forward) {
                self.grow_now(Direction::Forward)?;
            }
            if std::mem::take(&mut self.pending_backward) {
                self.grow_now(Direction::Backward)?;
            }
            self.render_pass(None, false)?;
        }
        self.render_queued = false;

        let filled = self.section_ref(Direction::Forward)?.rows_len() > 0
            || self.section_ref(Direction::Backward)?.rows_len() > 0;
        if filled && !self.loaded {
            self.loaded = true;
            let key = self.options.key.clone();
            self.emit(Event::Loaded { key });
        } else if !filled {
            mwarn!("initial fill found no items");
        }
        Ok(())
    }

    /// Applies a scroll offset event from the host and re-renders against
    /// the new snapshot. Fast flings render in placeholder mode; growth is
    /// deferred until the viewport settles.
    pub fn apply_scroll(&mut self, offset: f64, now_ms: u64) -> Result<()> {
        self.ensure_live()?;
        if !self.attached {
            return Err(Error::NotAttached);
        }
        mtrace!(offset, now_ms, "apply_scroll");
        self.scroll_reader
            .observe(offset, self.viewport.height, now_ms);
        self.scroll_offset = self.clamp_scroll(offset);
        self.render_pass(None, true)
    }

    /// Records a resize event; the new geometry is applied by `tick` once
    /// the viewport stops changing.
    pub fn apply_resize(&mut self, viewport: Viewport, now_ms: u64) -> Result<()> {
        self.ensure_live()?;
        if !self.attached {
            return Err(Error::NotAttached);
        }
        self.resize_reader.observe(viewport, now_ms);
        Ok(())
    }

    /// Advances deferred work: settles the readers, applies a settled
    /// resize, then drains queued growth and renders — but only while the
    /// viewport is not mid-fling.
    ///
    /// Call once per frame or timer tick. Ticking before `attach` is a
    /// no-op.
    pub fn tick(&mut self, now_ms: u64) -> Result<()> {
        self.ensure_live()?;
        if !self.attached {
            return Ok(());
        }
        let was_fast = self.scroll_reader.is_fast();
        self.scroll_reader.settle(now_ms);
        if let Some(viewport) = self.resize_reader.settled(now_ms) {
            self.handle_resize(viewport)?;
        }
        if self.scroll_reader.is_fast() {
            return Ok(());
        }
        if was_fast {
            // settled: re-render at full quality
            self.render_queued = true;
        }
        if std::mem::take(&mut self.pending_forward) {
            self.grow_now(Direction::Forward)?;
        }
        if std::mem::take(&mut self.pending_backward) {
            self.grow_now(Direction::Backward)?;
        }
        if std::mem::take(&mut self.render_queued) {
            self.render_pass(None, false)?;
        }
        Ok(())
    }

    /// Requests one page of growth below the viewport. Returns `Ok(false)`
    /// when the forward section is already exhausted (nothing to do).
    pub fn next(&mut self) -> Result<bool> {
        self.request_growth(Direction::Forward)
    }

    /// Requests one page of growth above the viewport. Returns `Ok(false)`
    /// when the backward section is already exhausted (nothing to do).
    pub fn previous(&mut self) -> Result<bool> {
        self.request_growth(Direction::Backward)
    }

    /// Folds a later-discovered size correction for a shown item into the
    /// memory-budget accounting.
    pub fn size_change(&mut self, id: &ItemId, bytes_added: f64) -> Result<()> {
        self.ensure_live()?;
        *self.measured.entry(id.clone()).or_insert(0.0) += bytes_added;
        self.measured_total += bytes_added;
        self.validate_budget();
        Ok(())
    }

    /// Applies `f` to every currently shown item, without re-tiling.
    pub fn update_items(&mut self, mut f: impl FnMut(&ItemId)) -> Result<()> {
        self.ensure_live()?;
        if !self.attached {
            return Err(Error::NotAttached);
        }
        self.section_ref(Direction::Backward)?.update_items(&mut f);
        self.section_ref(Direction::Forward)?.update_items(&mut f);
        Ok(())
    }

    /// Marks `id` as the focused identity without moving the viewport.
    pub fn focus(&mut self, id: impl Into<ItemId>) -> Result<()> {
        self.ensure_live()?;
        self.focused = Some(id.into());
        Ok(())
    }

    /// Navigates to `id`: focuses it, anchors the viewport at its row, and
    /// reports the row change.
    pub fn scroll_to(&mut self, id: &ItemId) -> Result<()> {
        self.ensure_live()?;
        if !self.attached {
            return Err(Error::NotAttached);
        }
        self.focused = Some(id.clone());
        self.render_pass(Some(id), true)
    }

    /// A cursor for programmatic next/previous item navigation.
    pub fn iter(&mut self) -> ItemIter<'_, K> {
        ItemIter::new(self)
    }

    /// Aborts pending work, detaches every shown item (hide then detach,
    /// once each), and drops both sections. Every later call on this engine
    /// returns [`Error::Destroyed`].
    pub fn destroy(&mut self) -> Result<()> {
        self.ensure_live()?;
        self.destroyed = true;
        self.attached = false;
        self.pending_forward = false;
        self.pending_backward = false;
        self.render_queued = false;
        let hide = Arc::clone(&self.options.hide_item);
        let detach = Arc::clone(&self.options.detach_item);
        if let Some(mut section) = self.backward.take() {
            section.dispose(&|id| hide(id), &|id| detach(id));
        }
        if let Some(mut section) = self.forward.take() {
            section.dispose(&|id| hide(id), &|id| detach(id));
        }
        self.item_keys.clear();
        mdebug!("destroyed");
        Ok(())
    }

    fn ensure_live(&self) -> Result<()> {
        if self.destroyed {
            Err(Error::Destroyed)
        } else {
            Ok(())
        }
    }

    fn row_width(&self) -> f64 {
        (self.viewport.width - self.options.scrollbar_width).max(0.0)
    }

    fn clamp_scroll(&self, offset: f64) -> f64 {
        let max = (self.total_height() - self.viewport.height).max(0.0);
        offset.clamp(0.0, max)
    }

    fn emit(&self, event: Event<K>) {
        if let Some(on_event) = &self.options.on_event {
            on_event(&event);
        }
    }

    fn section_ref(&self, direction: Direction) -> Result<&Section<K>> {
        let section = match direction {
            Direction::Backward => self.backward.as_ref(),
            Direction::Forward => self.forward.as_ref(),
        };
        section.ok_or(Error::NotAttached)
    }

    fn request_growth(&mut self, direction: Direction) -> Result<bool> {
        self.ensure_live()?;
        if !self.attached {
            return Err(Error::NotAttached);
        }
        if !self.section_ref(direction)?.can_grow() {
            return Ok(false);
        }
        // Coalesce: at most one queued growth per direction.
        match direction {
            Direction::Forward => self.pending_forward = true,
            Direction::Backward => self.pending_backward = true,
        }
        Ok(true)
    }

    /// Grows a section until it covers the viewport height or exhausts.
    fn fill(&mut self, direction: Direction) -> Result<()> {
        loop {
            let section = self.section_ref(direction)?;
            if section.height() > self.viewport.height || !section.can_grow() {
                return Ok(());
            }
            self.grow_now(direction)?;
        }
    }

    /// Performs one growth step immediately: fetch, tile, split if the row
    /// limit was crossed, and keep the viewport anchored through pivot
    /// movement.
    fn grow_now(&mut self, direction: Direction) -> Result<()> {
        let threshold = self.threshold;
        let pivot_before = self.pivot();
        {
            let fetch = Arc::clone(&self.options.get_page);
            let keys = &mut self.item_keys;
            let section = match direction {
                Direction::Backward => self.backward.as_mut(),
                Direction::Forward => self.forward.as_mut(),
            }
            .ok_or(Error::NotAttached)?;
            section.next(threshold, &|key| fetch(key), &mut |id, key| {
                keys.insert(id.clone(), key.clone());
            })?;
        }
        self.after_growth(direction, pivot_before)?;
        self.render_queued = true;
        Ok(())
    }

    /// Post-growth bookkeeping shared by render-driven and iterator-driven
    /// growth: scroll anchoring against pivot movement, then a split when
    /// the row limit was crossed.
    pub(crate) fn after_growth(&mut self, direction: Direction, pivot_before: f64) -> Result<()> {
        if direction == Direction::Backward {
            let pivot_now = self.pivot();
            if pivot_now != pivot_before {
                self.scroll_offset = (self.scroll_offset + pivot_now - pivot_before).max(0.0);
            }
        }
        if self.section_ref(direction)?.should_split() {
            self.perform_split(direction)?;
        }
        Ok(())
    }

    /// Re-points the section pair after a split: the grown section is
    /// reversed into the opposite role, the spawned sibling continues its
    /// growth, and the far section is discarded (its pages stay reachable
    /// through the reversed section's growth edge).
    fn perform_split(&mut self, direction: Direction) -> Result<()> {
        let hide = Arc::clone(&self.options.hide_item);
        let detach = Arc::clone(&self.options.detach_item);
        let pivot_before = self.pivot();

        let discarded = match direction {
            Direction::Forward => {
                let mut reversed = self.forward.take().ok_or(Error::NotAttached)?;
                let sibling = reversed.split();
                let discarded = self.backward.replace(reversed);
                self.forward = Some(sibling);
                let kept = self.section_ref(Direction::Backward)?.height();
                self.scroll_offset += self.pivot() - kept - pivot_before;
                discarded
            }
            Direction::Backward => {
                let mut reversed = self.backward.take().ok_or(Error::NotAttached)?;
                let sibling = reversed.split();
                let discarded = self.forward.replace(reversed);
                self.backward = Some(sibling);
                let kept = self.section_ref(Direction::Forward)?.height();
                self.scroll_offset += self.pivot() + kept - pivot_before;
                discarded
            }
        };
        self.scroll_offset = self.scroll_offset.max(0.0);

        if let Some(mut old) = discarded {
            for id in old.member_ids() {
                self.item_keys.remove(id);
            }
            old.dispose(&|id| hide(id), &|id| detach(id));
        }
        mdebug!(direction = ?direction, "sections re-pointed after split");
        Ok(())
    }

    /// One full render pass: both sections rendered against the same scroll
    /// snapshot, row-change reporting, growth requests, budget check.
    ///
    /// `at` anchors the pass at an item identity (navigation); `report`
    /// controls whether an anchor crossing emits [`Event::RowChange`].
    fn render_pass(&mut self, at: Option<&ItemId>, report: bool) -> Result<()> {
        self.ensure_live()?;
        if !self.attached {
            return Err(Error::NotAttached);
        }
        let pivot = self.pivot();

        if let Some(id) = at {
            let target = {
                let forward = self.section_ref(Direction::Forward)?;
                let backward = self.section_ref(Direction::Backward)?;
                if let Some((from, _)) = forward.row_span_of(id) {
                    Some(pivot + from)
                } else if let Some((from, height)) = backward.row_span_of(id) {
                    Some(pivot - from - height)
                } else {
                    None
                }
            };
            match target {
                Some(target) => self.scroll_offset = self.clamp_scroll(target),
                None => mwarn!(id = %id, "navigation target is not materialized"),
            }
        }

        let scroll = self.scroll_offset;
        let viewport = self.viewport;
        let margin = self.options.offset;
        let fast = self.scroll_reader.is_fast();

        let show = Arc::clone(&self.options.show_item);
        let hide = Arc::clone(&self.options.hide_item);
        let show_fn = |request: &ShowItemRequest| show(request);
        let hide_fn = |id: &ItemId| hide(id);

        let measured = &mut self.measured;
        let order = &mut self.measured_order;
        let total = &mut self.measured_total;
        let mut measure = |id: &ItemId, aspect: f64, bytes: Option<f64>| {
            if measured.contains_key(id) {
                return;
            }
            order.push((id.clone(), aspect));
            let bytes = bytes.unwrap_or(0.0);
            measured.insert(id.clone(), bytes);
            *total += bytes;
        };

        let backward = self.backward.as_mut().ok_or(Error::NotAttached)?;
        let forward = self.forward.as_mut().ok_or(Error::NotAttached)?;

        let mut hooks = ShowHooks {
            show_item: &show_fn,
            hide_item: &hide_fn,
            measure: &mut measure,
        };

        // Both sections see the same snapshot, so there is no seam at the
        // pivot.
        let backward_out = backward.render(
            (pivot - scroll).max(0.0),
            pivot - (scroll + viewport.height) - margin,
            pivot - scroll + margin,
            &|from, height| pivot - from - height,
            fast,
            &mut hooks,
        );
        let forward_out = forward.render(
            (scroll - pivot).max(0.0),
            scroll - margin - pivot,
            scroll + viewport.height + margin - pivot,
            &|from, _| pivot + from,
            fast,
            &mut hooks,
        );

        if report || at.is_some() {
            let backward_match = backward_out.matched.and_then(|m| {
                backward
                    .row_first_id(m.index)
                    .cloned()
                    .map(|id| (id, m.delta))
            });
            let forward_match = forward_out.matched.and_then(|m| {
                forward
                    .row_first_id(m.index)
                    .cloned()
                    .map(|id| (id, m.delta))
            });
            let best = match (backward_match, forward_match) {
                (Some(b), Some(f)) => Some(if f.1.abs() <= b.1.abs() { f } else { b }),
                (b, f) => b.or(f),
            };
            if let Some((id, delta)) = best {
                if self.anchor.as_ref() != Some(&id) {
                    self.anchor = Some(id.clone());
                    let key = self.item_keys.get(&id).cloned();
                    self.emit(Event::RowChange { item: id, key, delta });
                }
            }
        }

        if forward_out.more {
            self.pending_forward = true;
        }
        if backward_out.more {
            self.pending_backward = true;
        }

        self.validate_budget();
        Ok(())
    }

    /// Applies settled viewport geometry: revalidates the threshold,
    /// re-tiles both sections when the width changed, and keeps the view
    /// anchored through the pivot movement.
    fn handle_resize(&mut self, viewport: Viewport) -> Result<()> {
        if viewport == self.viewport {
            return Ok(());
        }
        let threshold = (self.options.row_threshold)(viewport.width);
        if threshold < 1.0 {
            return Err(Error::Threshold(threshold));
        }
        let relayout =
            viewport.width != self.viewport.width || threshold != self.threshold;
        mdebug!(
            width = viewport.width,
            height = viewport.height,
            threshold,
            relayout,
            "resize settled"
        );
        self.viewport = viewport;
        self.threshold = threshold;

        if relayout {
            let row_width = self.row_width();
            let hide = Arc::clone(&self.options.hide_item);
            let detach = Arc::clone(&self.options.detach_item);
            let pivot_before = self.pivot();
            for direction in [Direction::Backward, Direction::Forward] {
                let section = match direction {
                    Direction::Backward => self.backward.as_mut(),
                    Direction::Forward => self.forward.as_mut(),
                }
                .ok_or(Error::NotAttached)?;
                section.relayout(row_width, threshold, &|id| hide(id), &|id| detach(id))?;
            }
            let pivot_after = self.pivot();
            self.scroll_offset =
                self.clamp_scroll(self.scroll_offset + pivot_after - pivot_before);
        }
        self.render_queued = true;
        Ok(())
    }

    /// Checks the accumulated measurements against the byte budget and, at
    /// most once per lifetime, proposes a coarser threshold through
    /// [`Event::ThresholdRejected`].
    ///
    /// Candidates descend in half-unit steps from the current threshold; the
    /// first whose re-tiled layout (over the items shown so far) has an
    /// aggregate aspect ratio below a quarter of the viewport's wins. The
    /// engine keeps its current layout — reconfiguring is the host's call.
    fn validate_budget(&mut self) {
        if self.rejected {
            return;
        }
        let max = self.options.max_items_size_bytes;
        if !max.is_finite() || max <= 0.0 {
            return;
        }
        if self.measured_total < max / 2.0 {
            return;
        }
        if self.threshold <= MIN_THRESHOLD {
            return;
        }

        // Re-tile the prefix of shown items up to the budget crossing.
        let mut ratios = Vec::new();
        let mut bytes = 0.0;
        for (id, aspect) in &self.measured_order {
            ratios.push(*aspect);
            bytes += self.measured.get(id).copied().unwrap_or(0.0);
            if bytes > max / 2.0 {
                break;
            }
        }
        if ratios.is_empty() {
            return;
        }

        let viewport_ar = self.viewport.aspect_ratio();
        let mut proposed = MIN_THRESHOLD;
        let mut candidate = self.threshold - 0.5;
        while candidate > MIN_THRESHOLD {
            if let Ok(breaks) = tile(&ratios, candidate, true) {
                if aggregate_aspect_ratio(&ratios, &breaks) < viewport_ar / 4.0 {
                    proposed = candidate;
                    break;
                }
            }
            candidate -= 0.5;
        }

        self.rejected = true;
        mdebug!(
            proposed,
            total = self.measured_total,
            "memory budget exceeded; proposing coarser threshold"
        );
        self.emit(Event::ThresholdRejected { proposed });
    }

    /// Resolves the identity `|from|` steps away from the focus, crossing
    /// the pivot and fetching pages as needed. Commits focus and renders
    /// unless `soft`.
    pub(crate) fn advance_focus(&mut self, from: i64, soft: bool) -> Result<Option<ItemId>> {
        self.ensure_live()?;
        if !self.attached {
            return Err(Error::NotAttached);
        }
        let step_forward = from >= 0;
        let mut steps = from.unsigned_abs();

        let mut current = match self.focused.clone() {
            Some(id) => id,
            None => {
                let Some(first) = self.section_first(Direction::Forward)? else {
                    return Ok(None);
                };
                if step_forward {
                    steps = steps.saturating_sub(1);
                }
                first
            }
        };

        for _ in 0..steps {
            let side = if self.section_ref(Direction::Forward)?.contains(&current) {
                Direction::Forward
            } else if self.section_ref(Direction::Backward)?.contains(&current) {
                Direction::Backward
            } else {
                mwarn!(id = %current, "focus left the materialized window");
                return Ok(None);
            };
            match self.section_step(side, &current, step_forward)? {
                IterStep::Found(id) => current = id,
                IterStep::Exhausted => return Ok(None),
                IterStep::CrossSection => {
                    match self.section_first(side.opposite())? {
                        Some(id) => current = id,
                        None => return Ok(None),
                    }
                }
            }
        }

        if !soft {
            self.focused = Some(current.clone());
            self.render_pass(Some(&current), true)?;
        }
        Ok(Some(current))
    }

    fn section_step(
        &mut self,
        direction: Direction,
        id: &ItemId,
        step_forward: bool,
    ) -> Result<IterStep> {
        let threshold = self.threshold;
        let pivot_before = self.pivot();
        let step = {
            let fetch = Arc::clone(&self.options.get_page);
            let keys = &mut self.item_keys;
            let section = match direction {
                Direction::Backward => self.backward.as_mut(),
                Direction::Forward => self.forward.as_mut(),
            }
            .ok_or(Error::NotAttached)?;
            section.step(id, step_forward, threshold, &|key| fetch(key), &mut |id, key| {
                keys.insert(id.clone(), key.clone());
            })?
        };
        self.after_growth(direction, pivot_before)?;
        Ok(step)
    }

    fn section_first(&mut self, direction: Direction) -> Result<Option<ItemId>> {
        let threshold = self.threshold;
        let pivot_before = self.pivot();
        let first = {
            let fetch = Arc::clone(&self.options.get_page);
            let keys = &mut self.item_keys;
            let section = match direction {
                Direction::Backward => self.backward.as_mut(),
                Direction::Forward => self.forward.as_mut(),
            }
            .ok_or(Error::NotAttached)?;
            section.first(threshold, &|key| fetch(key), &mut |id, key| {
                keys.insert(id.clone(), key.clone());
            })?
        };
        self.after_growth(direction, pivot_before)?;
        Ok(first)
    }

    /// Whether more content can still be paginated in `direction`.
    pub fn can_grow(&self, direction: Direction) -> bool {
        self.section_ref(direction)
            .map(Section::can_grow)
            .unwrap_or(false)
    }
}

/// Width-to-height ratio of a tiled layout: rows stack along the scroll
/// axis, so the aggregate is the harmonic combination of per-row ratio sums.
fn aggregate_aspect_ratio(ratios: &[f64], breaks: &[usize]) -> f64 {
    let mut inverse = 0.0;
    let mut at = 0usize;
    for &b in breaks {
        let sum: f64 = ratios[at..b].iter().sum();
        if sum > 0.0 {
            inverse += 1.0 / sum;
        }
        at = b;
    }
    if inverse > 0.0 { 1.0 / inverse } else { 0.0 }
}

impl<K> Drop for Mosaic<K> {
    fn drop(&mut self) {
        // Hosts destroy explicitly; dropping a live engine only logs.
        if !self.destroyed && self.attached {
            mwarn!("dropped without destroy; host hooks were not detached");
        }
    }
}
