//! A single laid-out row of items.

use crate::types::{ItemId, PageItem, ShowItemRequest};

/// Geometry of one item inside its row.
#[derive(Clone, Debug)]
pub(crate) struct RowItem {
    pub id: ItemId,
    pub aspect_ratio: f64,
    /// Horizontal offset inside the row, spacing included.
    pub left: f64,
    pub width: f64,
}

/// A contiguous run of items sharing one height, positioned along the scroll
/// axis at `from` (outward-local to the owning section).
#[derive(Clone, Debug)]
pub(crate) struct Row {
    items: Vec<RowItem>,
    from: f64,
    height: f64,
    dangling: bool,
    attached: bool,
    ever_attached: bool,
}

impl Row {
    /// Lays out `items` into `row_width`, spacing included.
    ///
    /// A `dangling` row whose combined aspect ratio falls short of the
    /// threshold is sized as if its items repeated often enough to reach it,
    /// so a sparse trailing row never stretches wider than a threshold-exact
    /// row would allow.
    pub fn new(
        items: Vec<PageItem>,
        from: f64,
        row_width: f64,
        spacing: f64,
        threshold: f64,
        dangling: bool,
    ) -> Self {
        debug_assert!(!items.is_empty(), "a row holds at least one item");
        let sum: f64 = items.iter().map(|i| i.aspect_ratio).sum();
        let count = items.len();

        let (effective_sum, effective_count) = if dangling && sum < threshold {
            let repeats = (threshold / sum).ceil().max(1.0);
            (sum * repeats, count * repeats as usize)
        } else {
            (sum, count)
        };

        let gaps = spacing * effective_count.saturating_sub(1) as f64;
        let height = if effective_sum > 0.0 {
            ((row_width - gaps) / effective_sum).max(0.0)
        } else {
            0.0
        };

        let mut laid = Vec::with_capacity(count);
        let mut left = 0.0;
        for item in items {
            debug_assert!(item.aspect_ratio > 0.0, "aspect ratio must be positive");
            let width = height * item.aspect_ratio;
            laid.push(RowItem {
                id: item.id,
                aspect_ratio: item.aspect_ratio,
                left,
                width,
            });
            left += width + spacing;
        }

        Self {
            items: laid,
            from,
            height,
            dangling,
            attached: false,
            ever_attached: false,
        }
    }

    pub fn from(&self) -> f64 {
        self.from
    }

    pub fn set_from(&mut self, from: f64) {
        self.from = from;
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn is_dangling(&self) -> bool {
        self.dangling
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn items(&self) -> &[RowItem] {
        &self.items
    }

    pub fn has(&self, id: &ItemId) -> bool {
        self.items.iter().any(|item| &item.id == id)
    }

    pub fn first_id(&self) -> Option<&ItemId> {
        self.items.first().map(|item| &item.id)
    }

    pub fn last_id(&self) -> Option<&ItemId> {
        self.items.last().map(|item| &item.id)
    }

    /// Shows every item at the row's absolute `top`, reporting one size
    /// measurement per item through `measure`.
    ///
    /// Always delegates to the host so positions stay current; attachment is
    /// only recorded once.
    pub fn show(
        &mut self,
        top: f64,
        fast: bool,
        show_item: &dyn Fn(&ShowItemRequest) -> Option<f64>,
        measure: &mut dyn FnMut(&ItemId, f64, Option<f64>),
    ) {
        self.attached = true;
        self.ever_attached = true;
        for item in &self.items {
            let bytes = show_item(&ShowItemRequest {
                id: item.id.clone(),
                left: item.left,
                top,
                width: item.width,
                height: self.height,
                fast,
            });
            measure(&item.id, item.aspect_ratio, bytes);
        }
    }

    pub fn hide(&mut self, hide_item: &dyn Fn(&ItemId)) {
        if !self.attached {
            return;
        }
        self.attached = false;
        for item in &self.items {
            hide_item(&item.id);
        }
    }

    /// Tears the row down. Hide and detach hooks fire once each per shown
    /// item; a row that never attached stays silent.
    pub fn dispose(&mut self, hide_item: &dyn Fn(&ItemId), detach_item: &dyn Fn(&ItemId)) {
        self.hide(hide_item);
        if !self.ever_attached {
            return;
        }
        self.ever_attached = false;
        for item in &self.items {
            detach_item(&item.id);
        }
    }

    pub fn update_items(&self, f: &mut dyn FnMut(&ItemId)) {
        for item in &self.items {
            f(&item.id);
        }
    }
}
