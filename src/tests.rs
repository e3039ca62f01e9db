use crate::*;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone, Copy, Debug)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        // Deterministic, dependency-free PRNG for tests.
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }

    fn gen_range_usize(&mut self, start: usize, end_exclusive: usize) -> usize {
        debug_assert!(start < end_exclusive);
        start + (self.next_u64() as usize) % (end_exclusive - start)
    }

    fn gen_f64(&mut self, start: f64, end: f64) -> f64 {
        let unit = (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64;
        start + unit * (end - start)
    }
}

#[derive(Default)]
struct HostState {
    /// Currently visible items, by id.
    shown: BTreeMap<String, ShowItemRequest>,
    show_calls: usize,
    hide_calls: BTreeMap<String, usize>,
    detach_calls: BTreeMap<String, usize>,
    events: Vec<Event<usize>>,
}

type SharedHost = Arc<Mutex<HostState>>;

fn pager(
    total: usize,
    page_size: usize,
    fetches: Arc<AtomicUsize>,
    fail: Arc<Mutex<Option<usize>>>,
) -> impl Fn(&usize) -> std::result::Result<Page<usize>, PageError> + Send + Sync + 'static {
    move |key: &usize| {
        fetches.fetch_add(1, Ordering::SeqCst);
        if Some(*key) == *fail.lock().unwrap() {
            return Err("synthetic fetch failure".into());
        }
        let start = key * page_size;
        let end = ((key + 1) * page_size).min(total);
        assert!(start < end, "page key {key} out of range");
        let items = (start..end)
            .map(|i| PageItem::new(format!("item-{i}"), 1.0))
            .collect();
        Ok(Page {
            items,
            next: (end < total).then(|| key + 1),
            previous: (*key > 0).then(|| key - 1),
        })
    }
}

struct Fixture {
    host: SharedHost,
    fetches: Arc<AtomicUsize>,
    fail: Arc<Mutex<Option<usize>>>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            host: Arc::new(Mutex::new(HostState::default())),
            fetches: Arc::new(AtomicUsize::new(0)),
            fail: Arc::new(Mutex::new(None)),
        }
    }

    /// Options for a data set of `total` uniform (ratio 1.0) items in pages
    /// of `page_size`, pivoted at page `key`. `bytes` is what `show_item`
    /// reports per item.
    fn options(
        &self,
        total: usize,
        page_size: usize,
        key: usize,
        bytes: Option<f64>,
    ) -> MosaicOptions<usize> {
        let get_page = pager(
            total,
            page_size,
            Arc::clone(&self.fetches),
            Arc::clone(&self.fail),
        );
        let show_host = Arc::clone(&self.host);
        let hide_host = Arc::clone(&self.host);
        let detach_host = Arc::clone(&self.host);
        let event_host = Arc::clone(&self.host);
        MosaicOptions::new(key, get_page, move |request: &ShowItemRequest| {
            let mut host = show_host.lock().unwrap();
            host.show_calls += 1;
            host.shown.insert(request.id.to_string(), request.clone());
            bytes
        })
        .with_hide_item(move |id: &ItemId| {
            let mut host = hide_host.lock().unwrap();
            host.shown.remove(id.as_str());
            *host.hide_calls.entry(id.to_string()).or_default() += 1;
        })
        .with_detach_item(move |id: &ItemId| {
            let mut host = detach_host.lock().unwrap();
            *host.detach_calls.entry(id.to_string()).or_default() += 1;
        })
        .with_on_event(Some(move |event: &Event<usize>| {
            event_host.lock().unwrap().events.push(event.clone());
        }))
    }

    fn shown_ids(&self) -> Vec<String> {
        self.host.lock().unwrap().shown.keys().cloned().collect()
    }

    fn loaded_events(&self) -> usize {
        self.host
            .lock()
            .unwrap()
            .events
            .iter()
            .filter(|event| matches!(event, Event::Loaded { .. }))
            .count()
    }

    fn rejections(&self) -> Vec<f64> {
        self.host
            .lock()
            .unwrap()
            .events
            .iter()
            .filter_map(|event| match event {
                Event::ThresholdRejected { proposed } => Some(*proposed),
                _ => None,
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// tiler

#[test]
fn tile_uniform_ratios_are_arithmetic() {
    assert_eq!(tile(&[1.0, 1.0, 1.0, 1.0], 1.0, true).unwrap(), [1, 2, 3, 4]);
    assert_eq!(tile(&[1.0, 1.0], 1.1, true).unwrap(), [2]);
}

#[test]
fn tile_general_case_minimizes_cubic_deviation() {
    assert_eq!(tile(&[1.0, 2.0, 3.0], 3.0, true).unwrap(), [2, 3]);
    assert_eq!(tile(&[5.0, 3.0, 2.0, 1.0], 3.0, true).unwrap(), [1, 2, 4]);
}

#[test]
fn tile_without_remainder_leaves_partial_tail_untiled() {
    // 5 uniform items, 2 per row: the 5th never reaches the threshold.
    assert_eq!(tile(&[1.0; 5], 2.0, false).unwrap(), [2, 4]);
    assert_eq!(tile(&[1.0; 5], 2.0, true).unwrap(), [2, 4, 5]);
    // Nothing reaches the threshold at all.
    assert_eq!(tile(&[1.0], 4.0, false).unwrap(), Vec::<usize>::new());
}

#[test]
fn tile_rejects_bad_input() {
    assert!(matches!(tile(&[], 2.0, true), Err(Error::NoItems)));
    assert!(matches!(
        tile(&[1.0], 0.5, true),
        Err(Error::Threshold(_))
    ));
}

#[test]
fn tile_always_covers_every_item_with_remainder() {
    let mut rng = Lcg::new(7);
    for _ in 0..200 {
        let len = rng.gen_range_usize(1, 40);
        let ratios: Vec<f64> = (0..len).map(|_| rng.gen_f64(0.3, 3.0)).collect();
        let threshold = rng.gen_f64(1.0, 4.0);
        let breaks = tile(&ratios, threshold, true).unwrap();
        assert_eq!(breaks.last().copied(), Some(len));
        let mut prev = 0usize;
        for &b in &breaks {
            assert!(b > prev, "breakpoints must be strictly increasing");
            prev = b;
        }
    }
}

// ---------------------------------------------------------------------------
// closest

#[test]
fn closest_matches_reference_deltas() {
    let top = |i: usize| i as f64 - 2.0;
    assert_eq!(
        closest(3, -2.5, top),
        Some(Closest {
            index: 0,
            delta: -0.5
        })
    );
    assert_eq!(
        closest(3, -1.5, top),
        Some(Closest {
            index: 1,
            delta: -0.5
        })
    );
    assert_eq!(
        closest(3, -0.5, top),
        Some(Closest {
            index: 2,
            delta: -0.5
        })
    );
}

#[test]
fn closest_handles_boundaries_and_empty_input() {
    let top = |i: usize| i as f64 * 10.0;
    assert_eq!(closest(0, 5.0, top), None);
    assert_eq!(closest(4, -100.0, top).unwrap().index, 0);
    assert_eq!(closest(4, 1000.0, top).unwrap().index, 3);
}

#[test]
fn closest_agrees_with_linear_scan() {
    let mut rng = Lcg::new(11);
    for _ in 0..200 {
        let len = rng.gen_range_usize(1, 50);
        let mut tops = Vec::with_capacity(len);
        let mut at = rng.gen_f64(-100.0, 0.0);
        for _ in 0..len {
            tops.push(at);
            at += rng.gen_f64(1.0, 30.0);
        }
        let target = rng.gen_f64(-150.0, at + 50.0);

        let mut expected = 0usize;
        for i in 0..len {
            // ties resolve to the later row
            if (target - tops[i]).abs() <= (target - tops[expected]).abs() {
                expected = i;
            }
        }
        let got = closest(len, target, |i| tops[i]).unwrap();
        assert_eq!(got.index, expected);
        assert!((got.delta - (target - tops[expected])).abs() < 1e-9);
    }
}

// ---------------------------------------------------------------------------
// rows

#[test]
fn dangling_rows_never_overstretch() {
    use crate::row::Row;

    let row = Row::new(
        vec![PageItem::new("a", 1.0)],
        0.0,
        1000.0,
        8.0,
        2.0,
        true,
    );
    assert!(row.is_dangling());
    assert!(!row.is_attached());
    assert!(row.has(&ItemId::new("a")));
    // Sized as if the item repeated twice: (1000 - 8) / 2 = 496.
    assert!((row.height() - 496.0).abs() < 1e-9);

    // The same item in a non-dangling row stretches to the full width.
    let full = Row::new(
        vec![PageItem::new("b", 1.0)],
        0.0,
        1000.0,
        8.0,
        2.0,
        false,
    );
    assert!((full.height() - 1000.0).abs() < 1e-9);
}

// ---------------------------------------------------------------------------
// end-to-end: attach and the steady-state render loop

#[test]
fn attach_fills_viewport_and_emits_one_load() {
    let fx = Fixture::new();
    let mut engine = Mosaic::new(fx.options(100, 20, 0, Some(1000.0)));
    engine.attach(Viewport::new(1000.0, 800.0)).unwrap();

    // One page (10 rows of 2) already exceeds the viewport height.
    assert_eq!(fx.fetches.load(Ordering::SeqCst), 1);
    assert_eq!(fx.loaded_events(), 1);

    // Row height (1000 - 8) / 2 = 496: rows at 0 and 504 intersect [0, 800].
    assert_eq!(
        fx.shown_ids(),
        ["item-0", "item-1", "item-2", "item-3"]
    );
    assert_eq!(engine.shown_rows(), 2);
    assert_eq!(engine.scroll_offset(), 0.0);

    // Top of feed: the backward section is exhausted immediately.
    assert_eq!(engine.previous().unwrap(), false);

    engine.destroy().unwrap();
}

#[test]
fn attach_twice_is_a_contract_violation() {
    let fx = Fixture::new();
    let mut engine = Mosaic::new(fx.options(10, 5, 0, None));
    engine.attach(Viewport::new(1000.0, 800.0)).unwrap();
    assert!(matches!(
        engine.attach(Viewport::new(1000.0, 800.0)),
        Err(Error::AlreadyAttached)
    ));
}

#[test]
fn attach_rejects_sub_unit_threshold() {
    let fx = Fixture::new();
    let options = fx.options(10, 5, 0, None).with_row_threshold(|_| 0.5);
    let mut engine = Mosaic::new(options);
    assert!(matches!(
        engine.attach(Viewport::new(1000.0, 800.0)),
        Err(Error::Threshold(_))
    ));
}

#[test]
fn scroll_moves_the_shown_window_and_reports_row_change() {
    let fx = Fixture::new();
    let mut engine = Mosaic::new(fx.options(100, 20, 0, None));
    engine.attach(Viewport::new(1000.0, 800.0)).unwrap();

    engine.apply_scroll(600.0, 1_000).unwrap();
    assert_eq!(fx.shown_ids(), ["item-2", "item-3", "item-4", "item-5"]);

    let events = fx.host.lock().unwrap().events.clone();
    let change = events
        .iter()
        .find_map(|event| match event {
            Event::RowChange { item, key, .. } => Some((item.clone(), *key)),
            _ => None,
        })
        .expect("scrolling across a row boundary reports a row change");
    assert_eq!(change.0.as_str(), "item-2");
    assert_eq!(change.1, Some(0));
}

#[test]
fn rerender_with_unchanged_anchor_is_idempotent() {
    let fx = Fixture::new();
    let mut engine = Mosaic::new(fx.options(100, 20, 0, None));
    engine.attach(Viewport::new(1000.0, 800.0)).unwrap();

    engine.apply_scroll(600.0, 1_000).unwrap();
    let shown = fx.shown_ids();
    let hides: usize = fx.host.lock().unwrap().hide_calls.values().sum();
    let shows = fx.host.lock().unwrap().show_calls;

    engine.apply_scroll(600.0, 2_000).unwrap();
    assert_eq!(fx.shown_ids(), shown);
    let hides_after: usize = fx.host.lock().unwrap().hide_calls.values().sum();
    assert_eq!(hides_after, hides, "no spurious show/hide churn");
    // Shown rows still re-delegate so the host can refresh positions.
    assert_eq!(fx.host.lock().unwrap().show_calls, shows + shown.len());
}

#[test]
fn reaching_the_materialized_edge_grows_forward_on_tick() {
    let fx = Fixture::new();
    let mut engine = Mosaic::new(fx.options(100, 20, 0, None));
    engine.attach(Viewport::new(1000.0, 800.0)).unwrap();
    let before = engine.total_height();

    // 10 rows cover 5032px; scrolling to the end (clamped) requests another
    // page.
    engine.apply_scroll(5_000.0, 100_000).unwrap();
    engine.tick(100_016).unwrap();

    assert_eq!(fx.fetches.load(Ordering::SeqCst), 2);
    assert!(engine.total_height() > before);
}

#[test]
fn concurrent_growth_requests_coalesce() {
    let fx = Fixture::new();
    let mut engine = Mosaic::new(fx.options(100, 20, 0, None));
    engine.attach(Viewport::new(1000.0, 800.0)).unwrap();
    let before = fx.fetches.load(Ordering::SeqCst);

    assert!(engine.next().unwrap());
    assert!(engine.next().unwrap());
    engine.tick(1_000).unwrap();

    assert_eq!(fx.fetches.load(Ordering::SeqCst), before + 1);
}

#[test]
fn fast_fling_defers_growth_until_settled() {
    let fx = Fixture::new();
    let mut engine = Mosaic::new(fx.options(100, 20, 0, None));
    engine.attach(Viewport::new(1000.0, 800.0)).unwrap();

    engine.apply_scroll(0.0, 1_000).unwrap();
    // 4000px in 16ms is far past two viewport-heights per second.
    engine.apply_scroll(4_000.0, 1_016).unwrap();
    assert!(fx.host.lock().unwrap().shown.values().any(|req| req.fast));

    engine.next().unwrap();
    let before = fx.fetches.load(Ordering::SeqCst);
    engine.tick(1_032).unwrap();
    assert_eq!(fx.fetches.load(Ordering::SeqCst), before, "still flinging");

    // The reset delay passes with no further scroll events.
    engine.tick(1_016 + 150).unwrap();
    assert_eq!(fx.fetches.load(Ordering::SeqCst), before + 1);
    assert!(fx.host.lock().unwrap().shown.values().all(|req| !req.fast));
}

// ---------------------------------------------------------------------------
// pivoted attach, anchoring, and the iterator

#[test]
fn mid_feed_attach_fills_both_directions_without_a_seam() {
    let fx = Fixture::new();
    let mut engine = Mosaic::new(fx.options(100, 20, 2, None));
    engine.attach(Viewport::new(1000.0, 800.0)).unwrap();

    // Forward holds page 2, backward page 1; the pivot sits between them.
    assert!(engine.pivot() > 0.0);
    assert_eq!(engine.scroll_offset(), engine.pivot());
    let shown = fx.shown_ids();
    assert!(shown.contains(&"item-40".to_string()));
    assert!(shown.contains(&"item-41".to_string()));

    // The item just above the pivot is one step back from the pivot item.
    engine.focus("item-40").unwrap();
    let previous = engine.iter().peek(-1).unwrap();
    assert_eq!(previous.unwrap().as_str(), "item-39");
    // Soft steps leave focus untouched.
    assert_eq!(engine.focused().unwrap().as_str(), "item-40");
}

#[test]
fn backward_growth_keeps_the_view_anchored() {
    let fx = Fixture::new();
    let mut engine = Mosaic::new(fx.options(100, 20, 2, None));
    engine.attach(Viewport::new(1000.0, 800.0)).unwrap();

    // Jump to the top of the materialized window (slowly).
    engine.apply_scroll(0.0, 1_000_000).unwrap();
    let (anchor_id, anchor_top) = {
        let host = fx.host.lock().unwrap();
        let (id, request) = host.shown.iter().next().expect("something is visible");
        (id.clone(), request.top)
    };
    let relative = anchor_top - engine.scroll_offset();

    // The tick pulls page 0 in above; the pivot and scroll offset both move.
    engine.tick(1_000_016).unwrap();
    assert_eq!(fx.fetches.load(Ordering::SeqCst), 3);
    assert!(engine.scroll_offset() > 0.0);

    let host = fx.host.lock().unwrap();
    let request = host.shown.get(&anchor_id).expect("anchor row is still shown");
    assert!(
        (request.top - engine.scroll_offset() - relative).abs() < 1e-6,
        "anchor stayed at the same viewport-relative position"
    );
}

#[test]
fn iterator_walks_forward_across_rows_and_pages() {
    let fx = Fixture::new();
    let mut engine = Mosaic::new(fx.options(50, 10, 0, None));
    engine.attach(Viewport::new(1000.0, 800.0)).unwrap();

    engine.focus("item-0").unwrap();
    for expected in 1..50usize {
        let id = engine.iter().next().unwrap().expect("more items ahead");
        assert_eq!(id.as_str(), format!("item-{expected}"));
    }
    assert_eq!(engine.iter().next().unwrap(), None, "end of the data set");
}

#[test]
fn committed_navigation_moves_focus_and_viewport() {
    let fx = Fixture::new();
    let mut engine = Mosaic::new(fx.options(100, 20, 0, None));
    engine.attach(Viewport::new(1000.0, 800.0)).unwrap();

    engine.focus("item-0").unwrap();
    let id = engine.iter().advance(10).unwrap().unwrap();
    assert_eq!(id.as_str(), "item-10");
    assert_eq!(engine.focused().unwrap().as_str(), "item-10");
    // item-10 opens row 5 at offset 5 * (496 + 8).
    assert!((engine.scroll_offset() - 2_520.0).abs() < 1e-6);
    assert!(fx.shown_ids().contains(&"item-10".to_string()));
}

#[test]
fn scroll_to_anchors_the_named_row() {
    let fx = Fixture::new();
    let mut engine = Mosaic::new(fx.options(100, 20, 0, None));
    engine.attach(Viewport::new(1000.0, 800.0)).unwrap();

    engine.scroll_to(&ItemId::new("item-6")).unwrap();
    assert!((engine.scroll_offset() - 1_512.0).abs() < 1e-6);
    let events = fx.host.lock().unwrap().events.clone();
    assert!(events.iter().any(|event| matches!(
        event,
        Event::RowChange { item, .. } if item.as_str() == "item-6"
    )));
}

// ---------------------------------------------------------------------------
// splits

#[test]
fn split_preserves_iteration_order() {
    let fx = Fixture::new();
    let mut engine = Mosaic::new(fx.options(100, 20, 0, None));
    engine.attach(Viewport::new(1000.0, 800.0)).unwrap();

    // Each page adds 10 rows; the 5th crosses the 40-row limit and splits.
    for i in 0..4 {
        assert!(engine.next().unwrap());
        engine.tick(1_000 + i).unwrap();
    }
    assert_eq!(fx.fetches.load(Ordering::SeqCst), 5);
    assert!(!engine.can_grow(Direction::Forward), "all pages consumed");

    engine.focus("item-0").unwrap();
    for expected in 1..100usize {
        let id = engine.iter().next().unwrap().expect("sequence survives the split");
        assert_eq!(id.as_str(), format!("item-{expected}"));
    }
    assert_eq!(engine.iter().next().unwrap(), None);
}

// ---------------------------------------------------------------------------
// failures, budget, teardown

#[test]
fn fetch_failure_propagates_and_the_page_can_be_retried() {
    let fx = Fixture::new();
    let mut engine = Mosaic::new(fx.options(100, 20, 0, None));
    engine.attach(Viewport::new(1000.0, 800.0)).unwrap();
    let height = engine.total_height();

    *fx.fail.lock().unwrap() = Some(1);
    assert!(engine.next().unwrap());
    assert!(matches!(engine.tick(1_000), Err(Error::Page(_))));
    assert_eq!(engine.total_height(), height);

    // The edge key was restored; the same page fetches cleanly now.
    *fx.fail.lock().unwrap() = None;
    assert!(engine.next().unwrap());
    engine.tick(2_000).unwrap();
    assert!(engine.total_height() > height);
}

#[test]
fn memory_pressure_rejects_the_threshold_once() {
    let fx = Fixture::new();
    // Four shown items at 1000 bytes each cross half of the 4000 budget.
    let options = fx
        .options(100, 20, 0, Some(1000.0))
        .with_max_items_size_bytes(4_000.0);
    let mut engine = Mosaic::new(options);
    engine.attach(Viewport::new(1000.0, 800.0)).unwrap();

    assert_eq!(fx.rejections(), [1.5]);

    // Re-running the budget path never fires a second rejection.
    engine.size_change(&ItemId::new("item-0"), 50_000.0).unwrap();
    engine.apply_scroll(600.0, 1_000).unwrap();
    assert_eq!(fx.rejections(), [1.5]);
}

#[test]
fn pending_measurements_arrive_through_size_change() {
    let fx = Fixture::new();
    let options = fx
        .options(100, 20, 0, None)
        .with_max_items_size_bytes(4_000.0);
    let mut engine = Mosaic::new(options);
    engine.attach(Viewport::new(1000.0, 800.0)).unwrap();
    assert_eq!(fx.rejections(), Vec::<f64>::new());

    engine.size_change(&ItemId::new("item-0"), 3_000.0).unwrap();
    assert_eq!(fx.rejections(), [1.5]);
}

#[test]
fn update_items_visits_exactly_the_shown_items() {
    let fx = Fixture::new();
    let mut engine = Mosaic::new(fx.options(100, 20, 0, None));
    engine.attach(Viewport::new(1000.0, 800.0)).unwrap();

    let mut visited = Vec::new();
    engine
        .update_items(|id| visited.push(id.to_string()))
        .unwrap();
    visited.sort();
    assert_eq!(visited, fx.shown_ids());
}

#[test]
fn destroy_detaches_everything_exactly_once() {
    let fx = Fixture::new();
    let mut engine = Mosaic::new(fx.options(100, 20, 0, None));
    engine.attach(Viewport::new(1000.0, 800.0)).unwrap();
    let shown = fx.shown_ids();
    assert!(!shown.is_empty());

    engine.destroy().unwrap();
    {
        let host = fx.host.lock().unwrap();
        assert!(host.shown.is_empty());
        for id in &shown {
            assert_eq!(host.hide_calls.get(id), Some(&1));
            assert_eq!(host.detach_calls.get(id), Some(&1));
        }
    }

    assert!(matches!(engine.tick(1_000), Err(Error::Destroyed)));
    assert!(matches!(engine.next(), Err(Error::Destroyed)));
    assert!(matches!(engine.destroy(), Err(Error::Destroyed)));
}

#[test]
fn empty_data_set_reaches_a_valid_steady_state_without_load() {
    let fx = Fixture::new();
    let get_page = |_key: &usize| {
        Ok(Page {
            items: Vec::new(),
            next: None,
            previous: None,
        })
    };
    let event_host = Arc::clone(&fx.host);
    let options = MosaicOptions::new(0usize, get_page, |_: &ShowItemRequest| None)
        .with_on_event(Some(move |event: &Event<usize>| {
            event_host.lock().unwrap().events.push(event.clone());
        }));
    let mut engine = Mosaic::new(options);
    engine.attach(Viewport::new(1000.0, 800.0)).unwrap();

    assert_eq!(fx.loaded_events(), 0);
    assert_eq!(engine.total_height(), 0.0);
    assert_eq!(engine.next().unwrap(), false);
    assert_eq!(engine.previous().unwrap(), false);
    engine.tick(1_000).unwrap();
}

// ---------------------------------------------------------------------------
// resize

#[test]
fn resize_settles_before_relayout() {
    let fx = Fixture::new();
    let mut engine = Mosaic::new(fx.options(100, 20, 0, None));
    engine.attach(Viewport::new(1000.0, 800.0)).unwrap();

    engine.apply_resize(Viewport::new(500.0, 800.0), 1_000).unwrap();
    engine.tick(1_050).unwrap();
    assert_eq!(engine.viewport().width, 1000.0, "still settling");

    engine.tick(1_200).unwrap();
    assert_eq!(engine.viewport().width, 500.0);
    // Rows re-tiled for the narrower width: (500 - 8) / 2 = 246 per row.
    let host = fx.host.lock().unwrap();
    let request = host.shown.values().next().expect("items shown after resize");
    assert!((request.height - 246.0).abs() < 1e-6);
}
