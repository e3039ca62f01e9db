// Example: a simulated host driving attach → scroll → grow from main().
use std::sync::Arc;
use std::sync::Mutex;

use mosaic::{Event, MosaicOptions, Page, PageItem, ShowItemRequest, Viewport};
use mosaic_adapter::Controller;

fn main() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);

    // 500 items of varying aspect ratio, paginated in chunks of 25.
    let total = 500usize;
    let page_size = 25usize;
    let get_page = move |key: &usize| {
        let start = key * page_size;
        let end = ((key + 1) * page_size).min(total);
        let items = (start..end)
            .map(|i| PageItem::new(format!("photo-{i}"), 0.5 + (i % 5) as f64 * 0.4))
            .collect();
        Ok(Page {
            items,
            next: (end < total).then(|| key + 1),
            previous: (*key > 0).then(|| key - 1),
        })
    };

    let options = MosaicOptions::new(0usize, get_page, |request: &ShowItemRequest| {
        println!(
            "show {:>10} at ({:7.1}, {:7.1}) {}x{}{}",
            request.id.to_string(),
            request.left,
            request.top,
            request.width.round(),
            request.height.round(),
            if request.fast { " (placeholder)" } else { "" },
        );
        Some(250_000.0)
    })
    .with_hide_item(|id| println!("hide {id}"))
    .with_row_threshold(|width| if width < 800.0 { 1.5 } else { 2.5 })
    .with_offset(100.0)
    .with_on_event(Some(move |event: &Event<usize>| {
        sink.lock().unwrap().push(format!("{event:?}"));
    }));

    let mut controller = Controller::new(options);
    controller.attach(Viewport::new(1200.0, 900.0)).unwrap();

    // Simulate a few seconds of steady scrolling, one tick per frame.
    let mut offset = 0.0;
    for frame in 0u64..240 {
        let now_ms = frame * 16;
        offset += 25.0;
        controller.on_scroll(offset, now_ms).unwrap();
        controller.tick(now_ms + 1).unwrap();
    }
    // Let the readers settle and flush any remaining deferred work.
    controller.tick(240 * 16 + 300).unwrap();

    let engine = controller.engine();
    println!("---");
    println!("materialized height: {:.0}px", engine.total_height());
    println!("shown rows: {}", engine.shown_rows());
    for event in events.lock().unwrap().iter() {
        println!("event: {event}");
    }

    controller.destroy().unwrap();
}
