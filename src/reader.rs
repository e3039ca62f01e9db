//! Event classifiers that turn raw, high-frequency viewport signals into
//! coarse state used to gate expensive work.

use crate::types::Viewport;

/// Viewport-heights per second above which a fling counts as fast.
const FAST_VELOCITY_FACTOR: f64 = 2.0;

/// Classifies scroll events into a coarse "fast fling" state.
///
/// Driven by the host: `observe` on every scroll event, `settle` on every
/// tick. While fast, layout commits wait and items may render as
/// placeholders.
#[derive(Clone, Debug)]
pub struct ScrollReader {
    last: Option<(f64, u64)>,
    last_event_ms: Option<u64>,
    fast: bool,
    reset_delay_ms: u64,
}

impl ScrollReader {
    pub fn new(reset_delay_ms: u64) -> Self {
        Self {
            last: None,
            last_event_ms: None,
            fast: false,
            reset_delay_ms,
        }
    }

    pub fn observe(&mut self, offset: f64, viewport_height: f64, now_ms: u64) {
        if let Some((prev_offset, prev_ms)) = self.last {
            if now_ms > prev_ms && viewport_height > 0.0 {
                let speed = (offset - prev_offset).abs() * 1000.0 / (now_ms - prev_ms) as f64;
                self.fast = speed > FAST_VELOCITY_FACTOR * viewport_height;
            }
        }
        self.last = Some((offset, now_ms));
        self.last_event_ms = Some(now_ms);
    }

    /// Clears the fast state once no scroll event arrived for the reset
    /// delay.
    pub fn settle(&mut self, now_ms: u64) {
        if !self.fast {
            return;
        }
        let Some(last) = self.last_event_ms else {
            return;
        };
        if now_ms.saturating_sub(last) >= self.reset_delay_ms {
            self.fast = false;
        }
    }

    pub fn is_fast(&self) -> bool {
        self.fast
    }
}

/// Debounces resize events; geometry is applied once the viewport settles.
#[derive(Clone, Debug)]
pub struct ResizeReader {
    pending: Option<Viewport>,
    last_event_ms: u64,
    settle_delay_ms: u64,
}

impl ResizeReader {
    pub fn new(settle_delay_ms: u64) -> Self {
        Self {
            pending: None,
            last_event_ms: 0,
            settle_delay_ms,
        }
    }

    pub fn observe(&mut self, viewport: Viewport, now_ms: u64) {
        self.pending = Some(viewport);
        self.last_event_ms = now_ms;
    }

    /// Returns the settled geometry once no resize arrived for the delay.
    pub fn settled(&mut self, now_ms: u64) -> Option<Viewport> {
        let viewport = self.pending?;
        if now_ms.saturating_sub(self.last_event_ms) >= self.settle_delay_ms {
            self.pending = None;
            Some(viewport)
        } else {
            None
        }
    }

    pub fn is_settling(&self) -> bool {
        self.pending.is_some()
    }
}
