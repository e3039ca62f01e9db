//! Nearest-row lookup over positioned rows.

/// A row index paired with its signed distance from the search target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Closest {
    pub index: usize,
    /// `target - top(index)`; negative when the row starts past the target.
    pub delta: f64,
}

/// Finds the row whose `top` is nearest `target`.
///
/// `top` must be monotonically increasing over `0..len`. A target outside the
/// covered range resolves to the boundary row; a tie between two equidistant
/// rows resolves to the later one. Returns `None` for an empty input.
pub fn closest<F: Fn(usize) -> f64>(len: usize, target: f64, top: F) -> Option<Closest> {
    if len == 0 {
        return None;
    }
    Some(search(0, len - 1, target, &top))
}

fn search<F: Fn(usize) -> f64>(lo: usize, hi: usize, target: f64, top: &F) -> Closest {
    if lo == hi {
        return Closest {
            index: lo,
            delta: target - top(lo),
        };
    }
    if hi - lo == 1 {
        let d_lo = target - top(lo);
        let d_hi = target - top(hi);
        return if d_lo.abs() < d_hi.abs() {
            Closest {
                index: lo,
                delta: d_lo,
            }
        } else {
            Closest {
                index: hi,
                delta: d_hi,
            }
        };
    }
    let mid = lo + (hi - lo) / 2;
    if top(mid) <= target {
        search(mid, hi, target, top)
    } else {
        search(lo, mid, target, top)
    }
}
