//! Index arithmetic over the segmented logical sequence.
//!
//! The cache itself is item-granular; segments only decide how missing items are grouped into
//! requests and in which order cached items are searched.

use alloc::vec::Vec;

use crate::Window;

/// Returns the contiguous runs of indexes in `window` for which `is_loaded` is false.
pub(crate) fn missing_runs(window: Window, mut is_loaded: impl FnMut(usize) -> bool) -> Vec<Window> {
    let mut runs = Vec::new();
    let mut start: Option<usize> = None;
    for i in window.range() {
        match (is_loaded(i), start) {
            (false, None) => start = Some(i),
            (true, Some(s)) => {
                runs.push(Window::new(s, i - s));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push(Window::new(s, window.end() - s));
    }
    runs
}

/// Widens `run` to segment boundaries, clamped to `total` when it is known.
pub(crate) fn align(run: Window, segment_size: usize, total: Option<usize>) -> Window {
    let size = segment_size.max(1);
    let begin = run.offset / size * size;
    let end = run.end().div_ceil(size) * size;
    let aligned = Window::new(begin, end - begin);
    match total {
        Some(total) => aligned.clamp(total),
        None => aligned,
    }
}

/// Returns the parts of `window` not covered by any of `covered`, in order.
pub(crate) fn subtract(window: Window, covered: &[Window]) -> Vec<Window> {
    let mut holes: Vec<Window> = covered
        .iter()
        .copied()
        .filter(|c| !c.is_empty() && c.offset < window.end() && window.offset < c.end())
        .collect();
    holes.sort_by_key(|c| c.offset);
    let mut out = Vec::new();
    let mut cursor = window.offset;
    for hole in holes {
        if hole.offset > cursor {
            out.push(Window::new(cursor, hole.offset - cursor));
        }
        cursor = cursor.max(hole.end());
    }
    if cursor < window.end() {
        out.push(Window::new(cursor, window.end() - cursor));
    }
    out
}

/// Merges sorted windows that overlap or touch.
pub(crate) fn coalesce(mut windows: Vec<Window>) -> Vec<Window> {
    windows.retain(|w| !w.is_empty());
    windows.sort_by_key(|w| w.offset);
    let mut out: Vec<Window> = Vec::with_capacity(windows.len());
    for w in windows {
        match out.last_mut() {
            Some(last) if w.offset <= last.end() => {
                let end = last.end().max(w.end());
                last.limit = end - last.offset;
            }
            _ => out.push(w),
        }
    }
    out
}

/// Segment indexes in search order: first the segments overlapping `priority`, then alternating
/// outward (one below, one above) until both ends are exhausted.
pub(crate) fn search_order(priority: Window, segment_size: usize, total: usize) -> Vec<usize> {
    let size = segment_size.max(1);
    let segment_count = total.div_ceil(size);
    let priority = priority.clamp(total);
    let lower_bound = (priority.offset / size).min(segment_count);
    let upper_bound = priority.end().div_ceil(size).clamp(lower_bound, segment_count);

    let mut order: Vec<usize> = (lower_bound..upper_bound).collect();
    let mut lower = lower_bound;
    let mut upper = upper_bound;
    while lower > 0 || upper < segment_count {
        if lower > 0 {
            lower -= 1;
            order.push(lower);
        }
        if upper < segment_count {
            order.push(upper);
            upper += 1;
        }
    }
    order
}

/// Item range covered by segment `index`.
pub(crate) fn segment_window(index: usize, segment_size: usize, total: usize) -> Window {
    let size = segment_size.max(1);
    Window::new(index * size, size).clamp(total)
}
