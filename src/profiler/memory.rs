//! Peak memory accounting
//!
//! [`TrackingAllocator`] wraps the system allocator and counts live bytes per
//! thread. A binary (or test crate) opts in by installing it:
//!
//! ```rust,ignore
//! use complexity_validator::profiler::TrackingAllocator;
//!
//! #[global_allocator]
//! static ALLOC: TrackingAllocator = TrackingAllocator;
//! ```
//!
//! Accounting is thread-local so operations profiled on parallel workers
//! do not see each other's allocations. Memory freed on a different thread
//! than it was allocated on is not credited back to the allocating thread.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;
use std::sync::atomic::{AtomicBool, Ordering};

static ACTIVE: AtomicBool = AtomicBool::new(false);

thread_local! {
    static LIVE: Cell<usize> = const { Cell::new(0) };
    static PEAK: Cell<usize> = const { Cell::new(0) };
}

/// Global allocator that records per-thread live and peak bytes.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrackingAllocator;

fn record_alloc(size: usize) {
    // try_with: TLS may already be torn down while a thread exits
    let _ = LIVE.try_with(|live| {
        let now = live.get().saturating_add(size);
        live.set(now);
        let _ = PEAK.try_with(|peak| {
            if now > peak.get() {
                peak.set(now);
            }
        });
    });
}

/// Set the flag once; later allocations only read it, so the hot path
/// doesn't keep writing a shared cache line.
fn mark_active(flag: &AtomicBool) {
    if !flag.load(Ordering::Relaxed) {
        flag.store(true, Ordering::Relaxed);
    }
}

fn record_dealloc(size: usize) {
    let _ = LIVE.try_with(|live| live.set(live.get().saturating_sub(size)));
}

// SAFETY: every call is forwarded unchanged to `System`; the bookkeeping
// touches only const-initialized thread locals and never allocates.
unsafe impl GlobalAlloc for TrackingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        mark_active(&ACTIVE);
        let ptr = System.alloc(layout);
        if !ptr.is_null() {
            record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        mark_active(&ACTIVE);
        let ptr = System.alloc_zeroed(layout);
        if !ptr.is_null() {
            record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout);
        record_dealloc(layout.size());
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = System.realloc(ptr, layout, new_size);
        if !new_ptr.is_null() {
            // Old and new blocks may briefly coexist during the copy.
            record_alloc(new_size);
            record_dealloc(layout.size());
        }
        new_ptr
    }
}

/// Check whether [`TrackingAllocator`] is the process's global allocator.
///
/// Without it every peak reads as zero, so memory fits would be meaningless.
#[must_use]
pub fn is_active() -> bool {
    ACTIVE.load(Ordering::Relaxed)
}

/// Bytes currently live on this thread.
#[must_use]
pub fn live_bytes() -> usize {
    LIVE.try_with(Cell::get).unwrap_or(0)
}

/// Peak auxiliary memory of a region of code on the current thread.
///
/// ```rust
/// use complexity_validator::profiler::PeakScope;
///
/// let scope = PeakScope::start();
/// let buffer = vec![0u8; 4096];
/// let peak = scope.finish();
/// drop(buffer);
/// // Zero unless the tracking allocator is installed.
/// assert!(peak == 0 || peak >= 4096);
/// ```
#[derive(Debug)]
pub struct PeakScope {
    baseline: usize,
}

impl PeakScope {
    /// Reset the thread's peak to its live bytes and start measuring.
    #[must_use]
    pub fn start() -> Self {
        let baseline = live_bytes();
        let _ = PEAK.try_with(|peak| peak.set(baseline));
        Self { baseline }
    }

    /// Bytes allocated above the starting level at the highest point.
    #[must_use]
    pub fn finish(self) -> u64 {
        let peak = PEAK.try_with(Cell::get).unwrap_or(self.baseline);
        peak.saturating_sub(self.baseline) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_alloc_tracks_peak() {
        let scope = PeakScope::start();
        record_alloc(100);
        record_alloc(50);
        record_dealloc(150);
        record_alloc(20);
        assert_eq!(scope.finish(), 150);
        record_dealloc(20);
    }

    #[test]
    fn test_dealloc_never_underflows() {
        let before = live_bytes();
        record_dealloc(usize::MAX);
        assert_eq!(live_bytes(), 0);
        record_alloc(before);
    }

    #[test]
    fn test_mark_active_sets_once_and_stays_set() {
        let flag = AtomicBool::new(false);
        mark_active(&flag);
        assert!(flag.load(Ordering::Relaxed));
        mark_active(&flag);
        assert!(flag.load(Ordering::Relaxed));
    }

    #[test]
    fn test_scope_without_allocations() {
        let scope = PeakScope::start();
        assert_eq!(scope.finish(), 0);
    }
}
