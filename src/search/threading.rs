//! Cross-thread control shared between the controller and one search run.
//!
//! The search thread only polls these flags; it never blocks on them. The
//! controller owns the other end of the `Arc` and flips them from the
//! command thread.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::time::Instant;

#[derive(Debug)]
pub struct SearchSignals {
    stop: AtomicBool,
    pondering: AtomicBool,
    ponder_hit: AtomicBool,
    finished: AtomicBool,
    ponder_hit_at: Mutex<Option<Instant>>,
}

impl SearchSignals {
    pub fn new(pondering: bool) -> Arc<Self> {
        Arc::new(Self {
            stop: AtomicBool::new(false),
            pondering: AtomicBool::new(pondering),
            ponder_hit: AtomicBool::new(false),
            finished: AtomicBool::new(false),
            ponder_hit_at: Mutex::new(None),
        })
    }

    #[inline]
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    #[inline]
    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_pondering(&self) -> bool {
        self.pondering.load(Ordering::Acquire)
    }

    /// Converts a pondering run into a normal one. Returns false if the run
    /// was not pondering (or a hit was already delivered).
    pub fn signal_ponder_hit(&self) -> bool {
        if !self.pondering.swap(false, Ordering::AcqRel) {
            return false;
        }
        if let Ok(mut guard) = self.ponder_hit_at.lock() {
            *guard = Some(Instant::now());
        }
        self.ponder_hit.store(true, Ordering::Release);
        true
    }

    #[inline]
    pub fn ponder_hit_received(&self) -> bool {
        self.ponder_hit.load(Ordering::Acquire)
    }

    /// Instant at which the ponder hit arrived, if one did.
    pub fn ponder_hit_at(&self) -> Option<Instant> {
        self.ponder_hit_at.lock().ok().and_then(|guard| *guard)
    }

    /// Set by the search thread right before it reports its result.
    #[inline]
    pub fn mark_finished(&self) {
        self.finished.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }
}
