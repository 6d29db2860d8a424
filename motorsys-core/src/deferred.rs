//! Deferred actuation slot
//!
//! The tick context may only touch counters. It hands pin writes off to the
//! actuation task through a single-slot signal: scheduling while a request is
//! already pending collapses into that request. The actuation task reads the
//! channel's current index when it runs, so a collapsed request never loses
//! a step, it only skips a redundant identical write.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;

/// Single-slot handoff from the tick context to the actuation context
pub struct DeferredActuation<M: RawMutex> {
    pending: Signal<M, ()>,
}

impl<M: RawMutex> Default for DeferredActuation<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> DeferredActuation<M> {
    pub const fn new() -> Self {
        Self {
            pending: Signal::new(),
        }
    }

    /// Request an actuation; a no-op if one is already pending
    pub fn schedule(&self) {
        self.pending.signal(());
    }

    /// Take the pending request, if any
    pub fn try_take(&self) -> bool {
        self.pending.try_take().is_some()
    }

    /// Wait until a request is pending and take it
    pub async fn wait(&self) {
        self.pending.wait().await
    }

    /// Check if a request is pending
    pub fn is_pending(&self) -> bool {
        self.pending.signaled()
    }

    /// Drop any pending request
    pub fn cancel(&self) {
        self.pending.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

    #[test]
    fn test_requests_collapse() {
        let slot: DeferredActuation<CriticalSectionRawMutex> = DeferredActuation::new();
        assert!(!slot.try_take());
        slot.schedule();
        slot.schedule();
        slot.schedule();
        assert!(slot.is_pending());
        assert!(slot.try_take());
        assert!(!slot.try_take());
    }

    #[test]
    fn test_cancel_drops_pending() {
        let slot: DeferredActuation<CriticalSectionRawMutex> = DeferredActuation::new();
        slot.schedule();
        slot.cancel();
        assert!(!slot.is_pending());
        assert!(!slot.try_take());
    }
}
