//! Signal-backed tick timer
//!
//! [`SignalTimer`] is what a [`StepChannel`](motorsys_core::StepChannel)
//! arms and cancels. The channel's step timer task waits on it and does the
//! actual sleeping.

use core::time::Duration;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use motorsys_core::TickTimer;

pub struct SignalTimer {
    start: Signal<CriticalSectionRawMutex, Duration>,
    cancel: Signal<CriticalSectionRawMutex, ()>,
}

impl SignalTimer {
    pub const fn new() -> Self {
        Self {
            start: Signal::new(),
            cancel: Signal::new(),
        }
    }

    /// Wait for the channel to arm the timer
    pub async fn started(&self) -> Duration {
        self.start.wait().await
    }

    /// Wait for the channel to cancel the timer
    pub async fn cancelled(&self) {
        self.cancel.wait().await
    }
}

impl TickTimer for SignalTimer {
    fn start(&self, after: Duration) {
        // a stale cancel must not stop the new run
        self.cancel.reset();
        self.start.signal(after);
    }

    fn cancel(&self) {
        self.start.reset();
        self.cancel.signal(());
    }
}
