//! Deferred actuation task
//!
//! Writes a channel's pins whenever its tick has moved the sequence index.

use defmt::*;

use crate::channels::StepperChannel;

#[embassy_executor::task(pool_size = 3)]
pub async fn actuation_task(name: &'static str, channel: &'static StepperChannel) {
    info!("{}: actuation task started", name);

    loop {
        if let Err(e) = channel.next_deferred().await {
            warn!("{}: actuation failed: {}", name, e);
        }
    }
}
